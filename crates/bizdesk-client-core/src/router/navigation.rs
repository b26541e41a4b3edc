use bizdesk_shared::nav::{ModalId, PageId};

/// The router's own record of where the user has been
///
/// `cursor` always indexes into `stack`, which is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    stack: Vec<PageId>,
    cursor: usize,
    pub(super) active_modal: Option<ModalId>,
}

/// Where a page reported by the browser sits relative to the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
    /// Neither neighbour. The cursor is left where it is
    Unrecognized,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::starting_at(PageId::home())
    }
}

impl NavigationState {
    pub fn starting_at(page: PageId) -> Self {
        Self {
            stack: vec![page],
            cursor: 0,
            active_modal: None,
        }
    }

    pub fn stack(&self) -> &[PageId] {
        &self.stack
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn active_modal(&self) -> Option<&ModalId> {
        self.active_modal.as_ref()
    }

    pub fn current(&self) -> &PageId {
        &self.stack[self.cursor]
    }

    /// Drops everything after the cursor then appends `page`
    pub fn push(&mut self, page: PageId) {
        self.stack.truncate(self.cursor + 1);
        self.stack.push(page);
        self.cursor = self.stack.len() - 1;
    }

    pub fn reset_to(&mut self, page: PageId) {
        self.stack.clear();
        self.stack.push(page);
        self.cursor = 0;
    }

    /// Moves the cursor towards `target` if it is a direct neighbour, back
    /// being checked first
    pub fn follow(&mut self, target: &PageId) -> Direction {
        if self.cursor > 0 && &self.stack[self.cursor - 1] == target {
            self.cursor -= 1;
            Direction::Back
        } else if self.stack.get(self.cursor + 1) == Some(target) {
            self.cursor += 1;
            Direction::Forward
        } else {
            Direction::Unrecognized
        }
    }
}
