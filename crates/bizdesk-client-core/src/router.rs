use bizdesk_shared::{
    const_config::client::QUERY_PARAM_PAGE,
    log_err_as_warn,
    nav::{HistoryEntry, ModalId, PageId},
};
use tracing::{debug, info};

use crate::backend::{BrowserHistory, ModalHost};

mod navigation;

pub use navigation::{Direction, NavigationState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Start a new stack with this page instead of adding to it
    pub is_top_level: bool,
    /// Leave the internal stack as it is
    pub skip_history_record: bool,
    /// Leave the browser's history as it is
    pub skip_browser_push: bool,
}

pub struct Router<H, M> {
    history: H,
    modals: M,
    state: NavigationState,
}

impl LoadOptions {
    pub fn top_level() -> Self {
        Self {
            is_top_level: true,
            ..Default::default()
        }
    }
}

impl<H: BrowserHistory, M: ModalHost> Router<H, M> {
    pub fn new(history: H, modals: M) -> Self {
        Self {
            history,
            modals,
            state: NavigationState::default(),
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn current_page(&self) -> &PageId {
        self.state.current()
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn modals(&self) -> &M {
        &self.modals
    }

    /// Picks the first page from the query string of the URL the app was
    /// opened with. The browser entry is replaced so no extra entry is made
    #[tracing::instrument(skip(self))]
    pub fn mount(&mut self, query: &str, landing_page: &PageId) -> PageId {
        let page = page_from_query(query)
            .unwrap_or_else(|| landing_page.clone())
            .redirected();
        log_err_as_warn!(self.history.replace_state(&HistoryEntry::page(page.clone())));
        self.hide_active_modal();
        self.state = NavigationState::starting_at(page.clone());
        info!(%page, "router mounted");
        page
    }

    /// Navigates to `page` and returns the page that should be rendered
    #[tracing::instrument(skip(self))]
    pub fn load_page(&mut self, page: PageId, options: LoadOptions) -> PageId {
        let page = page.redirected();

        // The new browser entry carries no modal
        self.hide_active_modal();

        if !options.skip_browser_push {
            let entry = HistoryEntry::page(page.clone());
            let already_current = self
                .history
                .current_state()
                .is_some_and(|current| current.page.as_ref() == Some(&page));
            if already_current {
                log_err_as_warn!(self.history.replace_state(&entry));
            } else {
                log_err_as_warn!(self.history.push_state(&entry));
            }
        }

        if !options.skip_history_record {
            if options.is_top_level {
                self.state.reset_to(page.clone());
            } else {
                self.state.push(page.clone());
            }
        }
        page
    }

    /// Reconciles with an entry the browser moved to
    ///
    /// Returns the page to render or `None` if only the modal changed. Jumps
    /// further than one entry are not recognized: the cursor stays put and
    /// only the reported page is rendered.
    #[tracing::instrument(skip(self))]
    pub fn handle_pop_state(&mut self, entry: Option<HistoryEntry>) -> Option<PageId> {
        let HistoryEntry { page, modal } = entry.unwrap_or_default();

        let modal_changed = modal != self.state.active_modal;
        if modal_changed {
            self.hide_active_modal();
            if let Some(modal) = modal {
                self.modals.show(&modal);
                self.state.active_modal = Some(modal);
            }
        }

        let target = page.unwrap_or_else(PageId::home).redirected();
        if modal_changed && &target == self.state.current() {
            debug!("modal only transition");
            return None;
        }

        let direction = self.state.follow(&target);
        debug!(?direction, cursor = self.state.cursor());
        Some(target)
    }

    /// Shows `id` and records it in the browser history so "back" closes it
    #[tracing::instrument(skip(self))]
    pub fn open_modal(&mut self, id: ModalId) {
        if self.state.active_modal.as_ref() == Some(&id) {
            return;
        }
        self.hide_active_modal();
        self.modals.show(&id);
        let entry = self
            .history
            .current_state()
            .unwrap_or_else(|| HistoryEntry::page(self.state.current().clone()))
            .with_modal(id.clone());
        log_err_as_warn!(self.history.push_state(&entry));
        self.state.active_modal = Some(id);
    }

    /// Goes back through the browser if `id` owns the current entry so the
    /// history stays consistent, otherwise hides it directly
    #[tracing::instrument(skip(self))]
    pub fn close_modal(&mut self, id: &ModalId) {
        let owns_entry = self
            .history
            .current_state()
            .is_some_and(|entry| entry.modal.as_ref() == Some(id));
        if owns_entry {
            log_err_as_warn!(self.history.go_back());
        } else {
            self.modals.hide(id);
            if self.state.active_modal.as_ref() == Some(id) {
                self.state.active_modal = None;
            }
        }
    }

    /// Back to a single `home` entry. Used at logout
    #[tracing::instrument(skip(self))]
    pub fn reset(&mut self) {
        self.hide_active_modal();
        self.state = NavigationState::default();
        log_err_as_warn!(self
            .history
            .replace_state(&HistoryEntry::page(PageId::home())));
    }

    fn hide_active_modal(&mut self) {
        if let Some(modal) = self.state.active_modal.take() {
            self.modals.hide(&modal);
        }
    }
}

/// Accepts the query with or without the leading `?`
pub fn page_from_query(query: &str) -> Option<PageId> {
    let query = query.trim_start_matches('?');
    if query.is_empty() {
        return None;
    }
    let url = reqwest::Url::parse(&format!("http://localhost/?{query}")).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == QUERY_PARAM_PAGE)
        .and_then(|(_, value)| PageId::try_from(value.into_owned()).ok())
}
