use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use anyhow::bail;
use bizdesk_client_core::{BrowserHistory, LocalStore, ModalHost, ViewRenderer};
use bizdesk_shared::{
    errors::{DeskError, DeskResult},
    nav::{HistoryEntry, ModalId, PageId},
    settings::{ThemeName, UserSettings},
    uac::{IdentityKind, Viewer},
};

/// Shared between clones so a test can inspect what the app stored
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().expect("mutex poisoned").get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("mutex poisoned")
            .insert(key.to_string(), value.to_string());
    }

    /// Every access fails while set, as with storage disabled in the browser
    pub fn set_unavailable(&self, value: bool) {
        *self.unavailable.lock().expect("mutex poisoned") = value;
    }

    fn check_available(&self) -> DeskResult<()> {
        if *self.unavailable.lock().expect("mutex poisoned") {
            Err(DeskError::Storage("SecurityError: The operation is insecure.".to_string()))
        } else {
            Ok(())
        }
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> DeskResult<Option<String>> {
        self.check_available()?;
        Ok(self.value(key))
    }

    fn set(&self, key: &str, value: &str) -> DeskResult<()> {
        self.check_available()?;
        self.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> DeskResult<()> {
        self.check_available()?;
        self.values.lock().expect("mutex poisoned").remove(key);
        Ok(())
    }
}

/// Browser history with the same shape as the real one: a list of entries,
/// a position, and popstate notifications that arrive after the move
#[derive(Debug)]
pub struct FakeHistory {
    entries: Vec<Option<HistoryEntry>>,
    index: usize,
    pending_pops: VecDeque<Option<HistoryEntry>>,
}

impl Default for FakeHistory {
    fn default() -> Self {
        // A freshly loaded page has one entry with no state
        Self {
            entries: vec![None],
            index: 0,
            pending_pops: VecDeque::new(),
        }
    }
}

impl FakeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Option<HistoryEntry>] {
        &self.entries
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Moves `delta` entries like `history.go(delta)`. Out of range moves
    /// are ignored, as in the browser
    pub fn go(&mut self, delta: isize) {
        let Some(target) = self.index.checked_add_signed(delta) else {
            return;
        };
        if delta == 0 || target >= self.entries.len() {
            return;
        }
        self.index = target;
        self.pending_pops.push_back(self.entries[target].clone());
    }

    pub fn back(&mut self) {
        self.go(-1);
    }

    pub fn forward(&mut self) {
        self.go(1);
    }

    /// The next popstate notification waiting to be delivered
    pub fn take_pop(&mut self) -> Option<Option<HistoryEntry>> {
        self.pending_pops.pop_front()
    }
}

impl BrowserHistory for FakeHistory {
    fn current_state(&self) -> Option<HistoryEntry> {
        self.entries[self.index].clone()
    }

    fn push_state(&mut self, entry: &HistoryEntry) -> anyhow::Result<()> {
        self.entries.truncate(self.index + 1);
        self.entries.push(Some(entry.clone()));
        self.index = self.entries.len() - 1;
        Ok(())
    }

    fn replace_state(&mut self, entry: &HistoryEntry) -> anyhow::Result<()> {
        self.entries[self.index] = Some(entry.clone());
        Ok(())
    }

    fn go_back(&mut self) -> anyhow::Result<()> {
        if self.index == 0 {
            bail!("no earlier history entry");
        }
        self.back();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeModals {
    visible: BTreeSet<String>,
    shown: usize,
}

impl FakeModals {
    pub fn visible(&self) -> Vec<&str> {
        self.visible.iter().map(String::as_str).collect()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.contains(id)
    }

    /// Number of times any modal was shown
    pub fn shown(&self) -> usize {
        self.shown
    }
}

impl ModalHost for FakeModals {
    fn show(&mut self, id: &ModalId) {
        self.shown += 1;
        self.visible.insert(id.to_string());
    }

    fn hide(&mut self, id: &ModalId) {
        self.visible.remove(&**id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Page {
        page: PageId,
        kind: IdentityKind,
        full_name: String,
        theme: ThemeName,
        currency: String,
    },
    Entry {
        theme: ThemeName,
    },
    PasswordReset,
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    rendered: Vec<Rendered>,
}

impl RecordingRenderer {
    pub fn rendered(&self) -> &[Rendered] {
        &self.rendered
    }

    pub fn last(&self) -> Option<&Rendered> {
        self.rendered.last()
    }

    /// The page shown last, `None` if the last view was not a page
    pub fn last_page(&self) -> Option<&str> {
        match self.rendered.last() {
            Some(Rendered::Page { page, .. }) => Some(&**page),
            _ => None,
        }
    }
}

impl ViewRenderer for RecordingRenderer {
    fn render_page(&mut self, page: &PageId, viewer: &Viewer, settings: &UserSettings) {
        self.rendered.push(Rendered::Page {
            page: page.clone(),
            kind: viewer.kind,
            full_name: viewer.full_name.clone(),
            theme: settings.theme.clone(),
            currency: settings.currency.to_string(),
        });
    }

    fn render_entry(&mut self, theme: &ThemeName) {
        self.rendered.push(Rendered::Entry {
            theme: theme.clone(),
        });
    }

    fn show_password_reset(&mut self) {
        self.rendered.push(Rendered::PasswordReset);
    }
}
