//! Browser implementations of the platform seams

use anyhow::{anyhow, Context as _};
use bizdesk_shared::{
    errors::{DeskError, DeskResult},
    nav::{HistoryEntry, ModalId},
};
use tracing::warn;
use wasm_bindgen::JsValue;

use crate::backend::{BrowserHistory, LocalStore, ModalHost};

/// Class that keeps a modal out of view
pub const HIDDEN_CLASS: &str = "hidden";

/// `window.localStorage`
#[derive(Debug, Default, Clone, Copy)]
pub struct WebStorage;

/// `window.history`. Entries are stored as JSON text in the state object
#[derive(Debug, Default, Clone, Copy)]
pub struct WebHistory;

/// Shows a modal by removing [`HIDDEN_CLASS`] from the element whose id is
/// the modal id
#[derive(Debug, Default, Clone, Copy)]
pub struct DomModalHost;

fn window() -> anyhow::Result<web_sys::Window> {
    web_sys::window().context("no global window")
}

fn js_err(err: JsValue) -> anyhow::Error {
    anyhow!("{err:?}")
}

/// Query string of the current URL including the leading `?`
pub fn location_search() -> anyhow::Result<String> {
    window()?.location().search().map_err(js_err)
}

/// Fragment of the current URL including the leading `#`
pub fn location_hash() -> anyhow::Result<String> {
    window()?.location().hash().map_err(js_err)
}

impl WebStorage {
    fn storage(&self) -> DeskResult<web_sys::Storage> {
        window()
            .map_err(|e| DeskError::Storage(e.to_string()))?
            .local_storage()
            .map_err(|e| DeskError::Storage(format!("{e:?}")))?
            .ok_or_else(|| DeskError::Storage("local storage disabled".to_string()))
    }
}

impl LocalStore for WebStorage {
    fn get(&self, key: &str) -> DeskResult<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| DeskError::Storage(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> DeskResult<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| DeskError::Storage(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> DeskResult<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| DeskError::Storage(format!("{e:?}")))
    }
}

impl WebHistory {
    fn history(&self) -> anyhow::Result<web_sys::History> {
        window()?.history().map_err(js_err)
    }

    /// Turns the `state` of a popstate event back into an entry
    pub fn entry_from_state(state: &JsValue) -> Option<HistoryEntry> {
        let text = state.as_string()?;
        match HistoryEntry::from_json(&text) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(?err, "ignoring history state not written by this app");
                None
            }
        }
    }

    fn to_state(entry: &HistoryEntry) -> anyhow::Result<JsValue> {
        Ok(JsValue::from_str(&entry.to_json()?))
    }
}

impl BrowserHistory for WebHistory {
    fn current_state(&self) -> Option<HistoryEntry> {
        let state = self.history().ok()?.state().ok()?;
        Self::entry_from_state(&state)
    }

    fn push_state(&mut self, entry: &HistoryEntry) -> anyhow::Result<()> {
        let state = Self::to_state(entry)?;
        self.history()?.push_state(&state, "").map_err(js_err)
    }

    fn replace_state(&mut self, entry: &HistoryEntry) -> anyhow::Result<()> {
        let state = Self::to_state(entry)?;
        self.history()?.replace_state(&state, "").map_err(js_err)
    }

    fn go_back(&mut self) -> anyhow::Result<()> {
        self.history()?.back().map_err(js_err)
    }
}

impl DomModalHost {
    fn element(&self, id: &ModalId) -> Option<web_sys::Element> {
        let element = window().ok()?.document()?.get_element_by_id(id);
        if element.is_none() {
            warn!(%id, "no element for modal");
        }
        element
    }
}

impl ModalHost for DomModalHost {
    fn show(&mut self, id: &ModalId) {
        if let Some(element) = self.element(id) {
            if let Err(err) = element.class_list().remove_1(HIDDEN_CLASS) {
                warn!(?err, %id, "failed to show modal");
            }
        }
    }

    fn hide(&mut self, id: &ModalId) {
        if let Some(element) = self.element(id) {
            if let Err(err) = element.class_list().add_1(HIDDEN_CLASS) {
                warn!(?err, %id, "failed to hide modal");
            }
        }
    }
}
