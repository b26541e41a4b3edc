use std::{fmt::Display, ops::Deref, str::FromStr};

use anyhow::Context as _;
use strum::IntoEnumIterator as _;

use crate::errors::ConversionError;

/// Identifier of a routable page
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PageId(String);

/// Element id of a modal dialog
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ModalId(String);

/// Pages the dashboard knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum KnownPage {
    Home,
    Branches,
    Workspace,
    Analytics,
    Profile,
    Operations,
    /// Kept for old links, always redirected to [`KnownPage::Profile`]
    Settings,
}

/// State stored with each native history entry
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Default, PartialEq, Eq)]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modal: Option<ModalId>,
}

impl PageId {
    pub const MAX_LENGTH: usize = 40;

    pub fn home() -> Self {
        KnownPage::Home.into()
    }

    pub fn known(&self) -> Option<KnownPage> {
        KnownPage::from_str(&self.0).ok()
    }

    /// Applies page aliases (`settings` is shown as `profile`)
    #[must_use]
    pub fn redirected(self) -> Self {
        match self.known() {
            Some(KnownPage::Settings) => KnownPage::Profile.into(),
            _ => self,
        }
    }
}

impl KnownPage {
    /// Pages that are listed in the dock (aliases excluded)
    pub fn listed() -> impl Iterator<Item = Self> {
        Self::iter().filter(|page| !matches!(page, Self::Settings))
    }
}

impl From<KnownPage> for PageId {
    fn from(value: KnownPage) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for PageId {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ConversionError::check_length(&value, Self::MAX_LENGTH)?;
        Ok(Self(value))
    }
}

impl TryFrom<&str> for PageId {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl TryFrom<String> for ModalId {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ConversionError::check_length(&value, 64)?;
        Ok(Self(value))
    }
}

impl TryFrom<&str> for ModalId {
    type Error = ConversionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.to_string().try_into()
    }
}

impl From<PageId> for String {
    fn from(value: PageId) -> Self {
        value.0
    }
}

impl From<ModalId> for String {
    fn from(value: ModalId) -> Self {
        value.0
    }
}

impl Deref for PageId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0[..]
    }
}

impl Deref for ModalId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0[..]
    }
}

impl Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ModalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl HistoryEntry {
    pub fn page(page: PageId) -> Self {
        Self {
            page: Some(page),
            modal: None,
        }
    }

    #[must_use]
    pub fn with_modal(mut self, modal: ModalId) -> Self {
        self.modal = Some(modal);
        self
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).context("failed to serialize history entry")
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("failed to parse history entry")
    }
}
