use crate::{
    id::EnterpriseId,
    settings::{CurrencyCode, ThemeName},
    uac::DisplayName,
};

/// A row of the `enterprises` table
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct Enterprise {
    pub id: EnterpriseId,
    pub name: String,
    #[serde(default)]
    pub currency: Option<CurrencyCode>,
    #[serde(default)]
    pub theme: Option<ThemeName>,
    /// Set once a security PIN has been configured. The PIN itself never
    /// leaves the backend
    #[serde(default)]
    pub has_security_pin: bool,
}

#[derive(Debug, Default, serde::Serialize, Clone, PartialEq, Eq)]
pub struct EnterpriseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<DisplayName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeName>,
}

impl Enterprise {
    const SLUG_MAX_LENGTH: usize = 24;

    /// Short lower case form of the name used to build branch login ids
    pub fn slug(&self) -> String {
        let mut result = String::new();
        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() {
                result.push(c.to_ascii_lowercase());
            } else if !result.is_empty() && !result.ends_with('-') {
                result.push('-');
            }
            if result.len() == Self::SLUG_MAX_LENGTH {
                break;
            }
        }
        let result = result.trim_end_matches('-');
        if result.is_empty() {
            "branch".to_string()
        } else {
            result.to_string()
        }
    }
}

impl EnterpriseUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.currency.is_none() && self.theme.is_none()
    }
}
