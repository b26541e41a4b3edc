use std::sync::Arc;

use bizdesk_shared::{
    const_config::storage::STORAGE_KEY_THEME,
    errors::{DeskResult, NotFoundError},
    log_err_as_warn,
    settings::{ThemeName, UserSettings},
    uac::Identity,
};
use tracing::warn;

use crate::{
    backend::{LocalStore, RemoteBackend},
    configuration::DefaultSettings,
};

/// Hydrates [`UserSettings`] for an identity once it is authenticated
pub struct SettingsLoader<B, S> {
    backend: Arc<B>,
    store: Arc<S>,
    defaults: DefaultSettings,
}

impl<B: RemoteBackend, S: LocalStore> SettingsLoader<B, S> {
    pub fn new(backend: Arc<B>, store: Arc<S>, defaults: DefaultSettings) -> Self {
        Self {
            backend,
            store,
            defaults,
        }
    }

    pub fn defaults(&self) -> &DefaultSettings {
        &self.defaults
    }

    /// Enterprise users take theme and currency from their profile, then from
    /// the enterprise, then from the defaults. Branches only use their own
    /// record and never have a security PIN
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, identity: &Identity) -> DeskResult<UserSettings> {
        match identity {
            Identity::Branch(user) => Ok(UserSettings {
                theme: user
                    .branch
                    .theme
                    .clone()
                    .unwrap_or_else(|| self.defaults.theme.clone()),
                currency: user
                    .branch
                    .currency
                    .clone()
                    .unwrap_or_else(|| self.defaults.currency.clone()),
                has_security_pin: false,
            }),
            Identity::Enterprise(user) => {
                let profile = user.profile.as_ref();
                let enterprise = match identity.enterprise_id() {
                    Some(id) => Some(
                        self.backend
                            .fetch_enterprise(id)
                            .await?
                            .ok_or_else(|| NotFoundError::Enterprise(id.to_string()))?,
                    ),
                    None => None,
                };
                let theme = profile
                    .and_then(|x| x.theme().cloned())
                    .or_else(|| enterprise.as_ref().and_then(|x| x.theme.clone()))
                    .unwrap_or_else(|| self.defaults.theme.clone());
                let currency = profile
                    .and_then(|x| x.currency().cloned())
                    .or_else(|| enterprise.as_ref().and_then(|x| x.currency.clone()))
                    .unwrap_or_else(|| self.defaults.currency.clone());
                Ok(UserSettings {
                    theme,
                    currency,
                    has_security_pin: enterprise.is_some_and(|x| x.has_security_pin),
                })
            }
        }
    }

    /// Used when [`Self::load`] fails. Nothing remote is consulted
    pub fn fallback(&self, identity: &Identity) -> UserSettings {
        let profile = identity.profile();
        UserSettings {
            theme: profile
                .and_then(|x| x.theme().cloned())
                .unwrap_or_else(|| self.defaults.theme.clone()),
            currency: profile
                .and_then(|x| x.currency().cloned())
                .unwrap_or_else(|| self.defaults.currency.clone()),
            has_security_pin: false,
        }
    }

    /// Remembers `theme` for this device, independent of who is logged in
    pub fn apply_theme(&self, theme: &ThemeName) {
        log_err_as_warn!(
            self.store.set(STORAGE_KEY_THEME, theme),
            "failed to remember the theme"
        );
    }

    /// The theme for the entry view
    pub fn device_theme(&self) -> ThemeName {
        match self.store.get(STORAGE_KEY_THEME) {
            Ok(Some(stored)) => ThemeName::try_from(stored).unwrap_or_else(|err| {
                warn!(?err, "ignoring invalid stored theme");
                self.defaults.theme.clone()
            }),
            Ok(None) => self.defaults.theme.clone(),
            Err(err) => {
                warn!(?err, "failed to read the stored theme");
                self.defaults.theme.clone()
            }
        }
    }
}
