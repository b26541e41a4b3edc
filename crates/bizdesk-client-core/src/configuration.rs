use bizdesk_shared::{
    const_config::client::{DEFAULT_CURRENCY, DEFAULT_THEME},
    nav::PageId,
    settings::{CurrencyCode, ThemeName},
};
use secrecy::SecretString;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ClientConfig {
    pub backend: BackendSettings,
    #[serde(default)]
    pub defaults: DefaultSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct BackendSettings {
    /// Root of the backend service, without a trailing slash
    pub base_url: String,
    /// Public key sent with every request. Row level security does the rest
    pub anon_key: SecretString,
}

/// Used whenever neither the profile nor the enterprise record says otherwise
#[derive(serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DefaultSettings {
    pub theme: ThemeName,
    pub currency: CurrencyCode,
    /// Shown after login and when the URL does not name a page
    pub landing_page: PageId,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            theme: ThemeName::try_from(DEFAULT_THEME).expect("default theme is valid"),
            currency: CurrencyCode::try_from(DEFAULT_CURRENCY)
                .expect("default currency is valid"),
            landing_page: PageId::home(),
        }
    }
}

impl BackendSettings {
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Reads `configuration/base.toml` and the file for the current environment
/// then applies any `APP_` prefixed environment variables
#[cfg(not(target_arch = "wasm32"))]
pub fn get_configuration() -> Result<ClientConfig, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("failed to determine the current directory: {e}"))
    })?;
    let configuration_directory = base_path.join("configuration");

    // Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.toml", environment.as_str());
    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.toml")))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename)).required(false),
        )
        // E.g. `APP_BACKEND__BASE_URL=https://example.com` sets `ClientConfig.backend.base_url`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<ClientConfig>()
}

/// For builds that embed their configuration (there is no file system in the
/// browser)
pub fn from_toml_str(text: &str) -> Result<ClientConfig, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::from_str(text, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<ClientConfig>()
}

/// The possible runtime environment for our application.
#[cfg(not(target_arch = "wasm32"))]
pub enum Environment {
    Local,
    Production,
}

#[cfg(not(target_arch = "wasm32"))]
impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
