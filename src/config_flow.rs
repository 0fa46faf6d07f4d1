use crate::config::{clamp_interval, ConfigEntry, ConfigStore};
use crate::coordinator::DEFAULT_UPDATE_INTERVAL;
use crate::error::SutroError;
use crate::gateway::INTEGRATION_NAME;
use crate::sutro_api::SutroAPI;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Form-level errors shown to the operator during setup or options update.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlowError {
    #[error("cannot connect to the Sutro service")]
    CannotConnect,

    #[error("invalid username or password")]
    InvalidAuth,

    #[error("no config entry `{0}`")]
    UnknownEntry(String),
}

impl FlowError {
    /// Error code keyed into the host's form translations.
    pub fn code(&self) -> &'static str {
        match self {
            FlowError::CannotConnect => "cannot_connect",
            FlowError::InvalidAuth => "invalid_auth",
            FlowError::UnknownEntry(_) => "unknown",
        }
    }
}

impl From<SutroError> for FlowError {
    fn from(err: SutroError) -> Self {
        match err {
            SutroError::Auth(_) => FlowError::InvalidAuth,
            SutroError::Connect(_) | SutroError::Parse(_) => FlowError::CannotConnect,
        }
    }
}

/// What the operator types into the setup or options form.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialsInput {
    pub username: String,
    pub password: String,
    pub update_interval: Option<Duration>,
}

/// Exchanges the credentials for a token.
pub async fn validate_credentials(
    api: &SutroAPI,
    username: &str,
    password: &str,
) -> Result<String, FlowError> {
    api.get_token(username, password).await.map_err(|e| {
        error!("Failed to retrieve token: {e}");
        FlowError::from(e)
    })
}

/// Initial setup: validates the credentials and stores a new entry.
pub async fn setup_entry(
    api: &SutroAPI,
    store: &dyn ConfigStore,
    input: CredentialsInput,
) -> Result<ConfigEntry, FlowError> {
    let token = validate_credentials(api, &input.username, &input.password).await?;

    let entry = ConfigEntry {
        entry_id: input.username.trim().to_lowercase(),
        title: INTEGRATION_NAME.to_string(),
        username: input.username,
        password: input.password,
        token,
        update_interval: clamp_interval(input.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL)),
    };

    info!(entry_id = %entry.entry_id, "created Sutro config entry");
    store.save(entry.clone());
    Ok(entry)
}

/// Options update: re-validates credentials and persists the new token.
///
/// The stored entry is left untouched when validation fails.
pub async fn update_options(
    api: &SutroAPI,
    store: &dyn ConfigStore,
    entry_id: &str,
    input: CredentialsInput,
) -> Result<ConfigEntry, FlowError> {
    let mut entry = store
        .load(entry_id)
        .ok_or_else(|| FlowError::UnknownEntry(entry_id.to_string()))?;

    let token = validate_credentials(api, &input.username, &input.password).await?;

    entry.username = input.username;
    entry.password = input.password;
    entry.token = token;
    if let Some(update_interval) = input.update_interval {
        entry.update_interval = clamp_interval(update_interval);
    }

    info!(entry_id = %entry.entry_id, "updated Sutro config entry");
    store.save(entry.clone());
    Ok(entry)
}
