//! Language preference, LLM provider settings and the signed-in identity.

use std::sync::Arc;

use shared::protocol::{ConfigData, ConfigUpdateRequest, UserInfo};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{error::Result, gateway::EntityGateway};

pub const DEFAULT_LANGUAGE: &str = "en";

struct PreferencesState {
    language: String,
    // Masked key as last loaded; an unchanged field must not overwrite the
    // stored secret.
    loaded_key: String,
    config: Option<ConfigData>,
}

pub struct PreferencesController {
    gateway: Arc<dyn EntityGateway>,
    state: Mutex<PreferencesState>,
}

impl PreferencesController {
    pub fn new(gateway: Arc<dyn EntityGateway>, language: impl Into<String>) -> Self {
        Self {
            gateway,
            state: Mutex::new(PreferencesState {
                language: language.into(),
                loaded_key: String::new(),
                config: None,
            }),
        }
    }

    pub async fn language(&self) -> String {
        self.state.lock().await.language.clone()
    }

    /// Switches the language locally right away, then tries to persist it.
    /// A failed write is logged and otherwise ignored.
    pub async fn set_language(&self, language: &str) {
        self.state.lock().await.language = language.to_string();
        info!("preferences: language set language={language}");

        let request = ConfigUpdateRequest::language_only(language);
        match self.gateway.update_config(&request).await {
            Ok(config) => self.install(config).await,
            Err(err) => warn!("preferences: language not saved language={language} error={err}"),
        }
    }

    /// Loads server settings. A non-empty server language replaces the
    /// local one.
    pub async fn load_config(&self) -> Result<ConfigData> {
        let config = self.gateway.get_config().await?;
        self.install(config.clone()).await;
        Ok(config)
    }

    pub async fn save_config(&self, edited: &ConfigData) -> Result<ConfigData> {
        let request = {
            let state = self.state.lock().await;
            ConfigUpdateRequest::from_edit(edited, &state.loaded_key)
        };
        let config = self.gateway.update_config(&request).await?;
        info!("preferences: config saved model={}", config.llm_model);
        self.install(config.clone()).await;
        Ok(config)
    }

    pub async fn config(&self) -> Option<ConfigData> {
        self.state.lock().await.config.clone()
    }

    pub async fn whoami(&self) -> Result<UserInfo> {
        self.gateway.whoami().await
    }

    async fn install(&self, config: ConfigData) {
        let mut state = self.state.lock().await;
        if !config.language.is_empty() {
            state.language = config.language.clone();
        }
        state.loaded_key = config.llm_api_key.clone();
        state.config = Some(config);
    }
}

#[cfg(test)]
#[path = "tests/preferences_tests.rs"]
mod tests;
