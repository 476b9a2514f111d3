use futures::future::join_all;
use std::sync::Arc;

use crate::controllers::{decode_list, ManagerError, Notice};
use crate::models::configuration::{ConfigGroup, Configuration, InferenceParam};
use crate::services::api::{ApiError, Backend, RequestOptions};

const CONFIGURATIONS_PATH: &str = "/configurations";

/// Two-phase state of a model activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Activation {
    #[default]
    Idle,
    /// Shown as active locally, waiting for the server.
    Pending { sk: String },
    /// The server accepted the activation.
    Confirmed { sk: String },
    /// The server rejected it; local flags were restored.
    RolledBack { sk: String, error: String },
}

/// Model IDs and inference parameters.
pub struct ConfigurationManager {
    backend: Arc<dyn Backend>,
    token: String,
    models: Vec<Configuration>,
    inference: Vec<Configuration>,
    activation: Activation,
    notice: Option<Notice>,
}

impl ConfigurationManager {
    pub fn new(backend: Arc<dyn Backend>, token: impl Into<String>) -> Self {
        Self {
            backend,
            token: token.into(),
            models: Vec::new(),
            inference: Vec::new(),
            activation: Activation::Idle,
            notice: None,
        }
    }

    pub fn models(&self) -> &[Configuration] {
        &self.models
    }

    pub fn inference_params(&self) -> &[Configuration] {
        &self.inference
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn find(&self, group: ConfigGroup, sk: &str) -> Option<&Configuration> {
        let entries = match group {
            ConfigGroup::ModelIds => &self.models,
            ConfigGroup::InferenceParams => &self.inference,
        };
        entries.iter().find(|c| c.sk == sk)
    }

    /// Fetch both configuration groups.
    pub async fn list(&mut self) -> Result<(), ManagerError> {
        let models = self.fetch_group(ConfigGroup::ModelIds).await;
        let inference = if models.is_ok() {
            self.fetch_group(ConfigGroup::InferenceParams).await
        } else {
            Ok(Vec::new())
        };
        match (models, inference) {
            (Ok(models), Ok(inference)) => {
                self.models = models;
                self.inference = inference;
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => Err(self.fail(e)),
        }
    }

    async fn fetch_group(&self, group: ConfigGroup) -> Result<Vec<Configuration>, ApiError> {
        let path = format!("{CONFIGURATIONS_PATH}?config_id={group}");
        let value = self
            .backend
            .get(&path, Some(&self.token), RequestOptions::default())
            .await?;
        Ok(decode_list(value, "configuration"))
    }

    /// Save one entry. Activating a model goes through [`Self::activate_model`] semantics.
    pub async fn update(&mut self, config: Configuration) -> Result<(), ManagerError> {
        if let Some(param) = config
            .group()
            .filter(|g| *g == ConfigGroup::InferenceParams)
            .and_then(|_| config.sk.parse::<InferenceParam>().ok())
        {
            if let Err(message) = param.check(&config.value) {
                self.notice = Some(Notice::error(message.clone()));
                return Err(ManagerError::Validation(message));
            }
        }

        if config.is_model() && config.is_active {
            return self.activate(config).await;
        }

        let result = self.put(&config).await;
        let outcome = result.map(|_| ()).map_err(|e| self.fail(e));
        if outcome.is_ok() {
            self.notice = Some(Notice::success(format!("{} updated", config.sk)));
        }
        self.refresh().await;
        outcome
    }

    /// Make `sk` the only active model.
    pub async fn activate_model(&mut self, sk: &str) -> Result<(), ManagerError> {
        let mut config = self
            .find(ConfigGroup::ModelIds, sk)
            .cloned()
            .ok_or_else(|| ManagerError::UnknownConfig(sk.to_string()))?;
        config.is_active = true;
        self.update(config).await
    }

    /// Deactivate every other active model concurrently, then activate `config`.
    /// A failed sibling update does not block the activation; either way the lists are
    /// re-fetched afterwards.
    async fn activate(&mut self, config: Configuration) -> Result<(), ManagerError> {
        let previous: Vec<(String, bool)> = self
            .models
            .iter()
            .map(|m| (m.sk.clone(), m.is_active))
            .collect();
        let siblings: Vec<Configuration> = self
            .models
            .iter()
            .filter(|m| m.sk != config.sk && m.is_active)
            .map(|m| Configuration {
                is_active: false,
                ..m.clone()
            })
            .collect();

        self.activation = Activation::Pending { sk: config.sk.clone() };
        for model in &mut self.models {
            model.is_active = model.sk == config.sk;
        }

        tracing::info!(model = %config.sk, deactivating = siblings.len(), "Activating model");
        let sibling_results = join_all(siblings.iter().map(|sibling| self.put(sibling))).await;
        let sibling_error = sibling_results
            .into_iter()
            .zip(&siblings)
            .filter_map(|(result, sibling)| {
                result
                    .inspect_err(|e| {
                        tracing::error!(model = %sibling.sk, error = %e, "Failed to deactivate model")
                    })
                    .err()
            })
            .next();

        let outcome = match self.put(&config).await {
            Ok(_) => {
                self.activation = Activation::Confirmed { sk: config.sk.clone() };
                match sibling_error {
                    Some(e) => Err(self.fail(e)),
                    None => {
                        self.notice = Some(Notice::success(format!("{} is now the active model", config.sk)));
                        Ok(())
                    }
                }
            }
            Err(e) => {
                for model in &mut self.models {
                    if let Some((_, was_active)) = previous.iter().find(|(sk, _)| *sk == model.sk) {
                        model.is_active = *was_active;
                    }
                }
                self.activation = Activation::RolledBack {
                    sk: config.sk.clone(),
                    error: e.user_message(),
                };
                Err(self.fail(e))
            }
        };

        self.refresh().await;
        outcome
    }

    async fn put(&self, config: &Configuration) -> Result<serde_json::Value, ApiError> {
        let body = serde_json::to_value(config)?;
        self.backend
            .put(CONFIGURATIONS_PATH, Some(&self.token), RequestOptions::json(body))
            .await
    }

    async fn refresh(&mut self) {
        if let Err(e) = self.list().await {
            tracing::warn!(error = %e, "Failed to refresh configurations");
        }
    }

    fn fail(&mut self, error: ApiError) -> ManagerError {
        tracing::error!(error = %error, "Configuration request failed");
        self.notice = Some(Notice::error(error.user_message()));
        ManagerError::Api(error)
    }
}
