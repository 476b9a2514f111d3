use garde::Validate;
use std::sync::Arc;

use crate::controllers::{decode_list, ManagerError, Notice};
use crate::models::prompt::{Prompt, PromptDraft};
use crate::services::api::{ApiError, Backend, RequestOptions};

const PROMPTS_PATH: &str = "/prompts";

fn prompt_path(id: &str) -> String {
    format!("{PROMPTS_PATH}?prompt_id={id}")
}

/// List, create, edit and delete prompt templates. Every mutation re-lists.
pub struct PromptManager {
    backend: Arc<dyn Backend>,
    token: String,
    prompts: Vec<Prompt>,
    notice: Option<Notice>,
}

impl PromptManager {
    pub fn new(backend: Arc<dyn Backend>, token: impl Into<String>) -> Self {
        Self {
            backend,
            token: token.into(),
            prompts: Vec::new(),
            notice: None,
        }
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Look up a listed prompt for preview or editing.
    pub fn find(&self, id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.key() == Some(id))
    }

    /// Fetch all prompts. A failed fetch leaves an empty list.
    pub async fn list(&mut self) -> Result<&[Prompt], ManagerError> {
        match self
            .backend
            .get(PROMPTS_PATH, Some(&self.token), RequestOptions::default())
            .await
        {
            Ok(value) => {
                self.prompts = decode_list(value, "prompt");
                tracing::debug!(count = self.prompts.len(), "Fetched prompts");
                Ok(&self.prompts)
            }
            Err(e) => {
                self.prompts.clear();
                Err(self.fail(e))
            }
        }
    }

    pub async fn create(&mut self, draft: &PromptDraft) -> Result<(), ManagerError> {
        self.validate(draft)?;
        let result = self
            .backend
            .post(PROMPTS_PATH, Some(&self.token), RequestOptions::json(draft.create_body()))
            .await;
        self.finish(result, "Prompt created successfully").await
    }

    pub async fn update(&mut self, draft: &PromptDraft) -> Result<(), ManagerError> {
        self.validate(draft)?;
        let Some(id) = draft.pk.as_deref().filter(|id| !id.is_empty()) else {
            tracing::error!("Cannot update prompt: ID is undefined");
            self.notice = Some(Notice::error(ManagerError::MissingId.to_string()));
            return Err(ManagerError::MissingId);
        };
        let body = serde_json::to_value(draft)?;
        let result = self
            .backend
            .put(&prompt_path(id), Some(&self.token), RequestOptions::json(body))
            .await;
        self.finish(result, "Prompt updated successfully").await
    }

    pub async fn delete(&mut self, id: &str) -> Result<(), ManagerError> {
        tracing::info!(prompt_id = %id, "Deleting prompt");
        let result = self
            .backend
            .delete(&prompt_path(id), Some(&self.token), RequestOptions::default())
            .await;
        self.finish(result, "Prompt deleted successfully").await
    }

    fn validate(&mut self, draft: &PromptDraft) -> Result<(), ManagerError> {
        if let Err(report) = draft.validate() {
            let message = report
                .iter()
                .map(|(_, error)| error.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            self.notice = Some(Notice::error(message.clone()));
            return Err(ManagerError::Validation(message));
        }
        Ok(())
    }

    /// Record the outcome of a mutation and re-list to pick up the server's state.
    async fn finish(
        &mut self,
        result: Result<serde_json::Value, ApiError>,
        success: &str,
    ) -> Result<(), ManagerError> {
        let outcome = match result {
            Ok(_) => {
                self.notice = Some(Notice::success(success));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        };
        if let Err(e) = self.list().await {
            tracing::warn!(error = %e, "Failed to refresh prompts after update");
        }
        outcome
    }

    fn fail(&mut self, error: ApiError) -> ManagerError {
        tracing::error!(error = %error, "Prompt request failed");
        self.notice = Some(Notice::error(error.user_message()));
        ManagerError::Api(error)
    }
}
