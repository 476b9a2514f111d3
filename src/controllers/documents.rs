use std::sync::Arc;

use crate::controllers::{decode_list, ManagerError, Notice};
use crate::models::document::AnalyzedDocument;
use crate::models::verification::AnalyzeDocumentRequest;
use crate::services::api::{ApiError, Backend, RequestOptions};
use crate::services::upload::UploadedImage;

const VERIFICATIONS_PATH: &str = "/verifications";

/// Single-shot document analysis and the history of analyzed documents.
pub struct DocumentAnalyzer {
    backend: Arc<dyn Backend>,
    token: String,
    documents: Vec<AnalyzedDocument>,
    selected: Option<UploadedImage>,
    notice: Option<Notice>,
    requires_sign_in: bool,
}

impl DocumentAnalyzer {
    pub fn new(backend: Arc<dyn Backend>, token: impl Into<String>) -> Self {
        Self {
            backend,
            token: token.into(),
            documents: Vec::new(),
            selected: None,
            notice: None,
            requires_sign_in: false,
        }
    }

    pub fn documents(&self) -> &[AnalyzedDocument] {
        &self.documents
    }

    pub fn selected(&self) -> Option<&UploadedImage> {
        self.selected.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Set after the backend rejected the token; the shell should send the user to sign in.
    pub fn requires_sign_in(&self) -> bool {
        self.requires_sign_in
    }

    pub fn find(&self, id: &str) -> Option<&AnalyzedDocument> {
        self.documents.iter().find(|d| d.id.as_deref() == Some(id))
    }

    pub fn select_image(&mut self, image: UploadedImage) {
        self.notice = None;
        self.selected = Some(image);
    }

    pub async fn list(&mut self) -> Result<&[AnalyzedDocument], ManagerError> {
        let value = match self
            .backend
            .get(VERIFICATIONS_PATH, Some(&self.token), RequestOptions::default())
            .await
        {
            Ok(value) => value,
            Err(e) => return Err(self.fail(e)),
        };

        if !value.is_array() {
            let error = ManagerError::Validation("Invalid response format".to_string());
            self.notice = Some(Notice::error(error.to_string()));
            return Err(error);
        }
        self.documents = decode_list::<AnalyzedDocument>(value, "document")
            .into_iter()
            .map(AnalyzedDocument::normalized)
            .collect();
        tracing::debug!(count = self.documents.len(), "Fetched analyzed documents");
        Ok(&self.documents)
    }

    /// Submit the selected image for analysis. The list is re-fetched whatever the outcome.
    pub async fn analyze(&mut self) -> Result<AnalyzedDocument, ManagerError> {
        let image = self.selected.clone().ok_or(ManagerError::NothingSelected)?;
        tracing::info!(file = %image.file_name, bytes = image.size, "Submitting document for analysis");

        let body = serde_json::to_value(AnalyzeDocumentRequest {
            image_base64: image.base64,
        })?;
        let result = self
            .backend
            .post(VERIFICATIONS_PATH, Some(&self.token), RequestOptions::json(body))
            .await;

        let outcome = match result {
            Ok(response) => {
                self.selected = None;
                self.notice = Some(Notice::success("Document analyzed"));
                let document = serde_json::from_value::<AnalyzedDocument>(response)
                    .unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Unrecognized analysis response");
                        AnalyzedDocument::default()
                    });
                Ok(document.normalized())
            }
            Err(e) => {
                let message = match &e {
                    ApiError::Status { body: Some(_), .. } => e.user_message(),
                    _ => "An error occurred during analysis".to_string(),
                };
                tracing::error!(error = %e, "Document analysis failed");
                self.requires_sign_in |= e.is_auth();
                self.notice = Some(Notice::error(message));
                Err(ManagerError::Api(e))
            }
        };

        let notice = self.notice.clone();
        if let Err(e) = self.list().await {
            tracing::warn!(error = %e, "Failed to refresh documents after analysis");
        }
        if outcome.is_err() {
            self.notice = notice;
        }
        outcome
    }

    fn fail(&mut self, error: ApiError) -> ManagerError {
        tracing::error!(error = %error, "Document request failed");
        self.requires_sign_in |= error.is_auth();
        self.notice = Some(Notice::error(error.user_message()));
        ManagerError::Api(error)
    }
}
