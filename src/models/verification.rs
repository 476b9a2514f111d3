use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of `POST /agent/verify`.
#[derive(Debug, Serialize)]
pub struct StartVerificationRequest {
    pub image_base64: String,
    /// Always sent as `null`; the agent infers the document type.
    pub document_type: Option<String>,
    pub metadata: Map<String, Value>,
}

impl StartVerificationRequest {
    pub fn new(image_base64: String) -> Self {
        Self {
            image_base64,
            document_type: None,
            metadata: Map::new(),
        }
    }
}

/// Response of `POST /agent/verify`.
#[derive(Debug, Deserialize)]
pub struct StartVerificationResponse {
    pub verification_id: String,
}

/// Body of `PUT /agent/verify/{id}`.
#[derive(Debug, Serialize)]
pub struct AdditionalInfoRequest {
    pub additional_info: String,
}

/// Body of `POST /verifications`.
#[derive(Debug, Serialize)]
pub struct AnalyzeDocumentRequest {
    pub image_base64: String,
}
