use serde::{Deserialize, Deserializer, Serialize};

/// A document analyzed by `POST /verifications`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyzedDocument {
    #[serde(default)]
    pub id: Option<String>,
    pub pk: Option<String>,
    pub timestamp: Option<String>,
    pub document_type: Option<String>,
    /// The backend stores confidence as a decimal and sometimes serializes it as a string.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    pub content_text: Option<String>,
    pub file_key: Option<String>,
    pub preview_url: Option<String>,
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl AnalyzedDocument {
    /// Fill display defaults for records missing optional fields.
    pub fn normalized(mut self) -> Self {
        if self.id.is_none() {
            self.id = Some(
                self.pk
                    .clone()
                    .unwrap_or_else(|| format!("temp-{}", uuid::Uuid::new_v4())),
            );
        }
        if self.document_type.as_deref().map_or(true, str::is_empty) {
            self.document_type = Some("Unknown".to_string());
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(chrono::Utc::now().to_rfc3339());
        }
        self
    }
}
