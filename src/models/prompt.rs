use garde::Validate;
use serde::{Deserialize, Serialize};

/// Prompt template stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    pub pk: Option<String>,
    /// Older records carry `id` instead of `pk`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    pub tasks: String,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Prompt {
    /// The key used in `?prompt_id=` queries.
    pub fn key(&self) -> Option<&str> {
        self.pk.as_deref().or(self.id.as_deref())
    }
}

/// Prompt form contents for create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct PromptDraft {
    #[garde(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pk: Option<String>,

    #[garde(custom(required("Role is required")))]
    pub role: String,

    #[garde(custom(required("Tasks are required")))]
    pub tasks: String,

    #[garde(skip)]
    pub is_active: bool,
}

fn required(message: &'static str) -> impl FnOnce(&str, &()) -> garde::Result {
    move |value, _| {
        if value.trim().is_empty() {
            Err(garde::Error::new(message))
        } else {
            Ok(())
        }
    }
}

impl PromptDraft {
    pub fn new(role: impl Into<String>, tasks: impl Into<String>, is_active: bool) -> Self {
        Self {
            pk: None,
            role: role.into(),
            tasks: tasks.into(),
            is_active,
        }
    }

    /// Body for `POST /prompts`.
    pub fn create_body(&self) -> serde_json::Value {
        serde_json::json!({
            "role": self.role,
            "tasks": self.tasks,
            "is_active": self.is_active,
        })
    }
}

impl From<&Prompt> for PromptDraft {
    fn from(prompt: &Prompt) -> Self {
        Self {
            pk: prompt.key().map(str::to_string),
            role: prompt.role.clone(),
            tasks: prompt.tasks.clone(),
            is_active: prompt.is_active,
        }
    }
}
