use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Configuration groups exposed by `GET /configurations?config_id=<group>`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum ConfigGroup {
    #[serde(rename = "MODEL_IDS")]
    #[strum(serialize = "MODEL_IDS")]
    ModelIds,
    #[serde(rename = "INFERENCE_PARAMS")]
    #[strum(serialize = "INFERENCE_PARAMS")]
    InferenceParams,
}

/// One configuration entry. `pk` is the group, `sk` the entry key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Configuration {
    pub pk: String,
    pub sk: String,
    pub value: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Configuration {
    pub fn group(&self) -> Option<ConfigGroup> {
        self.pk.parse().ok()
    }

    pub fn is_model(&self) -> bool {
        self.group() == Some(ConfigGroup::ModelIds)
    }
}

/// Tunable inference parameters with bounded numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum InferenceParam {
    Temperature,
    TopP,
    TopK,
    MaxNewTokens,
}

impl InferenceParam {
    /// Inclusive `(min, max, step)` accepted for the parameter.
    pub fn bounds(self) -> (f64, f64, f64) {
        match self {
            InferenceParam::Temperature | InferenceParam::TopP => (0.0, 1.0, 0.01),
            InferenceParam::TopK => (0.0, 500.0, 1.0),
            InferenceParam::MaxNewTokens => (1.0, 64000.0, 1.0),
        }
    }

    /// Check a raw value against the parameter's range.
    pub fn check(self, raw: &str) -> Result<f64, String> {
        let (min, max, step) = self.bounds();
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| format!("{self} must be a number, got {raw:?}"))?;
        if !(min..=max).contains(&value) {
            return Err(format!("{self} must be between {min} and {max}"));
        }
        if step >= 1.0 && value.fract() != 0.0 {
            return Err(format!("{self} must be a whole number"));
        }
        Ok(value)
    }
}
