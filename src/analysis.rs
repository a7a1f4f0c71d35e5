/// Data structures for analysis requests and results
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::InputPolicy;

pub const NO_RESPONSE_MESSAGE: &str =
    "Could not reach the analysis service. Check your connection and try again.";

/// What the user asked to analyze
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl AnalysisInput {
    pub fn from_url(url: impl Into<String>) -> AnalysisInput {
        AnalysisInput {
            url: Some(url.into()),
            text: None,
        }
    }

    pub fn from_text(text: impl Into<String>) -> AnalysisInput {
        AnalysisInput {
            url: None,
            text: Some(text.into()),
        }
    }

    /// Build the body for the two form fields according to `policy`.
    ///
    /// Under `Exclusive` the URL wins when both are filled; under
    /// `Combined` both fields are always sent, empty or not.
    pub fn from_fields(url: &str, text: &str, policy: InputPolicy) -> AnalysisInput {
        let url = url.trim();
        let text = text.trim();

        match policy {
            InputPolicy::Combined => AnalysisInput {
                url: Some(url.to_string()),
                text: Some(text.to_string()),
            },
            InputPolicy::Exclusive if !url.is_empty() => AnalysisInput::from_url(url),
            InputPolicy::Exclusive => AnalysisInput::from_text(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        let blank = |field: &Option<String>| field.as_deref().is_none_or(|v| v.trim().is_empty());
        blank(&self.url) && blank(&self.text)
    }
}

/// One user-initiated submission
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub input: AnalysisInput,
    /// Milliseconds since the epoch
    pub submitted_at: f64,
}

impl AnalysisRequest {
    pub fn new(input: AnalysisInput, submitted_at: f64) -> AnalysisRequest {
        AnalysisRequest {
            input,
            submitted_at,
        }
    }

    pub fn body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.input)
    }
}

/// The `analysis` field: one string, a list of paragraphs, or anything else
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisBody {
    Text(String),
    Paragraphs(Vec<String>),
    Opaque(Value),
}

impl AnalysisBody {
    fn from_value(value: &Value) -> AnalysisBody {
        match value {
            Value::String(s) => AnalysisBody::Text(s.clone()),
            Value::Array(items) if items.iter().all(Value::is_string) => AnalysisBody::Paragraphs(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            other => AnalysisBody::Opaque(other.clone()),
        }
    }
}

/// Successful response from the analysis endpoint. Every field is optional
/// since the service has shipped several response shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub overall_bias: Option<String>,
    pub analysis: Option<AnalysisBody>,
    pub bias_analysis: Option<String>,
    pub url: Option<String>,
    pub raw: Value,
}

impl AnalysisResult {
    pub fn from_value(raw: Value) -> AnalysisResult {
        let text_field = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);

        AnalysisResult {
            overall_bias: text_field("overallBias"),
            analysis: raw
                .get("analysis")
                .filter(|v| !v.is_null())
                .map(AnalysisBody::from_value),
            bias_analysis: text_field("bias_analysis"),
            url: text_field("url"),
            raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("{message}")]
    ServerRejected { status: u16, message: String },
    #[error("{}", NO_RESPONSE_MESSAGE)]
    NoResponse,
    #[error("{0}")]
    RequestConstructionFailed(String),
}

/// What the result slot holds once a submission settles
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Success(AnalysisResult),
    Failed(AnalysisError),
}

impl AnalysisOutcome {
    pub fn error_message(&self) -> Option<String> {
        match self {
            AnalysisOutcome::Failed(e) => Some(e.to_string()),
            AnalysisOutcome::Success(_) => None,
        }
    }
}
