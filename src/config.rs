/// Runtime configuration for the widget and the analysis form
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/analyze";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TRANSITION_MS: u32 = 200;
pub const DEFAULT_ICON_PATH: &str = "icons/icon48.png";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid analysis endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("timeoutMs must be greater than zero")]
    ZeroTimeout,
    #[error("invalid frame origin `{0}`")]
    InvalidOrigin(String),
    #[error("frame origin must be explicit, `*` is not allowed")]
    WildcardOrigin,
}

/// Whether the URL and text fields may both be submitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    /// Filling one field disables the other; only the filled field is sent
    Exclusive,
    #[default]
    Combined,
}

/// What the widget sends when nothing is selected on the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSource {
    #[default]
    Text,
    Url,
}

/// Embedded frame that receives each analysis result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultFrame {
    pub src: String,
    pub target_origin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub input_policy: InputPolicy,
    pub page_source: PageSource,
    pub transition_ms: u32,
    pub icon_path: String,
    pub result_frame: Option<ResultFrame>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            input_policy: InputPolicy::default(),
            page_source: PageSource::default(),
            transition_ms: DEFAULT_TRANSITION_MS,
            icon_path: DEFAULT_ICON_PATH.to_string(),
            result_frame: None,
        }
    }
}

/// A config whose endpoint and frame origin have been checked
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub settings: AnalyzerConfig,
    pub endpoint: Url,
    pub frame_origin: Option<String>,
}

impl ValidatedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.settings.timeout_ms)
    }
}

impl AnalyzerConfig {
    /// Resolve the endpoint (relative paths against `base`) and check the
    /// remaining fields.
    pub fn validate(self, base: Option<&Url>) -> Result<ValidatedConfig, ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let endpoint = resolve_endpoint(&self.endpoint, base)?;
        let frame_origin = self
            .result_frame
            .as_ref()
            .map(|frame| resolve_target_origin(&frame.target_origin))
            .transpose()?;

        Ok(ValidatedConfig {
            settings: self,
            endpoint,
            frame_origin,
        })
    }
}

fn resolve_endpoint(endpoint: &str, base: Option<&Url>) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let url = match Url::parse(endpoint) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base.join(endpoint).map_err(|e| invalid(e.to_string()))?,
            None => return Err(invalid("relative endpoint without a page location".to_string())),
        },
        Err(e) => return Err(invalid(e.to_string())),
    };

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme `{}`", other))),
    }
}

/// Normalize an origin for `postMessage`, refusing the broadcast wildcard
pub fn resolve_target_origin(origin: &str) -> Result<String, ConfigError> {
    let origin = origin.trim();
    if origin == "*" {
        return Err(ConfigError::WildcardOrigin);
    }

    let url = Url::parse(origin).map_err(|_| ConfigError::InvalidOrigin(origin.to_string()))?;
    let serialized = url.origin().ascii_serialization();
    if serialized != "null" {
        return Ok(serialized);
    }

    // Extension schemes have opaque origins in the URL standard but the
    // browser still matches them as scheme://host
    match url.host_str() {
        Some(host) => Ok(match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        }),
        None => Err(ConfigError::InvalidOrigin(origin.to_string())),
    }
}
