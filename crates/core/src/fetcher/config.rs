//! Fetcher configuration.

use serde::{Deserialize, Deserializer, Serialize};

/// Configuration for remote file fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Largest accepted file, in megabytes.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Accepted file extensions, compared case-insensitively.
    /// Accepts a list or a single space/comma separated string.
    #[serde(
        default = "default_allowed_extensions",
        deserialize_with = "deserialize_extensions"
    )]
    pub allowed_extensions: Vec<String>,

    /// Whole-request timeout of the HTTP client (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_max_file_size_mb() -> u64 {
    300
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".jpg".to_string(), ".jpeg".to_string(), ".pdf".to_string()]
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            allowed_extensions: default_allowed_extensions(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl FetcherConfig {
    /// Size ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Allowlist normalized to lowercase without the leading dot.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.allowed_extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

/// Lowercase an extension and strip its leading dot.
pub(crate) fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn deserialize_extensions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawExtensions {
        List(Vec<String>),
        Joined(String),
    }

    let extensions = match RawExtensions::deserialize(deserializer)? {
        RawExtensions::List(list) => list,
        RawExtensions::Joined(joined) => joined
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
    };
    Ok(extensions)
}
