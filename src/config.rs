//! TOML configuration; every field has a default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Full configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat-completion API used for the narrative.
    pub llm: LlmConfig,
    /// Analysis settings.
    pub analysis: AnalysisConfig,
}

/// Maximum completion tokens per narrative phase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTokens {
    /// Liquidity and leverage commentary.
    pub liquidity_leverage: u32,
    /// Profitability and activity commentary.
    pub profitability_activity: u32,
    /// Integrated conclusion.
    pub conclusion: u32,
}

impl Default for PhaseTokens {
    fn default() -> Self {
        Self {
            liquidity_leverage: 2500,
            profitability_activity: 2800,
            conclusion: 2500,
        }
    }
}

/// OpenAI-compatible chat-completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling.
    pub top_p: f32,
    /// Token limits per phase.
    pub max_tokens: PhaseTokens,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "openai/gpt-oss-20b".to_string(),
            temperature: 0.6,
            top_p: 0.9,
            max_tokens: PhaseTokens::default(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Reads the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String, ReportError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ReportError::MissingApiKey {
                var: self.api_key_env.clone(),
            })
    }
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rows kept when a consolidated table is reduced to its main lines.
    pub top_n: usize,
    /// Years at or after this are not taken as document years; defaults to the current year.
    pub year_cutoff: Option<i32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            year_cutoff: None,
        }
    }
}

impl Config {
    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ReportError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.llm.max_tokens.profitability_activity, 2800);
        assert_eq!(config.analysis.top_n, 10);
        assert!(config.analysis.year_cutoff.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [llm]
            model = "llama-3.3-70b-versatile"
            api_key_env = "MY_KEY"

            [llm.max_tokens]
            conclusion = 1000

            [analysis]
            year_cutoff = 2024
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.llm.max_tokens.conclusion, 1000);
        assert_eq!(config.llm.max_tokens.liquidity_leverage, 2500);
        assert_eq!(config.analysis.year_cutoff, Some(2024));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = Config::from_toml_str("[llm\nmodel = 1").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn unset_key_variable_is_reported() {
        let llm = LlmConfig {
            api_key_env: "SMV_REPORT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        let err = llm.api_key().unwrap_err();
        assert!(matches!(err, ReportError::MissingApiKey { var } if var.starts_with("SMV_")));
    }
}
