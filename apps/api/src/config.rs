use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub analyzer: AnalyzerConfig,
}

/// Everything the synthesizer needs. Built once at startup and handed to
/// `Synthesizer::from_config`; the synthesizer never reads the environment.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerConfig {
    pub primary: Option<ProviderConfig>,
    pub secondary: Option<ProviderConfig>,
    pub settings: AnalysisSettings,
}

/// Credentials and endpoint for one OpenAI-compatible chat completion provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Request parameters shared by both provider tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Deadline applied to each provider call, retries included.
    pub provider_timeout: Duration,
    pub malformed_policy: MalformedOutputPolicy,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.3,
            provider_timeout: Duration::from_secs(30),
            malformed_policy: MalformedOutputPolicy::default(),
        }
    }
}

/// What to do when the primary provider answers, but not with a JSON object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedOutputPolicy {
    /// Go straight to the heuristic tier. The secondary provider is not asked.
    #[default]
    SkipToHeuristic,
    /// Treat malformed output like any other primary failure.
    TrySecondary,
}

impl FromStr for MalformedOutputPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "skip_to_heuristic" | "heuristic" => Ok(Self::SkipToHeuristic),
            "try_secondary" | "secondary" => Ok(Self::TrySecondary),
            other => Err(anyhow!("unknown malformed output policy '{other}'")),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = AnalysisSettings::default();
        let settings = AnalysisSettings {
            max_tokens: parse_env("ANALYSIS_MAX_TOKENS", defaults.max_tokens)?,
            temperature: parse_env("ANALYSIS_TEMPERATURE", defaults.temperature)?,
            provider_timeout: Duration::from_secs(parse_env(
                "ANALYSIS_PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout.as_secs(),
            )?),
            malformed_policy: parse_env("ANALYSIS_MALFORMED_POLICY", defaults.malformed_policy)?,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            analyzer: AnalyzerConfig {
                primary: provider_from_env(
                    "openai",
                    "OPENAI",
                    DEFAULT_OPENAI_BASE_URL,
                    DEFAULT_OPENAI_MODEL,
                ),
                secondary: provider_from_env(
                    "groq",
                    "GROQ",
                    DEFAULT_GROQ_BASE_URL,
                    DEFAULT_GROQ_MODEL,
                ),
                settings,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(std::env::var(key).ok()) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("Environment variable '{key}' is invalid: {e}")),
        None => Ok(default),
    }
}

fn provider_from_env(
    name: &str,
    prefix: &str,
    default_base_url: &str,
    default_model: &str,
) -> Option<ProviderConfig> {
    let api_key = non_empty(std::env::var(format!("{prefix}_API_KEY")).ok())?;
    Some(ProviderConfig {
        name: name.to_string(),
        api_key,
        base_url: non_empty(std::env::var(format!("{prefix}_BASE_URL")).ok())
            .unwrap_or_else(|| default_base_url.to_string()),
        model: non_empty(std::env::var(format!("{prefix}_MODEL")).ok())
            .unwrap_or_else(|| default_model.to_string()),
    })
}

/// Blank values count as unset, so `OPENAI_API_KEY=` disables the provider.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_are_unset() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(Some(" sk-1 ".to_string())), Some("sk-1".to_string()));
    }

    #[test]
    fn test_policy_parses_known_labels() {
        assert_eq!(
            "skip_to_heuristic".parse::<MalformedOutputPolicy>().unwrap(),
            MalformedOutputPolicy::SkipToHeuristic
        );
        assert_eq!(
            "Try-Secondary".parse::<MalformedOutputPolicy>().unwrap(),
            MalformedOutputPolicy::TrySecondary
        );
        assert!("retry_forever".parse::<MalformedOutputPolicy>().is_err());
    }

    #[test]
    fn test_default_settings() {
        let settings = AnalysisSettings::default();
        assert_eq!(settings.max_tokens, 2000);
        assert!((settings.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(settings.provider_timeout, Duration::from_secs(30));
        assert_eq!(settings.malformed_policy, MalformedOutputPolicy::SkipToHeuristic);
    }

    #[test]
    fn test_provider_debug_redacts_key() {
        let provider = ProviderConfig {
            name: "openai".to_string(),
            api_key: "sk-secret".to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
        };
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("gpt-4o-mini"));
    }
}
