use anyhow::{bail, Context, Result};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2000;
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const MAX_LLM_ATTEMPTS: u32 = 10;

/// Decoding parameters for one pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm_api_url: String,
    pub llm_max_retries: u32,
    pub llm_retry_base_ms: u64,
    pub redis_url: Option<String>,
    pub analysis_ttl_secs: u64,
    pub analysis_store_capacity: u64,
    pub document_timeout_secs: u64,
    pub extraction: GenerationSettings,
    pub analysis: GenerationSettings,
    pub scoring: GenerationSettings,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let shared = settings_from_env("", GenerationSettings::default())?;
        let llm_max_retries = parse_env("LLM_MAX_RETRIES", 3)?;
        validate_retries(llm_max_retries)?;

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            llm_max_retries,
            llm_retry_base_ms: parse_env("LLM_RETRY_BASE_MS", 1000)?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty()),
            analysis_ttl_secs: parse_env("ANALYSIS_TTL_SECS", 86_400)?,
            analysis_store_capacity: parse_env("ANALYSIS_STORE_CAPACITY", 10_000)?,
            document_timeout_secs: parse_env("DOCUMENT_TIMEOUT_SECS", 60)?,
            extraction: settings_from_env("EXTRACTION_", shared.clone())?,
            analysis: settings_from_env("ANALYSIS_", shared.clone())?,
            scoring: settings_from_env("SCORING_", shared)?,
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads `{prefix}LLM_MODEL`, `{prefix}LLM_TEMPERATURE` and `{prefix}LLM_MAX_OUTPUT_TOKENS`,
/// falling back to `base` for anything unset.
fn settings_from_env(prefix: &str, base: GenerationSettings) -> Result<GenerationSettings> {
    let settings = GenerationSettings {
        model: std::env::var(format!("{prefix}LLM_MODEL")).unwrap_or(base.model),
        temperature: parse_env(&format!("{prefix}LLM_TEMPERATURE"), base.temperature)?,
        max_output_tokens: parse_env(
            &format!("{prefix}LLM_MAX_OUTPUT_TOKENS"),
            base.max_output_tokens,
        )?,
    };
    validate_settings(prefix, &settings)?;
    Ok(settings)
}

fn validate_settings(prefix: &str, settings: &GenerationSettings) -> Result<()> {
    if settings.model.trim().is_empty() {
        bail!("{prefix}LLM_MODEL must not be empty");
    }
    if !(0.0..=1.0).contains(&settings.temperature) {
        bail!(
            "{prefix}LLM_TEMPERATURE must be between 0 and 1, got {}",
            settings.temperature
        );
    }
    if settings.max_output_tokens == 0 {
        bail!("{prefix}LLM_MAX_OUTPUT_TOKENS must be greater than 0");
    }
    Ok(())
}

fn validate_retries(attempts: u32) -> Result<()> {
    if !(1..=MAX_LLM_ATTEMPTS).contains(&attempts) {
        bail!("LLM_MAX_RETRIES must be between 1 and {MAX_LLM_ATTEMPTS}, got {attempts}");
    }
    Ok(())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
