//! Runtime configuration, read from the environment after a best-effort
//! `.env` load.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Stored Gmail credential (authorized-user file, read-only mail scope).
pub const MAIL_TOKEN_PATH: &str = "token.json";
/// Token cache for the Sheets authenticator.
pub const SHEETS_TOKEN_PATH: &str = "token_sheets.json";
/// Preferred location of the installed-app secret.
pub const CLIENT_SECRET_PRIMARY: &str = "client_secret.json";
/// Legacy fallback location of the installed-app secret.
pub const CLIENT_SECRET_FALLBACK: &str = "token.json";

const DEFAULT_MAX_RESULTS: u32 = 50;
const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";

/// Batch job configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: SecretString,
    pub groq_model: String,
    pub spreadsheet_id: String,
    pub max_results: u32,
}

impl Config {
    /// Load configuration from the process environment. Missing API key or
    /// spreadsheet id is fatal here, before any remote call is made.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let groq_api_key = get("GROQ_API_KEY")
            .filter(|v| !v.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("GROQ_API_KEY".into()))?;

        let spreadsheet_id = get("GOOGLE_SHEET_ID")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GOOGLE_SHEET_ID".into()))?;

        let groq_model = get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_results = match get("MAIL_TRIAGE_MAX_RESULTS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAIL_TRIAGE_MAX_RESULTS".into(),
                        message: format!("expected a positive integer, got {raw:?}"),
                    });
                }
            },
            None => DEFAULT_MAX_RESULTS,
        };

        Ok(Self {
            groq_api_key,
            groq_model,
            spreadsheet_id,
            max_results,
        })
    }
}
