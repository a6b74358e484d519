use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_GENERATIVE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_VISION_API_BASE: &str = "https://vision.googleapis.com/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct WellnessConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    /// `None` when no `MONGODB_URI` is set; history routes then answer 500.
    pub mongodb: Option<MongoConfig>,
    pub google: GoogleConfig,
    pub auth: AuthConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub api_key: String,
    /// Model for plans, chat and posture reports (e.g., gemini-2.0-flash)
    pub text_model: String,
    pub generative_api_base: String,
    pub vision_api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the managed auth provider.
    pub jwt_secret: String,
    /// Expected `aud` claim; audience is not checked when unset.
    pub audience: Option<String>,
}

impl WellnessConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let mongodb = match get_optional_env("MONGODB_URI") {
            Some(uri) => Some(MongoConfig {
                uri,
                database: get_env("MONGODB_DATABASE", Some("wellness_db"), is_prod)?,
            }),
            None if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "MONGODB_URI is required in production but not set"
                )))
            }
            None => None,
        };

        Ok(WellnessConfig {
            common: common_config,
            mongodb,
            google: GoogleConfig {
                api_key: get_env("GOOGLE_API_KEY", Some(""), is_prod)?,
                text_model: get_env("GENAI_TEXT_MODEL", Some("gemini-2.0-flash"), is_prod)?,
                generative_api_base: get_env(
                    "GENAI_API_BASE",
                    Some(DEFAULT_GENERATIVE_API_BASE),
                    false,
                )?,
                vision_api_base: get_env("VISION_API_BASE", Some(DEFAULT_VISION_API_BASE), false)?,
            },
            auth: AuthConfig {
                jwt_secret: get_env("AUTH_JWT_SECRET", None, is_prod)?,
                audience: get_optional_env("AUTH_JWT_AUDIENCE"),
            },
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
