use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use crate::models::Module;
use crate::services::progress_summarizer::{DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS};
use crate::utils::time::TimeZonePolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub progress: ProgressConfig,
    pub curriculum: CurriculumConfig,
    pub practice: PracticeConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub retry_attempts: usize,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub token_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ProgressConfig {
    pub lookback_days: u32,
    pub timezone: TimeZonePolicy,
}

/// Lesson counts per module; the backend overview overrides these when it
/// is reachable.
#[derive(Debug, Clone)]
pub struct CurriculumConfig {
    pub quran: u32,
    pub qaida: u32,
    pub dua: u32,
}

impl CurriculumConfig {
    pub fn totals(&self) -> HashMap<Module, u32> {
        HashMap::from([
            (Module::Quran, self.quran),
            (Module::Qaida, self.qaida),
            (Module::Dua, self.dua),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct PracticeConfig {
    pub min_accuracy: u8,
    pub max_accuracy: u8,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then a local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/{env}.toml + APP__ overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let string_setting = |key: &str, legacy_env: &str, default: &str| -> String {
            settings
                .get_string(key)
                .or_else(|_| env::var(legacy_env))
                .unwrap_or_else(|_| default.to_string())
        };
        let int_setting = |key: &str, legacy_env: &str, default: i64| -> Result<i64, config::ConfigError> {
            if let Ok(value) = settings.get_int(key) {
                return Ok(value);
            }
            match env::var(legacy_env) {
                Ok(raw) => raw.trim().parse::<i64>().map_err(|e| {
                    config::ConfigError::Message(format!("{} must be an integer: {}", legacy_env, e))
                }),
                Err(_) => Ok(default),
            }
        };

        let base_url = string_setting("api.base_url", "API_BASE_URL", "http://localhost:3000/api");
        if url::Url::parse(&base_url).is_err() {
            return Err(config::ConfigError::Message(format!(
                "api.base_url is not a valid URL: {}",
                base_url
            )));
        }

        let timezone = string_setting("progress.timezone", "PROGRESS_TIMEZONE", "utc")
            .parse::<TimeZonePolicy>()
            .map_err(config::ConfigError::Message)?;

        let min_accuracy = bounded_u8(int_setting("practice.min_accuracy", "PRACTICE_MIN_ACCURACY", 60)?)?;
        let max_accuracy = bounded_u8(int_setting("practice.max_accuracy", "PRACTICE_MAX_ACCURACY", 100)?)?;
        if min_accuracy > max_accuracy {
            return Err(config::ConfigError::Message(
                "practice.min_accuracy must not exceed practice.max_accuracy".to_string(),
            ));
        }

        Ok(Config {
            api: ApiConfig {
                base_url,
                timeout_secs: non_negative(int_setting("api.timeout_secs", "API_TIMEOUT_SECS", 15)?)?,
                retry_attempts: non_negative(int_setting("api.retry_attempts", "API_RETRY_ATTEMPTS", 3)?)?
                    as usize,
            },
            session: SessionConfig {
                token_path: PathBuf::from(string_setting(
                    "session.token_path",
                    "SESSION_TOKEN_PATH",
                    ".session/token.json",
                )),
            },
            progress: ProgressConfig {
                lookback_days: bounded_u32(
                    "progress.lookback_days",
                    int_setting(
                        "progress.lookback_days",
                        "PROGRESS_LOOKBACK_DAYS",
                        i64::from(DEFAULT_LOOKBACK_DAYS),
                    )?,
                    MAX_LOOKBACK_DAYS,
                )?,
                timezone,
            },
            curriculum: CurriculumConfig {
                quran: bounded_u32("curriculum.quran", int_setting("curriculum.quran", "CURRICULUM_QURAN", 114)?, u32::MAX)?,
                qaida: bounded_u32("curriculum.qaida", int_setting("curriculum.qaida", "CURRICULUM_QAIDA", 29)?, u32::MAX)?,
                dua: bounded_u32("curriculum.dua", int_setting("curriculum.dua", "CURRICULUM_DUA", 40)?, u32::MAX)?,
            },
            practice: PracticeConfig {
                min_accuracy,
                max_accuracy,
            },
        })
    }
}

fn non_negative(value: i64) -> Result<u64, config::ConfigError> {
    u64::try_from(value)
        .map_err(|_| config::ConfigError::Message(format!("Expected a non-negative value, got {}", value)))
}

fn bounded_u32(key: &str, value: i64, max: u32) -> Result<u32, config::ConfigError> {
    match u32::try_from(value) {
        Ok(v) if v <= max => Ok(v),
        _ => Err(config::ConfigError::Message(format!(
            "{} must be within 0..={}, got {}",
            key, max, value
        ))),
    }
}

fn bounded_u8(value: i64) -> Result<u8, config::ConfigError> {
    match u8::try_from(value) {
        Ok(v) if v <= 100 => Ok(v),
        _ => Err(config::ConfigError::Message(format!(
            "Accuracy bounds must be within 0..=100, got {}",
            value
        ))),
    }
}
