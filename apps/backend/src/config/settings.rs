//! Environment-driven runtime configuration.
//!
//! Environment variables must be set by the runtime environment (compose
//! env_file, `--env-file`, or sourced manually for local dev).

use std::env;
use std::str::FromStr;

use crate::ai::difficulty::IterationBudgets;
use crate::error::AppError;

/// Stream prefix shared with the other platform services; queue/group names
/// are internal to this service.
pub const DEFAULT_STREAM_PREFIX: &str = "game_events";

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub stream_prefix: String,
    pub allowed_origin: Option<String>,
    pub ai_iterations_low: u32,
    pub ai_iterations_medium: u32,
    pub ai_iterations_high: u32,
    pub ai_iterations_very_high: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        let host = env_or("BACKEND_HOST", "0.0.0.0");
        let port = parse_env_or("BACKEND_PORT", 3002u16)?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::config("DATABASE_URL must be set".to_string()))?;
        let redis_url = env::var("REDIS_URL")
            .map_err(|_| AppError::config("REDIS_URL must be set".to_string()))?;

        let stream_prefix = env_or("GAME_EVENTS_STREAM_PREFIX", DEFAULT_STREAM_PREFIX);
        let allowed_origin = env::var("BACKEND_ALLOWED_ORIGIN").ok();

        let defaults = IterationBudgets::default();
        let settings = Self {
            host,
            port,
            database_url,
            redis_url,
            stream_prefix,
            allowed_origin,
            ai_iterations_low: parse_env_or("AI_PLAYER_MCTS_ITERATIONS_LOW", defaults.low)?,
            ai_iterations_medium: parse_env_or("AI_PLAYER_MCTS_ITERATIONS_MEDIUM", defaults.medium)?,
            ai_iterations_high: parse_env_or("AI_PLAYER_MCTS_ITERATIONS_HIGH", defaults.high)?,
            ai_iterations_very_high: parse_env_or(
                "AI_PLAYER_MCTS_ITERATIONS_VERY_HIGH",
                defaults.very_high,
            )?,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn iteration_budgets(&self) -> IterationBudgets {
        IterationBudgets {
            low: self.ai_iterations_low,
            medium: self.ai_iterations_medium,
            high: self.ai_iterations_high,
            very_high: self.ai_iterations_very_high,
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        let tiers = [
            self.ai_iterations_low,
            self.ai_iterations_medium,
            self.ai_iterations_high,
            self.ai_iterations_very_high,
        ];
        // Difficulty tiers must stay strictly increasing.
        if tiers.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(AppError::config(format!(
                "AI iteration budgets must be strictly increasing, got {tiers:?}"
            )));
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse()
            .map_err(|e| AppError::config(format!("{key} is invalid: {e}"))),
    }
}
