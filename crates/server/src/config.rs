//! Server configuration from the environment (and `.env`)

use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_DB_PATH: &str = "data/leaderboard.db";
const DEFAULT_UPLOAD_DIR: &str = "uploads/images";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be true or false, got {value:?}")]
    InvalidFlag { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    /// Where uploaded avatars are written (served under `/uploads/images`)
    pub upload_dir: PathBuf,
    /// Prebuilt client bundle served as the fallback route
    pub static_dir: PathBuf,
    /// CORS origins; empty means any origin
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    /// Insert the default roster on `serve` when the board is empty
    pub seed_on_start: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map instead of the process env)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("LEADERBOARD_DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let upload_dir = lookup("LEADERBOARD_UPLOAD_DIR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string());
        let static_dir = lookup("LEADERBOARD_STATIC_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_static_dir);

        let allowed_origins = lookup("LEADERBOARD_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let max_upload_bytes = match lookup("LEADERBOARD_MAX_UPLOAD_BYTES") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: "LEADERBOARD_MAX_UPLOAD_BYTES",
                        value,
                    })
                }
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let seed_on_start = match lookup("LEADERBOARD_SEED") {
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag {
                var: "LEADERBOARD_SEED",
                value,
            })?,
            None => true,
        };

        Ok(Self {
            db_path: PathBuf::from(db_path),
            upload_dir: PathBuf::from(upload_dir),
            static_dir,
            allowed_origins,
            max_upload_bytes,
            seed_on_start,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// `dist/` next to the executable if it exists, else `./dist`
fn default_static_dir() -> PathBuf {
    let exe_path = env::current_exe().unwrap_or_default();
    let dist_dir = exe_path
        .parent()
        .map(|dir| dir.join("dist"))
        .filter(|dir| dir.exists());
    dist_dir.unwrap_or_else(|| PathBuf::from("dist"))
}
