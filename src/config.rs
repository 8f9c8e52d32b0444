//! Runtime configuration read from the environment (and `.env`, if present).

use std::env;

use crate::excel::SourceLocation;
use crate::models::SourceKind;
use crate::subjects::groq::GROQ_BASE_URL;
use crate::subjects::{OracleOptions, DEFAULT_MAX_CANDIDATES, DEFAULT_MODEL};

pub const DEFAULT_CLASS_SOURCE: &str = "data/class_occupancy.xlsx";
pub const DEFAULT_LAB_SOURCE: &str = "data/lab_occupancy.csv";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8001";

/// Keys starting like this are the sample value from `.env.example`.
const PLACEHOLDER_KEY_PREFIX: &str = "gsk_...";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub class_source: SourceLocation,
    pub lab_source: SourceLocation,
    pub class_anchor: String,
    pub lab_anchor: String,
    pub bind_addr: String,
    pub groq_api_key: Option<String>,
    pub groq_base_url: String,
    pub oracle_model: String,
    pub oracle_max_candidates: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();
        AppConfig::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let oracle_max_candidates = match get("TT_ORACLE_MAX_CANDIDATES") {
            None => DEFAULT_MAX_CANDIDATES,
            Some(v) => match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!("invalid TT_ORACLE_MAX_CANDIDATES '{}', using {}", v, DEFAULT_MAX_CANDIDATES);
                    DEFAULT_MAX_CANDIDATES
                }
            },
        };

        AppConfig {
            class_source: SourceLocation::parse(&or("TT_CLASS_SOURCE", DEFAULT_CLASS_SOURCE)),
            lab_source: SourceLocation::parse(&or("TT_LAB_SOURCE", DEFAULT_LAB_SOURCE)),
            class_anchor: or("TT_CLASS_ANCHOR", SourceKind::Class.default_anchor()),
            lab_anchor: or("TT_LAB_ANCHOR", SourceKind::Lab.default_anchor()),
            bind_addr: or("TT_BIND_ADDR", DEFAULT_BIND_ADDR),
            groq_api_key: get("GROQ_API_KEY").filter(|k| !k.starts_with(PLACEHOLDER_KEY_PREFIX)),
            groq_base_url: or("GROQ_BASE_URL", GROQ_BASE_URL),
            oracle_model: or("TT_ORACLE_MODEL", DEFAULT_MODEL),
            oracle_max_candidates,
        }
    }

    /// Oracle options for a request, optionally overriding the model.
    pub fn oracle_options(&self, model: Option<&str>) -> OracleOptions {
        OracleOptions {
            model: model
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(&self.oracle_model)
                .to_string(),
            max_candidates: self.oracle_max_candidates,
        }
    }
}
