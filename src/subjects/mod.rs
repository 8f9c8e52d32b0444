//! Subject normalization: reducing noisy cell strings to a vocabulary of
//! canonical subject names.
//!
//! Two strategies share one contract (raw values in, `SubjectMapping` out):
//! - identity: every raw value is its own canonical key (offline default);
//! - oracle: an external classifier groups pre-cleaned candidates. Its answer
//!   is untrusted; anything unusable is replaced by a first-token mapping.

pub mod groq;
pub mod noise;

pub use groq::GroqOracle;
pub use noise::{is_noise, pre_clean_values};

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::error::OracleError;
use crate::models::{MappingSource, SubjectContext, SubjectMapping};

/// Upper bound on candidates sent to the oracle.
pub const DEFAULT_MAX_CANDIDATES: usize = 100;
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-120b";

/// First lexical token: text up to the first whitespace, `-` or `(`.
///
/// `"DIP-TJ"` → `"DIP"`, `"Radar (301)"` → `"Radar"`, `"DnM\nSD"` → `"DnM"`.
pub fn first_token(s: &str) -> &str {
    s.split(|c: char| c.is_whitespace() || c == '-' || c == '(')
        .next()
        .unwrap_or("")
        .trim()
}

/// Canonical key of the identity strategy: line breaks collapsed, trimmed.
pub fn canonical_key(raw: &str) -> String {
    raw.replace('\n', " ").trim().to_string()
}

pub fn identity_mapping<'a, I>(raw_values: I) -> SubjectMapping
where
    I: IntoIterator<Item = &'a String>,
{
    let mut mapping = SubjectMapping::new();
    for raw in raw_values {
        let key = canonical_key(raw);
        if !key.is_empty() {
            mapping.insert_alias(key, raw.clone());
        }
    }
    mapping
}

/// Groups candidates under their first token.
pub fn first_token_mapping(candidates: &[String]) -> SubjectMapping {
    let mut mapping = SubjectMapping::new();
    for c in candidates {
        let token = first_token(c);
        if !token.is_empty() {
            mapping.insert_alias(token, c.clone());
        }
    }
    mapping
}

#[derive(Debug, Clone, PartialEq)]
pub struct OracleOptions {
    pub model: String,
    pub max_candidates: usize,
}

impl Default for OracleOptions {
    fn default() -> Self {
        OracleOptions {
            model: DEFAULT_MODEL.to_string(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}

/// External capability suggesting a canonical grouping of candidate strings.
#[async_trait]
pub trait SubjectOracle: Send + Sync {
    async fn suggest(&self, candidates: &[String], options: &OracleOptions) -> Result<SubjectMapping, OracleError>;
}

/// Offline oracle: the first-token rule. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicOracle;

#[async_trait]
impl SubjectOracle for HeuristicOracle {
    async fn suggest(&self, candidates: &[String], _options: &OracleOptions) -> Result<SubjectMapping, OracleError> {
        Ok(first_token_mapping(candidates))
    }
}

/// Shape check of an oracle answer: an object of string → array of strings.
/// Blank keys and blank aliases are skipped; an empty result is malformed.
pub fn validate_oracle_payload(value: &serde_json::Value) -> Result<SubjectMapping, OracleError> {
    let obj = value
        .as_object()
        .ok_or_else(|| OracleError::Malformed("top-level value is not an object".into()))?;

    let mut mapping = SubjectMapping::new();
    for (key, aliases) in obj {
        let arr = aliases
            .as_array()
            .ok_or_else(|| OracleError::Malformed(format!("aliases of '{}' are not a list", key)))?;
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        mapping.insert_subject(key);
        for a in arr {
            let a = a
                .as_str()
                .ok_or_else(|| OracleError::Malformed(format!("alias of '{}' is not a string", key)))?;
            if !a.trim().is_empty() {
                mapping.insert_alias(key, a);
            }
        }
    }

    if mapping.is_empty() {
        return Err(OracleError::Malformed("no subjects in mapping".into()));
    }
    Ok(mapping)
}

/// Which of the two normalization paths to run.
pub enum Strategy<'a> {
    Identity,
    Oracle {
        oracle: Option<&'a dyn SubjectOracle>,
        options: OracleOptions,
    },
}

pub async fn normalize_subjects(raw_values: &BTreeSet<String>, strategy: Strategy<'_>) -> SubjectContext {
    match strategy {
        Strategy::Identity => identity_context(raw_values),
        Strategy::Oracle { oracle, options } => refine_subjects(raw_values, oracle, &options).await,
    }
}

/// Identity strategy over all harvested values.
pub fn identity_context(raw_values: &BTreeSet<String>) -> SubjectContext {
    SubjectContext::new(identity_mapping(raw_values), MappingSource::Identity)
}

/// Oracle strategy with fallback. Candidates are noise-filtered and capped
/// before being handed out; any oracle failure yields the first-token mapping
/// of the same candidates.
pub async fn refine_subjects(
    raw_values: &BTreeSet<String>,
    oracle: Option<&dyn SubjectOracle>,
    options: &OracleOptions,
) -> SubjectContext {
    let mut candidates = pre_clean_values(raw_values);
    candidates.truncate(options.max_candidates);
    tracing::info!("{} candidate subject strings after noise filtering", candidates.len());

    let outcome = match oracle {
        Some(o) => o.suggest(&candidates, options).await,
        None => Err(OracleError::Unavailable),
    };

    match outcome {
        Ok(mapping) if !mapping.is_empty() => SubjectContext::new(mapping, MappingSource::Oracle),
        Ok(_) => {
            tracing::warn!("oracle returned an empty mapping, using first-token fallback");
            SubjectContext::new(first_token_mapping(&candidates), MappingSource::FirstTokenFallback)
        }
        Err(e) => {
            tracing::warn!("{}; using first-token fallback", e);
            SubjectContext::new(first_token_mapping(&candidates), MappingSource::FirstTokenFallback)
        }
    }
}
