//! Where a timetable table lives: a local file or an `http(s)` URL.
//!
//! Google Sheets links are rewritten to their export endpoints:
//! - `.../edit...` → `.../export?format=xlsx`
//! - `.../pubhtml...gid=N` → `.../pub?output=csv&gid=N`

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::error::SourceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SourceLocation {
    Local(PathBuf),
    Remote(String),
}

impl SourceLocation {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            SourceLocation::Remote(s.to_string())
        } else {
            SourceLocation::Local(PathBuf::from(s))
        }
    }

    /// Local files must exist; URLs must at least parse.
    pub fn is_resolvable(&self) -> bool {
        match self {
            SourceLocation::Local(p) => p.is_file(),
            SourceLocation::Remote(u) => reqwest::Url::parse(u).is_ok(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Local(p) => write!(f, "{}", p.display()),
            SourceLocation::Remote(u) => write!(f, "{}", u),
        }
    }
}

fn gid_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"gid=(\d+)").expect("static regex"))
}

/// URL actually downloaded for a remote location.
pub fn export_url(url: &str) -> String {
    if !url.contains("docs.google.com") {
        return url.to_string();
    }

    if url.contains("/edit") {
        let base = url.split(['?', '#']).next().unwrap_or(url);
        return format!("{}?format=xlsx", base.replacen("/edit", "/export", 1));
    }

    if let Some((base, _)) = url.split_once("/pubhtml") {
        let gid = gid_pattern()
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| format!("&gid={}", m.as_str()))
            .unwrap_or_default();
        return format!("{}/pub?output=csv{}", base, gid);
    }

    url.to_string()
}

/// Downloads the bytes behind a remote location.
pub async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, SourceError> {
    let target = export_url(url);
    tracing::info!("fetching timetable from {}", target);
    let fail = |reason: String| SourceError::Fetch { url: target.clone(), reason };

    let resp = client.get(&target).send().await.map_err(|e| fail(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(fail(format!("status {}", resp.status())));
    }
    let bytes = resp.bytes().await.map_err(|e| fail(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Reads the raw bytes of a location, local or remote.
pub async fn read_location(client: &reqwest::Client, location: &SourceLocation) -> Result<Vec<u8>, SourceError> {
    match location {
        SourceLocation::Local(p) => tokio::fs::read(p).await.map_err(|e| SourceError::Unreadable {
            location: p.display().to_string(),
            reason: e.to_string(),
        }),
        SourceLocation::Remote(u) => fetch_bytes(client, u).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_distinguishes_urls() {
        assert!(matches!(SourceLocation::parse("https://x.org/t.xlsx"), SourceLocation::Remote(_)));
        assert!(matches!(SourceLocation::parse("data/t.csv"), SourceLocation::Local(_)));
    }

    #[test]
    fn edit_links_export_xlsx() {
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/abc/edit?usp=sharing"),
            "https://docs.google.com/spreadsheets/d/abc/export?format=xlsx"
        );
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/abc/edit#gid=0"),
            "https://docs.google.com/spreadsheets/d/abc/export?format=xlsx"
        );
    }

    #[test]
    fn published_links_export_csv_with_gid() {
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/e/abc/pubhtml?gid=42&single=true"),
            "https://docs.google.com/spreadsheets/d/e/abc/pub?output=csv&gid=42"
        );
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/e/abc/pubhtml"),
            "https://docs.google.com/spreadsheets/d/e/abc/pub?output=csv"
        );
    }

    #[test]
    fn other_urls_untouched() {
        assert_eq!(export_url("https://example.org/tt.csv"), "https://example.org/tt.csv");
    }

    #[test]
    fn missing_local_file_is_not_resolvable() {
        assert!(!SourceLocation::parse("/definitely/not/here.xlsx").is_resolvable());
    }
}
