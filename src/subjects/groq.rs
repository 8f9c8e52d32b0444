//! Groq (OpenAI-compatible chat completions) implementation of `SubjectOracle`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

use super::{validate_oracle_payload, OracleOptions, SubjectOracle};
use crate::error::OracleError;
use crate::models::SubjectMapping;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct GroqOracle {
    client: reqwest::Client,
    base_url: String,
}

impl GroqOracle {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, OracleError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| OracleError::Transport(format!("invalid api key: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(GroqOracle {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Instructions sent along with the candidate list.
pub fn build_prompt(candidates: &[String]) -> String {
    let listing: String = candidates.iter().map(|c| format!("- {}\n", c)).collect();
    format!(
        "You clean subject names taken from a university timetable.\n\
         Group the strings below under short canonical subject names.\n\
         \n\
         Rules:\n\
         1. The subject is the first word of a string. Words end at a space, a hyphen, \
         an opening parenthesis or a line break. \"DIP-TJ\" is \"DIP\", \"Radar (301)\" is \"Radar\".\n\
         2. A '/' separates two sessions; apply rule 1 to each side.\n\
         3. Faculty titles (Dr., Mr., Ms.) and room codes such as \"(301)\" or \"CR-2\" are not subjects.\n\
         4. Leave out administrative text such as Branch, Semester or Lunch.\n\
         \n\
         Answer with a JSON object only, mapping each canonical name to the list of \
         original strings it covers: {{\"NAME\": [\"original 1\", \"original 2\"]}}\n\
         \n\
         Strings:\n{}",
        listing
    )
}

/// Pulls the mapping out of a chat-completions response body.
pub fn parse_completion(body: &Value) -> Result<SubjectMapping, OracleError> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| OracleError::Malformed("response has no message content".into()))?;

    let payload: Value =
        serde_json::from_str(content).map_err(|e| OracleError::Malformed(format!("content is not JSON: {}", e)))?;
    validate_oracle_payload(&payload)
}

#[async_trait]
impl SubjectOracle for GroqOracle {
    async fn suggest(&self, candidates: &[String], options: &OracleOptions) -> Result<SubjectMapping, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": options.model,
            "messages": [{"role": "user", "content": build_prompt(candidates)}],
            "temperature": 0,
            "max_tokens": 4000,
            "response_format": {"type": "json_object"},
        });

        tracing::info!("asking {} to group {} candidates", options.model, candidates.len());
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OracleError::Transport(format!("status {}: {}", status, text)));
        }

        let value: Value = response.json().await?;
        parse_completion(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_candidate() {
        let p = build_prompt(&["DIP-TJ".to_string(), "FML-ND".to_string()]);
        assert!(p.contains("- DIP-TJ\n"));
        assert!(p.contains("- FML-ND\n"));
    }

    #[test]
    fn completion_content_is_validated() {
        let ok = json!({"choices": [{"message": {"content": "{\"DIP\": [\"DIP-TJ\"]}"}}]});
        let m = parse_completion(&ok).unwrap();
        assert_eq!(m.subjects(), vec!["DIP"]);

        let not_json = json!({"choices": [{"message": {"content": "sure, here you go"}}]});
        assert!(matches!(parse_completion(&not_json), Err(OracleError::Malformed(_))));

        let empty = json!({"choices": []});
        assert!(matches!(parse_completion(&empty), Err(OracleError::Malformed(_))));
    }
}
