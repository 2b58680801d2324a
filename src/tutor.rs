//! Tutoring Model Client
//! Mission: Forward a topic to the Gemini API and return the tutoring text

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Outbound client for the tutoring endpoint. Built once at startup and
/// shared; the call is synchronous from the caller's point of view.
#[derive(Clone)]
pub struct TutorClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl TutorClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build tutor HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Ask the model to explain a topic. The persona depends on who asks:
    /// students get a peer tutor, instructors a teaching assistant.
    pub async fn ask(&self, topic: &str, caller_role: &str) -> Result<String> {
        let prompt = build_prompt(topic, caller_role);

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("Tutor model request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Tutor model returned {}: {}", status, text));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .context("Failed to parse tutor model response")?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .context("Tutor model response had no candidates")
    }
}

fn build_prompt(topic: &str, caller_role: &str) -> String {
    let persona = if caller_role == "student" {
        "a helpful peer tutor"
    } else {
        "a teaching assistant"
    };
    format!("You are {}. Explain: {}", persona, topic)
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_depends_on_caller_role() {
        let student = build_prompt("fractions", "student");
        assert_eq!(student, "You are a helpful peer tutor. Explain: fractions");

        let instructor = build_prompt("fractions", "instructor");
        assert_eq!(
            instructor,
            "You are a teaching assistant. Explain: fractions"
        );

        // Anything that is not exactly "student" gets the assistant persona
        let admin = build_prompt("fractions", "admin");
        assert!(admin.starts_with("You are a teaching assistant"));
    }

    #[test]
    fn test_response_parsing_takes_first_candidate() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "first"}, {"text": "second"}]}},
                {"content": {"parts": [{"text": "other"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text);
        assert_eq!(text.as_deref(), Some("first"));
    }

    #[test]
    fn test_empty_candidates_is_none() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
