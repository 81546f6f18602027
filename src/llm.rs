//! Groq classifier client.
//!
//! Posts the fixed triage prompt to Groq's OpenAI-compatible chat-completion
//! endpoint and consumes the SSE response fragment by fragment, echoing each
//! fragment to stdout as it arrives. Returns the full concatenated text once
//! the stream ends. No retry: transport and auth failures propagate.

use std::io::Write;

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::Config;
use crate::error::LlmError;

const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

const SYSTEM_PROMPT: &str = "Tu es un agent de tri et de priorisation d'emails. \
    Tu dois évaluer chaque email reçu et attribuer l'un des 5 niveaux \
    de priorité suivants : Critique, Élevée, Modérée, Faible, Anodine. \
    Tu dois classer également ces mails en 5 types: Problème technique informatique, \
    Demande administrative, Problème d’accès / authentification, \
    Demande de support utilisateur, Bug ou dysfonctionnement d’un service.";

/// Classifies one mail body into the raw model response text. Seam for the
/// pipeline; tests substitute scripted implementations.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<String, LlmError>;
}

/// Classifier backed by the Groq chat-completion API.
pub struct GroqClassifier {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
}

impl GroqClassifier {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
        }
    }
}

#[async_trait]
impl Classifier for GroqClassifier {
    async fn classify(&self, text: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt(text) },
            ],
            "temperature": 0.2,
            "max_completion_tokens": 2048,
            "top_p": 0.9,
            "stream": true,
        });

        let response = self
            .client
            .post(GROQ_CHAT_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, body });
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut full = String::new();
        let mut stdout = std::io::stdout();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = buffer.find('\n') {
                let line: String = buffer.drain(..=pos).collect();
                if let Some(fragment) = delta_from_line(line.trim_end())? {
                    // Surface each fragment immediately for live observation.
                    print!("{fragment}");
                    let _ = stdout.flush();
                    full.push_str(&fragment);
                }
            }
        }

        // A well-formed stream ends with a newline, but don't lose a
        // trailing event if it doesn't.
        if let Some(fragment) = delta_from_line(buffer.trim_end())? {
            print!("{fragment}");
            let _ = stdout.flush();
            full.push_str(&fragment);
        }

        Ok(full.trim().to_string())
    }
}

fn user_prompt(raw_emails: &str) -> String {
    format!(
        "Tu dois renvoyer ta réponse en JSON strictement valide, au format :\n\
         {{\n    \"type\": \"\",\n    \"Sujet\": \"\",\n    \"priorite\": \"\",\n    \"Synthèse\": \"\"\n}}\n\n\
         Voici les emails à analyser :\n{}",
        raw_emails.trim()
    )
}

/// Extract the content fragment carried by one SSE line, if any.
fn delta_from_line(line: &str) -> Result<Option<String>, LlmError> {
    let Some(data) = line.strip_prefix("data: ") else {
        return Ok(None);
    };
    if data == "[DONE]" {
        return Ok(None);
    }

    let event: StreamEvent = serde_json::from_str(data)?;
    Ok(event
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_line_yields_fragment() {
        let line = r#"data: {"choices":[{"delta":{"content":"Bon"}}]}"#;
        assert_eq!(delta_from_line(line).unwrap().as_deref(), Some("Bon"));
    }

    #[test]
    fn done_marker_yields_nothing() {
        assert_eq!(delta_from_line("data: [DONE]").unwrap(), None);
    }

    #[test]
    fn non_data_lines_are_ignored() {
        assert_eq!(delta_from_line("").unwrap(), None);
        assert_eq!(delta_from_line(": keep-alive").unwrap(), None);
    }

    #[test]
    fn empty_delta_is_filtered() {
        let role_only = r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#;
        assert_eq!(delta_from_line(role_only).unwrap(), None);

        let empty = r#"data: {"choices":[{"delta":{"content":""}}]}"#;
        assert_eq!(delta_from_line(empty).unwrap(), None);
    }

    #[test]
    fn malformed_event_is_a_decode_error() {
        assert!(matches!(
            delta_from_line("data: {nope"),
            Err(LlmError::Decode(_))
        ));
    }

    #[test]
    fn fragments_reassemble_in_order() {
        let transcript = [
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"{\"type\""}}]}"#,
            r#"data: {"choices":[{"delta":{"content":": \"Bug\"}"}}]}"#,
            "data: [DONE]",
        ];
        let mut full = String::new();
        for line in transcript {
            if let Some(fragment) = delta_from_line(line).unwrap() {
                full.push_str(&fragment);
            }
        }
        assert_eq!(full, r#"{"type": "Bug"}"#);
    }

    #[test]
    fn user_prompt_embeds_trimmed_text() {
        let prompt = user_prompt("  le serveur est en panne \n");
        assert!(prompt.ends_with("le serveur est en panne"));
        assert!(prompt.contains("\"Synthèse\""));
    }
}
