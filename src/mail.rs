//! Gmail mailbox reader.
//!
//! Talks to the Gmail REST API directly over reqwest. Authentication uses a
//! previously authorized user credential stored on disk (read-only mail
//! scope); its refresh token is silently exchanged for an access token at
//! connect time. A missing or refused credential is an auth error — there is
//! no interactive flow on the mail side.
//!
//! Fetching is one list call for the requested page plus one `format=full`
//! get per message. No pagination beyond the single page.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::{DecodePaddingMode, GeneralPurpose};
use serde::Deserialize;

use crate::error::MailError;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const NO_SUBJECT: &str = "(Sans objet)";
const UNKNOWN_SENDER: &str = "(Expéditeur inconnu)";

// Gmail serves body data as base64url, sometimes padded, sometimes not.
const BASE64_URL_FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// One fetched mailbox message, body already decoded to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailItem {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    pub body: String,
}

/// Source of mailbox items. The pipeline is written against this seam so
/// tests can drive it without a live mailbox.
#[async_trait]
pub trait MailSource: Send + Sync {
    async fn fetch(&self, max_results: u32) -> Result<Vec<MailItem>, MailError>;
}

// ── Stored credential ───────────────────────────────────────────────

/// Authorized-user credential as persisted by Google's OAuth tooling.
#[derive(Debug, Deserialize)]
struct StoredCredential {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

// ── Gmail wire types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListResponse {
    messages: Option<Vec<MessageRef>>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    id: String,
    snippet: Option<String>,
    payload: Option<Payload>,
}

#[derive(Debug, Default, Deserialize)]
struct Payload {
    headers: Option<Vec<Header>>,
    body: Option<Body>,
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    mime_type: Option<String>,
    body: Option<Body>,
}

#[derive(Debug, Deserialize)]
struct Body {
    data: Option<String>,
}

// ── Reader ──────────────────────────────────────────────────────────

/// Gmail reader over the REST API.
#[derive(Debug)]
pub struct GmailReader {
    client: reqwest::Client,
    access_token: String,
}

impl GmailReader {
    /// Load the stored credential and exchange its refresh token for an
    /// access token. Fails when the credential file is missing, malformed,
    /// or Google refuses the refresh.
    pub async fn connect(token_path: &Path) -> Result<Self, MailError> {
        let auth_err = |reason: String| MailError::Auth {
            path: token_path.display().to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(token_path).map_err(|e| auth_err(e.to_string()))?;
        let creds: StoredCredential = serde_json::from_str(&raw)
            .map_err(|e| auth_err(format!("invalid credential file: {e}")))?;

        let client = reqwest::Client::new();
        let params = [
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("refresh_token", creds.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = client.post(GOOGLE_TOKEN_URL).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(auth_err(format!("token refresh failed ({status}): {body}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(Self {
            client,
            access_token: token.access_token,
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T, MailError> {
        let url = format!("{GMAIL_API_BASE}{endpoint}");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MailSource for GmailReader {
    async fn fetch(&self, max_results: u32) -> Result<Vec<MailItem>, MailError> {
        let list: ListResponse = self
            .get(&format!("/users/me/messages?maxResults={max_results}"))
            .await?;
        let refs = list.messages.unwrap_or_default();

        let mut items = Vec::with_capacity(refs.len());
        for message_ref in refs {
            let message: Message = self
                .get(&format!("/users/me/messages/{}?format=full", message_ref.id))
                .await?;
            items.push(to_mail_item(message));
        }

        tracing::debug!(count = items.len(), "fetched mailbox page");
        Ok(items)
    }
}

fn to_mail_item(message: Message) -> MailItem {
    let payload = message.payload.unwrap_or_default();
    let subject =
        header_value(&payload, "Subject").unwrap_or_else(|| NO_SUBJECT.to_string());
    let from = header_value(&payload, "From").unwrap_or_else(|| UNKNOWN_SENDER.to_string());

    MailItem {
        id: message.id,
        from,
        subject,
        snippet: message.snippet.unwrap_or_default(),
        body: decode_body(&payload),
    }
}

fn header_value(payload: &Payload, name: &str) -> Option<String> {
    payload
        .headers
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|h| h.name == name)
        .map(|h| h.value.clone())
}

/// Decode the text/plain content of a message payload.
///
/// Inline body data wins; otherwise the first immediate `text/plain`
/// sub-part is used. Nested multipart structures are not recursed into. A
/// message with neither yields an empty body, which is a valid resolved
/// state rather than an error.
fn decode_body(payload: &Payload) -> String {
    if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
        return decode_base64url(data);
    }

    for part in payload.parts.as_deref().unwrap_or_default() {
        if part.mime_type.as_deref() == Some("text/plain") {
            if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
                return decode_base64url(data);
            }
        }
    }

    String::new()
}

fn decode_base64url(data: &str) -> String {
    match BASE64_URL_FORGIVING.decode(data) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(text: &str) -> String {
        BASE64_URL_FORGIVING.encode(text.as_bytes())
    }

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn inline_body_decodes() {
        let payload: Payload = serde_json::from_value(serde_json::json!({
            "body": { "data": b64("bonjour") }
        }))
        .unwrap();
        assert_eq!(decode_body(&payload), "bonjour");
    }

    #[test]
    fn multipart_picks_first_text_plain() {
        let payload: Payload = serde_json::from_value(serde_json::json!({
            "parts": [
                { "mimeType": "text/html", "body": { "data": b64("<b>html</b>") } },
                { "mimeType": "text/plain", "body": { "data": b64("plain text") } },
                { "mimeType": "text/plain", "body": { "data": b64("second part") } }
            ]
        }))
        .unwrap();
        assert_eq!(decode_body(&payload), "plain text");
    }

    #[test]
    fn no_text_content_is_empty_body() {
        let payload: Payload = serde_json::from_value(serde_json::json!({
            "parts": [ { "mimeType": "image/png", "body": {} } ]
        }))
        .unwrap();
        assert_eq!(decode_body(&payload), "");
    }

    #[test]
    fn missing_payload_is_empty_body() {
        let item = to_mail_item(message(serde_json::json!({ "id": "m1" })));
        assert_eq!(item.body, "");
        assert_eq!(item.snippet, "");
    }

    #[test]
    fn missing_headers_get_placeholders() {
        let item = to_mail_item(message(serde_json::json!({
            "id": "m1",
            "snippet": "extrait",
            "payload": { "headers": [ { "name": "Date", "value": "today" } ] }
        })));
        assert_eq!(item.subject, "(Sans objet)");
        assert_eq!(item.from, "(Expéditeur inconnu)");
        assert_eq!(item.snippet, "extrait");
    }

    #[test]
    fn present_headers_are_used() {
        let item = to_mail_item(message(serde_json::json!({
            "id": "m2",
            "payload": {
                "headers": [
                    { "name": "Subject", "value": "Panne VPN" },
                    { "name": "From", "value": "alice@example.com" }
                ],
                "body": { "data": b64("le vpn ne marche plus") }
            }
        })));
        assert_eq!(item.subject, "Panne VPN");
        assert_eq!(item.from, "alice@example.com");
        assert_eq!(item.body, "le vpn ne marche plus");
    }

    #[test]
    fn undecodable_blob_yields_empty_body() {
        let payload: Payload = serde_json::from_value(serde_json::json!({
            "body": { "data": "not!!valid&&base64" }
        }))
        .unwrap();
        assert_eq!(decode_body(&payload), "");
    }

    #[test]
    fn padded_and_unpadded_data_both_decode() {
        assert_eq!(decode_base64url("aGk"), "hi");
        assert_eq!(decode_base64url("aGk="), "hi");
    }

    #[tokio::test]
    async fn connect_without_credential_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("token.json");
        let err = GmailReader::connect(&missing).await.unwrap_err();
        assert!(matches!(err, MailError::Auth { .. }));
    }

    #[tokio::test]
    async fn connect_with_malformed_credential_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = GmailReader::connect(&path).await.unwrap_err();
        assert!(matches!(err, MailError::Auth { .. }));
    }
}
