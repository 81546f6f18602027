//! Google Sheets ticket sink.
//!
//! One row per ticket, appended to the tab matching the ticket's category.
//! Authentication is the installed-app OAuth flow handled by yup-oauth2:
//! cached token on disk, silent refresh with re-persistence, interactive
//! local-server consent only when no usable token exists. The authenticator
//! is built once at startup and injected into the writer; the batch loop
//! only ever asks it for an access token.

use std::path::Path;

use async_trait::async_trait;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{InstalledFlowAuthenticator, InstalledFlowReturnMethod, read_application_secret};

use crate::error::{ConfigError, SheetError};
use crate::ticket::Ticket;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const TAB_TECH: &str = "Problème technique informatique";
const TAB_ADMIN: &str = "Demande administrative";
const TAB_ACCESS: &str = "Problème d’accès / authentification";
const TAB_SUPPORT: &str = "Demande de support utilisateur";
const TAB_BUG: &str = "Bug ou dysfonctionnement d’un service";

/// Tab that receives tickets whose category matches nothing known.
pub const DEFAULT_TAB: &str = "Autres";

/// Destination for finished tickets. Seam for the pipeline; tests substitute
/// recording implementations.
#[async_trait]
pub trait TicketSink: Send + Sync {
    async fn append(&self, ticket: &Ticket) -> Result<(), SheetError>;
}

/// Map a raw classifier category onto its destination tab.
///
/// Total and deterministic: trim, casefold, normalize the apostrophe, then
/// look up a fixed table of known spellings (including the unaccented
/// variants the model is known to emit). Diacritics are not stripped in
/// general — only the listed variants are recognized. Anything else lands on
/// the default tab.
pub fn normalize_category(category: &str) -> &'static str {
    let key = category.trim().to_lowercase().replace('’', "'");
    match key.as_str() {
        "problème technique informatique" | "probleme technique informatique" => TAB_TECH,
        "demande administrative" => TAB_ADMIN,
        "problème d'accès / authentification"
        | "probleme d'accès / authentification"
        | "probleme d'acces / authentification" => TAB_ACCESS,
        "demande de support utilisateur" => TAB_SUPPORT,
        "bug ou dysfonctionnement d'un service" => TAB_BUG,
        _ => DEFAULT_TAB,
    }
}

/// Build the Sheets authenticator. Runs at startup, before the batch loop:
/// the interactive consent flow blocks on the user and must never fire
/// mid-batch.
pub async fn authenticator(
    secret_primary: &Path,
    secret_fallback: &Path,
    token_cache: &Path,
) -> Result<DefaultAuthenticator, SheetError> {
    let secret_path = if secret_primary.exists() {
        secret_primary
    } else if secret_fallback.exists() {
        secret_fallback
    } else {
        return Err(SheetError::Auth(format!(
            "client secret not found at {} or {}",
            secret_primary.display(),
            secret_fallback.display()
        )));
    };

    let secret = read_application_secret(secret_path).await.map_err(|e| {
        SheetError::Auth(format!(
            "application secret unusable at {}: {e}",
            secret_path.display()
        ))
    })?;

    InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
        .persist_tokens_to_disk(token_cache)
        .build()
        .await
        .map_err(|e| SheetError::Auth(e.to_string()))
}

/// Appends ticket rows to the spreadsheet over the Sheets REST API.
pub struct SheetWriter {
    client: reqwest::Client,
    auth: DefaultAuthenticator,
    spreadsheet_id: String,
}

impl SheetWriter {
    /// The spreadsheet id is checked here so a misconfigured run fails
    /// before any append is attempted.
    pub fn new(spreadsheet_id: &str, auth: DefaultAuthenticator) -> Result<Self, ConfigError> {
        if spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("GOOGLE_SHEET_ID".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            auth,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }
}

#[async_trait]
impl TicketSink for SheetWriter {
    async fn append(&self, ticket: &Ticket) -> Result<(), SheetError> {
        let tab = normalize_category(&ticket.category);

        let token = self
            .auth
            .token(&[SHEETS_SCOPE])
            .await
            .map_err(|e| SheetError::Auth(e.to_string()))?;
        let bearer = token
            .token()
            .ok_or_else(|| SheetError::Auth("authenticator returned no access token".into()))?;

        let range = format!("{tab}!A:C");
        let url = format!(
            "{SHEETS_API_BASE}/{}/values/{}:append",
            self.spreadsheet_id,
            urlencoding::encode(&range)
        );
        let body = serde_json::json!({
            "values": [[ticket.subject, ticket.priority, ticket.summary]],
        });

        let response = self
            .client
            .post(&url)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .bearer_auth(bearer)
            .json(&body)
            .send()
            .await
            .map_err(|e| SheetError::Append {
                tab: tab.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SheetError::Append {
                tab: tab.to_string(),
                reason: format!("{status}: {detail}"),
            });
        }

        tracing::debug!(tab, "appended ticket row");
        Ok(())
    }
}
