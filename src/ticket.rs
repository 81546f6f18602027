//! Ticket assembly — the pure merge of a mail item and its classification.

use crate::extract::Classification;
use crate::mail::MailItem;

/// Flattened record written to the spreadsheet, one per classified mail.
/// Write-once; its only identity is the source mail id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub category: String,
    pub priority: String,
    pub summary: String,
    pub snippet: String,
    pub body: String,
}

impl Ticket {
    /// Merge a mail item with its classification. Infallible: every field is
    /// always defined, the classification subject falling back to the mail
    /// subject when empty.
    pub fn build(mail: &MailItem, classification: &Classification) -> Self {
        let subject = if classification.subject.is_empty() {
            mail.subject.clone()
        } else {
            classification.subject.clone()
        };

        Self {
            id: mail.id.clone(),
            from: mail.from.clone(),
            subject,
            category: classification.category.clone(),
            priority: classification.priority.clone(),
            summary: classification.summary.clone(),
            snippet: mail.snippet.clone(),
            body: mail.body.clone(),
        }
    }
}
