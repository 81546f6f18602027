//! The batch orchestrator: mailbox → classifier → extraction → sheet.

use tracing::{info, warn};

use crate::error::Error;
use crate::extract;
use crate::llm::Classifier;
use crate::mail::MailSource;
use crate::sheets::TicketSink;
use crate::ticket::Ticket;

/// Sequential triage pipeline over injected component seams.
pub struct Pipeline<'a> {
    pub mail: &'a dyn MailSource,
    pub classifier: &'a dyn Classifier,
    pub sink: &'a dyn TicketSink,
}

impl Pipeline<'_> {
    /// Fetch up to `max_results` messages and drive each through
    /// classify → extract → build → append, one at a time.
    ///
    /// A response that yields no usable record is logged under the item id
    /// and skipped; any other failure aborts the remaining batch. That
    /// asymmetry is intentional and pinned by the integration tests.
    pub async fn run(&self, max_results: u32) -> Result<(), Error> {
        let mails = self.mail.fetch(max_results).await?;
        info!(count = mails.len(), "fetched mailbox messages");

        for mail in &mails {
            let raw = self.classifier.classify(&mail.body).await?;

            let classification = match extract::extract_json_block(&raw) {
                Ok(record) => record,
                Err(err) => {
                    warn!(id = %mail.id, error = %err, "unusable classifier output, skipping");
                    continue;
                }
            };

            let ticket = Ticket::build(mail, &classification);
            self.sink.append(&ticket).await?;
            info!(id = %ticket.id, priority = %ticket.priority, "ticket recorded");
        }

        Ok(())
    }
}
