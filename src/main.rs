use std::path::Path;

use mail_triage::config::{self, Config};
use mail_triage::llm::GroqClassifier;
use mail_triage::mail::GmailReader;
use mail_triage::pipeline::Pipeline;
use mail_triage::sheets::{self, SheetWriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    let reader = GmailReader::connect(Path::new(config::MAIL_TOKEN_PATH)).await?;
    let classifier = GroqClassifier::new(&config);

    // Sheets consent can block on user interaction; it happens here, once,
    // never inside the batch loop.
    let auth = sheets::authenticator(
        Path::new(config::CLIENT_SECRET_PRIMARY),
        Path::new(config::CLIENT_SECRET_FALLBACK),
        Path::new(config::SHEETS_TOKEN_PATH),
    )
    .await?;
    let writer = SheetWriter::new(&config.spreadsheet_id, auth)?;

    let pipeline = Pipeline {
        mail: &reader,
        classifier: &classifier,
        sink: &writer,
    };
    pipeline.run(config.max_results).await?;

    Ok(())
}
