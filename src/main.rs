use std::sync::Arc;

use tracing::{error, info, warn};

use mailcomposer::{
    Composer, Config, DeliveryGateway, PendingFile, RecordingGateway, Result, SentHistory,
    SmtpGateway,
};

/// Build the delivery gateway from the `[smtp]` section, if usable.
fn build_gateway(config: &Config, history: &Arc<SentHistory>) -> Option<Arc<dyn DeliveryGateway>> {
    let smtp = config.smtp.clone()?;
    match SmtpGateway::new(smtp) {
        Ok(gateway) => Some(Arc::new(RecordingGateway::new(
            gateway,
            Arc::clone(history),
        ))),
        Err(e) => {
            warn!("SMTP settings are incomplete: {e}");
            None
        }
    }
}

/// Compose and send one message from `mailcomposer <recipient> <subject> <body> [attachment...]`.
///
/// Refuses to send if any attachment was rejected.
async fn send_from_args(composer: &Composer, args: &[String]) -> Result<()> {
    composer.set_recipient(args[0].as_str())?;
    composer.set_subject(args[1].as_str())?;
    composer.set_body(args[2].as_str())?;

    let report = composer.add_attachments(args[3..].iter().map(PendingFile::from_path))?;
    if let Some(rejected) = report.errors.into_iter().next() {
        return Err(rejected.into());
    }

    let receipt = composer.submit().await?;
    info!(id = %receipt.id, "message sent");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = mailcomposer::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        mailcomposer::logging::init_console_only(&config.logging.level);
    }

    info!("mailcomposer starting");

    let history = Arc::new(SentHistory::new(config.history.max_entries));
    let composer = Composer::open(build_gateway(&config, &history), &config.composer);

    if !composer.is_configured() {
        warn!("no SMTP settings; add an [smtp] section to config.toml to send mail");
        return;
    }

    if let Err(e) = composer.test_connection().await {
        error!("SMTP connection test failed: {e}");
        return;
    }
    info!("SMTP connection OK");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        info!("usage: mailcomposer <recipient> <subject> <body> [attachment...]");
        return;
    }

    if let Err(e) = send_from_args(&composer, &args).await {
        error!("{e}");
    }

    let stats = history.stats();
    info!(total = stats.total, sent = stats.sent, failed = stats.failed, "session history");

    if let Err(e) = composer.teardown() {
        warn!("failed to close composer: {e}");
    }
}
