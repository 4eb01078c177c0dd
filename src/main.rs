use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lesson_registry::adapters::audit::TracingAuditLog;
use lesson_registry::adapters::email::{HttpEmailClient, LoggingEmailClient};
use lesson_registry::adapters::side_channel::QueuedSideChannel;
use lesson_registry::adapters::storage::{in_memory_stores, SeedData};
use lesson_registry::adapters::SystemClock;
use lesson_registry::application::RegistrationService;
use lesson_registry::config::{AppConfig, LogFormat, LoggingConfig};
use lesson_registry::ports::{EmailClient, EntityStores};

fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("invalid log directive `{}`", config.level))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

fn load_stores(config: &AppConfig) -> anyhow::Result<EntityStores> {
    let Some(path) = &config.storage.seed_path else {
        info!("No seed configured, starting with empty tables");
        return Ok(in_memory_stores());
    };

    let seed = SeedData::load(path)
        .with_context(|| format!("failed to load seed data from {}", path.display()))?;
    Ok(seed.into_stores()?)
}

fn email_client(config: &AppConfig) -> anyhow::Result<Arc<dyn EmailClient>> {
    match config.notifications.resend() {
        Some(resend) => {
            info!(base_url = %resend.base_url, "Delivering email over HTTP");
            Ok(Arc::new(HttpEmailClient::new(resend)?))
        }
        None => {
            info!("No Resend API key configured, emails will be logged");
            Ok(Arc::new(LoggingEmailClient::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging)?;
    config.validate().context("invalid configuration")?;

    let stores = load_stores(&config)?;
    let side_channel = Arc::new(QueuedSideChannel::spawn(
        email_client(&config)?,
        Arc::new(TracingAuditLog),
        config.notifications.side_channel(),
    ));

    let service = RegistrationService::new(
        stores,
        side_channel.clone(),
        Arc::new(SystemClock),
        config.registration_settings(),
    );

    let booked = service.resync_ledger().await?;
    info!(slots = booked, "Slot ledger rebuilt");

    let health = service.health().await?;
    for repository in health.repositories.iter().filter(|r| !r.healthy) {
        warn!(
            table = %repository.kind,
            error = repository.error.as_deref().unwrap_or("unknown"),
            "Repository unhealthy"
        );
    }
    info!(healthy = health.healthy, "Health check complete");

    let dashboard = service.dashboard().await?;
    for (kind, counts) in &dashboard.counts {
        info!(table = %kind, total = counts.total, active = counts.active, "Table summary");
    }
    let statuses = &dashboard.registrations_by_status;
    info!(
        pending = statuses.pending,
        approved = statuses.approved,
        cancelled = statuses.cancelled,
        completed = statuses.completed,
        "Registrations by status"
    );

    service.flush().await;
    let stats = side_channel.stats();
    info!(
        emails_sent = stats.emails_sent,
        audits_recorded = stats.audits_recorded,
        "Lesson registry ready"
    );

    Ok(())
}
