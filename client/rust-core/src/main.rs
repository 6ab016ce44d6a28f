use std::sync::Arc;

use anyhow::Context;
use quran_learn_core::metrics::render_metrics;
use quran_learn_core::session::FileTokenStore;
use quran_learn_core::{ApiClient, AuthSession, Config, DashboardService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(
        "Configuration loaded for environment: {:?}",
        std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string())
    );

    let api = ApiClient::new(&config.api).context("Failed to build API client")?;
    let store = Arc::new(FileTokenStore::new(config.session.token_path.clone()));
    let mut session = AuthSession::restore(store)
        .await
        .context("Failed to restore session")?;

    if let (Ok(email), Ok(password)) = (
        std::env::var("REPORT_EMAIL"),
        std::env::var("REPORT_PASSWORD"),
    ) {
        let tokens = api
            .login(&email, &password)
            .await
            .context("Login failed")?;
        session.sign_in(tokens).await.context("Failed to persist session")?;
    }

    if !session.is_authenticated() {
        anyhow::bail!("Not signed in; set REPORT_EMAIL and REPORT_PASSWORD");
    }

    let service = DashboardService::new(&api, &config);
    let now = config.progress.timezone.now();
    let dashboard = match std::env::var("REPORT_CHILD_ID") {
        Ok(child_id) => service.load_child(&session, &child_id, now).await,
        Err(_) => service.load_learner(&session, now).await,
    }
    .context("Failed to load dashboard")?;

    if dashboard.is_degraded() {
        tracing::warn!(
            resources = ?dashboard.degraded,
            "Some data could not be loaded; showing placeholders"
        );
    }

    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    if std::env::var("REPORT_METRICS").is_ok_and(|v| v == "1") {
        eprintln!("{}", render_metrics().context("Failed to render metrics")?);
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quran_learn_core=debug,progress_report=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
