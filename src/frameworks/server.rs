// Framework bootstrap for the review server runtime.

use crate::frameworks::config::{ConfigError, Settings};
use crate::interface_adapters::routes::app;
use crate::interface_adapters::scm::ConfiguredScm;
use crate::interface_adapters::state::AppState;

use std::io::Result;
use std::sync::Arc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn config_failure(err: ConfigError) -> std::io::Error {
    tracing::error!(error = %err, "invalid configuration");
    std::io::Error::other(err)
}

pub async fn run(listener: tokio::net::TcpListener, settings: Settings) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(&settings).map_err(config_failure)?;

    tracing::info!(%address, site = %state.site.url, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app(state)).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let settings = Settings::load().map_err(config_failure)?;
    let address = settings.listen_address().map_err(config_failure)?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, settings).await
}

fn build_state(settings: &Settings) -> std::result::Result<Arc<AppState>, ConfigError> {
    let directory = settings.directory_records();
    let review_requests = settings.review_requests()?;
    let scm = ConfiguredScm::new(settings.scm_profiles()?);

    tracing::debug!(
        users = directory.users.len(),
        groups = directory.groups.len(),
        repositories = directory.repositories.len(),
        review_requests = review_requests.len(),
        "seed data loaded"
    );

    Ok(Arc::new(AppState::new(
        settings.site_settings(),
        directory,
        review_requests,
        Arc::new(scm),
    )))
}
