use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use profile_api::{app_state::AppState, config, factory, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename("./profile-api/.env.local").ok();
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,profile_api=debug")),
        )
        .init();

    let settings = config::read_config().context("failed to read configuration")?;
    info!(
        supabase = %settings.supabase.url,
        bucket = %settings.supabase.bucket,
        retention = ?settings.avatar.retention,
        "Loaded configuration"
    );

    let services = factory::build_services(&settings).context("failed to wire services")?;
    let _sweeper = services
        .state_cache
        .clone()
        .start_sweep_task(settings.cache.sweep_interval());

    let app = router::create(AppState::new(&settings, &services));

    let addr: SocketAddr = format!("{}:{}", settings.application.host, settings.application.port)
        .parse()
        .context("invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
