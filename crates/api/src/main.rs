use std::sync::Arc;

use anyhow::Context;

use clinic_api::config::ApiConfig;
use clinic_infra::ClinicSeed;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clinic_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    let seed = match &config.seed_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read seed file {}", path.display()))?;
            serde_json::from_str::<ClinicSeed>(&raw)
                .with_context(|| format!("failed to parse seed file {}", path.display()))?
        }
        None => {
            tracing::warn!("CLINIC_SEED_FILE not set; starting with no clinic records");
            ClinicSeed::default()
        }
    };

    let bind_addr = config.bind_addr;
    let services = Arc::new(clinic_api::app::services::build_services(config, seed));
    let app = clinic_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
