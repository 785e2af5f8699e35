use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let cfg = benkyo::config::Config::from_env();
    info!(target: "benkyo", "Benkyō dashboard starting: RUST_LOG='{}'", rust_log);
    if cfg.demo_mode {
        info!(target: "benkyo", "demo accounts enabled; disable with BENKYO_DEMO_MODE=false");
    }

    benkyo::server::run(cfg).await
}
