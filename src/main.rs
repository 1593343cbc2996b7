use dotenvy::dotenv;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = polls_backend::start_server().await {
        error!("Failed to start server: {e}");
        std::process::exit(1);
    }
}
