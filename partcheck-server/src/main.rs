//! Entry point for the example service. Host and port come from flags or HOST/PORT.

use clap::Parser;
use partcheck_core::{DetailMode, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "partcheck-server")]
#[command(about = "Example HTTP service using partcheck request validators")]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,
    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,
    /// Report every validation error in `err` instead of only the first.
    #[arg(long, env = "PARTCHECK_ALL_DETAILS")]
    all_details: bool,
    /// Leave request bodies unparsed (body validation then answers 500).
    #[arg(long)]
    no_json_body: bool,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            json_body: !self.no_json_body,
            detail_mode: if self.all_details {
                DetailMode::All
            } else {
                DetailMode::First
            },
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Cli::parse().into_config();
    let app = partcheck_server::build_app(&config)?;
    tracing::info!("POST /example  (token header, JSON body)");
    tracing::info!("GET  /users/:id?verbose=true|false");
    partcheck_core::http::run(app, &config)?;
    Ok(())
}
