//! # DIORES - orientation form server
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    apps/diores (THE BINARY)                  │
//! │                                                              │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────────┐   │
//! │  │    CLI      │    │  HTTP API   │    │ Prediction      │   │
//! │  │   (clap)    │    │   (axum)    │    │ client (reqwest)│   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬────────┘   │
//! │         └──────────────────┼────────────────────┘            │
//! │                            ▼                                 │
//! │                    ┌───────────────┐                         │
//! │                    │  diores-core  │                         │
//! │                    │ (THE ENGINE)  │                         │
//! │                    └───────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! diores serve --host 0.0.0.0 --port 8080
//! diores average -f record.json
//! diores check-field --field Moy_nde --value 9.4
//! diores validate -f record.json --step exam-info
//! diores predict -f record.json
//! ```

use clap::Parser;
use diores::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // DIORES_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("DIORES_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "diores=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ██████╗ ██╗ ██████╗ ██████╗ ███████╗███████╗
  ██╔══██╗██║██╔═══██╗██╔══██╗██╔════╝██╔════╝
  ██║  ██║██║██║   ██║██████╔╝█████╗  ███████╗
  ██║  ██║██║██║   ██║██╔══██╗██╔══╝  ╚════██║
  ██████╔╝██║╚██████╔╝██║  ██║███████╗███████║
  ╚═════╝ ╚═╝ ╚═════╝ ╚═╝  ╚═╝╚══════╝╚══════╝

  Orientation form engine v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
