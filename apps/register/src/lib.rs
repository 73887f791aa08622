//! # Till Register Library
//!
//! The register application: one cashier, one sale at a time, driven from a
//! terminal. The binary in `main.rs` only calls [`run`].
//!
//! ## Module Organization
//! ```text
//! till_register/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── cli.rs          ◄─── Terminal view: parse lines, render answers
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── session.rs  ◄─── Sale in progress (cart, payment, customer)
//! │   └── config.rs   ◄─── Store details and receipt width
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── product.rs  ◄─── Product search
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   ├── discount.rs ◄─── Discounts and promo codes
//! │   ├── payment.rs  ◄─── Payment panel
//! │   ├── sale.rs     ◄─── Checkout, receipts, history
//! │   └── held.rs     ◄─── Hold and recall
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

use till_client::{ClientResult, HeldSaleStore, HttpPosApi, RegisterConfig};

use cli::Register;
use state::{ConfigState, SessionState};

/// Command-line flags. Each one overrides the matching config file entry.
#[derive(Debug, Parser)]
#[command(name = "till-register", version, about = "Till POS register")]
pub struct Cli {
    /// Config file (default: platform config dir, or TILL_CONFIG)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, env = "TILL_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Where a held sale is parked
    #[arg(long, value_name = "FILE")]
    pub held_sale_path: Option<PathBuf>,

    /// Directory PDF receipts are saved to
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub receipt_dir: PathBuf,
}

/// Runs the register until the cashier quits or stdin closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Register Startup                                  │
/// │                                                                         │
/// │  1. Parse flags, initialize logging (stderr, RUST_LOG)                  │
/// │  2. Load config file, apply flag overrides, validate                    │
/// │  3. Build the HTTP client and the held sale store                       │
/// │  4. Fresh session; load the default catalog (failure only warns)        │
/// │  5. Read commands from stdin until quit                                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ClientResult<()> {
    let cli = Cli::parse();
    init_tracing();

    info!("Starting Till register");

    let mut config = RegisterConfig::load(cli.config)?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(path) = cli.held_sale_path {
        config.held_sale.path = Some(path);
    }
    config.validate()?;

    let api = HttpPosApi::new(&config.api)?;
    let held = HeldSaleStore::new(config.held_sale_path()?);
    let session = SessionState::new();
    let config_state = ConfigState::from(&config);
    info!(api = %api.base_url(), held_sale = ?held.path(), "Register configured");

    let receipt_dir = cli.receipt_dir;
    let span = info_span!("session", id = %session.id());
    async {
        if let Err(err) = commands::product::load_catalog(&api, &session).await {
            warn!(error = %err, "Could not load the product list; search still works");
        }

        let register = Register::new(&api, &session, &config_state, &held, receipt_dir);
        register
            .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
    .instrument(span)
    .await?;

    info!("Register closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so they never interleave with the register on stdout.
/// Override with `RUST_LOG`, e.g. `RUST_LOG=till=trace`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "till-register",
            "--api-url",
            "http://pos.local:8080",
            "--receipt-dir",
            "/tmp/receipts",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://pos.local:8080"));
        assert_eq!(cli.receipt_dir, PathBuf::from("/tmp/receipts"));
        assert!(cli.config.is_none());

        let cli = Cli::parse_from(["till-register"]);
        assert_eq!(cli.receipt_dir, PathBuf::from("."));
    }
}
