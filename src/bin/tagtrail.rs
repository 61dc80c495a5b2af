//! tagtrail: one-shot request dispatcher
//!
//! Reads a single request envelope (JSON) from stdin, runs it against the
//! configured store and writes the response envelope (JSON) to stdout.
//!
//! ## Usage
//! ```text
//! echo '{"operation":"ListAccounts","identity":{"sub":"u1","scopes":["account"]}}' \
//!     | tagtrail [config.yaml]
//! ```
//!
//! ## Configuration
//! - TAGTRAIL_CONFIG: Path to a YAML config file (optional)
//! - TAGTRAIL__STORAGE__TYPE: `memory` or `dynamo`
//! - TAGTRAIL_LOG: Log filter (default: info)

use std::io::Read;

use tracing::info;

use tagtrail::config::Config;
use tagtrail::gateway::{dispatch, GatewayRequest};
use tagtrail::utils::bootstrap::{build_services, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;
    let services = build_services(&config).await?;

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let request: GatewayRequest = serde_json::from_str(&input)?;

    let response = dispatch(&services, request).await;
    info!(status = response.status_code, "Request handled");

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
