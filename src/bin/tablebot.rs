//! Tablebot Binary
//!
//! Listens for the relay's decoded frame stream and plays the hero's seat
//! at every table it reports.

use clap::Parser;
use tablebot::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log();
    kys();
    let config = config::Config::parse();
    let settings = config.settings()?;
    hosting::Tap::run(&config.bind, settings).await
}
