//! Autonomous seat driver for a proprietary poker table protocol.
//!
//! Decoded frames from a relay are routed per connection into a
//! [`session::TableSession`], which reconstructs hand state, feeds an
//! external decision service through [`decision::DecisionClient`], and
//! synthesizes the hero's actions back into the relay.
pub mod action;
pub mod cards;
pub mod config;
pub mod decision;
pub mod hosting;
pub mod protocol;
pub mod session;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Chip amounts as reported by the backend (smallest currency unit).
pub type Chips = i64;
/// Physical seat index around the table.
pub type Position = usize;
/// Relay-assigned connection identifier.
pub type ConnId = u64;
/// Backend hand identifier.
pub type HandId = u64;

// ============================================================================
// PROTOCOL CONSTANTS
// ============================================================================
/// Channel used for every synthesized frame.
pub const SYNTH_CHANNEL: u32 = 1;
/// Poll interval while a suggestion waits for the hero's turn.
pub const AWAIT_POLL: std::time::Duration = std::time::Duration::from_millis(100);
/// Grace period for the final decision reply when a client is closed.
pub const DECISION_LINGER: std::time::Duration = std::time::Duration::from_secs(5);

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate termination.
/// Sessions hold no durable state, so there is nothing to flush.
pub fn kys() {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                println!();
                log::warn!("interrupt received, exiting immediately");
                std::process::exit(0);
            }
            Err(e) => log::error!("failed to listen for interrupt: {}", e),
        }
    });
}
