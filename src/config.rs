use crate::action::Delay;
use crate::decision::Tcp;
use crate::session::Settings;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

/// Command line and environment configuration for the relay tap.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Plays the hero's seat on relayed poker tables", long_about = None)]
pub struct Config {
    /// Address the relay connects to.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:7878")]
    pub bind: String,
    #[arg(long, env = "DECISION_HOST", default_value = "127.0.0.1")]
    pub decision_host: String,
    #[arg(long, env = "DECISION_PORT", default_value_t = 9999)]
    pub decision_port: u16,
    /// Minimum response delay in seconds.
    #[arg(long, env = "DELAY_MIN", default_value_t = 1.0)]
    pub delay_min: f64,
    /// Maximum response delay in seconds.
    #[arg(long, env = "DELAY_MAX", default_value_t = 4.0)]
    pub delay_max: f64,
    /// Track tables without consulting the decision service or acting.
    #[arg(long, env = "AUTOMATION_DISABLED")]
    pub disabled: bool,
    /// Give up on a decision round trip after this many seconds.
    #[arg(long, env = "DECISION_TIMEOUT")]
    pub decision_timeout: Option<f64>,
}

impl Config {
    /// Validates the raw values into what sessions share.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let delay = Delay::from_secs(self.delay_min, self.delay_max)?;
        let timeout = match self.decision_timeout {
            None => None,
            Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
            Some(secs) => anyhow::bail!("decision timeout must be positive, got {}", secs),
        };
        let dialer = Tcp::new(&self.decision_host, self.decision_port);
        log::info!(
            "decision service {} delay {:?}..{:?} timeout {:?}{}",
            dialer.addr(),
            delay.min(),
            delay.max(),
            timeout,
            if self.disabled { " (automation disabled)" } else { "" }
        );
        Ok(Settings {
            enabled: !self.disabled,
            delay,
            dialer: Arc::new(dialer),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["tablebot"]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:7878");
        assert_eq!(config.decision_port, 9999);
        let settings = config.settings().unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.delay, Delay::default());
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn flags_override() {
        let config = Config::try_parse_from([
            "tablebot",
            "--delay-min",
            "0.5",
            "--delay-max",
            "0.5",
            "--disabled",
            "--decision-timeout",
            "3",
        ])
        .unwrap();
        let settings = config.settings().unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.delay.min(), Duration::from_millis(500));
        assert_eq!(settings.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn rejects_inverted_delay() {
        let config =
            Config::try_parse_from(["tablebot", "--delay-min", "5", "--delay-max", "1"]).unwrap();
        assert!(config.settings().is_err());
    }

    #[test]
    fn rejects_nonpositive_timeout() {
        let config = Config::try_parse_from(["tablebot", "--decision-timeout", "0"]).unwrap();
        assert!(config.settings().is_err());
    }
}
