use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-friendly multi-line output
    Pretty,
    /// One line per event
    #[default]
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(anyhow!("unknown log format `{other}` (expected pretty or compact)")),
        }
    }
}

/// Installs the global subscriber. Logs go to stderr so `--json` output on
/// stdout stays machine-readable. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool, format: LogFormat) -> Result<()> {
    let default_level = if verbose { "spotter=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    let res = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };

    res.map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!(LogFormat::parse("Pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("compact").unwrap(), LogFormat::Compact);
        assert!(LogFormat::parse("json").is_err());
    }
}
