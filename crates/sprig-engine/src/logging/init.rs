use std::sync::Once;

/// Filter used when neither [`LoggingConfig::env_filter`] nor `RUST_LOG` is set.
///
/// wgpu and naga are chatty at `info`; shader diagnostics are reported by the
/// renderer itself.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g.
/// `"sprig_engine=debug,wgpu=warn"`) and takes precedence over `RUST_LOG`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// The filter string that will be applied.
    pub fn resolve_filter(&self, rust_log: Option<String>) -> String {
        self.env_filter
            .clone()
            .or(rust_log)
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolve_filter(std::env::var("RUST_LOG").ok());

        // try_init: a test harness or host app may already own the logger.
        let installed = env_logger::Builder::new()
            .parse_filters(&filter)
            .write_style(config.write_style)
            .try_init();

        if installed.is_ok() {
            log::debug!("logging initialized with filter `{filter}`");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_rust_log() {
        let config = LoggingConfig {
            env_filter: Some("debug".into()),
            ..LoggingConfig::default()
        };
        assert_eq!(config.resolve_filter(Some("trace".into())), "debug");
    }

    #[test]
    fn falls_back_to_rust_log_then_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.resolve_filter(Some("warn".into())), "warn");
        assert_eq!(config.resolve_filter(None), DEFAULT_FILTER);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::default());
    }
}
