use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line human readable output.
    #[default]
    Compact,
    /// One JSON object per event, for log shippers.
    Json,
}

fn default_directives(component: &str) -> String {
    format!("info,todo_web=debug,{component}=debug")
}

/// `TODO_LOG` wins over `RUST_LOG`; unparsable values fall through to the default.
fn resolve_filter(todo_log: Option<&str>, component: &str) -> EnvFilter {
    todo_log
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(component)))
}

pub fn init_tracing(component: &str, format: LogFormat) {
    let todo_log = std::env::var("TODO_LOG").ok();
    let filter = resolve_filter(todo_log.as_deref(), component);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let _ = match format {
        LogFormat::Compact => builder
            .with_file(true)
            .with_line_number(true)
            .compact()
            .try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn default_directives_include_component() {
        assert_eq!(
            default_directives("worker"),
            "info,todo_web=debug,worker=debug"
        );
    }

    #[test]
    fn explicit_filter_is_used_when_valid() {
        let filter = resolve_filter(Some("warn"), "todo_web");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn log_format_parses_from_flag_values() {
        assert_eq!(LogFormat::from_str("json", true), Ok(LogFormat::Json));
        assert_eq!(LogFormat::from_str("compact", true), Ok(LogFormat::Compact));
        assert!(LogFormat::from_str("xml", true).is_err());
    }
}
