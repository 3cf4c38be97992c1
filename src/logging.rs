use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global subscriber. `RUST_LOG` takes precedence over `log_level`.
pub fn init(log_format: &str, log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let format = normalize_log_format(log_format);

    if format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .compact(),
            )
            .init();
    }

    tracing::debug!(
        log_format = format,
        log_level,
        "Logging system initialized"
    );
}

fn normalize_log_format(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "json" => "json",
        "pretty" | "compact" | "text" => "pretty",
        _ => {
            eprintln!(
                "WARN: Invalid log format '{}', defaulting to 'json'. Valid options: json, pretty",
                format
            );
            "json"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_log_format() {
        assert_eq!(normalize_log_format("JSON"), "json");
        assert_eq!(normalize_log_format("pretty"), "pretty");
        assert_eq!(normalize_log_format("text"), "pretty");
        assert_eq!(normalize_log_format("yaml"), "json");
    }
}
