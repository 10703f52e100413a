use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Шумные зависимости HTTP-стека, которым хватает `warn`.
const QUIET_TARGETS: &[&str] = &["hyper_util=warn", "reqwest=warn", "h2=warn"];

/// Инициализирует глобальный subscriber. `RUST_LOG` имеет приоритет над
/// `default_level`. Вывод идёт в stderr, stdout остаётся за CLI.
pub fn init_logging(default_level: &str) -> Result<()> {
    fmt()
        .with_env_filter(sabagram_filter(default_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}

fn sabagram_filter(default_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let directives = std::iter::once(default_level)
        .chain(QUIET_TARGETS.iter().copied())
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::sabagram_filter;

    #[test]
    fn default_level_keeps_http_stack_quiet() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let rendered = sabagram_filter("debug").to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("reqwest=warn"));
    }

    #[test]
    fn broken_level_falls_back_to_info() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(sabagram_filter("sabagram=loud").to_string(), "info");
    }
}
