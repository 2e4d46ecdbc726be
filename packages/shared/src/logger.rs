//! Logging setup utilities for the Tsunagi binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive for the given targets.
///
/// Crate names are normalised the way `tracing` reports them (`-` becomes `_`).
pub fn default_filter(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level applies to every crate listed in `targets`; everything else stays
/// at the subscriber default. The filter can be overridden with `RUST_LOG`.
///
/// # Arguments
///
/// * `targets` - Crate or binary names to enable (e.g. `["tsunagi-client"]`)
/// * `default_log_level` - The default log level (e.g. "debug", "info", "warn")
///
/// # Examples
///
/// ```no_run
/// use tsunagi_shared::logger::setup_logger;
///
/// setup_logger(&["tsunagi-client"], "info");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_normalises_crate_names() {
        // テスト項目: クレート名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let targets = ["tsunagi-client", "tsunagi_shared"];

        // when (操作):
        let filter = default_filter(&targets, "debug");

        // then (期待する結果):
        assert_eq!(filter, "tsunagi_client=debug,tsunagi_shared=debug");
    }

    #[test]
    fn test_default_filter_with_no_targets() {
        // テスト項目: ターゲットが空の場合は空文字列になる
        // given (前提条件):

        // when (操作):
        let filter = default_filter(&[], "info");

        // then (期待する結果):
        assert!(filter.is_empty());
    }
}
