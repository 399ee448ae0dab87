//! tracing-subscriber initialization.
//!
//! Installs a registry with an `EnvFilter` and a JSON stdout layer.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, Registry};

/// Crates whose debug output drowns out the relay's own events.
const NOISY_TARGETS: [&str; 5] = ["hyper", "h2", "tungstenite", "rustls", "serenity"];

/// Build the filter: `RUST_LOG` wins, otherwise `log_level` with noisy
/// dependencies capped at `warn`.
pub fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(log_level)))
}

fn directives(log_level: &str) -> String {
    let mut directives = log_level.to_string();
    for target in NOISY_TARGETS {
        directives.push_str(&format!(",{target}=warn"));
    }
    directives
}

/// Install the global subscriber. Call once, before any logging.
pub fn init(log_level: &str) {
    Registry::default()
        .with(build_filter(log_level))
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

#[cfg(test)]
mod tests {
    fn assert_contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "missing expected instrumentation contract fragment: {needle}"
        );
    }

    #[test]
    fn directives_cap_noisy_dependencies() {
        let d = super::directives("debug");
        assert!(d.starts_with("debug,"));
        assert!(d.contains("hyper=warn"));
        assert!(d.contains("serenity=warn"));
    }

    #[test]
    fn instrument_skip_list_contract_is_present() {
        let webhooks = include_str!("../webhooks/handlers.rs");
        assert_contains(webhooks, "skip(state, headers, body)");
    }
}
