//! # fid-adapters
//!
//! Adapter implementations for the first input delay ports, built on an
//! in-process page model (`PageHost`), plus the JSON logger and page trace
//! replay. This crate depends on `ports`, `domain`, and `shared`.

pub mod fallback;
pub mod log_sink;
pub mod logger;
pub mod observer;
pub mod page;
pub mod reporter;
pub mod restore;
pub mod stack;
pub mod trace;
pub mod visibility;

pub use fallback::InputListenerFallback;
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use observer::{PerformanceObserver, PerformanceObserverSource};
pub use page::{ListenerId, PageHost, PageShow, VisibilityChange, WeakPageHost};
pub use reporter::{OnceReporterBinder, RandomIdMetricFactory};
pub use restore::PageShowRestoreNotifier;
pub use stack::PageStack;
pub use trace::{PageTrace, TraceError, TraceStep, apply_step};
pub use visibility::FirstHiddenTracker;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fid_ports::ports_crate_version;
    use fid_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]";
                continue;
            }
            if in_deps && line.starts_with("fid-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_config() {
        let deps = workspace_deps();
        let forbidden = ["fid-app", "fid-config"];

        for dep in &deps {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
    }

    #[test]
    fn adapters_crate_compiles() {
        let version = adapters_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn adapters_can_use_ports_and_shared() {
        let ports_version = ports_crate_version();
        let shared_version = shared_crate_version();

        assert!(!ports_version.is_empty());
        assert!(!shared_version.is_empty());
    }
}
