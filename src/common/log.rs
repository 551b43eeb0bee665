//! Process-wide tracing setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_tree::HierarchicalLayer;

/// Environment variable holding the filter directives, e.g. `tabtile=debug`.
/// `RUST_LOG` is consulted when it is unset.
pub const LOG_ENV: &str = "TABTILE_LOG";

const DEFAULT_FILTER: &str = "info";

/// Installs a hierarchical stderr logger. Calling it again is a no-op.
pub fn init_logging() {
    let filter = EnvFilter::new(filter_directive(|key| std::env::var(key).ok()));
    let tree = HierarchicalLayer::new(2)
        .with_writer(std::io::stderr)
        .with_indent_lines(true)
        .with_targets(true)
        .with_bracketed_fields(true);
    let _ = tracing_subscriber::registry().with(filter).with(tree).try_init();
}

fn filter_directive(var: impl Fn(&str) -> Option<String>) -> String {
    var(LOG_ENV)
        .or_else(|| var("RUST_LOG"))
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
}
