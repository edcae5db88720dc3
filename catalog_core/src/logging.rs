//! Process-wide `tracing` subscriber setup for the command line tools.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset, by `-v` count. Quiet by default,
/// since the tools print the rendered report themselves.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "catalog_core=off",
        1 => "catalog_core=info",
        2 => "catalog_core=debug",
        _ => "catalog_core=trace",
    }
}

/// Installs a stderr formatter once; later calls are no-ops.
pub fn init(verbosity: u8) {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    if INSTALLED.set(()).is_err() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_filter_level() {
        assert_eq!(default_directive(0), "catalog_core=off");
        assert_eq!(default_directive(1), "catalog_core=info");
        assert_eq!(default_directive(2), "catalog_core=debug");
        assert_eq!(default_directive(9), "catalog_core=trace");
    }

    #[test]
    fn init_is_idempotent() {
        init(1);
        init(3);
    }
}
