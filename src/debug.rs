use std::sync::OnceLock;

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// True when `INVSCAN_DEBUG` is set; raises the default log filter to `debug`
pub fn debug_enabled() -> bool {
    *DEBUG_ENABLED.get_or_init(|| std::env::var("INVSCAN_DEBUG").is_ok())
}

/// Default `env_logger` filter for front ends
pub fn default_log_filter() -> &'static str {
    if debug_enabled() { "invscan=debug" } else { "warn" }
}
