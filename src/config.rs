use std::path::PathBuf;
use std::time::Duration;

/// Fixed socket connect timeout for a single probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause between consecutive probes of one job, to avoid flooding the target.
pub const PROBE_DELAY: Duration = Duration::from_millis(50);

/// Knobs of the scan runner. Defaults are the service's fixed behavior;
/// tests shrink the delay to keep runs short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub probe_timeout: Duration,
    pub probe_delay: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            probe_timeout: PROBE_TIMEOUT,
            probe_delay: PROBE_DELAY,
        }
    }
}

/// HTTP service configuration, filled from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Directory served at `/` (the presentation layer).
    pub ui_dir: PathBuf,
    /// How long a completed job stays pollable before eviction.
    pub retention: Duration,
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            ui_dir: PathBuf::from("ui"),
            retention: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
