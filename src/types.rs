use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability of one probed port.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Open,
    Closed,
    Error,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Open => write!(f, "open"),
            ProbeStatus::Closed => write!(f, "closed"),
            ProbeStatus::Error => write!(f, "error"),
        }
    }
}

/// Outcome of a single probe against host:port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub port: u16,
    pub status: ProbeStatus,
    pub message: String,
}

impl ProbeResult {
    pub fn open(port: u16) -> Self {
        Self {
            port,
            status: ProbeStatus::Open,
            message: format!("Port {port} is open"),
        }
    }

    pub fn closed(port: u16) -> Self {
        Self {
            port,
            status: ProbeStatus::Closed,
            message: format!("Port {port} is closed"),
        }
    }

    pub fn error(host: &str, port: u16, err: impl fmt::Display) -> Self {
        Self {
            port,
            status: ProbeStatus::Error,
            message: format!("Couldn't connect to {host}:{port} - {err}"),
        }
    }
}

/// Per-status tally of a job's results, computed at read time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub open: u64,
    pub closed: u64,
    pub errors: u64,
    pub total_scanned: u64,
}

impl ScanStats {
    pub fn tally(results: &[ProbeResult]) -> Self {
        let mut stats = ScanStats::default();
        for r in results {
            match r.status {
                ProbeStatus::Open => stats.open += 1,
                ProbeStatus::Closed => stats.closed += 1,
                ProbeStatus::Error => stats.errors += 1,
            }
        }
        stats.total_scanned = results.len() as u64;
        stats
    }
}

/// Consistent point-in-time view of a scan job, as served by the progress endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub scan_id: String,
    pub ip: String,
    pub start_port: u16,
    pub end_port: u16,
    pub progress: u64,
    pub total: u64,
    pub completed: bool,
    pub results: Vec<ProbeResult>,
    pub stats: ScanStats,
    pub created_at: String,
}
