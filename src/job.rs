use crate::error::ScanError;
use crate::types::{JobSnapshot, ProbeResult, ScanStats};
use ::time::{format_description::well_known, OffsetDateTime};
use tokio::time::Instant;

/// Validated parameters of one scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanParams {
    pub host: String,
    pub start_port: u16,
    pub end_port: u16,
}

impl ScanParams {
    /// Check `host` is non-empty and `1 <= start <= end <= 65535`.
    ///
    /// Ports arrive as signed integers so that negative or oversized request
    /// values land here as a range error rather than as a body error.
    pub fn validate(host: &str, start_port: i64, end_port: i64) -> Result<Self, ScanError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(ScanError::MissingHost);
        }
        if start_port > end_port {
            return Err(ScanError::InvertedRange { start: start_port, end: end_port });
        }
        if start_port < 1 || end_port > 65535 {
            return Err(ScanError::PortOutOfRange { start: start_port, end: end_port });
        }
        Ok(Self {
            host: host.to_string(),
            start_port: start_port as u16,
            end_port: end_port as u16,
        })
    }

    pub fn total(&self) -> u64 {
        u64::from(self.end_port) - u64::from(self.start_port) + 1
    }
}

/// State of one scan job. Mutated only by its runner through the registry.
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub id: String,
    pub params: ScanParams,
    results: Vec<ProbeResult>,
    completed: bool,
    created_at: OffsetDateTime,
    completed_at: Option<Instant>,
}

impl ScanJob {
    pub fn new(id: String, params: ScanParams) -> Self {
        Self {
            id,
            params,
            results: Vec::new(),
            completed: false,
            created_at: OffsetDateTime::now_utc(),
            completed_at: None,
        }
    }

    pub fn progress(&self) -> u64 {
        self.results.len() as u64
    }

    pub fn total(&self) -> u64 {
        self.params.total()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn completed_at(&self) -> Option<Instant> {
        self.completed_at
    }

    /// Append a result; refuses once completed or full. Progress is derived
    /// from the result list, so the two can never disagree.
    pub fn push(&mut self, result: ProbeResult) -> bool {
        if self.completed || self.progress() >= self.total() {
            return false;
        }
        self.results.push(result);
        true
    }

    /// Flip to completed. Returns false if it already was.
    pub fn complete(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(Instant::now());
        true
    }

    pub fn stats(&self) -> ScanStats {
        ScanStats::tally(&self.results)
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            scan_id: self.id.clone(),
            ip: self.params.host.clone(),
            start_port: self.params.start_port,
            end_port: self.params.end_port,
            progress: self.progress(),
            total: self.total(),
            completed: self.completed,
            results: self.results.clone(),
            stats: self.stats(),
            created_at: self
                .created_at
                .format(&well_known::Rfc3339)
                .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z")),
        }
    }
}
