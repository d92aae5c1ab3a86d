use std::sync::Arc;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{job::ScanParams, prober, registry::JobRegistry};

/// Drive one job from `start_port` to `end_port`, one port at a time, in ascending order.
///
/// Before each probe the runner checks that its job is still registered and that
/// its token has not fired; either condition ends the loop early. The probe and
/// the inter-probe delay both race the token, so shutdown does not have to wait
/// out a full connect timeout. The job is marked completed at the end if it
/// still exists.
pub async fn run_job(
    registry: Arc<JobRegistry>,
    job_id: String,
    params: ScanParams,
    cancel: CancellationToken,
) {
    let settings = registry.settings();
    debug!(scan_id = %job_id, host = %params.host, "runner started");

    for port in params.start_port..=params.end_port {
        if cancel.is_cancelled() || !registry.contains(&job_id).await {
            debug!(scan_id = %job_id, port, "job abandoned, stopping runner");
            break;
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            r = prober::probe(&params.host, port, settings.probe_timeout) => r,
        };
        if !registry.record_result(&job_id, result).await {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = time::sleep(settings.probe_delay) => {}
        }
    }

    if registry.mark_completed(&job_id).await {
        if let Ok(snap) = registry.get(&job_id).await {
            info!(
                scan_id = %job_id,
                host = %params.host,
                scanned = snap.stats.total_scanned,
                open = snap.stats.open,
                closed = snap.stats.closed,
                errors = snap.stats.errors,
                "scan finished"
            );
        }
    } else {
        debug!(scan_id = %job_id, "job removed before completion");
    }
}
