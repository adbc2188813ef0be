use std::future::Future;
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::llm::VisionReply;

/// Target routed to `timing.log` and `timing.jsonl` only.
pub const TIMING_TARGET: &str = "catalog.timing";

/// What is being timed: one vision request for one stored image.
#[derive(Debug, Clone, Copy)]
pub struct VisionCall<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    pub image: &'a Path,
    pub image_bytes: usize,
}

fn response_status(result: &Result<VisionReply>) -> &'static str {
    match result {
        Ok(reply) if reply.refused => "refused",
        Ok(_) => "success",
        Err(_) => "error",
    }
}

/// Wraps a vision request with `vision_request` and `vision_response`
/// timing events.
pub async fn log_vision_timing<F, Fut>(call: &VisionCall<'_>, request: F) -> Result<VisionReply>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<VisionReply>>,
{
    let image = call.image.display();
    let started_perf = Instant::now();
    info!(
        target: TIMING_TARGET,
        "event=vision_request provider={} model={} image={} image_bytes={} started_at={}",
        call.provider,
        call.model,
        image,
        call.image_bytes,
        Utc::now().to_rfc3339()
    );

    let result = request().await;

    let reply_chars = result
        .as_ref()
        .map(|reply| reply.text.chars().count())
        .unwrap_or(0);
    info!(
        target: TIMING_TARGET,
        "event=vision_response provider={} model={} image={} completed_at={} duration_s={:.3} status={} reply_chars={}",
        call.provider,
        call.model,
        image,
        Utc::now().to_rfc3339(),
        started_perf.elapsed().as_secs_f64(),
        response_status(&result),
        reply_chars
    );

    result
}

/// Records which parse stage turned a reply into a catalog record.
pub fn log_parse_outcome(image: &Path, tier: &str, reply_chars: usize) {
    info!(
        target: TIMING_TARGET,
        "event=vision_parsed image={} tier={} reply_chars={}",
        image.display(),
        tier,
        reply_chars
    );
}
