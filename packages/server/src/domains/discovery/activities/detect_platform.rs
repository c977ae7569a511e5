use anyhow::{Context, Result};

use crate::domains::discovery::models::PlatformDetection;
use crate::kernel::ServerDeps;

pub async fn detect_platform(url: &str, deps: &ServerDeps) -> Result<PlatformDetection> {
    deps.osint
        .detect_platform(url)
        .await
        .with_context(|| format!("Failed to detect ATS platform for {}", url))
}
