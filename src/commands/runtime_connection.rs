// ABOUTME: Shared helper for connecting to the local container engine.
// ABOUTME: Detects the socket, connects and pings before any command runs.

use reimage::config::Settings;
use reimage::error::Result;
use reimage::output::Output;
use reimage::runtime::traits::RuntimeInfo;
use reimage::runtime::{BollardRuntime, RuntimeError, detect_local};

/// Connect to the local container engine.
///
/// Fails fast if no socket is found or the engine does not answer a ping, so
/// no command starts work against an engine that is not there.
pub async fn connect_to_runtime(settings: &Settings, output: &Output) -> Result<BollardRuntime> {
    output.operation("Detecting runtime...");
    let detected = detect_local(&settings.runtime).map_err(RuntimeError::from)?;

    output.operation(&format!(
        "Found {} at {}",
        detected.runtime_type, detected.socket_path
    ));

    let runtime =
        BollardRuntime::connect(&detected, &settings.timeouts).map_err(RuntimeError::from)?;
    runtime.ping().await.map_err(RuntimeError::from)?;

    match runtime.info().await {
        Ok(info) => output.operation(&format!(
            "{} {} ({}/{})",
            info.name, info.version, info.os, info.arch
        )),
        Err(e) => tracing::debug!(error = %e, "engine info unavailable"),
    }

    tracing::debug!(
        runtime = %runtime.runtime_type(),
        socket = %detected.socket_path,
        "connected to container engine"
    );
    Ok(runtime)
}
