//! neurolaunch binary
//!
//! Takes no flags of its own: every argument is forwarded to the downstream
//! server. Exits 1 on any failure; on success the process is replaced.

use std::process::ExitCode;

use neurolaunch::config::LIBRARY_PATH_VAR;
use neurolaunch::tracing::{init_tracing, shutdown_tracing, OTLP_ENDPOINT_VAR};
use neurolaunch::{capability, output, BootstrapConfig, BootstrapError, Bootstrapper, CliRuntime};

#[tokio::main]
async fn main() -> ExitCode {
    let otlp_endpoint = std::env::var(OTLP_ENDPOINT_VAR).ok();
    if let Err(e) = init_tracing("neurolaunch", otlp_endpoint.as_deref()) {
        eprintln!("[WARN] Failed to initialize tracing: {}", e);
    }

    let result = run().await;
    shutdown_tracing();

    match result {
        Ok(never) => match never {},
        Err(e) => {
            tracing::error!(error = %e, "Bootstrap failed");
            output::fatal(&e, e.hint().as_deref());
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run() -> Result<std::convert::Infallible, BootstrapError> {
    let config = BootstrapConfig::from_env()?;
    let runtime = CliRuntime::new(config.container.runtime.clone());
    let bootstrapper = Bootstrapper::new(&runtime, &config, capability::gpu_present());

    let library_path = std::env::var_os(LIBRARY_PATH_VAR);
    let (report, plan) = bootstrapper
        .run(std::env::args_os().skip(1), library_path.as_deref())
        .await?;

    output::success(format!(
        "{} ready ({}, {} model(s), {:.1}s); starting {}",
        report.container.name,
        report.container.accel,
        report.verified.present.len(),
        report.elapsed.as_secs_f64(),
        plan.program.display()
    ));

    // Pending spans are lost once the process image is replaced
    shutdown_tracing();
    plan.exec()
}
