use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::{info, instrument, warn};

const SERVICE_MANAGER: &str = "systemctl";

#[derive(Debug, Error)]
pub enum RestartServiceError {
    #[error("could not run `{program} restart {service_name}`")]
    Spawn {
        program: String,
        service_name: String,
        source: io::Error,
    },
}

fn restart_command(program: &str, service_name: &str) -> Command {
    let mut command = Command::new(program);
    command.arg("restart").arg(service_name);
    command
}

fn restart_with(program: &str, service_name: &str) -> Result<(), RestartServiceError> {
    info!("Running `{} restart {}`...", program, service_name);

    let status = restart_command(program, service_name)
        .status()
        .map_err(|e| RestartServiceError::Spawn {
            program: program.to_string(),
            service_name: service_name.to_string(),
            source: e,
        })?;

    if !status.success() {
        warn!(
            "`{} restart {}` exited with {}",
            program, service_name, status,
        );
    }

    info!("Done requesting restart of {}.", service_name);
    Ok(())
}

/// Ask the service manager to restart `service_name`.
///
/// No existence check is made for the service; the command is issued as
/// given and a non-zero exit status is logged, not treated as an error.
/// Only failure to run the service manager itself is reported to the
/// caller.
#[instrument(level = "trace", skip_all)]
pub fn execute(service_name: &str) -> Result<(), RestartServiceError> {
    restart_with(SERVICE_MANAGER, service_name)
}
