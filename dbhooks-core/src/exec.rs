//! Replacing the current process with the resolved client.

use std::convert::Infallible;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::client::ResolvedCommand;
use crate::error::{DbHooksError, Result};

/// Locates a client executable on `PATH`.
///
/// # Errors
/// Returns `ClientNotFound` naming the program if it cannot be found
pub fn find_client(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| DbHooksError::client_not_found(program))
}

/// Replaces the current process with the resolved command.
///
/// The command's environment is applied on top of the inherited one, so its
/// entries win on conflicts. On success this never returns.
///
/// # Errors
/// Returns `ClientNotFound` before attempting anything if the program is not
/// on `PATH`, and `Exec` if the operating system refuses to run it
pub fn exec(command: &ResolvedCommand) -> Result<Infallible> {
    let program = command.program();
    let path = find_client(program)?;

    debug!("Executing {} ({})", program, path.display());

    let mut process = Command::new(&path);
    process.args(command.args()).envs(&command.env);

    replace_process(process, program)
}

#[cfg(unix)]
fn replace_process(mut process: Command, program: &str) -> Result<Infallible> {
    use std::os::unix::process::CommandExt;

    // exec only returns on failure
    let source = process.arg0(program).exec();
    Err(DbHooksError::Exec {
        command: program.to_string(),
        source,
    })
}

#[cfg(not(unix))]
fn replace_process(mut process: Command, program: &str) -> Result<Infallible> {
    let status = process.status().map_err(|source| DbHooksError::Exec {
        command: program.to_string(),
        source,
    })?;
    std::process::exit(status.code().unwrap_or(1))
}
