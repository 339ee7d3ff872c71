use crate::COMPANION_EXECUTABLE;
use crate::companion::process::CompanionProcess;
use crate::config::CompanionConfig;
use crate::error::spawn::SpawnError;

use common::ErrorLocation;

use std::env::current_exe;
use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;
use std::path::Path;
use std::process::Stdio;

use log::{debug, info, trace};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;

pub(crate) fn build_spawn_command(program: &Path, args: &[String]) -> TokioCommand {
    let mut cmd = TokioCommand::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Launch the companion window described by `config`.
///
/// The program is looked up on PATH first. A bare program name that is not
/// found there is retried next to the current executable, where installers
/// usually drop the window binary.
///
/// # Returns
///
/// * `Ok(CompanionProcess)` - Process started; it is killed when the handle drops
/// * `Err(SpawnError)` - Empty program or the OS refused to start it
pub fn spawn_companion(config: &CompanionConfig) -> Result<CompanionProcess, SpawnError> {
    if config.program.as_os_str().is_empty() {
        return Err(SpawnError::Validation {
            message: "Companion program path is empty".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let program = config.program.display().to_string();
    debug!("Attempting to spawn companion {program} {:?}", config.args);

    let mut child = match build_spawn_command(&config.program, &config.args).spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == ErrorKind::NotFound && is_bare_name(&config.program) => {
            debug!("{program} not in PATH, trying local binary");
            spawn_local_binary(&config.args)?
        }
        Err(err) => {
            return Err(SpawnError::Spawn {
                message: format!("Failed to spawn {program}: {err}"),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(err),
            });
        }
    };

    forward_output(&mut child);

    let companion = CompanionProcess::new(child, program)?;
    info!(
        "Spawned companion {} (PID: {})",
        companion.program(),
        companion.pid()
    );

    Ok(companion)
}

fn is_bare_name(program: &Path) -> bool {
    program.components().count() == 1 && !program.is_absolute()
}

fn spawn_local_binary(args: &[String]) -> Result<TokioChild, SpawnError> {
    let exe = current_exe().map_err(|e| SpawnError::Spawn {
        message: format!("Failed to get current executable path: {e}"),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(e),
    })?;

    let dir = exe.parent().ok_or_else(|| SpawnError::Spawn {
        message: format!("Executable has no parent directory: {}", exe.display()),
        location: ErrorLocation::from(Location::caller()),
        source: Box::new(IoError::new(ErrorKind::NotFound, "no parent dir")),
    })?;

    let local_path = dir.join(COMPANION_EXECUTABLE);
    debug!("Attempting to spawn from {}", local_path.display());

    build_spawn_command(&local_path, args)
        .current_dir(dir)
        .spawn()
        .map_err(|e| SpawnError::Spawn {
            message: format!(
                "Failed to spawn {COMPANION_EXECUTABLE} from {}: {e}",
                local_path.display()
            ),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })
}

/// The window's own output goes to the trace log so a full pipe never stalls it.
fn forward_output(child: &mut TokioChild) {
    if let Some(stdout) = child.stdout.take() {
        TokioSpawn(forward_lines(stdout, "stdout"));
    }
    if let Some(stderr) = child.stderr.take() {
        TokioSpawn(forward_lines(stderr, "stderr"));
    }
}

async fn forward_lines<R>(reader: R, stream_name: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        trace!("Companion {stream_name}: {line}");
    }
}
