use crate::error::spawn::SpawnError;

use common::ErrorLocation;

use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, trace, warn};
use sysinfo::{Pid, Process, ProcessStatus, ProcessesToUpdate, System};
use tokio::process::Child as TokioChild;
use tokio::time::sleep as TokioSleep;

const KILL_VERIFY_MAX_ELAPSED: Duration = Duration::from_secs(5);

/// Owned handle to the spawned companion window.
///
/// Liveness is asked of the OS, never of the window itself: the protocol has no
/// heartbeat.
#[derive(Debug)]
pub struct CompanionProcess {
    child: TokioChild,
    pid: u32,
    program: String,
}

impl CompanionProcess {
    #[track_caller]
    pub(crate) fn new(child: TokioChild, program: String) -> Result<Self, SpawnError> {
        let pid = child.id().ok_or_else(|| SpawnError::Spawn {
            message: format!("{program} exited before its PID could be read"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(IoError::new(ErrorKind::NotFound, "no pid")),
        })?;

        Ok(Self {
            child,
            pid,
            program,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Best-effort, non-blocking liveness probe.
    ///
    /// The child must not have been reaped and the OS must still list the PID
    /// as something other than a zombie.
    pub fn is_alive(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) => {
                trace!("Companion {} exited with {status}", self.pid);
                return false;
            }
            Err(e) => {
                debug!("Could not poll companion {}: {e}", self.pid);
                return false;
            }
        }

        with_process(self.pid, |p| p.status() != ProcessStatus::Zombie).unwrap_or(false)
    }

    /// Ask the OS to kill the process without waiting for it to go away.
    pub fn kill(&mut self) {
        match self.child.start_kill() {
            Ok(()) => debug!("Sent kill to companion {}", self.pid),
            // Already exited and reaped.
            Err(e) if e.kind() == ErrorKind::InvalidInput => {}
            Err(e) => warn!("Failed to kill companion {}: {e}", self.pid),
        }
    }

    /// Kill the process and wait, with exponential backoff up to 5 seconds,
    /// until it is gone.
    ///
    /// # Returns
    ///
    /// * `true` - The process is no longer running
    /// * `false` - It was still running when the backoff gave up
    pub async fn terminate(&mut self) -> bool {
        self.kill();

        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(KILL_VERIFY_MAX_ELAPSED),
            ..Default::default()
        };

        loop {
            if !matches!(self.child.try_wait(), Ok(None)) {
                debug!("Companion {} successfully terminated", self.pid);
                return true;
            }

            match backoff.next_backoff() {
                Some(duration) => {
                    trace!("Companion {} still alive, retrying after {duration:?}", self.pid);
                    TokioSleep(duration).await;
                }
                None => {
                    warn!("Companion {} still running after max backoff time", self.pid);
                    return false;
                }
            }
        }
    }
}

/// Run `f` against the OS view of `pid`, or return `None` if there is none.
pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid).map(f)
}
