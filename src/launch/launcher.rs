use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Hands a written script to the queueing system.
pub trait Launcher {
    /// Start `command` with `script` as its final argument and wait for it.
    ///
    /// Only a failure to start the process is an error; whatever the
    /// process itself reports is not inspected.
    fn launch(&self, command: &str, script: &Path) -> Result<()>;
}

/// Runs the launcher as a child process, e.g. `sbatch ./slurm-jobs/run1.slurm`.
///
/// `command` may carry leading arguments (`"sbatch --parsable"`); it is split
/// on whitespace, not through a shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandLauncher;

impl Launcher for CommandLauncher {
    fn launch(&self, command: &str, script: &Path) -> Result<()> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(Error::MissingRequiredField {
            field: "launcher_command",
        })?;

        let status = Command::new(program)
            .args(parts)
            .arg(script)
            .status()
            .map_err(|source| Error::LauncherInvocation {
                command: command.to_string(),
                source,
            })?;

        tracing::debug!(command, %status, "launcher returned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_an_invocation_error() {
        let err = CommandLauncher
            .launch("stool-no-such-launcher-binary", Path::new("job.slurm"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::LauncherInvocation { command, .. } if command == "stool-no-such-launcher-binary"
        ));
    }

    #[test]
    fn blank_command_is_rejected_before_spawning() {
        let err = CommandLauncher.launch("   ", Path::new("job.slurm")).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingRequiredField {
                field: "launcher_command"
            }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn failing_launcher_exit_status_is_ignored() {
        // `false` starts fine and exits 1; the launch still counts as issued.
        CommandLauncher
            .launch("false", Path::new("job.slurm"))
            .unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn leading_arguments_are_passed_before_the_script() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("seen");
        let script = dir.path().join("job.slurm");
        std::fs::write(&script, format!("touch {}\n", marker.display())).unwrap();

        CommandLauncher.launch("sh -e", &script).unwrap();
        assert!(marker.exists());
    }
}
