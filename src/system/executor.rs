// src/system/executor.rs

use crate::constants::WAIT_COMMAND;
use crate::core::aliases::AliasMap;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Child, Command as StdCommand, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;

/// Why a process could not be launched or waited for.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The `wait` delay was not a non-negative integer.
    #[error("invalid delay '{0}': expected a non-negative number of milliseconds")]
    InvalidDelay(String),
    /// The OS refused to start the program.
    #[error("Command '{command}' could not be started: {source}")]
    ProcessStart {
        /// The program, after alias resolution.
        command: String,
        /// The spawn error.
        #[source]
        source: std::io::Error,
    },
    /// The path of the running esplus binary is unknown, so `wait` cannot re-invoke it.
    #[error("Could not locate the esplus executable for a delayed start: {0}")]
    CurrentExe(#[source] std::io::Error),
    /// Writing to the child's standard input failed.
    #[error("Could not pass input to '{command}': {source}")]
    Input {
        /// The program being fed.
        command: String,
        /// The write error.
        #[source]
        source: std::io::Error,
    },
    /// The child ran but reported failure.
    #[error("Command '{0}' exited with a non-zero error code.")]
    NonZeroExitStatus(String),
}

/// A process that was started and left running on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
    /// OS process id of the child.
    pub pid: u32,
    /// The program that was executed, after alias resolution.
    pub program: String,
}

/// How far a started process is cut loose from esplus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Detach {
    /// Own process group; still attached to the console on Windows.
    Group,
    /// Own process group and, on Windows, no console at all.
    Full,
}

/// Parses a delay token: a non-negative integer number of milliseconds.
pub fn parse_delay(token: &str) -> Result<u64, LaunchError> {
    token
        .trim()
        .parse::<u64>()
        .map_err(|_| LaunchError::InvalidDelay(token.to_string()))
}

/// Starts processes for `run`, `wait` and the clipboard bridge.
#[derive(Debug)]
pub struct Launcher<'a> {
    aliases: &'a AliasMap,
    self_exe: Option<PathBuf>,
}

impl<'a> Launcher<'a> {
    /// Creates a launcher that resolves program names through `aliases`.
    pub fn new(aliases: &'a AliasMap) -> Self {
        Self {
            aliases,
            self_exe: None,
        }
    }

    /// Overrides the executable re-invoked for delayed starts (defaults to the running binary).
    pub fn with_self_exe(mut self, exe: PathBuf) -> Self {
        self.self_exe = Some(exe);
        self
    }

    /// `run [ms] <cmd> [args...]`.
    ///
    /// Without a delay the command starts right away with its output forwarded to ours.
    /// With a delay esplus re-invokes itself as `wait <ms> <cmd> [args...]` in the background
    /// and returns at once. Returns `None` when there was nothing to start.
    pub fn run(&self, args: &[String]) -> Result<Option<Launched>, LaunchError> {
        let Some((first, rest)) = args.split_first() else {
            return Ok(None);
        };

        if first.trim().parse::<i64>().is_err() {
            let mut command = self.command_for(first, rest);
            command
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
            return self.spawn_detached(command, first, Detach::Group).map(Some);
        }

        let delay = parse_delay(first)?;
        if rest.is_empty() {
            log::debug!("Delay of {}ms given without a command; nothing to run.", delay);
            return Ok(None);
        }

        let exe = match &self.self_exe {
            Some(exe) => exe.clone(),
            None => std::env::current_exe().map_err(LaunchError::CurrentExe)?,
        };
        log::debug!("Scheduling '{}' in {}ms via {}", rest.join(" "), delay, exe.display());

        let mut command = StdCommand::new(&exe);
        command
            .arg(WAIT_COMMAND)
            .arg(delay.to_string())
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let label = exe.display().to_string();
        self.spawn_detached(command, &label, Detach::Full).map(Some)
    }

    /// `wait <ms> <cmd> [args...]`: sleeps, then starts the command with all streams closed.
    ///
    /// The delay is validated before anything else happens.
    pub fn wait(&self, args: &[String]) -> Result<Option<Launched>, LaunchError> {
        let Some((first, rest)) = args.split_first() else {
            return Ok(None);
        };
        let delay = parse_delay(first)?;
        let Some((program, program_args)) = rest.split_first() else {
            return Ok(None);
        };

        if delay > 0 {
            log::debug!("Waiting {}ms before starting '{}'", delay, program);
            thread::sleep(Duration::from_millis(delay));
        }

        let mut command = self.command_for(program, program_args);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        self.spawn_detached(command, program, Detach::Group).map(Some)
    }

    /// Runs `args` to completion with `input` on its stdin.
    ///
    /// Stdout is forwarded, stderr discarded. A child that exits without reading all of its
    /// input is fine; a non-zero exit status is not.
    pub fn run_with_input(&self, args: &[String], input: &str) -> Result<(), LaunchError> {
        let Some((program, program_args)) = args.split_first() else {
            return Ok(());
        };

        let mut command = self.command_for(program, program_args);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::null());
        let mut child = self.spawn(command, program)?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(input.as_bytes()) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    log::debug!("'{}' closed its input early.", program);
                }
                Err(e) => {
                    return Err(LaunchError::Input {
                        command: program.clone(),
                        source: e,
                    });
                }
            }
        }

        let status = child.wait().map_err(|e| LaunchError::ProcessStart {
            command: program.clone(),
            source: e,
        })?;
        if !status.success() {
            return Err(LaunchError::NonZeroExitStatus(program.clone()));
        }
        Ok(())
    }

    fn command_for(&self, program: &str, args: &[String]) -> StdCommand {
        let resolved = self.aliases.resolve(program);
        let mut command = StdCommand::new(resolved);
        command.args(args);
        command
    }

    fn spawn(&self, mut command: StdCommand, label: &str) -> Result<Child, LaunchError> {
        log::debug!("Spawning {:?}", command);
        command.spawn().map_err(|e| LaunchError::ProcessStart {
            command: label.to_string(),
            source: e,
        })
    }

    fn spawn_detached(
        &self,
        mut command: StdCommand,
        label: &str,
        detach: Detach,
    ) -> Result<Launched, LaunchError> {
        detach_command(&mut command, detach);
        let program = command.get_program().to_string_lossy().into_owned();
        let child = self.spawn(command, label)?;
        let launched = Launched {
            pid: child.id(),
            program,
        };
        log::debug!("Started {:?}", launched);
        // The handle is dropped without waiting: the child outlives us.
        drop(child);
        Ok(launched)
    }
}

#[cfg(unix)]
fn detach_command(command: &mut StdCommand, _detach: Detach) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(windows)]
fn detach_command(command: &mut StdCommand, detach: Detach) {
    use std::os::windows::process::CommandExt;
    let flags = match detach {
        Detach::Group => CREATE_NEW_PROCESS_GROUP,
        Detach::Full => CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS,
    };
    command.creation_flags(flags);
}

#[cfg(not(any(unix, windows)))]
fn detach_command(_command: &mut StdCommand, _detach: Detach) {}
