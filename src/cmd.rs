use std::{
    cell::Cell,
    fmt, io,
    path::PathBuf,
    process::{Command, Stdio},
    thread,
    time::Duration,
};

use tracing::debug;

use crate::{error::InstallerError, ui};

// ── Command builder ───────────────────────────────────────────────────────────

/// A single external command, described as data so every call site shares the
/// same spinner, privilege and error handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Run through `sudo`.
    pub elevated: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            elevated: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    fn to_command(&self) -> Command {
        let mut command = if self.elevated {
            let mut c = Command::new("sudo");
            c.arg(&self.program);
            c
        } else {
            Command::new(&self.program)
        };
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }

    /// Name reported in errors: `sudo` is an implementation detail.
    fn label(&self) -> &str {
        &self.program
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elevated {
            f.write_str("sudo ")?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

// ── Runner ────────────────────────────────────────────────────────────────────

/// Executes [`CommandSpec`]s and answers PATH lookups.
pub trait Runner {
    /// Runs silently behind a spinner. Prints `done_msg` with a ✓ on success,
    /// the captured output on failure.
    fn run(&self, cmd: &CommandSpec, spin_msg: &str, done_msg: &str)
        -> Result<(), InstallerError>;

    /// Runs with the terminal handed over to the child.
    fn run_interactive(&self, cmd: &CommandSpec) -> Result<(), InstallerError>;

    /// Runs and returns stdout.
    fn capture(&self, cmd: &CommandSpec) -> Result<String, InstallerError>;

    /// Resolves `program` on PATH.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Asks for the sudo password once per run, so the prompt never ends up
    /// hidden behind a spinner.
    fn cache_sudo(&self) -> Result<(), InstallerError>;

    fn is_installed(&self, program: &str) -> bool {
        self.locate(program).is_some()
    }
}

fn not_found_or_io(program: &str, err: io::Error) -> InstallerError {
    if err.kind() == io::ErrorKind::NotFound {
        InstallerError::CommandNotFound(program.to_string())
    } else {
        InstallerError::Io(err)
    }
}

fn print_captured_output(stdout: &[u8], stderr: &[u8]) {
    let out = String::from_utf8_lossy(stdout);
    let err = String::from_utf8_lossy(stderr);
    if !out.trim().is_empty() {
        eprintln!("{}", out.trim());
    }
    if !err.trim().is_empty() {
        eprintln!("{}", err.trim());
    }
}

/// Runs real processes, or only pretends to when `dry_run` is set.
#[derive(Debug)]
pub struct SystemRunner {
    dry_run: bool,
    sudo_cached: Cell<bool>,
}

impl SystemRunner {
    pub fn new(dry_run: bool) -> Self {
        SystemRunner {
            dry_run,
            sudo_cached: Cell::new(false),
        }
    }

    fn cache_sudo_for(&self, cmd: &CommandSpec) -> Result<(), InstallerError> {
        if cmd.elevated {
            self.cache_sudo()?;
        }
        Ok(())
    }

    fn simulate(&self, cmd: &CommandSpec) {
        ui::print_info(&format!("[dry-run] {}", cmd));
        thread::sleep(Duration::from_millis(300));
    }
}

impl Runner for SystemRunner {
    fn run(
        &self,
        cmd: &CommandSpec,
        spin_msg: &str,
        done_msg: &str,
    ) -> Result<(), InstallerError> {
        debug!(command = %cmd, "running");
        if self.dry_run {
            let pb = ui::spinner(spin_msg);
            self.simulate(cmd);
            ui::done_spinner(pb, done_msg);
            return Ok(());
        }

        self.cache_sudo_for(cmd)?;

        let pb = ui::spinner(spin_msg);
        let result = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| not_found_or_io(cmd.label(), e));
        pb.finish_and_clear();

        match result {
            Err(e) => Err(e),
            Ok(output) if !output.status.success() => {
                print_captured_output(&output.stdout, &output.stderr);
                Err(InstallerError::CommandFailed(
                    cmd.label().to_string(),
                    output.status.code().unwrap_or(-1),
                ))
            }
            Ok(_) => {
                ui::print_success(done_msg);
                Ok(())
            }
        }
    }

    fn run_interactive(&self, cmd: &CommandSpec) -> Result<(), InstallerError> {
        debug!(command = %cmd, "running interactively");
        if self.dry_run {
            self.simulate(cmd);
            return Ok(());
        }

        self.cache_sudo_for(cmd)?;

        let status = cmd
            .to_command()
            .status()
            .map_err(|e| not_found_or_io(cmd.label(), e))?;

        if !status.success() {
            return Err(InstallerError::CommandFailed(
                cmd.label().to_string(),
                status.code().unwrap_or(-1),
            ));
        }
        Ok(())
    }

    fn capture(&self, cmd: &CommandSpec) -> Result<String, InstallerError> {
        debug!(command = %cmd, "capturing");
        if self.dry_run {
            return Ok(String::new());
        }

        self.cache_sudo_for(cmd)?;

        let output = cmd
            .to_command()
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| not_found_or_io(cmd.label(), e))?;

        if !output.status.success() {
            return Err(InstallerError::CommandFailed(
                cmd.label().to_string(),
                output.status.code().unwrap_or(-1),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn cache_sudo(&self) -> Result<(), InstallerError> {
        if self.dry_run || self.sudo_cached.get() {
            return Ok(());
        }

        debug!("caching sudo credentials");
        let status = Command::new("sudo")
            .arg("-v")
            .status()
            .map_err(|e| not_found_or_io("sudo", e))?;

        if !status.success() {
            return Err(InstallerError::CommandFailed(
                "sudo".to_string(),
                status.code().unwrap_or(-1),
            ));
        }

        self.sudo_cached.set(true);
        Ok(())
    }
}

// ── Test double ───────────────────────────────────────────────────────────────
