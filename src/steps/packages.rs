use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    cmd::{CommandSpec, Runner},
    config::PackageManager,
    error::InstallerError,
    ui,
};

pub const HOMEBREW_INSTALL_URL: &str =
    "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// Where the Homebrew installer puts `brew` on Linux, Apple Silicon and Intel.
const HOMEBREW_LOCATIONS: [&str; 3] = [
    "/home/linuxbrew/.linuxbrew/bin/brew",
    "/opt/homebrew/bin/brew",
    "/usr/local/bin/brew",
];

// ── Packages ──────────────────────────────────────────────────────────────────

/// A package name plus the binary that proves it is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Package {
    pub name: &'static str,
    binary: Option<&'static str>,
}

impl Package {
    pub const fn new(name: &'static str) -> Self {
        Package { name, binary: None }
    }

    pub const fn aliased(name: &'static str, binary: &'static str) -> Self {
        Package {
            name,
            binary: Some(binary),
        }
    }

    pub fn binary(&self) -> &'static str {
        self.binary.unwrap_or(self.name)
    }
}

pub const ZSH: Package = Package::new("zsh");
pub const STOW: Package = Package::new("stow");
pub const NEOVIM: Package = Package::aliased("neovim", "nvim");
pub const TMUX: Package = Package::new("tmux");

/// Command line tools the zsh configuration expects.
pub const SHELL_TOOLS: [Package; 6] = [
    Package::new("fzf"),
    Package::aliased("ripgrep", "rg"),
    Package::new("bat"),
    Package::new("eza"),
    Package::new("zoxide"),
    Package::new("thefuck"),
];

/// Nerd font used by the powerlevel10k prompt.
pub const PROMPT_FONT_CASK: &str = "font-meslo-lg-nerd-font";

// ── Homebrew ──────────────────────────────────────────────────────────────────

/// A resolved `brew` executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homebrew {
    program: PathBuf,
}

impl Homebrew {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Homebrew {
            program: program.into(),
        }
    }

    /// Finds `brew` on PATH or at one of the installer's default prefixes.
    pub fn locate(runner: &dyn Runner) -> Option<Self> {
        runner
            .locate("brew")
            .or_else(|| {
                HOMEBREW_LOCATIONS
                    .iter()
                    .map(PathBuf::from)
                    .find(|p| p.exists())
            })
            .map(Homebrew::new)
    }

    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(self.program.to_string_lossy())
    }

    /// True if `binary` sits in Homebrew's `bin` directory, which may not be
    /// on PATH yet right after a fresh install.
    fn provides(&self, binary: &str) -> bool {
        self.program
            .parent()
            .map(|bin| bin.join(binary).exists())
            .unwrap_or(false)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Installs Homebrew unless a `brew` executable can already be found.
pub fn ensure_homebrew(runner: &dyn Runner, dry_run: bool) -> Result<Homebrew, InstallerError> {
    if let Some(brew) = Homebrew::locate(runner) {
        info!(brew = %brew.program().display(), "homebrew found");
        ui::print_skipped("homebrew");
        return Ok(brew);
    }

    // The install script asks for sudo itself and must not run as root.
    runner.cache_sudo()?;

    ui::print_info("Installing homebrew… this can take a few minutes.");
    println!();
    let install = CommandSpec::new("/bin/bash")
        .arg("-c")
        .arg(format!("curl -fsSL {} | bash", HOMEBREW_INSTALL_URL))
        .env("NONINTERACTIVE", "1");
    runner.run_interactive(&install)?;

    match Homebrew::locate(runner) {
        Some(brew) => {
            ui::print_success("homebrew installed successfully.");
            Ok(brew)
        }
        None if dry_run => Ok(Homebrew::new("brew")),
        None => Err(InstallerError::CommandNotFound("brew".to_string())),
    }
}

// ── Installation ──────────────────────────────────────────────────────────────

/// The package manager a package step goes through.
#[derive(Debug, Clone, Copy)]
pub enum Installer<'a> {
    Native(PackageManager),
    Homebrew(&'a Homebrew),
}

impl Installer<'_> {
    pub fn install_command(&self, package: &str) -> CommandSpec {
        match self {
            Installer::Native(pm) => CommandSpec::new(pm.as_str())
                .args(pm.install_args().iter().copied())
                .arg(package)
                .elevated(),
            Installer::Homebrew(brew) => brew.command().args(["install", package]),
        }
    }

    fn provides(&self, binary: &str) -> bool {
        match self {
            Installer::Native(_) => false,
            Installer::Homebrew(brew) => brew.provides(binary),
        }
    }
}

/// Installs `package` unless its binary already resolves. Re-running is
/// always safe: an installed package never reaches the package manager.
pub fn ensure_installed(
    runner: &dyn Runner,
    installer: &Installer<'_>,
    package: Package,
) -> Result<(), InstallerError> {
    let binary = package.binary();
    if runner.is_installed(binary) || installer.provides(binary) {
        info!(package = package.name, "already installed");
        ui::print_skipped(package.name);
        return Ok(());
    }

    runner.run(
        &installer.install_command(package.name),
        &format!("Installing package {}…", package.name),
        &format!("{} installed successfully.", package.name),
    )
}

/// Installs a Homebrew cask unless `brew list --casks` already lists it.
pub fn ensure_cask(runner: &dyn Runner, brew: &Homebrew, cask: &str) -> Result<(), InstallerError> {
    let listed = runner.capture(&brew.command().args(["list", "--casks"]))?;
    if listed.lines().any(|line| line.trim() == cask) {
        ui::print_skipped(cask);
        return Ok(());
    }

    runner.run(
        &brew.command().args(["install", "--cask", cask]),
        &format!("Installing font {}…", cask),
        &format!("Font {} installed successfully.", cask),
    )
}
