use std::{fmt, path::PathBuf};

/// Directory under `$HOME` that holds the deployed templates and backups.
pub const MANAGED_DIR: &str = ".dreitagebart";

/// Holds everything the installer knows about the host and the user's choices.
///
/// Filled in by the prober, refined by the questionnaire and read-only once the
/// orchestrator starts.
#[derive(Debug, Clone)]
pub struct Config {
    pub home_dir: PathBuf,
    pub platform: Platform,
    pub distribution_id: Option<String>,
    pub package_manager: Option<PackageManager>,
    pub login_user: Option<String>,
    pub login_shell: Option<PathBuf>,
    pub tmux_installed: bool,
    pub neovim_installed: bool,
    pub install_tmux: bool,
    pub install_tmux_addons: bool,
    pub install_neovim: bool,
    pub install_neovim_addons: bool,
    pub git: GitIdentity,
    pub dry_run: bool,
}

impl Config {
    /// Root of the managed template tree, `~/.dreitagebart`.
    pub fn managed_root(&self) -> PathBuf {
        self.home_dir.join(MANAGED_DIR)
    }

    /// Parent of every per-run backup directory.
    pub fn backups_root(&self) -> PathBuf {
        self.managed_root().join("backups")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

/// Native package managers the installer knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Pacman,
}

impl PackageManager {
    pub const ALL: [PackageManager; 3] = [
        PackageManager::Apt,
        PackageManager::Dnf,
        PackageManager::Pacman,
    ];

    /// Maps an os-release `ID` to the distribution's package manager.
    pub fn for_distribution(id: &str) -> Option<Self> {
        match id {
            "arch" | "manjaro" => Some(PackageManager::Pacman),
            "debian" | "ubuntu" | "raspbian" | "linuxmint" | "pop" => Some(PackageManager::Apt),
            "fedora" | "rocky" | "almalinux" => Some(PackageManager::Dnf),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Pacman => "pacman",
        }
    }

    /// Arguments that precede the package name in an install command.
    pub fn install_args(self) -> &'static [&'static str] {
        match self {
            PackageManager::Apt => &["install", "-y"],
            PackageManager::Dnf => &["install", "-y"],
            PackageManager::Pacman => &["-Suy", "--noconfirm"],
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
