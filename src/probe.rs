use std::{env, fs, path::PathBuf};

use nix::unistd::{Uid, User};
use tracing::{debug, warn};

use crate::{
    cmd::Runner,
    config::{Config, GitIdentity, PackageManager, Platform},
};

pub const OS_RELEASE: &str = "/etc/os-release";

/// The passwd entry of the user running the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
    pub home: PathBuf,
    pub shell: PathBuf,
}

/// Collects everything that can be known about the host before asking the
/// user anything. Detection misses leave fields empty; nothing here fails.
pub fn detect(runner: &dyn Runner) -> Config {
    let os_release = match fs::read_to_string(OS_RELEASE) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!(error = %e, "no {}", OS_RELEASE);
            None
        }
    };

    let user = current_user();
    let login_user = env::var("USER").ok().filter(|u| !u.is_empty());
    let fallback_home = env::var_os("HOME").map(PathBuf::from);

    let mut config = from_parts(Platform::current(), os_release.as_deref(), user, fallback_home);
    config.login_user = login_user;
    config.tmux_installed = runner.is_installed("tmux");
    config.neovim_installed = runner.is_installed("nvim");

    debug!(?config, "probed environment");
    config
}

/// Builds the initial configuration from raw detection inputs.
pub fn from_parts(
    platform: Platform,
    os_release: Option<&str>,
    user: Option<UserInfo>,
    fallback_home: Option<PathBuf>,
) -> Config {
    let distribution_id = os_release.and_then(parse_os_release_id);
    let package_manager = distribution_id
        .as_deref()
        .and_then(PackageManager::for_distribution);

    if let (Some(id), None) = (&distribution_id, package_manager) {
        warn!(distribution = %id, "no package manager known for distribution");
    }

    let (home_dir, login_shell, git) = match user {
        Some(u) => {
            let git = GitIdentity {
                email: format!("{}@example.com", u.name),
                name: u.name,
            };
            (u.home, Some(u.shell), git)
        }
        None => {
            warn!("could not read the current user from the passwd database");
            (fallback_home.unwrap_or_default(), None, GitIdentity::default())
        }
    };

    Config {
        home_dir,
        platform,
        distribution_id,
        package_manager,
        login_user: None,
        login_shell,
        tmux_installed: false,
        neovim_installed: false,
        install_tmux: false,
        install_tmux_addons: false,
        install_neovim: false,
        install_neovim_addons: false,
        git,
        dry_run: false,
    }
}

/// Returns the first `ID=` value of an os-release file, unquoted.
pub fn parse_os_release_id(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("ID="))
        .map(|v| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|v| !v.is_empty())
}

fn current_user() -> Option<UserInfo> {
    match User::from_uid(Uid::current()) {
        Ok(Some(user)) => Some(UserInfo {
            name: user.name,
            home: user.dir,
            shell: user.shell,
        }),
        Ok(None) => None,
        Err(e) => {
            debug!(error = %e, "passwd lookup failed");
            None
        }
    }
}
