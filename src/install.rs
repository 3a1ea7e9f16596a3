use chrono::{DateTime, Local};
use tracing::info;

use crate::{
    assets::AssetProvider,
    cmd::Runner,
    config::{Config, Platform},
    error::InstallerError,
    steps::{
        gitconfig,
        link::{BackupDir, Linker},
        packages::{self, Installer, Package},
        shell, templates,
    },
    ui,
};

const TOTAL_STEPS: u8 = 8;

/// Runs every installation step in order. The first failure stops the run;
/// nothing already done is rolled back, and re-running picks up where it left.
pub fn run(
    config: &Config,
    runner: &dyn Runner,
    assets: &dyn AssetProvider,
) -> Result<(), InstallerError> {
    run_started_at(config, runner, assets, Local::now())
}

pub fn run_started_at(
    config: &Config,
    runner: &dyn Runner,
    assets: &dyn AssetProvider,
    started: DateTime<Local>,
) -> Result<(), InstallerError> {
    if config.home_dir.as_os_str().is_empty() {
        return Err(InstallerError::MissingHome);
    }
    let managed_root = config.managed_root();

    // ── Step 1: Homebrew ──────────────────────────────────────────────────────
    ui::print_step(1, TOTAL_STEPS, "Homebrew");
    let brew = packages::ensure_homebrew(runner, config.dry_run)?;

    // ── Step 2: Native packages ───────────────────────────────────────────────
    ui::print_step(2, TOTAL_STEPS, "System Packages");
    let native = match config.platform {
        Platform::MacOs => Installer::Homebrew(&brew),
        Platform::Linux => Installer::Native(
            config
                .package_manager
                .ok_or(InstallerError::NoPackageManager)?,
        ),
    };
    for package in native_packages(config) {
        packages::ensure_installed(runner, &native, package)?;
    }

    // ── Step 3: Shell tools ───────────────────────────────────────────────────
    ui::print_step(3, TOTAL_STEPS, "Shell Tools");
    let homebrew = Installer::Homebrew(&brew);
    for package in packages::SHELL_TOOLS {
        packages::ensure_installed(runner, &homebrew, package)?;
    }

    // ── Step 4: Fonts ─────────────────────────────────────────────────────────
    ui::print_step(4, TOTAL_STEPS, "Fonts");
    if config.platform == Platform::MacOs {
        packages::ensure_cask(runner, &brew, packages::PROMPT_FONT_CASK)?;
    } else {
        ui::print_info("Font casks are macOS only. Install a Nerd Font with your terminal.");
    }

    // ── Step 5: Templates ─────────────────────────────────────────────────────
    ui::print_step(5, TOTAL_STEPS, "Configuration Templates");
    if config.dry_run {
        ui::print_info(&format!("[dry-run] would deploy templates to {}", managed_root.display()));
    } else {
        let written = templates::deploy_tree(assets, &managed_root)?;
        ui::print_success(&format!(
            "{} template files written to {}.",
            written,
            managed_root.display()
        ));
    }

    // ── Step 6: Git identity ──────────────────────────────────────────────────
    ui::print_step(6, TOTAL_STEPS, "Git Identity");
    let gitconfig_path = managed_root.join("git").join("dot-gitconfig");
    if config.dry_run {
        ui::print_info(&format!(
            "[dry-run] would set user.name = {}, user.email = {}",
            config.git.name, config.git.email
        ));
    } else {
        gitconfig::configure(&gitconfig_path, &config.git)?;
        ui::print_success(&format!("Git identity set to {} <{}>.", config.git.name, config.git.email));
    }

    // ── Step 7: Backup and link ───────────────────────────────────────────────
    ui::print_step(7, TOTAL_STEPS, "Linking Dotfiles");
    let backup = BackupDir::plan(&config.backups_root(), &started);
    let backup = if config.dry_run { backup } else { backup.create()? };
    ui::print_info(&format!("Replaced files go to {}", backup.path().display()));

    let linker = Linker {
        runner,
        home: &config.home_dir,
        managed_root: &managed_root,
        backup: &backup,
        dry_run: config.dry_run,
    };
    for (target, template) in links(config) {
        linker.link(target, template)?;
    }

    // ── Step 8: Default shell ─────────────────────────────────────────────────
    ui::print_step(8, TOTAL_STEPS, "Default Shell");
    shell::set_default_shell(runner, config)?;

    info!("installation finished");
    Ok(())
}

fn native_packages(config: &Config) -> Vec<Package> {
    let mut list = vec![packages::ZSH, packages::STOW];
    if config.install_neovim {
        list.push(packages::NEOVIM);
    }
    if config.install_tmux {
        list.push(packages::TMUX);
    }
    list
}

/// `(path under $HOME, template package)` pairs to hand to stow.
fn links(config: &Config) -> Vec<(&'static str, &'static str)> {
    let mut list = vec![(".gitconfig", "git"), (".zshrc", "zsh"), (".p10k.zsh", "p10k")];
    if config.install_tmux_addons {
        list.push((".tmux.conf", "tmux"));
    }
    if config.install_neovim_addons {
        list.push((".config/nvim", "nvim"));
    }
    list
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use chrono::TimeZone;

    use super::*;
    use crate::{
        assets::EmbeddedAssets,
        cmd::test_helpers::RecordingRunner,
        config::{GitIdentity, PackageManager},
    };

    fn config(home: PathBuf) -> Config {
        Config {
            home_dir: home,
            platform: Platform::Linux,
            distribution_id: Some("ubuntu".to_string()),
            package_manager: Some(PackageManager::Apt),
            login_user: Some("jane".to_string()),
            login_shell: Some(PathBuf::from("/nonexistent/bin/zsh")),
            tmux_installed: false,
            neovim_installed: false,
            install_tmux: true,
            install_tmux_addons: true,
            install_neovim: true,
            install_neovim_addons: true,
            git: GitIdentity {
                name: "Jane Doe".to_string(),
                email: "jane@doe.dev".to_string(),
            },
            dry_run: false,
        }
    }

    fn started() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn everything_installed() -> RecordingRunner {
        RecordingRunner::new()
            .with_binary("brew", "/nonexistent/brew/bin/brew")
            .with_binary("zsh", "/nonexistent/bin/zsh")
            .with_installed(&[
                "stow", "nvim", "tmux", "fzf", "rg", "bat", "eza", "zoxide", "thefuck",
            ])
    }

    #[test]
    fn second_run_only_relinks() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(".gitconfig"), "X").unwrap();
        let config = config(tmp.path().to_path_buf());
        let runner = everything_installed();

        run_started_at(&config, &runner, &EmbeddedAssets::templates(), started()).unwrap();

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.starts_with("stow ")));
        let templates: Vec<_> = runner.calls().iter().map(|c| c.args[0].clone()).collect();
        assert_eq!(templates, ["git", "zsh", "p10k", "tmux", "nvim"]);

        let backup = tmp.path().join(".dreitagebart/backups/20240101-120000");
        assert_eq!(fs::read_to_string(backup.join(".gitconfig")).unwrap(), "X");
        assert!(!tmp.path().join(".gitconfig").exists());

        let gitconfig =
            fs::read_to_string(tmp.path().join(".dreitagebart/git/dot-gitconfig")).unwrap();
        assert!(gitconfig.contains("\tname = Jane Doe\n\temail = jane@doe.dev\n"));
        assert!(tmp.path().join(".dreitagebart/nvim/dot-config/nvim/init.lua").is_file());
    }

    #[test]
    fn fresh_host_installs_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path().to_path_buf());
        let runner = RecordingRunner::new()
            .with_binary("brew", "/nonexistent/brew/bin/brew")
            .with_binary("zsh", "/nonexistent/bin/zsh");

        run_started_at(&config, &runner, &EmbeddedAssets::templates(), started()).unwrap();

        let lines = runner.command_lines();
        // zsh itself is registered so the shell step can resolve it.
        let expected_prefix = [
            "sudo apt install -y stow",
            "sudo apt install -y neovim",
            "sudo apt install -y tmux",
            "/nonexistent/brew/bin/brew install fzf",
            "/nonexistent/brew/bin/brew install ripgrep",
            "/nonexistent/brew/bin/brew install bat",
            "/nonexistent/brew/bin/brew install eza",
            "/nonexistent/brew/bin/brew install zoxide",
            "/nonexistent/brew/bin/brew install thefuck",
        ];
        assert_eq!(&lines[..expected_prefix.len()], expected_prefix);
    }

    #[test]
    fn skipped_addons_are_not_linked() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config(tmp.path().to_path_buf());
        config.install_tmux = false;
        config.install_tmux_addons = false;
        config.install_neovim_addons = false;
        let runner = everything_installed();

        run_started_at(&config, &runner, &EmbeddedAssets::templates(), started()).unwrap();

        let templates: Vec<_> = runner.calls().iter().map(|c| c.args[0].clone()).collect();
        assert_eq!(templates, ["git", "zsh", "p10k"]);
    }

    #[test]
    fn first_failure_stops_the_run() {
        let tmp = tempfile::tempdir().unwrap();
        let config = config(tmp.path().to_path_buf());
        let runner = RecordingRunner::new()
            .with_binary("brew", "/nonexistent/brew/bin/brew")
            .failing_on("apt");

        let err = run_started_at(&config, &runner, &EmbeddedAssets::templates(), started())
            .unwrap_err();

        assert!(matches!(err, InstallerError::CommandFailed(ref p, _) if p == "apt"));
        assert_eq!(runner.calls().len(), 1);
        assert!(!tmp.path().join(".dreitagebart").exists());
    }

    #[test]
    fn linux_without_package_manager_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = config(tmp.path().to_path_buf());
        config.package_manager = None;
        let err = run_started_at(&config, &everything_installed(), &EmbeddedAssets::templates(), started())
            .unwrap_err();
        assert!(matches!(err, InstallerError::NoPackageManager));
    }

    #[test]
    fn dry_run_leaves_home_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(".zshrc"), "keep").unwrap();
        let mut config = config(tmp.path().to_path_buf());
        config.dry_run = true;
        let runner = everything_installed();

        run_started_at(&config, &runner, &EmbeddedAssets::templates(), started()).unwrap();

        assert!(!tmp.path().join(".dreitagebart").exists());
        assert_eq!(fs::read_to_string(tmp.path().join(".zshrc")).unwrap(), "keep");
    }

    #[test]
    fn empty_home_is_rejected() {
        let config = config(PathBuf::new());
        let err = run_started_at(&config, &everything_installed(), &EmbeddedAssets::templates(), started())
            .unwrap_err();
        assert!(matches!(err, InstallerError::MissingHome));
    }
}
