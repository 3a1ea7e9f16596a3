use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use chrono::{DateTime, TimeZone};
use tracing::info;

use crate::{
    cmd::{CommandSpec, Runner},
    error::InstallerError,
    ui,
};

// ── Backup directory ──────────────────────────────────────────────────────────

/// The per-run folder that receives every file a link step would clobber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupDir {
    path: PathBuf,
}

impl BackupDir {
    /// Picks `<root>/<YYYYmmdd-HHMMSS>` for this run, suffixed with `-1`, `-2`…
    /// when a run in the same second already claimed the name.
    pub fn plan<Tz: TimeZone>(root: &Path, started: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        let stamp = started.format("%Y%m%d-%H%M%S").to_string();
        let mut path = root.join(&stamp);
        let mut n = 1;
        while path.exists() {
            path = root.join(format!("{}-{}", stamp, n));
            n += 1;
        }
        BackupDir { path }
    }

    pub fn create(self) -> Result<Self, InstallerError> {
        fs::create_dir_all(&self.path)?;
        info!(backup = %self.path.display(), "backup directory created");
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ── Backup and link ───────────────────────────────────────────────────────────

/// Moves clobbered dotfiles out of the way, then lets `stow` link the managed
/// template in their place.
pub struct Linker<'a> {
    pub runner: &'a dyn Runner,
    pub home: &'a Path,
    /// `~/.dreitagebart`, the stow directory.
    pub managed_root: &'a Path,
    pub backup: &'a BackupDir,
    pub dry_run: bool,
}

impl Linker<'_> {
    /// Links `template` so that it provides `home/target`.
    pub fn link(&self, target: &str, template: &str) -> Result<(), InstallerError> {
        let rel = Path::new(target);
        self.back_up(rel)?;

        let stow = CommandSpec::new("stow")
            .arg(template)
            .arg(format!("--dir={}", self.managed_root.display()))
            .arg(format!("--target={}", self.home.display()))
            .arg("--dotfiles");
        self.runner.run(
            &stow,
            &format!("Linking {}…", target),
            &format!("{} linked to the {} template.", target, template),
        )
    }

    /// Moves an existing `home/rel` into the backup directory. Returns whether
    /// anything was (or in a dry run, would be) moved.
    pub fn back_up(&self, rel: &Path) -> Result<bool, InstallerError> {
        let target = self.home.join(rel);
        let backup_err = |source: io::Error| InstallerError::Backup {
            path: target.clone(),
            source,
        };

        let meta = match fs::symlink_metadata(&target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(backup_err(e)),
        };

        if (meta.file_type().is_symlink() && self.points_into_managed_root(&target))
            || self.resolves_into_managed_root(&target)
        {
            info!(target = %target.display(), "already linked");
            return Ok(false);
        }

        let dest = self.backup.path().join(rel);
        if self.dry_run {
            ui::print_info(&format!(
                "[dry-run] would move {} to {}",
                target.display(),
                dest.display()
            ));
            return Ok(true);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(backup_err)?;
        }
        // A rename moves symlinks as links and directories as a whole.
        fs::rename(&target, &dest).map_err(backup_err)?;

        ui::print_warning(&format!(
            "Existing {} moved to {}",
            target.display(),
            dest.display()
        ));
        Ok(true)
    }

    fn points_into_managed_root(&self, link: &Path) -> bool {
        let Ok(dest) = fs::read_link(link) else {
            return false;
        };
        let resolved = match link.parent() {
            Some(parent) if dest.is_relative() => parent.join(dest),
            _ => dest,
        };
        normalize(&resolved).starts_with(normalize(self.managed_root))
    }

    /// Catches targets reached through a folded parent, e.g. `~/.config`
    /// itself linked into the managed root by an earlier stow run.
    fn resolves_into_managed_root(&self, target: &Path) -> bool {
        match (fs::canonicalize(target), fs::canonicalize(self.managed_root)) {
            (Ok(target), Ok(root)) => target.starts_with(root),
            _ => false,
        }
    }
}

/// Resolves `.` and `..` lexically, without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::symlink;

    use chrono::{Local, NaiveDate};

    use super::*;
    use crate::cmd::test_helpers::RecordingRunner;

    struct Home {
        _tmp: tempfile::TempDir,
        home: PathBuf,
        managed: PathBuf,
        backup: BackupDir,
    }

    fn home() -> Home {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().to_path_buf();
        let managed = home.join(".dreitagebart");
        let backup = BackupDir {
            path: managed.join("backups/20240101-120000"),
        }
        .create()
        .unwrap();
        Home {
            _tmp: tmp,
            home,
            managed,
            backup,
        }
    }

    fn linker<'a>(h: &'a Home, runner: &'a RecordingRunner) -> Linker<'a> {
        Linker {
            runner,
            home: &h.home,
            managed_root: &h.managed,
            backup: &h.backup,
            dry_run: false,
        }
    }

    #[test]
    fn existing_file_is_moved_byte_identically() {
        let h = home();
        fs::write(h.home.join(".gitconfig"), "X").unwrap();
        let runner = RecordingRunner::new();

        linker(&h, &runner).link(".gitconfig", "git").unwrap();

        assert_eq!(
            fs::read_to_string(h.home.join(".dreitagebart/backups/20240101-120000/.gitconfig"))
                .unwrap(),
            "X"
        );
        assert!(fs::symlink_metadata(h.home.join(".gitconfig")).is_err());
        assert_eq!(
            runner.command_lines(),
            [format!(
                "stow git --dir={} --target={} --dotfiles",
                h.managed.display(),
                h.home.display()
            )]
        );
    }

    #[test]
    fn existing_directory_is_relocated_whole() {
        let h = home();
        let nvim = h.home.join(".config/nvim");
        fs::create_dir_all(nvim.join("lua")).unwrap();
        fs::write(nvim.join("init.lua"), "a").unwrap();
        fs::write(nvim.join("lua/plugins.lua"), "b").unwrap();
        let runner = RecordingRunner::new();

        linker(&h, &runner).link(".config/nvim", "nvim").unwrap();

        let moved = h.backup.path().join(".config/nvim");
        assert_eq!(fs::read_to_string(moved.join("init.lua")).unwrap(), "a");
        assert_eq!(fs::read_to_string(moved.join("lua/plugins.lua")).unwrap(), "b");
        assert!(!nvim.exists());
        assert!(h.home.join(".config").is_dir());
    }

    #[test]
    fn missing_target_goes_straight_to_stow() {
        let h = home();
        let runner = RecordingRunner::new();

        linker(&h, &runner).link(".zshrc", "zsh").unwrap();

        assert_eq!(fs::read_dir(h.backup.path()).unwrap().count(), 0);
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(runner.calls()[0].program, "stow");
    }

    #[test]
    fn foreign_symlink_is_moved_not_followed() {
        let h = home();
        let elsewhere = h.home.join("elsewhere.conf");
        fs::write(&elsewhere, "mine").unwrap();
        symlink(&elsewhere, h.home.join(".tmux.conf")).unwrap();
        let runner = RecordingRunner::new();

        assert!(linker(&h, &runner).back_up(Path::new(".tmux.conf")).unwrap());

        let moved = h.backup.path().join(".tmux.conf");
        assert!(fs::symlink_metadata(&moved).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&moved).unwrap(), elsewhere);
        assert_eq!(fs::read_to_string(&elsewhere).unwrap(), "mine");
    }

    #[test]
    fn dangling_symlink_is_still_moved() {
        let h = home();
        symlink(h.home.join("gone"), h.home.join(".zshrc")).unwrap();
        let runner = RecordingRunner::new();

        assert!(linker(&h, &runner).back_up(Path::new(".zshrc")).unwrap());
        assert!(fs::symlink_metadata(h.backup.path().join(".zshrc")).is_ok());
    }

    #[test]
    fn managed_symlink_is_left_for_stow() {
        let h = home();
        fs::create_dir_all(h.managed.join("git")).unwrap();
        fs::write(h.managed.join("git/dot-gitconfig"), "").unwrap();
        symlink(".dreitagebart/git/dot-gitconfig", h.home.join(".gitconfig")).unwrap();
        let runner = RecordingRunner::new();

        assert!(!linker(&h, &runner).back_up(Path::new(".gitconfig")).unwrap());
        assert!(fs::symlink_metadata(h.home.join(".gitconfig")).is_ok());
    }

    #[test]
    fn template_behind_folded_parent_is_not_backed_up() {
        let h = home();
        let template = h.managed.join("nvim/dot-config/nvim");
        fs::create_dir_all(&template).unwrap();
        fs::write(template.join("init.lua"), "-- managed").unwrap();
        symlink(".dreitagebart/nvim/dot-config", h.home.join(".config")).unwrap();
        let runner = RecordingRunner::new();

        linker(&h, &runner).link(".config/nvim", "nvim").unwrap();

        assert_eq!(
            fs::read_to_string(template.join("init.lua")).unwrap(),
            "-- managed"
        );
        assert!(!h.backup.path().join(".config").exists());
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn dry_run_moves_nothing() {
        let h = home();
        fs::write(h.home.join(".zshrc"), "keep").unwrap();
        let runner = RecordingRunner::new();
        let mut linker = linker(&h, &runner);
        linker.dry_run = true;

        assert!(linker.back_up(Path::new(".zshrc")).unwrap());
        assert_eq!(fs::read_to_string(h.home.join(".zshrc")).unwrap(), "keep");
    }

    #[test]
    fn stow_failure_is_fatal() {
        let h = home();
        let runner = RecordingRunner::new().failing_on("stow");
        let err = linker(&h, &runner).link(".zshrc", "zsh").unwrap_err();
        assert!(matches!(err, InstallerError::CommandFailed(ref p, _) if p == "stow"));
    }

    #[test]
    fn backup_dir_is_named_after_the_run_and_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let started = Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
            )
            .unwrap();

        let first = BackupDir::plan(tmp.path(), &started).create().unwrap();
        assert_eq!(first.path(), tmp.path().join("20240101-120000"));
        assert!(first.path().is_dir());

        let second = BackupDir::plan(tmp.path(), &started).create().unwrap();
        assert_eq!(second.path(), tmp.path().join("20240101-120000-1"));
    }

    #[test]
    fn normalize_resolves_parent_components() {
        assert_eq!(
            normalize(Path::new("/home/j/.config/../.dreitagebart/./nvim")),
            PathBuf::from("/home/j/.dreitagebart/nvim")
        );
    }
}
