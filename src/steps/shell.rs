use std::{fs, path::Path};

use tracing::info;

use crate::{
    cmd::{CommandSpec, Runner},
    config::Config,
    error::InstallerError,
    ui,
};

/// Makes zsh the login shell of `$USER` via `sudo chsh`.
pub fn set_default_shell(runner: &dyn Runner, config: &Config) -> Result<(), InstallerError> {
    let user = config
        .login_user
        .as_deref()
        .ok_or(InstallerError::MissingUser)?;

    let zsh = match runner.locate("zsh") {
        Some(path) => path,
        // zsh was only pretended to be installed.
        None if config.dry_run => {
            ui::print_warning("[dry-run] zsh is not on PATH yet, skipping chsh.");
            return Ok(());
        }
        None => return Err(InstallerError::ZshNotFound),
    };

    if let Some(current) = &config.login_shell {
        if same_file(current, &zsh) {
            info!(shell = %zsh.display(), "zsh already the login shell");
            ui::print_success("ZSH is already your default shell.");
            return Ok(());
        }
    }

    let chsh = CommandSpec::new("chsh")
        .arg("-s")
        .arg(zsh.to_string_lossy())
        .arg(user)
        .elevated();
    runner.run_interactive(&chsh)?;

    ui::print_success("ZSH is now your default shell.");
    Ok(())
}

/// `/bin/zsh` and `/usr/bin/zsh` are often the same binary.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
