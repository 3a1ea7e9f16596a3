use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Bootstraps zsh, neovim, tmux and friends from the dreitagebart dotfiles")]
pub struct Cli {
    /// Print every command instead of running it; nothing on disk changes
    #[arg(long)]
    pub dry_run: bool,

    /// Install into this home directory instead of the detected one
    #[arg(long, value_name = "PATH")]
    pub home: Option<PathBuf>,

    /// Deploy templates from this directory instead of the built-in set
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Skip the logo and the "Hit ENTER" pause
    #[arg(long)]
    pub no_banner: bool,

    /// Emit debug logs on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
