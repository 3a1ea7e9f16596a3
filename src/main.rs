mod assets;
mod cli;
mod cmd;
mod config;
mod error;
mod install;
mod logging;
mod probe;
mod questionnaire;
mod steps;
mod ui;

use clap::Parser;
use tracing::debug;

use assets::{AssetProvider, DirAssets, EmbeddedAssets};
use cli::Cli;
use cmd::{Runner, SystemRunner};
use config::Config;
use error::InstallerError;
use questionnaire::{Outcome, Prompter};

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        println!();
        ui::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), InstallerError> {
    let runner = SystemRunner::new(cli.dry_run);
    let detected = probe::detect(&runner);
    session(cli, detected, &runner, &ui::DialoguerPrompter::new())
}

/// Everything after host detection: welcome, questionnaire, installation.
fn session(
    cli: Cli,
    mut config: Config,
    runner: &dyn Runner,
    prompter: &dyn Prompter,
) -> Result<(), InstallerError> {
    if let Some(home) = cli.home {
        config.home_dir = home;
    }
    config.dry_run = cli.dry_run;
    debug!(?config, "detected host");

    // ── Welcome ───────────────────────────────────────────────────────────────
    if !cli.no_banner {
        ui::print_banner();
        ui::wait_for_enter()?;
    }

    if config.dry_run {
        ui::print_warning("DRY-RUN MODE: commands are printed, nothing is installed or moved.");
    }

    // ── Questionnaire ─────────────────────────────────────────────────────────
    let config = match questionnaire::run(config, prompter)? {
        Outcome::Confirmed(config) => config,
        Outcome::Declined => {
            ui::print_info("Nothing was changed. See you next time!");
            return Ok(());
        }
    };

    // ── Installation ──────────────────────────────────────────────────────────
    let assets: Box<dyn AssetProvider> = match cli.templates {
        Some(dir) => Box::new(DirAssets::new(dir)),
        None => Box::new(EmbeddedAssets::templates()),
    };
    install::run(&config, runner, assets.as_ref())?;

    println!();
    ui::print_success("All done! Open a new terminal to start using zsh.");
    Ok(())
}
