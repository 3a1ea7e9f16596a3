//! The interactive part of the installer.
//!
//! Questions are a fixed sequence of states. Each state decides from the
//! detection results and the answers collected so far whether it is shown at
//! all, so the prompt groups never need to know about each other.

use tracing::info;

use crate::{
    config::{Config, PackageManager, Platform},
    error::InstallerError,
};

/// Rendering backend for the questionnaire.
pub trait Prompter {
    fn note(&self, msg: &str);

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, InstallerError>;

    /// Re-prompts until `validate` accepts the answer.
    fn input(
        &self,
        prompt: &str,
        default: &str,
        validate: fn(&str) -> Result<(), String>,
    ) -> Result<String, InstallerError>;

    fn select(&self, prompt: &str, items: &[&str], default: usize)
        -> Result<usize, InstallerError>;

    fn summary(&self, rows: &[(&str, &str)]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    AskPackageManager,
    AskGitIdentity,
    AskTmux,
    AskTmuxAddons,
    AskNeovim,
    AskNeovimAddons,
    Confirm,
}

impl Question {
    pub fn first() -> Self {
        Question::AskPackageManager
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Question::AskPackageManager => Some(Question::AskGitIdentity),
            Question::AskGitIdentity => Some(Question::AskTmux),
            Question::AskTmux => Some(Question::AskTmuxAddons),
            Question::AskTmuxAddons => Some(Question::AskNeovim),
            Question::AskNeovim => Some(Question::AskNeovimAddons),
            Question::AskNeovimAddons => Some(Question::Confirm),
            Question::Confirm => None,
        }
    }

    pub fn is_visible(self, config: &Config) -> bool {
        match self {
            Question::AskPackageManager => config.platform == Platform::Linux,
            Question::AskGitIdentity | Question::Confirm => true,
            Question::AskTmux => !config.tmux_installed,
            Question::AskTmuxAddons => config.tmux_installed || config.install_tmux,
            Question::AskNeovim => !config.neovim_installed,
            Question::AskNeovimAddons => config.neovim_installed || config.install_neovim,
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Confirmed(Config),
    Declined,
}

enum Flow {
    Continue,
    Declined,
}

/// Walks every question in order and returns the final configuration, or
/// `Declined` when the user says no to the last confirmation.
pub fn run(mut config: Config, prompter: &dyn Prompter) -> Result<Outcome, InstallerError> {
    config.install_tmux = !config.tmux_installed;
    config.install_neovim = !config.neovim_installed;
    config.install_tmux_addons = true;
    config.install_neovim_addons = true;

    let mut state = Some(Question::first());
    while let Some(question) = state {
        if question.is_visible(&config) {
            if let Flow::Declined = ask(question, &mut config, prompter)? {
                info!("installer declined at final confirmation");
                return Ok(Outcome::Declined);
            }
        } else {
            hide(question, &mut config);
        }
        state = question.next();
    }

    Ok(Outcome::Confirmed(config))
}

/// A hidden addon question means there is nothing to put the addons on.
fn hide(question: Question, config: &mut Config) {
    match question {
        Question::AskTmuxAddons => config.install_tmux_addons = false,
        Question::AskNeovimAddons => config.install_neovim_addons = false,
        _ => {}
    }
}

fn ask(
    question: Question,
    config: &mut Config,
    prompter: &dyn Prompter,
) -> Result<Flow, InstallerError> {
    match question {
        Question::AskPackageManager => {
            let title = match (&config.distribution_id, config.package_manager) {
                (Some(id), Some(pm)) => format!(
                    "It seems that you are using {} - I will use {} for installing your software packages. Is this okay?",
                    id, pm
                ),
                (Some(id), None) => format!(
                    "I don't know which package manager {} uses. Please pick one:",
                    id
                ),
                (None, _) => {
                    "I could not detect your linux distribution. Which package manager should I use?"
                        .to_string()
                }
            };
            let items: Vec<&str> = PackageManager::ALL.iter().map(|pm| pm.as_str()).collect();
            let default = config
                .package_manager
                .and_then(|pm| PackageManager::ALL.iter().position(|p| *p == pm))
                .unwrap_or(0);

            let idx = prompter.select(&title, &items, default)?;
            config.package_manager = PackageManager::ALL.get(idx).copied();
        }

        Question::AskGitIdentity => {
            prompter.note("What's your name and email? I will put this information in your .gitconfig file");
            config.git.name = prompter.input("Your name", &config.git.name, validate_name)?;
            config.git.email = prompter.input("Your email", &config.git.email, validate_email)?;
        }

        Question::AskTmux => {
            config.install_tmux = prompter.confirm("Do you want to install Tmux?", true)?;
        }

        Question::AskTmuxAddons => {
            let prompt = if config.tmux_installed {
                "Tmux is already installed - install tmux theme and plugins?"
            } else {
                "Do you want to install tmux themes and plugins as well?"
            };
            config.install_tmux_addons = prompter.confirm(prompt, true)?;
        }

        Question::AskNeovim => {
            config.install_neovim = prompter.confirm("Do you want to install NeoVim?", true)?;
        }

        Question::AskNeovimAddons => {
            let prompt = if config.neovim_installed {
                "Neovim is already installed - install neovim theme and plugins?"
            } else {
                "Do you want to install neovim themes and plugins as well?"
            };
            config.install_neovim_addons = prompter.confirm(prompt, true)?;
        }

        Question::Confirm => {
            let packages = match (config.platform, config.package_manager) {
                (Platform::MacOs, _) => "homebrew".to_string(),
                (Platform::Linux, Some(pm)) => format!("{} + homebrew", pm),
                (Platform::Linux, None) => "homebrew".to_string(),
            };
            let tmux = component_plan(config.install_tmux, config.install_tmux_addons);
            let neovim = component_plan(config.install_neovim, config.install_neovim_addons);
            prompter.summary(&[
                ("packages", packages.as_str()),
                ("git name", config.git.name.as_str()),
                ("git email", config.git.email.as_str()),
                ("tmux", tmux),
                ("neovim", neovim),
            ]);

            if !prompter.confirm("Are you sure you want to run the installer?", true)? {
                return Ok(Flow::Declined);
            }
        }
    }

    Ok(Flow::Continue)
}

fn component_plan(install: bool, addons: bool) -> &'static str {
    match (install, addons) {
        (true, true) => "install + theme/plugins",
        (true, false) => "install",
        (false, true) => "theme/plugins",
        (false, false) => "skip",
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name must not be empty".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if is_valid_email(email.trim()) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid email address", email.trim()))
    }
}

/// Accepts `local@domain.tld`: one `@`, no whitespace, a dotted domain without
/// empty labels.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| !label.is_empty())
}
