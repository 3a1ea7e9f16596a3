use console::{style, Term};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::{error::InstallerError, questionnaire::Prompter};

// ── Terminal helpers ──────────────────────────────────────────────────────────

fn term_width() -> usize {
    Term::stdout().size().1.max(60) as usize
}

// ── Banner ────────────────────────────────────────────────────────────────────

pub fn print_banner() {
    let _ = Term::stdout().clear_screen();

    let logo = [
        r"       _       _    __ _ _",
        r"      | |     | |  / _(_) |",
        r"    __| | ___ | |_| |_ _| | ___  ___",
        r"   / _` |/ _ \| __|  _| | |/ _ \/ __|",
        r"  | (_| | (_) | |_| | | | |  __/\__ \",
        r" (_)__,_|\___/ \__|_| |_|_|\___||___/",
    ];

    println!();
    for line in &logo {
        println!("{}", style(line).magenta().bold());
    }
    println!();
    println!(
        "{}",
        style("   dreitagebart  ·  dotfiles bootstrap  ·  v0.1.0")
            .dim()
            .italic()
    );
    println!();
    println!("{}", style("─".repeat(term_width().min(52))).dim());
    println!();
}

/// Blocks until the user presses Enter.
pub fn wait_for_enter() -> Result<(), InstallerError> {
    println!("  {}", style("Hit ENTER to start the installer...").bold());
    Term::stdout().read_line()?;
    Ok(())
}

// ── Step header ───────────────────────────────────────────────────────────────

/// Prints a visually distinct numbered step header.
pub fn print_step(step: u8, total: u8, title: &str) {
    println!();
    let tag = style(format!(" {}/{} ", step, total)).black().on_magenta().bold();
    let heading = style(format!("  {}", title)).white().bold();
    println!("{}{}", tag, heading);
    println!("{}", style("─".repeat(term_width().min(52))).dim());
}

// ── Feedback messages ─────────────────────────────────────────────────────────

/// Green ✓ — operation completed successfully.
pub fn print_success(msg: &str) {
    println!("  {}  {}", style("✓").green().bold(), style(msg).green());
}

/// Green name followed by the "skipped" note.
pub fn print_skipped(name: &str) {
    println!(
        "  {}  {} is already installed... skipped",
        style("✓").green().bold(),
        style(name).green()
    );
}

/// Blue → — neutral info / progress note.
pub fn print_info(msg: &str) {
    println!("  {}  {}", style("→").blue().bold(), msg);
}

/// Yellow ⚠  — non-fatal notice.
pub fn print_warning(msg: &str) {
    println!("  {}  {}", style("⚠").yellow().bold(), style(msg).yellow());
}

/// Red ✗ — error (written to stderr).
pub fn print_error(msg: &str) {
    eprintln!("  {}  {}", style("✗").red().bold(), style(msg).red());
}

// ── Info box ──────────────────────────────────────────────────────────────────

/// Renders a bordered key→value box in the terminal. The box grows to fit the
/// longest row.
///
/// ```text
/// ┌─ Summary ───────────────────────────────┐
/// │  packages     apt + homebrew            │
/// │  git name     Jane Doe                  │
/// └─────────────────────────────────────────┘
/// ```
pub fn print_kv_box(title: &str, rows: &[(&str, &str)]) {
    for line in kv_box_lines(title, rows) {
        println!("{}", line);
    }
}

const KEY_WIDTH: usize = 13;

fn kv_box_lines(title: &str, rows: &[(&str, &str)]) -> Vec<String> {
    const MIN_INNER: usize = 40;

    let inner = rows
        .iter()
        .map(|(_, val)| 2 + KEY_WIDTH + val.chars().count() + 2)
        .chain([title.chars().count() + 5, MIN_INNER])
        .max()
        .unwrap_or(MIN_INNER);

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let dashes = "─".repeat(inner - title.chars().count() - 3);
    lines.push(format!(
        "  ┌─ {} {}┐",
        style(title).white().bold(),
        style(&dashes).dim()
    ));

    for (key, val) in rows {
        let pad = inner - 2 - KEY_WIDTH - val.chars().count();
        lines.push(format!(
            "  │  {}{}{}│",
            style(format!("{:<width$}", key, width = KEY_WIDTH)).dim(),
            style(*val).white().bold(),
            " ".repeat(pad)
        ));
    }

    lines.push(format!("  └{}┘", style("─".repeat(inner)).dim()));
    lines
}

// ── Spinner ───────────────────────────────────────────────────────────────────

/// Returns a running dot spinner.
/// Call `pb.finish_and_clear()` (or the `done_spinner` helper) when done.
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("  {spinner:.magenta.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["∙", "•", "●", "•", "∙", " "]);
    pb.set_style(style);
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Clears the spinner and prints a success message in its place.
pub fn done_spinner(pb: ProgressBar, msg: &str) {
    pb.finish_and_clear();
    print_success(msg);
}

// ── Prompts ───────────────────────────────────────────────────────────────────

/// Renders questionnaire prompts with dialoguer's colorful theme.
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        DialoguerPrompter {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Prompter for DialoguerPrompter {
    fn note(&self, msg: &str) {
        println!();
        print_info(msg);
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool, InstallerError> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn input(
        &self,
        prompt: &str,
        default: &str,
        validate: fn(&str) -> Result<(), String>,
    ) -> Result<String, InstallerError> {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(prompt);
        if !default.is_empty() {
            input = input.default(default.to_string());
        }
        let value = input
            .validate_with(|v: &String| validate(v))
            .interact_text()?;
        Ok(value.trim().to_string())
    }

    fn select(
        &self,
        prompt: &str,
        items: &[&str],
        default: usize,
    ) -> Result<usize, InstallerError> {
        Ok(Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()?)
    }

    fn summary(&self, rows: &[(&str, &str)]) {
        println!();
        print_kv_box("Summary", rows);
        println!();
    }
}
