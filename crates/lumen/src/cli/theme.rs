//! Terminal presentation: prompt theme, spinner, progress bar.
//!
//! Everything here writes to stderr so stdout stays clean for piped output.

use console::{style, Style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Returns a `ColorfulTheme` configured with Lumen's colours.
pub fn lumen_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().cyan(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Ask a yes/no question on the terminal.
///
/// Returns `false` when stderr is not a terminal, or on Ctrl+C / Esc.
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    if !Term::stderr().is_term() {
        return Ok(false);
    }
    match Confirm::with_theme(&lumen_theme())
        .with_prompt(prompt)
        .default(false)
        .interact_opt()
    {
        Ok(answer) => Ok(answer.unwrap_or(false)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Indeterminate spinner for a single remote call or a wait.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress bar for indexing `total` files.
pub fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message("indexing...");
    pb
}

/// Green check line on stderr.
pub fn success(message: &str) {
    eprintln!("{} {}", style("✓").for_stderr().green(), message);
}

/// Yellow warning line on stderr.
pub fn warning(message: &str) {
    eprintln!("{} {}", style("!").for_stderr().yellow(), message);
}
