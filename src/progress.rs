use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::PassError;

/// Controls how step output is rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Spinner per step, checkmark on completion.
    Normal,
    /// No ANSI — one plain line per step (for piped/non-TTY stderr).
    Plain,
    /// Nothing.
    Quiet,
}

/// Numbered query steps with spinners and checkmarks.
///
/// Everything goes to stderr so stdout carries only the generated commands.
pub struct StepProgress {
    total_steps: usize,
    current_step: usize,
    mode: OutputMode,
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("[{prefix}] {spinner:.cyan} {msg}")
        .expect("valid spinner template")
}

fn done_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("[{prefix}] \u{2713} {msg:.green}")
        .expect("valid done template")
}

fn failed_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("[{prefix}] \u{2717} {msg:.red}")
        .expect("valid failed template")
}

impl StepProgress {
    pub fn new(total_steps: usize, mode: OutputMode) -> Self {
        Self {
            total_steps,
            current_step: 0,
            mode,
        }
    }

    /// Await `fut` as the next numbered step.
    pub async fn run<F, T>(&mut self, label: &str, fut: F) -> Result<T, PassError>
    where
        F: Future<Output = Result<T, PassError>>,
    {
        self.current_step += 1;
        let prefix = format!("{}/{}", self.current_step, self.total_steps);

        match self.mode {
            OutputMode::Quiet => fut.await,
            OutputMode::Plain => {
                eprintln!("[{prefix}] {label}");
                let result = fut.await;
                let mark = if result.is_ok() { '\u{2713}' } else { '\u{2717}' };
                eprintln!("[{prefix}] {mark} {label}");
                result
            }
            OutputMode::Normal => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(spinner_style());
                bar.set_prefix(prefix);
                bar.set_message(label.to_string());
                bar.enable_steady_tick(Duration::from_millis(80));

                let result = fut.await;

                bar.set_style(if result.is_ok() {
                    done_style()
                } else {
                    failed_style()
                });
                bar.finish_with_message(label.to_string());
                result
            }
        }
    }

    /// Print an info line under the last step.
    pub fn info(&self, text: &str) {
        if self.mode != OutputMode::Quiet {
            eprintln!("      \u{2192} {text}");
        }
    }
}
