use std::io::Write;

use bibverify_core::{AlternativeSet, CheckStats, ObserverEvent, Status, VerificationResult};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(self) -> bool {
        self.0
    }
}

pub fn progress_bar(total: usize, color: ColorMode) -> ProgressBar {
    let template = if color.enabled() {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"
    } else {
        "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"
    };
    let style = ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    let bar = ProgressBar::new(total as u64);
    bar.set_style(style);
    bar
}

/// Feed pipeline notifications into the bar until the observer is dropped.
/// Log lines are printed above the bar so it stays at the bottom.
pub async fn drain_events(mut rx: UnboundedReceiver<ObserverEvent>, bar: ProgressBar) {
    while let Some(event) = rx.recv().await {
        match event {
            ObserverEvent::Progress { index, total, key } => {
                bar.set_length(total as u64);
                bar.set_position(index.saturating_sub(1) as u64);
                bar.set_message(key);
            }
            ObserverEvent::Log(line) => bar.println(line),
        }
    }
}

fn paint_status(status: Status, color: ColorMode) -> String {
    let label = status.label();
    if !color.enabled() {
        return label.to_string();
    }
    match status {
        Status::Valid => label.green().bold().to_string(),
        Status::Invalid => label.red().bold().to_string(),
        Status::NoIdentifier => label.yellow().to_string(),
    }
}

pub fn print_summary(
    w: &mut dyn Write,
    results: &[VerificationResult],
    color: ColorMode,
) -> std::io::Result<()> {
    let stats = CheckStats::from_results(results);
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "Summary".bold())?;
    } else {
        writeln!(w, "Summary")?;
    }
    writeln!(w, "  Total:         {}", stats.total)?;
    writeln!(w, "  {:<14} {}", format!("{}:", paint_status(Status::Valid, color)), stats.valid)?;
    writeln!(
        w,
        "  {:<14} {}",
        format!("{}:", paint_status(Status::Invalid, color)),
        stats.invalid
    )?;
    writeln!(
        w,
        "  {:<14} {}",
        format!("{}:", paint_status(Status::NoIdentifier, color)),
        stats.no_identifier
    )?;

    let invalid: Vec<&VerificationResult> = results
        .iter()
        .filter(|r| r.status() == Status::Invalid)
        .collect();
    if !invalid.is_empty() {
        writeln!(w)?;
        let heading = "Potentially fake references:";
        if color.enabled() {
            writeln!(w, "{}", heading.red().bold())?;
        } else {
            writeln!(w, "{heading}")?;
        }
        for result in invalid {
            let title = result.reference().title.as_deref().unwrap_or("(no title)");
            writeln!(w, "  ⚠ {}  {}", result.key(), title)?;
        }
    }
    Ok(())
}

pub fn print_alternatives_summary(
    w: &mut dyn Write,
    sets: &[AlternativeSet],
    color: ColorMode,
) -> std::io::Result<()> {
    let found = sets.iter().filter(|s| !s.candidates.is_empty()).count();
    let line = format!(
        "Alternative searches: {} ({} with suggestions)",
        sets.len(),
        found
    );
    if color.enabled() {
        writeln!(w, "{}", line.cyan())
    } else {
        writeln!(w, "{line}")
    }
}
