//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Closure counts per repository role and per resolution pass
//! - Download statistics
//! - Every recorded error, printed as a warning

use crate::diagnostics::ErrorRecord;
use crate::domain::RepositoryType;
use crate::orchestrator::ResolutionReport;
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    fail_on_errors: bool,
    color: bool,
}

impl TextFormatter {
    pub fn new(verbosity: Verbosity, fail_on_errors: bool) -> Self {
        Self::with_color(verbosity, fail_on_errors, true)
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, fail_on_errors: bool, color: bool) -> Self {
        Self {
            verbosity,
            fail_on_errors,
            color,
        }
    }

    fn format_header(
        &self,
        report: &ResolutionReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let total = report.closure.len();
        let main = report.count(RepositoryType::Main);
        let plugin = report.count(RepositoryType::Plugin);
        let noun = if total == 1 { "artifact" } else { "artifacts" };

        if self.color {
            writeln!(
                writer,
                "{} {} {} ({} main, {} plugin)",
                "Closure:".bold(),
                total.to_string().bright_white().bold(),
                noun,
                main.to_string().green(),
                plugin.to_string().cyan()
            )
        } else {
            writeln!(
                writer,
                "Closure: {} {} ({} main, {} plugin)",
                total, noun, main, plugin
            )
        }
    }

    fn format_passes(
        &self,
        report: &ResolutionReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let width = report
            .passes
            .iter()
            .map(|p| p.phase.as_str().len())
            .max()
            .unwrap_or(0);

        for pass in &report.passes {
            let name = format!("{:width$}", pass.phase.as_str(), width = width);
            if self.color {
                writeln!(
                    writer,
                    "  {} {} found, {} new",
                    name.dimmed(),
                    pass.found,
                    pass.added.to_string().green()
                )?;
            } else {
                writeln!(writer, "  {} {} found, {} new", name, pass.found, pass.added)?;
            }
        }
        Ok(())
    }

    fn format_closure(
        &self,
        report: &ResolutionReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let mut members: Vec<_> = report.closure.iter().collect();
        members.sort();
        for member in members {
            let role = format!("[{}]", member.repository_type);
            if self.color {
                writeln!(writer, "    {} {}", member.artifact, role.dimmed())?;
            } else {
                writeln!(writer, "    {} {}", member.artifact, role)?;
            }
        }
        Ok(())
    }

    fn format_download(
        &self,
        report: &ResolutionReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let download = &report.download;
        let line = format!(
            "{} downloaded ({}), {} already present, {} optional missing, {} failed",
            download.downloaded,
            human_bytes(download.bytes),
            download.already_present,
            download.missing_variants,
            download.failed
        );
        if self.color {
            let label = "Download:".bold();
            if download.failed > 0 {
                writeln!(writer, "{} {}", label, line.yellow())
            } else {
                writeln!(writer, "{} {}", label, line)
            }
        } else {
            writeln!(writer, "Download: {}", line)
        }
    }

    fn format_warning(&self, record: &ErrorRecord, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.color {
            writeln!(
                writer,
                "{} [{}] {}: {}",
                "warning:".yellow().bold(),
                record.stage,
                record.context.bold(),
                record.message
            )
        } else {
            writeln!(writer, "warning: {}", record)
        }
    }

    fn format_status(
        &self,
        report: &ResolutionReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let elapsed = (report.finished_at - report.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        let errors = report.errors.len();

        if report.is_failure(self.fail_on_errors) {
            let message = format!(
                "Failed: {} error{} recorded and fail-on-errors is set",
                errors,
                if errors == 1 { "" } else { "s" }
            );
            if self.color {
                writeln!(writer, "{}", message.red().bold())
            } else {
                writeln!(writer, "{}", message)
            }
        } else if errors > 0 {
            let message = format!(
                "Done in {:.1}s with {} warning{}",
                elapsed,
                errors,
                if errors == 1 { "" } else { "s" }
            );
            if self.color {
                writeln!(writer, "{}", message.yellow())
            } else {
                writeln!(writer, "{}", message)
            }
        } else if self.color {
            writeln!(writer, "{}", format!("Done in {:.1}s", elapsed).green())
        } else {
            writeln!(writer, "Done in {:.1}s", elapsed)
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &ResolutionReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            self.format_header(report, writer)?;
            self.format_passes(report, writer)?;
            if self.verbosity == Verbosity::Verbose {
                self.format_closure(report, writer)?;
            }
            self.format_download(report, writer)?;
        }

        if !report.errors.is_empty() {
            if self.verbosity != Verbosity::Quiet {
                writeln!(writer)?;
            }
            for record in &report.errors {
                self.format_warning(record, writer)?;
            }
        }

        self.format_status(report, writer)
    }
}

/// Human-readable byte count
fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
