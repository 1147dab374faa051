//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of the run report
//! - Closure members with their repository role (omitted in quiet mode)

use crate::diagnostics::ErrorRecord;
use crate::domain::{ArtifactWithRepoType, RepositoryType};
use crate::download::DownloadSummary;
use crate::orchestrator::{PassStats, Phase, ResolutionReport};
use crate::output::{OutputFormatter, Verbosity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Quiet drops the closure listing
    verbosity: Verbosity,
    fail_on_errors: bool,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity, fail_on_errors: bool) -> Self {
        Self {
            verbosity,
            fail_on_errors,
        }
    }
}

/// JSON representation of a run
#[derive(Serialize)]
struct JsonOutput<'a> {
    success: bool,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    phases: &'a [Phase],
    summary: JsonSummary,
    passes: &'a [PassStats],
    download: &'a DownloadSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    closure: Option<Vec<&'a ArtifactWithRepoType>>,
    errors: &'a [ErrorRecord],
}

#[derive(Serialize)]
struct JsonSummary {
    artifacts: usize,
    main: usize,
    plugin: usize,
    errors: usize,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &ResolutionReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let closure = if self.verbosity == Verbosity::Quiet {
            None
        } else {
            let mut members: Vec<_> = report.closure.iter().collect();
            members.sort();
            Some(members)
        };

        let output = JsonOutput {
            success: !report.is_failure(self.fail_on_errors),
            started_at: report.started_at,
            finished_at: report.finished_at,
            phases: &report.phases,
            summary: JsonSummary {
                artifacts: report.closure.len(),
                main: report.count(RepositoryType::Main),
                plugin: report.count(RepositoryType::Plugin),
                errors: report.errors.len(),
            },
            passes: &report.passes,
            download: &report.download,
            closure,
            errors: &report.errors,
        };

        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        writeln!(writer, "{}", json)
    }
}
