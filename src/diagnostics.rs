//! Accumulated resolution and download errors
//!
//! Failures are never thrown past the step that produced them. They are
//! appended here and surfaced once, at the end of the run.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Step of the run an error was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Plugin,
    Dependency,
    Ancestor,
    DynamicDependency,
    Download,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Plugin => "plugin",
            Stage::Dependency => "dependency",
            Stage::Ancestor => "ancestor",
            Stage::DynamicDependency => "dynamic dependency",
            Stage::Download => "download",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One failed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub stage: Stage,
    pub severity: Severity,
    /// Artifact, plugin or build unit the failure refers to
    pub context: String,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(
        stage: Stage,
        severity: Severity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            severity,
            context: context.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.context, self.message)
    }
}

/// Ordered, concurrency-safe error accumulator
#[derive(Debug, Default)]
pub struct ErrorLog {
    records: Mutex<Vec<ErrorRecord>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: ErrorRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Record an error-severity failure
    pub fn error(&self, stage: Stage, context: impl Into<String>, error: &dyn std::error::Error) {
        self.push(ErrorRecord::new(
            stage,
            Severity::Error,
            context,
            error.to_string(),
        ));
    }

    /// Record a warning-severity failure
    pub fn warning(&self, stage: Stage, context: impl Into<String>, message: impl Into<String>) {
        self.push(ErrorRecord::new(stage, Severity::Warning, context, message));
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the records in insertion order
    pub fn records(&self) -> Vec<ErrorRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_records(self) -> Vec<ErrorRecord> {
        self.records
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
