//! Run orchestrator coordinating the whole go-offline workflow
//!
//! This module provides:
//! - Workflow coordination: validate → resolve (per enabled artifact type) → download → report
//! - Bounded concurrency inside each pass
//! - Best-effort semantics: only validation can abort a run

use crate::closure::ClosureSet;
use crate::config::GoOfflineConfig;
use crate::diagnostics::{ErrorLog, ErrorRecord};
use crate::domain::{ArtifactType, ArtifactWithRepoType, BuildUnit, PluginDeclaration, RepositoryType};
use crate::download::{DownloadExecutor, DownloadSummary};
use crate::error::ConfigError;
use crate::progress::Progress;
use crate::resolver::{
    AncestorChainResolver, ArtifactResolver, DescriptorBuilder, DynamicDependencyResolver,
    PluginResolver, ProjectDependencyResolver, ResolutionContext,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// States of a run, in the order they can be visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Validating,
    ResolvingPlugins,
    ResolvingDependencies,
    ResolvingAncestors,
    ResolvingDynamicDependencies,
    Downloading,
    Reporting,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Validating => "validating",
            Phase::ResolvingPlugins => "resolving plugins",
            Phase::ResolvingDependencies => "resolving dependencies",
            Phase::ResolvingAncestors => "resolving ancestors",
            Phase::ResolvingDynamicDependencies => "resolving dynamic dependencies",
            Phase::Downloading => "downloading",
            Phase::Reporting => "reporting",
            Phase::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one resolution pass contributed to the closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub phase: Phase,
    /// Distinct artifacts the pass produced
    pub found: usize,
    /// Artifacts that were not already in the closure
    pub added: usize,
}

/// Outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub phases: Vec<Phase>,
    pub passes: Vec<PassStats>,
    pub closure: Vec<ArtifactWithRepoType>,
    pub download: DownloadSummary,
    pub errors: Vec<ErrorRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ResolutionReport {
    /// Whether the run should exit with a failure status
    pub fn is_failure(&self, fail_on_errors: bool) -> bool {
        fail_on_errors && !self.errors.is_empty()
    }

    /// Number of closure members resolved under a repository role
    pub fn count(&self, repository_type: RepositoryType) -> usize {
        self.closure
            .iter()
            .filter(|item| item.repository_type == repository_type)
            .count()
    }
}

/// Orchestrator for a go-offline run
pub struct Orchestrator {
    config: GoOfflineConfig,
    resolver: Arc<dyn ArtifactResolver>,
    descriptors: Arc<dyn DescriptorBuilder>,
    context: ResolutionContext,
    /// Reactor modules
    units: Vec<BuildUnit>,
    show_progress: bool,
}

impl Orchestrator {
    pub fn new(
        config: GoOfflineConfig,
        resolver: Arc<dyn ArtifactResolver>,
        descriptors: Arc<dyn DescriptorBuilder>,
        context: ResolutionContext,
        units: Vec<BuildUnit>,
    ) -> Self {
        Self {
            config,
            resolver,
            descriptors,
            context,
            units,
            show_progress: false,
        }
    }

    /// Enable or disable progress display (builder pattern)
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Every distinct plugin declaration across the reactor, in declaration order
    pub fn collect_plugins(&self) -> Vec<PluginDeclaration> {
        let mut seen = HashSet::new();
        self.units
            .iter()
            .flat_map(|unit| unit.plugins.iter())
            .filter(|plugin| seen.insert((*plugin).clone()))
            .cloned()
            .collect()
    }

    fn enter(&self, phases: &mut Vec<Phase>, phase: Phase, progress: &mut Progress) {
        info!(phase = %phase, "Entering phase");
        phases.push(phase);
        progress.finish_and_clear();
        if phase != Phase::Downloading {
            progress.spinner(&format!("{}...", capitalize(phase.as_str())));
        }
    }

    /// Run the workflow
    ///
    /// Only configuration errors are returned. Every other failure is recorded
    /// in the report.
    pub async fn run(&self) -> Result<ResolutionReport, ConfigError> {
        let started_at = Utc::now();
        let mut phases = Vec::new();
        let mut progress = Progress::new(self.show_progress);

        // Step 1: Validate before any resolver call
        self.enter(&mut phases, Phase::Validating, &mut progress);
        if let Err(e) = self.config.validate() {
            progress.finish_and_clear();
            return Err(e);
        }
        let filter = self.config.artifact_filter()?;
        let options = self.config.download_options()?;
        let concurrency = self.config.concurrency;

        let errors = ErrorLog::new();
        let closure = ClosureSet::new();
        let mut passes = Vec::new();
        let resolver = self.resolver.as_ref();

        // Step 2: Resolution passes, strictly sequential
        for artifact_type in filter.enabled() {
            match artifact_type {
                ArtifactType::Plugin => {
                    self.enter(&mut phases, Phase::ResolvingPlugins, &mut progress);
                    let plugins = self.collect_plugins();
                    let found = PluginResolver::new(resolver, &self.context, &errors, concurrency)
                        .resolve_all(&plugins)
                        .await;
                    passes.push(merge(&closure, Phase::ResolvingPlugins, &found));
                }
                ArtifactType::Dependency => {
                    self.enter(&mut phases, Phase::ResolvingDependencies, &mut progress);
                    let found = ProjectDependencyResolver::new(
                        resolver,
                        &self.context,
                        &errors,
                        self.config.copy_poms,
                        concurrency,
                    )
                    .resolve_all(&self.units)
                    .await;
                    passes.push(merge(&closure, Phase::ResolvingDependencies, &found));

                    self.enter(&mut phases, Phase::ResolvingAncestors, &mut progress);
                    let resolved = closure.snapshot();
                    let found = AncestorChainResolver::new(
                        self.descriptors.as_ref(),
                        &self.context,
                        &errors,
                        concurrency,
                    )
                    .resolve_all(&resolved)
                    .await;
                    passes.push(merge(&closure, Phase::ResolvingAncestors, &found));
                }
                ArtifactType::DynamicDependency => {
                    self.enter(
                        &mut phases,
                        Phase::ResolvingDynamicDependencies,
                        &mut progress,
                    );
                    let found =
                        DynamicDependencyResolver::new(resolver, &self.context, &errors, concurrency)
                            .expand_all(&self.config.dynamic_dependencies)
                            .await;
                    passes.push(merge(
                        &closure,
                        Phase::ResolvingDynamicDependencies,
                        &found,
                    ));
                }
            }
        }

        // Step 3: Download the closure
        self.enter(&mut phases, Phase::Downloading, &mut progress);
        let members = closure.snapshot();
        info!(
            artifacts = members.len(),
            target = %options.target_repository.display(),
            "Downloading closure"
        );
        let download = DownloadExecutor::new(resolver, &self.context, &errors, &options)
            .download_all(&members, &mut progress)
            .await;

        // Step 4: Surface accumulated errors
        self.enter(&mut phases, Phase::Reporting, &mut progress);
        progress.finish_and_clear();
        let errors = errors.into_records();
        if !errors.is_empty() {
            warn!(errors = errors.len(), "Run finished with errors");
        }
        info!(
            artifacts = members.len(),
            downloaded = download.downloaded,
            already_present = download.already_present,
            failed = download.failed,
            "Run complete"
        );

        phases.push(Phase::Done);
        Ok(ResolutionReport {
            phases,
            passes,
            closure: members,
            download,
            errors,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

fn merge(closure: &ClosureSet, phase: Phase, found: &ClosureSet) -> PassStats {
    let added = closure.union(found);
    info!(phase = %phase, found = found.len(), added, "Pass complete");
    PassStats {
        phase,
        found: found.len(),
        added,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
