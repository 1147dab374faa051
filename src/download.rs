//! Best-effort materialization of the closure into a target repository
//!
//! Every fetch is independent. Failures of primary artifacts and POMs are
//! recorded in the error log; missing sources or javadoc jars are only
//! counted.

use crate::diagnostics::{ErrorLog, Stage};
use crate::domain::{ArtifactWithRepoType, DEFAULT_EXTENSION};
use crate::progress::Progress;
use crate::resolver::{ArtifactResolver, FetchOutcome, ResolutionContext};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Default number of concurrent fetches
pub const DEFAULT_CONCURRENCY: usize = 8;

pub const SOURCES_CLASSIFIER: &str = "sources";
pub const JAVADOC_CLASSIFIER: &str = "javadoc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Root of the Maven-layout directory files are written into
    pub target_repository: PathBuf,
    pub copy_poms: bool,
    pub download_sources: bool,
    pub download_javadoc: bool,
    pub concurrency: usize,
}

impl DownloadOptions {
    pub fn new(target_repository: impl Into<PathBuf>) -> Self {
        Self {
            target_repository: target_repository.into(),
            copy_poms: false,
            download_sources: false,
            download_javadoc: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Counts of what happened during the download phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub already_present: usize,
    pub missing_variants: usize,
    pub failed: usize,
    pub bytes: u64,
}

/// One file to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadTask {
    pub item: ArtifactWithRepoType,
    /// Sources and javadoc jars may be absent without it being an error
    pub optional: bool,
}

pub struct DownloadExecutor<'a> {
    resolver: &'a dyn ArtifactResolver,
    context: &'a ResolutionContext,
    errors: &'a ErrorLog,
    options: &'a DownloadOptions,
}

impl<'a> DownloadExecutor<'a> {
    pub fn new(
        resolver: &'a dyn ArtifactResolver,
        context: &'a ResolutionContext,
        errors: &'a ErrorLog,
        options: &'a DownloadOptions,
    ) -> Self {
        Self {
            resolver,
            context,
            errors,
            options,
        }
    }

    /// Every file to fetch for the closure, without duplicates
    pub fn plan(&self, closure: &[ArtifactWithRepoType]) -> Vec<DownloadTask> {
        let mut seen = HashSet::new();
        let mut tasks = Vec::new();
        let mut push = |item: ArtifactWithRepoType, optional: bool| {
            if seen.insert(item.clone()) {
                tasks.push(DownloadTask { item, optional });
            }
        };

        for member in closure {
            push(member.clone(), false);

            let artifact = &member.artifact;
            if self.options.copy_poms && !artifact.is_pom() {
                push(
                    ArtifactWithRepoType::new(artifact.pom(), member.repository_type),
                    false,
                );
            }

            if artifact.extension == DEFAULT_EXTENSION && artifact.classifier().is_none() {
                if self.options.download_sources {
                    push(
                        ArtifactWithRepoType::new(
                            artifact.variant(SOURCES_CLASSIFIER),
                            member.repository_type,
                        ),
                        true,
                    );
                }
                if self.options.download_javadoc {
                    push(
                        ArtifactWithRepoType::new(
                            artifact.variant(JAVADOC_CLASSIFIER),
                            member.repository_type,
                        ),
                        true,
                    );
                }
            }
        }
        tasks
    }

    /// Download the whole closure; never fails
    pub async fn download_all(
        &self,
        closure: &[ArtifactWithRepoType],
        progress: &mut Progress,
    ) -> DownloadSummary {
        let tasks = self.plan(closure);
        progress.start(tasks.len() as u64, "Downloading");

        let progress_ref = &*progress;
        let results: Vec<_> = stream::iter(&tasks)
            .map(|task| async move {
                let result = self
                    .resolver
                    .fetch(
                        self.context,
                        &task.item.artifact,
                        task.item.repository_type,
                        &self.options.target_repository,
                    )
                    .await;
                progress_ref.inc();
                (task, result)
            })
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut summary = DownloadSummary::default();
        for (task, result) in results {
            match result {
                Ok(FetchOutcome::Downloaded { bytes }) => {
                    summary.downloaded += 1;
                    summary.bytes += bytes;
                }
                Ok(FetchOutcome::AlreadyPresent) => summary.already_present += 1,
                Err(e) if task.optional => {
                    debug!(artifact = %task.item, error = %e, "Optional variant unavailable");
                    summary.missing_variants += 1;
                }
                Err(e) => {
                    warn!(artifact = %task.item, error = %e, "Failed to download artifact");
                    summary.failed += 1;
                    self.errors
                        .error(Stage::Download, task.item.to_string(), &e);
                }
            }
        }

        progress.finish_and_clear();
        summary
    }
}
