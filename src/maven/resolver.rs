//! Maven implementation of the resolution collaborators
//!
//! POMs are looked up in the reactor first, then in the local repository and
//! finally in the remote repositories of the requested role. Everything read
//! remotely is cached in the local repository.

use super::model::{bom_imports, own_coordinate, parent_coordinate, properties_for, EffectiveModel};
use super::pom::{has_placeholder, RawPom};
use super::transport::RepositoryTransport;
use crate::domain::{
    ArtifactCoordinate, DependencyDeclaration, Exclusion, ProjectDescriptor, RepositoryType,
};
use crate::error::{DescriptorError, FetchError, RepositoryError, ResolutionError};
use crate::resolver::{
    ArtifactResolver, CollectRequest, DescriptorBuilder, FetchOutcome, ResolutionContext,
};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

/// Tracking file Maven keeps next to downloaded artifacts
pub const REMOTE_TRACKING_FILE: &str = "_remote.repositories";

/// A reactor module's pom.xml
#[derive(Debug, Clone)]
struct WorkspacePom {
    path: PathBuf,
    xml: String,
}

/// Resolves artifacts and dependency graphs against Maven repositories
pub struct MavenResolver {
    transport: RepositoryTransport,
    local_repository: PathBuf,
    /// Reactor POMs keyed by `group:artifact:version`
    workspace: RwLock<HashMap<String, WorkspacePom>>,
    /// Root POM properties, used to expand module and parent references
    reactor_properties: RwLock<HashMap<String, String>>,
    models: Mutex<HashMap<ArtifactCoordinate, Arc<EffectiveModel>>>,
    tracking: tokio::sync::Mutex<()>,
}

impl MavenResolver {
    pub fn new(transport: RepositoryTransport, local_repository: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            local_repository: local_repository.into(),
            workspace: RwLock::new(HashMap::new()),
            reactor_properties: RwLock::new(HashMap::new()),
            models: Mutex::new(HashMap::new()),
            tracking: tokio::sync::Mutex::new(()),
        }
    }

    pub fn local_repository(&self) -> &Path {
        &self.local_repository
    }

    /// Make a reactor POM resolvable by its coordinate without any repository
    pub fn register_workspace(
        &self,
        coordinate: &ArtifactCoordinate,
        path: impl Into<PathBuf>,
        xml: impl Into<String>,
    ) {
        let pom = WorkspacePom {
            path: path.into(),
            xml: xml.into(),
        };
        if let Ok(mut workspace) = self.workspace.write() {
            workspace.insert(workspace_key(coordinate), pom);
        }
    }

    pub fn set_reactor_properties(&self, properties: HashMap<String, String>) {
        if let Ok(mut reactor_properties) = self.reactor_properties.write() {
            *reactor_properties = properties;
        }
    }

    /// Fallback properties for a POM's coordinate and parent reference
    ///
    /// Only reactor POMs see the root's properties.
    fn reference_properties(&self, coordinate: &ArtifactCoordinate) -> HashMap<String, String> {
        if !self.is_workspace(coordinate) {
            return HashMap::new();
        }
        self.reactor_properties
            .read()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// Whether a coordinate belongs to a reactor module
    pub fn is_workspace(&self, coordinate: &ArtifactCoordinate) -> bool {
        self.workspace
            .read()
            .map(|w| w.contains_key(&workspace_key(coordinate)))
            .unwrap_or(false)
    }

    fn workspace_pom(&self, coordinate: &ArtifactCoordinate) -> Option<WorkspacePom> {
        self.workspace
            .read()
            .ok()
            .and_then(|w| w.get(&workspace_key(coordinate)).cloned())
    }

    fn cached_model(&self, coordinate: &ArtifactCoordinate) -> Option<Arc<EffectiveModel>> {
        self.models
            .lock()
            .ok()
            .and_then(|models| models.get(coordinate).cloned())
    }

    fn cache_model(&self, coordinate: ArtifactCoordinate, model: Arc<EffectiveModel>) {
        if let Ok(mut models) = self.models.lock() {
            models.insert(coordinate, model);
        }
    }

    /// Effective model of an artifact's POM
    pub async fn model(
        &self,
        context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
        repository_type: RepositoryType,
    ) -> Result<Arc<EffectiveModel>, ResolutionError> {
        self.effective_model(context, artifact.pom(), repository_type, Vec::new())
            .await
    }

    fn effective_model<'a>(
        &'a self,
        context: &'a ResolutionContext,
        coordinate: ArtifactCoordinate,
        repository_type: RepositoryType,
        mut chain: Vec<ArtifactCoordinate>,
    ) -> BoxFuture<'a, Result<Arc<EffectiveModel>, ResolutionError>> {
        async move {
            if let Some(model) = self.cached_model(&coordinate) {
                return Ok(model);
            }
            if chain.contains(&coordinate) {
                return Err(DescriptorError::ParentCycle {
                    location: coordinate.to_string(),
                }
                .into());
            }

            let (xml, location) = self.pom_text(context, &coordinate, repository_type).await?;
            let raw = RawPom::parse(&xml, &location)?;
            chain.push(coordinate.clone());

            let defaults = self.reference_properties(&coordinate);
            let parent = match parent_coordinate(&raw, &defaults) {
                Some(parent_pom) => {
                    Some(
                        self.effective_model(
                            context,
                            parent_pom,
                            repository_type,
                            chain.clone(),
                        )
                        .await?,
                    )
                }
                None => None,
            };

            let own = own_coordinate(&raw, parent.as_deref(), &defaults, &location)?;
            let properties = properties_for(&raw, &own, parent.as_deref());
            let mut imports = Vec::new();
            for bom in bom_imports(&raw, parent.as_deref(), &properties) {
                trace!(pom = %coordinate, bom = %bom, "Importing BOM");
                imports.push(
                    self.effective_model(context, bom, repository_type, chain.clone())
                        .await?,
                );
            }

            let model = Arc::new(EffectiveModel::assemble(raw, own, parent, &imports));
            self.cache_model(coordinate, Arc::clone(&model));
            Ok(model)
        }
        .boxed()
    }

    /// POM text and a label for error messages
    async fn pom_text(
        &self,
        context: &ResolutionContext,
        coordinate: &ArtifactCoordinate,
        repository_type: RepositoryType,
    ) -> Result<(String, String), ResolutionError> {
        if let Some(pom) = self.workspace_pom(coordinate) {
            return Ok((pom.xml, pom.path.display().to_string()));
        }

        let cached = coordinate.local_path(&self.local_repository);
        if let Ok(xml) = tokio::fs::read_to_string(&cached).await {
            trace!(pom = %coordinate, "POM found in local repository");
            return Ok((xml, cached.display().to_string()));
        }

        let repositories = context.repositories(repository_type);
        let retrieved = self
            .transport
            .get(repositories, &coordinate.relative_path())
            .await
            .map_err(|e| not_found_as_missing(e, coordinate, repositories.len()))?;

        match write_atomic(&cached, &retrieved.bytes).await {
            Ok(()) => {
                self.record_remote(&cached, &retrieved.repository_id).await;
            }
            Err(e) => debug!(pom = %coordinate, error = %e, "Could not cache POM"),
        }

        Ok((
            String::from_utf8_lossy(&retrieved.bytes).into_owned(),
            coordinate.to_string(),
        ))
    }

    /// Append `<file>><repository>=` to the tracking file of the artifact's directory
    async fn record_remote(&self, path: &Path, repository_id: &str) {
        let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
            return;
        };
        let tracking = dir.join(REMOTE_TRACKING_FILE);
        let entry = format!("{}>{}=", file_name.to_string_lossy(), repository_id);

        let _lock = self.tracking.lock().await;
        let existing = tokio::fs::read_to_string(&tracking)
            .await
            .unwrap_or_default();
        if existing.lines().any(|line| line == entry) {
            return;
        }
        let mut content = if existing.is_empty() {
            "#NOTE: This file records the repository each artifact was downloaded from.\n"
                .to_string()
        } else {
            existing
        };
        if !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&entry);
        content.push('\n');

        if let Err(e) = write_atomic(&tracking, content.as_bytes()).await {
            debug!(path = %tracking.display(), error = %e, "Could not update tracking file");
        }
    }

    /// Breadth-first dependency collection with nearest-wins mediation
    async fn collect(
        &self,
        context: &ResolutionContext,
        request: &CollectRequest,
        repository_type: RepositoryType,
    ) -> Result<Vec<ArtifactCoordinate>, ResolutionError> {
        let mut managed: BTreeMap<String, DependencyDeclaration> = request
            .managed
            .iter()
            .map(|m| (m.artifact.versionless_key(), m.clone()))
            .collect();

        let mut direct: Vec<DependencyDeclaration> = request
            .dependencies
            .iter()
            .filter(|d| d.scope.is_resolvable())
            .cloned()
            .collect();

        if let Some(root) = &request.root {
            let root = resolve_version(root)?;
            let model = self
                .model(context, &root, repository_type)
                .await
                .map_err(|e| ResolutionError::collection(root.to_string(), e))?;
            for (key, entry) in &model.dependency_management {
                managed.entry(key.clone()).or_insert_with(|| entry.clone());
            }
            direct.extend(
                model
                    .dependencies
                    .iter()
                    .filter(|d| d.scope.is_transitive() && !d.optional)
                    .cloned(),
            );
        }

        let mut queue: VecDeque<(DependencyDeclaration, Vec<Exclusion>, usize)> = direct
            .into_iter()
            .map(|d| {
                let exclusions = d.exclusions.clone();
                (d, exclusions, 0)
            })
            .collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut result = Vec::new();

        while let Some((declaration, exclusions, depth)) = queue.pop_front() {
            let mut artifact = declaration.artifact;
            let key = artifact.versionless_key();
            if let Some(entry) = managed.get(&key) {
                if depth > 0 || artifact.version.is_empty() {
                    artifact.version = entry.artifact.version.clone();
                }
            }
            if !seen.insert(key) {
                continue;
            }

            let artifact = resolve_version(&artifact)?;
            if self.is_workspace(&artifact) {
                trace!(artifact = %artifact, "Skipping reactor module");
            } else {
                result.push(artifact.clone());
            }

            let model = self
                .model(context, &artifact, repository_type)
                .await
                .map_err(|e| ResolutionError::collection(artifact.to_string(), e))?;

            for child in model
                .dependencies
                .iter()
                .filter(|d| d.scope.is_transitive() && !d.optional)
                .filter(|d| !exclusions.iter().any(|e| e.matches(&d.artifact)))
            {
                let mut inherited = exclusions.clone();
                for exclusion in &child.exclusions {
                    if !inherited.contains(exclusion) {
                        inherited.push(exclusion.clone());
                    }
                }
                queue.push_back((child.clone(), inherited, depth + 1));
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl ArtifactResolver for MavenResolver {
    async fn resolve_artifact(
        &self,
        context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
        repository_type: RepositoryType,
    ) -> Result<ArtifactCoordinate, ResolutionError> {
        let resolved = resolve_version(artifact)?;
        self.model(context, &resolved, repository_type).await?;
        Ok(resolved)
    }

    async fn resolve_dependencies(
        &self,
        context: &ResolutionContext,
        request: &CollectRequest,
        repository_type: RepositoryType,
    ) -> Result<Vec<ArtifactCoordinate>, ResolutionError> {
        self.collect(context, request, repository_type).await
    }

    async fn fetch(
        &self,
        context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
        repository_type: RepositoryType,
        destination: &Path,
    ) -> Result<FetchOutcome, FetchError> {
        let target = artifact.local_path(destination);
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let cached = artifact.local_path(&self.local_repository);
        if cached != target {
            if let Ok(bytes) = tokio::fs::read(&cached).await {
                write_atomic(&target, &bytes).await?;
                return Ok(FetchOutcome::Downloaded {
                    bytes: bytes.len() as u64,
                });
            }
        }

        let retrieved = self
            .transport
            .get(context.repositories(repository_type), &artifact.relative_path())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    FetchError::NotFound {
                        artifact: artifact.to_string(),
                        repository_type: repository_type.to_string(),
                    }
                } else {
                    FetchError::Repository(e)
                }
            })?;

        write_atomic(&target, &retrieved.bytes).await?;
        self.record_remote(&target, &retrieved.repository_id).await;
        debug!(artifact = %artifact, repository = %retrieved.repository_id, "Downloaded");

        Ok(FetchOutcome::Downloaded {
            bytes: retrieved.bytes.len() as u64,
        })
    }
}

#[async_trait]
impl DescriptorBuilder for MavenResolver {
    async fn build_descriptor(
        &self,
        context: &ResolutionContext,
        artifact: &ArtifactCoordinate,
    ) -> Result<ProjectDescriptor, ResolutionError> {
        let model = match self.model(context, artifact, RepositoryType::Main).await {
            Ok(model) => model,
            Err(ResolutionError::ArtifactNotFound { .. }) => {
                self.model(context, artifact, RepositoryType::Plugin).await?
            }
            Err(e) => return Err(e),
        };
        Ok(model.to_descriptor(context.process_plugins()))
    }
}

fn workspace_key(coordinate: &ArtifactCoordinate) -> String {
    format!(
        "{}:{}:{}",
        coordinate.group_id, coordinate.artifact_id, coordinate.version
    )
}

fn not_found_as_missing(
    error: RepositoryError,
    coordinate: &ArtifactCoordinate,
    repositories: usize,
) -> ResolutionError {
    if error.is_not_found() {
        ResolutionError::ArtifactNotFound {
            artifact: coordinate.to_string(),
            repositories,
        }
    } else {
        error.into()
    }
}

/// Pin an artifact to a concrete version
///
/// A range whose lower bound is inclusive (`[1.2,)`, `[1.2,2.0)`, `[1.2]`)
/// resolves to that bound. Anything else cannot be decided without
/// repository metadata.
pub fn resolve_version(artifact: &ArtifactCoordinate) -> Result<ArtifactCoordinate, ResolutionError> {
    let version = artifact.version.trim();
    if version.is_empty() || has_placeholder(version) {
        return Err(ResolutionError::unresolved_version(
            artifact.management_key(),
            "no version declared or managed",
        ));
    }

    if let Some(range) = version.strip_prefix('[') {
        let lower = range
            .split([',', ']'])
            .next()
            .map(str::trim)
            .unwrap_or_default();
        if !lower.is_empty() {
            return Ok(artifact.clone().with_version(lower));
        }
    }
    if version.starts_with('[') || version.starts_with('(') {
        return Err(ResolutionError::unresolved_version(
            artifact.management_key(),
            format!("version range '{}' is not supported", version),
        ));
    }

    Ok(artifact.clone().with_version(version))
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let target = path.to_path_buf();
    let bytes = bytes.to_vec();
    let error_path = target.clone();
    tokio::task::spawn_blocking(move || persist(&target, &bytes))
        .await
        .map_err(|e| FetchError::write_error(error_path, std::io::Error::other(e)))?
}

fn persist(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let dir = path.parent().ok_or_else(|| {
        FetchError::write_error(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent directory"),
        )
    })?;
    std::fs::create_dir_all(dir).map_err(|e| FetchError::write_error(dir, e))?;
    let mut file = NamedTempFile::new_in(dir).map_err(|e| FetchError::write_error(path, e))?;
    file.write_all(bytes)
        .map_err(|e| FetchError::write_error(path, e))?;
    file.persist(path)
        .map_err(|e| FetchError::write_error(path, e.error))?;
    Ok(())
}
