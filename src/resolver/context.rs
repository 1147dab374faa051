//! Shared resolution context: repositories per role and the plugin-processing toggle

use crate::domain::RepositoryType;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Maven Central repository URL
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// A remote (or file-backed) artifact repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub url: String,
}

impl Repository {
    /// Create a repository; trailing slashes are stripped from the URL
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            id: id.into(),
            url: url.trim().trim_end_matches('/').to_string(),
        }
    }

    /// Maven Central
    pub fn central() -> Self {
        Self::new("central", MAVEN_CENTRAL_URL)
    }

    /// Create a repository from a bare URL, deriving an id from the host
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let repository = Self::new("", url);
        repository.check_url()?;
        let id = repository
            .url
            .split("://")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .filter(|host| !host.is_empty())
            .unwrap_or("local")
            .to_string();
        Ok(Self { id, ..repository })
    }

    /// Check that the URL uses a supported scheme
    pub fn check_url(&self) -> Result<(), ConfigError> {
        let supported = ["http://", "https://", "file://"];
        if supported.iter().any(|s| self.url.starts_with(s)) {
            Ok(())
        } else {
            Err(ConfigError::InvalidRepository {
                url: self.url.clone(),
            })
        }
    }

    /// Directory backing a `file://` repository
    pub fn file_root(&self) -> Option<PathBuf> {
        self.url.strip_prefix("file://").map(PathBuf::from)
    }

    /// Absolute URL of a layout-relative resource
    pub fn resource_url(&self, relative_path: &str) -> String {
        format!("{}/{}", self.url, relative_path.trim_start_matches('/'))
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.url)
    }
}

/// State shared by every resolution call of one run
///
/// Passes hold a shared [`PassGuard`] while they run. The ancestor pass takes
/// the exclusive [`PluginProcessingGuard`], so no other pass observes the
/// toggled flag.
#[derive(Debug)]
pub struct ResolutionContext {
    main_repositories: Vec<Repository>,
    plugin_repositories: Vec<Repository>,
    process_plugins: AtomicBool,
    passes: RwLock<()>,
}

impl ResolutionContext {
    pub fn new(main_repositories: Vec<Repository>, plugin_repositories: Vec<Repository>) -> Self {
        Self {
            main_repositories,
            plugin_repositories,
            process_plugins: AtomicBool::new(true),
            passes: RwLock::new(()),
        }
    }

    /// Repositories used for artifacts of the given role
    pub fn repositories(&self, repository_type: RepositoryType) -> &[Repository] {
        match repository_type {
            RepositoryType::Main => &self.main_repositories,
            RepositoryType::Plugin => &self.plugin_repositories,
        }
    }

    /// Append a repository to a role unless its URL is already configured
    pub fn add_repository(&mut self, repository_type: RepositoryType, repository: Repository) {
        let list = match repository_type {
            RepositoryType::Main => &mut self.main_repositories,
            RepositoryType::Plugin => &mut self.plugin_repositories,
        };
        if !list.iter().any(|r| r.url == repository.url) {
            list.push(repository);
        }
    }

    /// Whether descriptor building should process build plugins
    pub fn process_plugins(&self) -> bool {
        self.process_plugins.load(Ordering::SeqCst)
    }

    /// Enter a regular resolution pass
    pub async fn enter_pass(&self) -> PassGuard<'_> {
        PassGuard {
            _shared: self.passes.read().await,
        }
    }

    /// Disable plugin processing until the returned guard is dropped
    pub async fn disable_plugin_processing(&self) -> PluginProcessingGuard<'_> {
        let exclusive = self.passes.write().await;
        let previous = self.process_plugins.swap(false, Ordering::SeqCst);
        PluginProcessingGuard {
            context: self,
            previous,
            _exclusive: exclusive,
        }
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new(vec![Repository::central()], vec![Repository::central()])
    }
}

/// Shared access held by a regular pass
pub struct PassGuard<'a> {
    _shared: RwLockReadGuard<'a, ()>,
}

/// Exclusive access with plugin processing disabled; restores the previous state on drop
pub struct PluginProcessingGuard<'a> {
    context: &'a ResolutionContext,
    previous: bool,
    _exclusive: RwLockWriteGuard<'a, ()>,
}

impl Drop for PluginProcessingGuard<'_> {
    fn drop(&mut self) {
        self.context
            .process_plugins
            .store(self.previous, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_strips_trailing_slash() {
        let repo = Repository::new("central", "https://repo.maven.apache.org/maven2/");
        assert_eq!(repo.url, MAVEN_CENTRAL_URL);
        assert_eq!(
            repo.resource_url("/org/example/lib/1.0/lib-1.0.pom"),
            "https://repo.maven.apache.org/maven2/org/example/lib/1.0/lib-1.0.pom"
        );
    }

    #[test]
    fn test_repository_from_url() {
        let repo = Repository::from_url("https://nexus.example.com/repository/maven/").unwrap();
        assert_eq!(repo.id, "nexus.example.com");

        let local = Repository::from_url("file:///srv/mirror").unwrap();
        assert_eq!(local.file_root(), Some(PathBuf::from("/srv/mirror")));

        assert!(Repository::from_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_repositories_per_role() {
        let mut ctx = ResolutionContext::new(
            vec![Repository::central()],
            vec![Repository::new("plugins", "https://plugins.example.com")],
        );
        ctx.add_repository(RepositoryType::Main, Repository::central());
        ctx.add_repository(
            RepositoryType::Main,
            Repository::new("extra", "https://extra.example.com"),
        );
        assert_eq!(ctx.repositories(RepositoryType::Main).len(), 2);
        assert_eq!(ctx.repositories(RepositoryType::Plugin)[0].id, "plugins");
    }

    #[tokio::test]
    async fn test_plugin_processing_guard_restores_state() {
        let ctx = ResolutionContext::default();
        assert!(ctx.process_plugins());
        {
            let _guard = ctx.disable_plugin_processing().await;
            assert!(!ctx.process_plugins());
        }
        assert!(ctx.process_plugins());
    }

    #[tokio::test]
    async fn test_guard_restores_on_error_path() {
        async fn failing(ctx: &ResolutionContext) -> Result<(), String> {
            let _guard = ctx.disable_plugin_processing().await;
            Err("descriptor unreadable".to_string())?;
            Ok(())
        }

        let ctx = ResolutionContext::default();
        assert!(failing(&ctx).await.is_err());
        assert!(ctx.process_plugins());
    }

    #[tokio::test]
    async fn test_guard_excludes_other_passes() {
        let ctx = ResolutionContext::default();
        let guard = ctx.disable_plugin_processing().await;
        assert!(ctx.passes.try_read().is_err());
        drop(guard);
        let _pass = ctx.enter_pass().await;
        assert!(ctx.passes.try_write().is_err());
    }
}
