//! go-offline configuration
//!
//! Settings are read from (lowest to highest priority):
//! - built-in defaults
//! - `go-offline.toml` in the project directory, or the file given with `--config`
//! - command-line flags

use crate::cli::CliArgs;
use crate::domain::{ArtifactType, ArtifactTypeFilter, DynamicDependency};
use crate::download::{DownloadOptions, DEFAULT_CONCURRENCY};
use crate::error::ConfigError;
use crate::resolver::{Repository, ResolutionContext};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the project directory
pub const CONFIG_FILE_NAME: &str = "go-offline.toml";

/// Effective configuration of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoOfflineConfig {
    /// Empty means every type
    pub artifact_types: Vec<String>,
    pub download_sources: bool,
    pub download_javadoc: bool,
    /// Only decides the exit status
    pub fail_on_errors: bool,
    pub copy_poms: bool,
    pub target_repository: Option<PathBuf>,
    pub local_repository: Option<PathBuf>,
    pub dynamic_dependencies: Vec<DynamicDependency>,
    pub repositories: Vec<String>,
    pub plugin_repositories: Vec<String>,
    pub concurrency: usize,
}

impl Default for GoOfflineConfig {
    fn default() -> Self {
        Self {
            artifact_types: Vec::new(),
            download_sources: false,
            download_javadoc: false,
            fail_on_errors: false,
            copy_poms: false,
            target_repository: None,
            local_repository: None,
            dynamic_dependencies: Vec::new(),
            repositories: Vec::new(),
            plugin_repositories: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl GoOfflineConfig {
    /// Parse a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// `go-offline.toml` from a project directory, or defaults if there is none
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Configuration for a command line: the file it points at, overridden by its flags
    pub fn from_cli(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::from_dir(&args.path)?,
        };
        config.apply_cli(args);
        Ok(config)
    }

    /// Override file values with command-line flags
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if !args.artifact_types.is_empty() {
            self.artifact_types = args
                .artifact_types
                .iter()
                .map(|t| t.as_str().to_string())
                .collect();
        }
        self.download_sources |= args.download_sources;
        self.download_javadoc |= args.download_javadoc;
        self.fail_on_errors |= args.fail_on_errors;
        self.copy_poms |= args.copy_poms;
        if let Some(path) = &args.target_repository {
            self.target_repository = Some(path.clone());
        }
        if let Some(path) = &args.local_repository {
            self.local_repository = Some(path.clone());
        }
        self.dynamic_dependencies.extend(
            args.dynamic_dependency
                .iter()
                .cloned()
                .map(|d| {
                    let transitive = args.include_transitive || d.include_transitive;
                    d.with_transitive(transitive)
                }),
        );
        if !args.repository.is_empty() {
            self.repositories = args.repository.clone();
        }
        if !args.plugin_repository.is_empty() {
            self.plugin_repositories = args.plugin_repository.clone();
        }
        if let Some(concurrency) = args.concurrency {
            self.concurrency = concurrency;
        }
    }

    /// Check everything that can be checked without touching the network
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.artifact_filter()?;
        for dependency in &self.dynamic_dependencies {
            dependency.validate()?;
        }
        if self.concurrency == 0 {
            return Err(ConfigError::invalid_field(
                "concurrency",
                "concurrency",
                "0",
            ));
        }
        self.main_repositories()?;
        self.plugin_repositories()?;
        Ok(())
    }

    pub fn artifact_filter(&self) -> Result<ArtifactTypeFilter, ConfigError> {
        let types = self
            .artifact_types
            .iter()
            .map(|t| t.parse::<ArtifactType>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ArtifactTypeFilter::with_types(types))
    }

    /// Local repository root, `~/.m2/repository` unless configured
    pub fn local_repository(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.local_repository {
            return Ok(path.clone());
        }
        dirs::home_dir()
            .map(|home| home.join(".m2").join("repository"))
            .ok_or_else(|| ConfigError::InvalidPath {
                path: PathBuf::from("~/.m2/repository"),
                message: "home directory could not be determined".to_string(),
            })
    }

    /// Download destination, defaulting to the local repository
    pub fn target_repository(&self) -> Result<PathBuf, ConfigError> {
        match &self.target_repository {
            Some(path) => Ok(path.clone()),
            None => self.local_repository(),
        }
    }

    pub fn main_repositories(&self) -> Result<Vec<Repository>, ConfigError> {
        parse_repositories(&self.repositories)
    }

    pub fn plugin_repositories(&self) -> Result<Vec<Repository>, ConfigError> {
        parse_repositories(&self.plugin_repositories)
    }

    /// Resolution context holding the configured repositories of both roles
    pub fn resolution_context(&self) -> Result<ResolutionContext, ConfigError> {
        Ok(ResolutionContext::new(
            self.main_repositories()?,
            self.plugin_repositories()?,
        ))
    }

    pub fn download_options(&self) -> Result<DownloadOptions, ConfigError> {
        Ok(DownloadOptions {
            target_repository: self.target_repository()?,
            copy_poms: self.copy_poms,
            download_sources: self.download_sources,
            download_javadoc: self.download_javadoc,
            concurrency: self.concurrency,
        })
    }
}

/// Configured URLs, or Maven Central when none are given
fn parse_repositories(urls: &[String]) -> Result<Vec<Repository>, ConfigError> {
    if urls.is_empty() {
        return Ok(vec![Repository::central()]);
    }
    urls.iter().map(|url| Repository::from_url(url)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RepositoryType;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GoOfflineConfig::default();
        assert_eq!(config.concurrency, 8);
        assert!(config.artifact_types.is_empty());
        assert!(config.validate().is_ok());
        assert_eq!(config.main_repositories().unwrap(), vec![Repository::central()]);
        assert_eq!(config.plugin_repositories().unwrap(), vec![Repository::central()]);
    }

    #[test]
    fn test_from_dir_without_file() {
        let temp = TempDir::new().unwrap();
        let config = GoOfflineConfig::from_dir(temp.path()).unwrap();
        assert_eq!(config, GoOfflineConfig::default());
    }

    #[test]
    fn test_load_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            r#"
artifact_types = ["plugin", "dependency"]
download_sources = true
copy_poms = true
concurrency = 4
repositories = ["https://nexus.example.com/maven"]

[[dynamic_dependencies]]
group_id = "org.example"
artifact_id = "agent"
version = "1.2.3"
repository_type = "PLUGIN"
include_transitive = true
"#,
        )
        .unwrap();

        let config = GoOfflineConfig::from_dir(temp.path()).unwrap();
        assert!(config.download_sources);
        assert!(config.copy_poms);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.dynamic_dependencies.len(), 1);
        assert_eq!(
            config.dynamic_dependencies[0].repository_type,
            RepositoryType::Plugin
        );

        let filter = config.artifact_filter().unwrap();
        assert!(filter.includes(ArtifactType::Plugin));
        assert!(!filter.includes(ArtifactType::DynamicDependency));
        assert_eq!(config.main_repositories().unwrap()[0].id, "nexus.example.com");
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "download_everything = true\n").unwrap();
        let err = GoOfflineConfig::from_dir(temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "concurrency = 2\nrepositories = [\"https://a.example.com\"]\n",
        )
        .unwrap();
        let path = temp.path().to_str().unwrap();
        let args = CliArgs::parse_from([
            "go-offline",
            path,
            "--concurrency",
            "16",
            "--repository",
            "https://b.example.com",
            "--dynamic-dependency",
            "org.example:lib:1.0",
            "--include-transitive",
        ]);

        let config = GoOfflineConfig::from_cli(&args).unwrap();
        assert_eq!(config.concurrency, 16);
        assert_eq!(config.repositories, vec!["https://b.example.com"]);
        assert!(config.dynamic_dependencies[0].include_transitive);
    }

    #[test]
    fn test_apply_cli_transitive_flag() {
        let mut config = GoOfflineConfig {
            dynamic_dependencies: vec![
                DynamicDependency::new("org.example", "agent", "1.0").with_transitive(true)
            ],
            ..GoOfflineConfig::default()
        };
        let args = CliArgs::parse_from([
            "go-offline",
            "--dynamic-dependency",
            "org.example:lib:1.0",
        ]);
        config.apply_cli(&args);
        assert!(config.dynamic_dependencies[0].include_transitive);
        assert!(!config.dynamic_dependencies[1].include_transitive);

        let mut config = GoOfflineConfig::default();
        let args = CliArgs::parse_from([
            "go-offline",
            "--dynamic-dependency",
            "org.example:lib:1.0",
            "--include-transitive",
        ]);
        config.apply_cli(&args);
        assert!(config.dynamic_dependencies[0].include_transitive);
    }

    #[test]
    fn test_validate_rejects_incomplete_dynamic_dependency() {
        let config = GoOfflineConfig {
            dynamic_dependencies: vec![DynamicDependency {
                group_id: Some("org.example".to_string()),
                artifact_id: Some("lib".to_string()),
                ..DynamicDependency::default()
            }],
            ..GoOfflineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_validate_rejects_bad_repository_and_type() {
        let config = GoOfflineConfig {
            repositories: vec!["ftp://example.com".to_string()],
            ..GoOfflineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRepository { .. })
        ));

        let config = GoOfflineConfig {
            artifact_types: vec!["sources".to_string()],
            ..GoOfflineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidArtifactType { .. })
        ));
    }

    #[test]
    fn test_target_defaults_to_local_repository() {
        let config = GoOfflineConfig {
            local_repository: Some(PathBuf::from("/cache/m2")),
            ..GoOfflineConfig::default()
        };
        assert_eq!(config.target_repository().unwrap(), PathBuf::from("/cache/m2"));

        let options = config.download_options().unwrap();
        assert_eq!(options.target_repository, PathBuf::from("/cache/m2"));
        assert_eq!(options.concurrency, 8);
    }
}
