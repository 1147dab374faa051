//! CLI argument parsing module for go-offline

use crate::domain::{ArtifactType, DynamicDependency};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Parse one entry of `--artifact-types`
fn parse_artifact_type(s: &str) -> Result<ArtifactType, String> {
    s.parse().map_err(|e: crate::error::ConfigError| e.to_string())
}

/// Parse `group:artifact:version[:type[:classifier]]`
fn parse_dynamic_dependency(s: &str) -> Result<DynamicDependency, String> {
    s.parse().map_err(|e: crate::error::ConfigError| e.to_string())
}

/// Parse a worker count, which must be at least 1
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", s))?;
    if n == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    Ok(n)
}

/// Resolve and download everything a Maven build needs to run offline
#[derive(Parser, Debug, Clone)]
#[command(
    name = "go-offline",
    version,
    about = "Resolve and download everything a Maven build needs to run offline"
)]
pub struct CliArgs {
    /// Project directory containing the root pom.xml (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Configuration file (default: <PATH>/go-offline.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    // Resolution options
    /// Artifact types to resolve, comma separated: dependency, plugin, dynamic-dependency
    #[arg(long, value_delimiter = ',', value_parser = parse_artifact_type)]
    pub artifact_types: Vec<ArtifactType>,

    /// Also download sources jars
    #[arg(long)]
    pub download_sources: bool,

    /// Also download javadoc jars
    #[arg(long)]
    pub download_javadoc: bool,

    /// Copy POM files of every dependency into the target repository
    #[arg(long)]
    pub copy_poms: bool,

    /// Exit with a failure status if any error was recorded
    #[arg(long)]
    pub fail_on_errors: bool,

    /// Additional dependency to download (can be specified multiple times)
    #[arg(long, action = ArgAction::Append, value_parser = parse_dynamic_dependency)]
    pub dynamic_dependency: Vec<DynamicDependency>,

    /// Resolve the transitive dependencies of command-line dynamic dependencies
    #[arg(long)]
    pub include_transitive: bool,

    // Repository options
    /// Directory files are downloaded into (default: the local repository)
    #[arg(long)]
    pub target_repository: Option<PathBuf>,

    /// Local Maven repository (default: ~/.m2/repository)
    #[arg(long)]
    pub local_repository: Option<PathBuf>,

    /// Remote repository URL for dependencies (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub repository: Vec<String>,

    /// Remote repository URL for plugins (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub plugin_repository: Vec<String>,

    /// Maximum number of concurrent resolutions and downloads
    #[arg(long, value_parser = parse_concurrency)]
    pub concurrency: Option<usize>,

    // Output options
    /// Output the report in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Whether progress bars should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}
