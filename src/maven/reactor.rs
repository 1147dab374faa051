//! Loading a multi-module build from disk

use super::lifecycle::with_lifecycle;
use super::model::{own_coordinate, parent_coordinate};
use super::pom::RawPom;
use super::resolver::MavenResolver;
use crate::domain::{extension_for_type, ArtifactCoordinate, BuildUnit, RepositoryType};
use crate::error::{AppError, ConfigError, IoError};
use crate::resolver::{Repository, ResolutionContext};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of a module descriptor
pub const POM_FILE_NAME: &str = "pom.xml";

/// Modules of a build, in declaration order, with the repositories they declare
#[derive(Debug, Clone, Default)]
pub struct Reactor {
    pub units: Vec<BuildUnit>,
    pub repositories: Vec<Repository>,
    pub plugin_repositories: Vec<Repository>,
}

impl Reactor {
    /// Add the declared repositories after the ones already configured
    pub fn extend_context(&self, context: &mut ResolutionContext) {
        for repository in &self.repositories {
            context.add_repository(RepositoryType::Main, repository.clone());
        }
        for repository in &self.plugin_repositories {
            context.add_repository(RepositoryType::Plugin, repository.clone());
        }
    }
}

struct ModulePom {
    path: PathBuf,
    coordinate: ArtifactCoordinate,
}

/// Read `pom.xml` in `project_dir` and every module below it
///
/// All module POMs are registered with the resolver before any effective
/// model is built, so modules can depend on and inherit from each other.
pub async fn load_reactor(
    project_dir: &Path,
    resolver: &MavenResolver,
    context: &ResolutionContext,
) -> Result<Reactor, AppError> {
    let root = project_dir.join(POM_FILE_NAME);
    if !root.is_file() {
        return Err(ConfigError::InvalidPath {
            path: project_dir.to_path_buf(),
            message: format!("no {} found", POM_FILE_NAME),
        }
        .into());
    }

    let mut modules = Vec::new();
    let mut visited = HashSet::new();
    let mut pending = vec![root];
    // properties of the root POM, for `${revision}` style module versions
    let mut root_properties: Option<HashMap<String, String>> = None;
    while let Some(path) = pending.pop() {
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        if !visited.insert(path.clone()) {
            continue;
        }
        let (raw, xml) = read_pom(&path).await?;
        let defaults = &*root_properties.get_or_insert_with(|| {
            resolver.set_reactor_properties(raw.properties.clone());
            raw.properties.clone()
        });
        let location = path.display().to_string();
        let coordinate = own_coordinate(&raw, None, defaults, &location)?;
        resolver.register_workspace(&coordinate, &path, xml);
        debug!(module = %coordinate, path = %location, "Registered module");

        register_local_parent(&raw, &path, defaults, resolver).await;

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        // reversed so the stack yields modules in declaration order
        for module in raw.modules.iter().rev() {
            let module_dir = dir.join(module);
            let module_pom = if module_dir.is_file() {
                module_dir
            } else {
                module_dir.join(POM_FILE_NAME)
            };
            pending.push(module_pom);
        }
        modules.push(ModulePom { path, coordinate });
    }

    let mut reactor = Reactor::default();
    for module in modules {
        let model = resolver
            .model(context, &module.coordinate, RepositoryType::Main)
            .await?;
        let packaging = model.packaging.as_str();

        let mut unit = BuildUnit::new(
            module
                .coordinate
                .clone()
                .with_extension(extension_for_type(packaging).0),
        );
        unit.base_dir = module.path.parent().map(Path::to_path_buf);
        unit.dependencies = model.dependencies.clone();
        unit.dependency_management = model.dependency_management.values().cloned().collect();
        unit.plugins = with_lifecycle(packaging, model.managed_plugins(), &model.plugin_management);

        for repository in &model.repositories {
            if !reactor.repositories.iter().any(|r| r.url == repository.url) {
                reactor.repositories.push(repository.clone());
            }
        }
        for repository in &model.plugin_repositories {
            if !reactor.plugin_repositories.iter().any(|r| r.url == repository.url) {
                reactor.plugin_repositories.push(repository.clone());
            }
        }
        reactor.units.push(unit);
    }

    info!(
        modules = reactor.units.len(),
        project = %project_dir.display(),
        "Loaded reactor"
    );
    Ok(reactor)
}

async fn read_pom(path: &Path) -> Result<(RawPom, String), AppError> {
    let xml = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::from(ConfigError::InvalidPath {
                path: path.to_path_buf(),
                message: "module POM does not exist".to_string(),
            })
        } else {
            IoError::from_io(path, e).into()
        }
    })?;
    let raw = RawPom::parse(&xml, &path.display().to_string())?;
    Ok((raw, xml))
}

/// Register a parent POM found at its `relativePath` when it is not a module itself
async fn register_local_parent(
    raw: &RawPom,
    child: &Path,
    defaults: &HashMap<String, String>,
    resolver: &MavenResolver,
) {
    let (Some(parent), Some(expected)) = (&raw.parent, parent_coordinate(raw, defaults)) else {
        return;
    };
    let relative = parent.relative_path.as_deref().unwrap_or("../pom.xml");
    if relative.is_empty() {
        return;
    }
    let Some(dir) = child.parent() else {
        return;
    };
    let mut path = dir.join(relative);
    if path.is_dir() {
        path = path.join(POM_FILE_NAME);
    }

    let Ok(xml) = tokio::fs::read_to_string(&path).await else {
        return;
    };
    let location = path.display().to_string();
    let Ok(candidate) = RawPom::parse(&xml, &location) else {
        return;
    };
    let Ok(coordinate) = own_coordinate(&candidate, None, defaults, &location) else {
        return;
    };
    if coordinate == expected && !resolver.is_workspace(&coordinate) {
        debug!(parent = %coordinate, path = %location, "Using parent from relativePath");
        resolver.register_workspace(&coordinate, path, xml);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maven::client::HttpClient;
    use crate::maven::transport::RepositoryTransport;
    use std::fs;
    use tempfile::TempDir;

    fn resolver(local: &TempDir) -> MavenResolver {
        MavenResolver::new(
            RepositoryTransport::new(HttpClient::new().unwrap()),
            local.path(),
        )
    }

    #[tokio::test]
    async fn test_missing_pom_is_config_error() {
        let project = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        let err = load_reactor(
            project.path(),
            &resolver(&local),
            &ResolutionContext::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_modules_inherit_from_aggregator() {
        let project = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        fs::write(
            project.path().join("pom.xml"),
            r#"<project>
  <groupId>org.example</groupId>
  <artifactId>parent</artifactId>
  <version>1.0</version>
  <packaging>pom</packaging>
  <modules><module>core</module><module>web</module></modules>
  <repositories>
    <repository><id>corp</id><url>https://repo.example.com/maven</url></repository>
  </repositories>
  <build>
    <pluginManagement>
      <plugins>
        <plugin><artifactId>maven-compiler-plugin</artifactId><version>3.13.0</version></plugin>
      </plugins>
    </pluginManagement>
  </build>
</project>"#,
        )
        .unwrap();
        for (name, packaging, deps) in [
            ("core", "jar", ""),
            (
                "web",
                "war",
                "<dependencies><dependency><groupId>org.example</groupId><artifactId>core</artifactId><version>${project.version}</version></dependency></dependencies>",
            ),
        ] {
            let dir = project.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(
                dir.join("pom.xml"),
                format!(
                    "<project><parent><groupId>org.example</groupId><artifactId>parent</artifactId><version>1.0</version></parent><artifactId>{}</artifactId><packaging>{}</packaging>{}</project>",
                    name, packaging, deps
                ),
            )
            .unwrap();
        }

        let resolver = resolver(&local);
        let reactor = load_reactor(project.path(), &resolver, &ResolutionContext::default())
            .await
            .unwrap();

        let labels: Vec<String> = reactor.units.iter().map(|u| u.label()).collect();
        assert_eq!(
            labels,
            vec![
                "org.example:parent:1.0",
                "org.example:core:1.0",
                "org.example:web:1.0"
            ]
        );

        let web = &reactor.units[2];
        assert_eq!(web.dependencies[0].artifact.version, "1.0");
        let compiler = web
            .plugins
            .iter()
            .find(|p| p.artifact.artifact_id == "maven-compiler-plugin")
            .unwrap();
        assert_eq!(compiler.artifact.version, "3.13.0");
        assert!(web
            .plugins
            .iter()
            .any(|p| p.artifact.artifact_id == "maven-war-plugin"));

        assert_eq!(reactor.repositories[0].id, "corp");

        let mut context = ResolutionContext::default();
        reactor.extend_context(&mut context);
        assert_eq!(context.repositories(RepositoryType::Main).len(), 2);
        assert!(resolver.is_workspace(&web.coordinate));
    }

    #[tokio::test]
    async fn test_revision_versioned_modules() {
        let project = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        fs::write(
            project.path().join("pom.xml"),
            r#"<project>
  <groupId>org.example</groupId>
  <artifactId>root</artifactId>
  <version>${revision}</version>
  <packaging>pom</packaging>
  <properties><revision>1.0-SNAPSHOT</revision></properties>
  <modules><module>core</module></modules>
</project>"#,
        )
        .unwrap();
        let core = project.path().join("core");
        fs::create_dir_all(&core).unwrap();
        fs::write(
            core.join("pom.xml"),
            r#"<project>
  <parent><groupId>org.example</groupId><artifactId>root</artifactId><version>${revision}</version></parent>
  <artifactId>core</artifactId>
</project>"#,
        )
        .unwrap();

        // no repository is reachable, so every parent must come from the reactor
        let context = ResolutionContext::new(Vec::new(), Vec::new());
        let resolver = resolver(&local);
        let reactor = load_reactor(project.path(), &resolver, &context)
            .await
            .unwrap();

        let labels: Vec<String> = reactor.units.iter().map(|u| u.label()).collect();
        assert_eq!(
            labels,
            vec!["org.example:root:1.0-SNAPSHOT", "org.example:core:1.0-SNAPSHOT"]
        );
    }
}
