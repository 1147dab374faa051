//! Effective POM model: a raw POM merged with its parent chain and imported BOMs

use super::pom::{
    has_placeholder, interpolate, RawDependency, RawPlugin, RawPom, RawRepository,
    DEFAULT_PLUGIN_GROUP,
};
use crate::domain::{
    ArtifactCoordinate, DependencyDeclaration, DependencyScope, PluginDeclaration,
    ProjectDescriptor,
};
use crate::error::DescriptorError;
use crate::resolver::Repository;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// A POM with inheritance, interpolation and BOM imports applied
#[derive(Debug, Clone)]
pub struct EffectiveModel {
    /// The POM's own coordinate (extension `pom`)
    pub coordinate: ArtifactCoordinate,
    pub packaging: String,
    pub parent: Option<Arc<EffectiveModel>>,
    pub properties: HashMap<String, String>,
    pub modules: Vec<String>,
    pub dependencies: Vec<DependencyDeclaration>,
    /// Keyed by `group:artifact:extension[:classifier]`
    pub dependency_management: BTreeMap<String, DependencyDeclaration>,
    /// Declared build plugins; versions may still be empty
    pub plugins: Vec<PluginDeclaration>,
    /// Managed plugin versions keyed by `group:artifact`
    pub plugin_management: HashMap<String, String>,
    pub repositories: Vec<Repository>,
    pub plugin_repositories: Vec<Repository>,
    /// Uninterpolated sections of this POM and its ancestors, root first
    inherited: RawPom,
}

/// Coordinate a raw POM declares for itself, with placeholders expanded
///
/// `defaults` rank below the parent's and the POM's own properties. They
/// carry the reactor root's properties for CI-friendly `${revision}` builds.
pub fn own_coordinate(
    raw: &RawPom,
    parent: Option<&EffectiveModel>,
    defaults: &HashMap<String, String>,
    location: &str,
) -> Result<ArtifactCoordinate, DescriptorError> {
    let mut properties = defaults.clone();
    properties.extend(base_properties(raw, parent));
    let group_id = raw
        .effective_group_id()
        .ok_or_else(|| DescriptorError::missing_element(location, "groupId"))?;
    let artifact_id = raw
        .artifact_id
        .as_deref()
        .ok_or_else(|| DescriptorError::missing_element(location, "artifactId"))?;
    let version = raw
        .effective_version()
        .ok_or_else(|| DescriptorError::missing_element(location, "version"))?;

    Ok(ArtifactCoordinate::new(
        interpolate(group_id, &properties),
        interpolate(artifact_id, &properties),
        interpolate(version, &properties),
    )
    .pom())
}

/// Coordinate of the POM's `<parent>`, expanded with its own properties over `defaults`
pub fn parent_coordinate(
    raw: &RawPom,
    defaults: &HashMap<String, String>,
) -> Option<ArtifactCoordinate> {
    let parent = raw.parent.as_ref()?;
    let mut properties = defaults.clone();
    properties.extend(raw.properties.clone());
    Some(
        ArtifactCoordinate::new(
            interpolate(&parent.group_id, &properties),
            interpolate(&parent.artifact_id, &properties),
            interpolate(&parent.version, &properties),
        )
        .pom(),
    )
}

/// Properties visible to a POM: parent first, then its own, then `project.*`
pub fn properties_for(
    raw: &RawPom,
    coordinate: &ArtifactCoordinate,
    parent: Option<&EffectiveModel>,
) -> HashMap<String, String> {
    let mut properties = base_properties(raw, parent);
    properties.insert("project.groupId".to_string(), coordinate.group_id.clone());
    properties.insert(
        "project.artifactId".to_string(),
        coordinate.artifact_id.clone(),
    );
    properties.insert("project.version".to_string(), coordinate.version.clone());
    properties.insert("project.packaging".to_string(), raw.packaging().to_string());
    if let Some(parent) = parent {
        properties.insert(
            "project.parent.groupId".to_string(),
            parent.coordinate.group_id.clone(),
        );
        properties.insert(
            "project.parent.artifactId".to_string(),
            parent.coordinate.artifact_id.clone(),
        );
        properties.insert(
            "project.parent.version".to_string(),
            parent.coordinate.version.clone(),
        );
    }
    properties
}

fn base_properties(raw: &RawPom, parent: Option<&EffectiveModel>) -> HashMap<String, String> {
    let mut properties = parent.map(|p| p.properties.clone()).unwrap_or_default();
    properties.extend(raw.properties.clone());
    properties
}

/// Inherited sections followed by the POM's own
fn inherit(raw: &RawPom, parent: Option<&EffectiveModel>) -> RawPom {
    let mut inherited = parent.map(|p| p.inherited.clone()).unwrap_or_default();
    inherited
        .dependency_management
        .extend(raw.dependency_management.iter().cloned());
    inherited.dependencies.extend(raw.dependencies.iter().cloned());
    inherited.plugins.extend(raw.plugins.iter().cloned());
    inherited
        .plugin_management
        .extend(raw.plugin_management.iter().cloned());
    inherited.repositories.extend(raw.repositories.iter().cloned());
    inherited
        .plugin_repositories
        .extend(raw.plugin_repositories.iter().cloned());
    inherited
}

/// BOMs imported through `scope=import` dependencyManagement entries, inherited ones included
pub fn bom_imports(
    raw: &RawPom,
    parent: Option<&EffectiveModel>,
    properties: &HashMap<String, String>,
) -> Vec<ArtifactCoordinate> {
    let mut imports: Vec<ArtifactCoordinate> = Vec::new();
    for entry in inherit(raw, parent)
        .dependency_management
        .iter()
        .filter(|entry| entry.is_bom_import())
    {
        let (Some(group_id), Some(artifact_id), Some(version)) =
            (&entry.group_id, &entry.artifact_id, &entry.version)
        else {
            continue;
        };
        let coordinate = ArtifactCoordinate::new(
            interpolate(group_id, properties),
            interpolate(artifact_id, properties),
            interpolate(version, properties),
        )
        .pom();
        if !imports.contains(&coordinate) {
            imports.push(coordinate);
        }
    }
    imports
}

impl EffectiveModel {
    /// Merge a raw POM with its already-built parent and imported BOMs
    ///
    /// Sections are inherited first and interpolated afterwards, so a child
    /// property overrides the value a parent's placeholder expands to.
    pub fn assemble(
        raw: RawPom,
        coordinate: ArtifactCoordinate,
        parent: Option<Arc<EffectiveModel>>,
        imports: &[Arc<EffectiveModel>],
    ) -> Self {
        let properties = properties_for(&raw, &coordinate, parent.as_deref());
        let inherited = inherit(&raw, parent.as_deref());

        // declared entries win over imported ones; later (child) entries win over earlier ones
        let mut dependency_management = BTreeMap::new();
        for entry in inherited
            .dependency_management
            .iter()
            .filter(|e| !e.is_bom_import())
        {
            if let Some(managed) = declaration(entry, &properties, None) {
                dependency_management.insert(managed.artifact.versionless_key(), managed);
            }
        }
        for import in imports {
            for (key, managed) in &import.dependency_management {
                dependency_management
                    .entry(key.clone())
                    .or_insert_with(|| managed.clone());
            }
        }

        let mut dependencies: Vec<DependencyDeclaration> = Vec::new();
        for entry in &inherited.dependencies {
            let Some(dependency) = declaration(entry, &properties, Some(&dependency_management))
            else {
                debug!(pom = %coordinate, "Skipping dependency without groupId or artifactId");
                continue;
            };
            let key = dependency.artifact.versionless_key();
            dependencies.retain(|d| d.artifact.versionless_key() != key);
            dependencies.push(dependency);
        }

        let mut plugin_management = HashMap::new();
        for managed in inherited
            .plugin_management
            .iter()
            .filter_map(|p| plugin_declaration(p, &properties))
            .filter(|p| p.has_version())
        {
            plugin_management.insert(
                managed.artifact.management_key(),
                managed.artifact.version.clone(),
            );
        }

        let mut plugins: Vec<PluginDeclaration> = Vec::new();
        for plugin in inherited
            .plugins
            .iter()
            .filter_map(|p| plugin_declaration(p, &properties))
        {
            let key = plugin.artifact.management_key();
            match plugins
                .iter_mut()
                .find(|p| p.artifact.management_key() == key)
            {
                Some(existing) => {
                    if plugin.has_version() {
                        existing.artifact.version = plugin.artifact.version.clone();
                    }
                    existing.dependencies.extend(plugin.dependencies);
                }
                None => plugins.push(plugin),
            }
        }

        let repositories = repositories_from(&inherited.repositories, &properties);
        let plugin_repositories = repositories_from(&inherited.plugin_repositories, &properties);

        Self {
            packaging: raw.packaging().to_string(),
            coordinate,
            parent,
            properties,
            modules: raw.modules,
            dependencies,
            dependency_management,
            plugins,
            plugin_management,
            repositories,
            plugin_repositories,
            inherited,
        }
    }

    /// Managed entry for an artifact, if any
    pub fn managed(&self, artifact: &ArtifactCoordinate) -> Option<&DependencyDeclaration> {
        self.dependency_management.get(&artifact.versionless_key())
    }

    /// Build plugins with versions filled from pluginManagement
    pub fn managed_plugins(&self) -> Vec<PluginDeclaration> {
        self.plugins
            .iter()
            .cloned()
            .map(|mut plugin| {
                if !plugin.has_version() {
                    if let Some(version) =
                        self.plugin_management.get(&plugin.artifact.management_key())
                    {
                        plugin.artifact.version = version.clone();
                    }
                }
                plugin
            })
            .collect()
    }

    /// Descriptor view of this model and its ancestors
    pub fn to_descriptor(&self, include_plugins: bool) -> ProjectDescriptor {
        let mut descriptor = ProjectDescriptor::new(self.coordinate.clone());
        if include_plugins {
            descriptor.plugins = self.managed_plugins();
        }
        if let Some(parent) = &self.parent {
            descriptor = descriptor.with_parent(parent.to_descriptor(include_plugins));
        }
        descriptor
    }
}

/// Convert a raw dependency, filling version, scope and exclusions from management
fn declaration(
    raw: &RawDependency,
    properties: &HashMap<String, String>,
    management: Option<&BTreeMap<String, DependencyDeclaration>>,
) -> Option<DependencyDeclaration> {
    let value = |v: &Option<String>| v.as_deref().map(|v| interpolate(v, properties));

    let artifact = ArtifactCoordinate::from_type(
        &value(&raw.group_id)?,
        &value(&raw.artifact_id)?,
        &value(&raw.version).unwrap_or_default(),
        value(&raw.dependency_type).as_deref(),
        value(&raw.classifier).as_deref(),
    );
    let managed = management.and_then(|m| m.get(&artifact.versionless_key()));

    let mut artifact = artifact;
    if artifact.version.is_empty() || has_placeholder(&artifact.version) {
        if let Some(managed) = managed {
            artifact.version = managed.artifact.version.clone();
        }
    }

    let scope = match value(&raw.scope) {
        Some(scope) => DependencyScope::parse(Some(&scope)),
        None => managed.map(|m| m.scope).unwrap_or_default(),
    };

    let mut declaration = DependencyDeclaration::new(artifact)
        .with_scope(scope)
        .with_optional(raw.optional);
    for exclusion in &raw.exclusions {
        declaration = declaration.with_exclusion(exclusion.clone());
    }
    if let Some(managed) = managed {
        for exclusion in &managed.exclusions {
            if !declaration.exclusions.contains(exclusion) {
                declaration = declaration.with_exclusion(exclusion.clone());
            }
        }
    }
    Some(declaration)
}

fn plugin_declaration(
    raw: &RawPlugin,
    properties: &HashMap<String, String>,
) -> Option<PluginDeclaration> {
    let group_id = raw
        .group_id
        .as_deref()
        .map(|g| interpolate(g, properties))
        .unwrap_or_else(|| DEFAULT_PLUGIN_GROUP.to_string());
    let artifact_id = interpolate(raw.artifact_id.as_deref()?, properties);
    let version = raw
        .version
        .as_deref()
        .map(|v| interpolate(v, properties))
        .filter(|v| !has_placeholder(v))
        .unwrap_or_default();

    let mut plugin = PluginDeclaration::new(ArtifactCoordinate::from_type(
        &group_id,
        &artifact_id,
        &version,
        Some("maven-plugin"),
        None,
    ));
    for dependency in &raw.dependencies {
        if let Some(dependency) = declaration(dependency, properties, None) {
            plugin = plugin.with_dependency(dependency);
        }
    }
    Some(plugin)
}

fn repositories_from(
    raw: &[RawRepository],
    properties: &HashMap<String, String>,
) -> Vec<Repository> {
    raw.iter()
        .filter_map(|repo| {
            let url = interpolate(&repo.url, properties);
            let mut repository = Repository::from_url(&url).ok()?;
            if let Some(id) = &repo.id {
                repository.id = interpolate(id, properties);
            }
            Some(repository)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(
        xml: &str,
        parent: Option<Arc<EffectiveModel>>,
        imports: &[Arc<EffectiveModel>],
    ) -> Arc<EffectiveModel> {
        let raw = RawPom::parse(xml, "test.pom").unwrap();
        let coordinate = own_coordinate(&raw, parent.as_deref(), &HashMap::new(), "test.pom").unwrap();
        Arc::new(EffectiveModel::assemble(raw, coordinate, parent, imports))
    }

    const PARENT: &str = r#"<project>
  <groupId>org.example</groupId>
  <artifactId>parent</artifactId>
  <version>1.0</version>
  <packaging>pom</packaging>
  <properties><slf4j.version>2.0.9</slf4j.version></properties>
  <dependencyManagement><dependencies>
    <dependency><groupId>org.slf4j</groupId><artifactId>slf4j-api</artifactId><version>${slf4j.version}</version></dependency>
    <dependency><groupId>org.example</groupId><artifactId>util</artifactId><version>3.0</version><scope>runtime</scope></dependency>
  </dependencies></dependencyManagement>
  <build>
    <pluginManagement><plugins>
      <plugin><artifactId>maven-compiler-plugin</artifactId><version>3.12.1</version></plugin>
    </plugins></pluginManagement>
    <plugins>
      <plugin><artifactId>maven-compiler-plugin</artifactId></plugin>
    </plugins>
  </build>
</project>"#;

    const CHILD: &str = r#"<project>
  <parent><groupId>org.example</groupId><artifactId>parent</artifactId><version>1.0</version></parent>
  <artifactId>app</artifactId>
  <properties><slf4j.version>2.0.12</slf4j.version></properties>
  <dependencies>
    <dependency><groupId>org.slf4j</groupId><artifactId>slf4j-api</artifactId></dependency>
    <dependency><groupId>org.example</groupId><artifactId>util</artifactId></dependency>
    <dependency><groupId>${project.groupId}</groupId><artifactId>sibling</artifactId><version>${project.version}</version><type>test-jar</type></dependency>
  </dependencies>
  <build><plugins>
    <plugin><groupId>org.codehaus.mojo</groupId><artifactId>exec-maven-plugin</artifactId><version>3.1.0</version></plugin>
  </plugins></build>
</project>"#;

    #[test]
    fn test_child_inherits_from_parent() {
        let parent = model(PARENT, None, &[]);
        let child = model(CHILD, Some(parent), &[]);

        assert_eq!(child.coordinate, ArtifactCoordinate::new("org.example", "app", "1.0").pom());
        assert_eq!(child.packaging, "jar");

        let slf4j = &child.dependencies[0];
        // parent-declared management, interpolated with the child's properties
        assert_eq!(slf4j.artifact.version, "2.0.12");

        let util = &child.dependencies[1];
        assert_eq!(util.artifact.version, "3.0");
        assert_eq!(util.scope, DependencyScope::Runtime);

        let sibling = &child.dependencies[2];
        assert_eq!(sibling.artifact.version, "1.0");
        assert_eq!(sibling.artifact.classifier(), Some("tests"));
    }

    #[test]
    fn test_plugins_inherit_and_take_managed_versions() {
        let parent = model(PARENT, None, &[]);
        let child = model(CHILD, Some(parent), &[]);
        let plugins = child.managed_plugins();

        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].artifact.group_id, DEFAULT_PLUGIN_GROUP);
        assert_eq!(plugins[0].artifact.version, "3.12.1");
        assert_eq!(plugins[0].artifact.extension, "jar");
        assert_eq!(plugins[1].artifact.artifact_id, "exec-maven-plugin");
    }

    #[test]
    fn test_bom_import_fills_management() {
        let bom = model(
            r#"<project><groupId>org.example</groupId><artifactId>bom</artifactId><version>5</version><packaging>pom</packaging>
              <dependencyManagement><dependencies>
                <dependency><groupId>org.example</groupId><artifactId>core</artifactId><version>5.1</version></dependency>
              </dependencies></dependencyManagement></project>"#,
            None,
            &[],
        );
        let xml = r#"<project><groupId>org.example</groupId><artifactId>app</artifactId><version>1</version>
            <dependencyManagement><dependencies>
              <dependency><groupId>org.example</groupId><artifactId>bom</artifactId><version>5</version><type>pom</type><scope>import</scope></dependency>
            </dependencies></dependencyManagement>
            <dependencies><dependency><groupId>org.example</groupId><artifactId>core</artifactId></dependency></dependencies>
            </project>"#;

        let raw = RawPom::parse(xml, "app.pom").unwrap();
        let coordinate = own_coordinate(&raw, None, &HashMap::new(), "app.pom").unwrap();
        let properties = properties_for(&raw, &coordinate, None);
        assert_eq!(
            bom_imports(&raw, None, &properties),
            vec![ArtifactCoordinate::new("org.example", "bom", "5").pom()]
        );

        let app = EffectiveModel::assemble(raw, coordinate, None, &[bom]);
        assert_eq!(app.dependencies[0].artifact.version, "5.1");
        assert!(app.managed(&ArtifactCoordinate::new("org.example", "core", "")).is_some());
    }

    #[test]
    fn test_descriptor_chain_respects_plugin_flag() {
        let parent = model(PARENT, None, &[]);
        let child = model(CHILD, Some(parent), &[]);

        let with_plugins = child.to_descriptor(true);
        assert_eq!(with_plugins.plugins.len(), 2);
        assert_eq!(with_plugins.ancestors().count(), 1);

        let without = child.to_descriptor(false);
        assert!(without.plugins.is_empty());
        assert!(without.parent().unwrap().plugins.is_empty());
    }

    #[test]
    fn test_revision_from_defaults() {
        let raw = RawPom::parse(
            r#"<project>
  <parent><groupId>org.example</groupId><artifactId>root</artifactId><version>${revision}</version></parent>
  <artifactId>core</artifactId>
</project>"#,
            "core/pom.xml",
        )
        .unwrap();
        let defaults = HashMap::from([("revision".to_string(), "1.0-SNAPSHOT".to_string())]);

        assert_eq!(
            parent_coordinate(&raw, &defaults),
            Some(ArtifactCoordinate::new("org.example", "root", "1.0-SNAPSHOT").pom())
        );
        let own = own_coordinate(&raw, None, &defaults, "core/pom.xml").unwrap();
        assert_eq!(own.version, "1.0-SNAPSHOT");

        let unresolved = parent_coordinate(&raw, &HashMap::new()).unwrap();
        assert_eq!(unresolved.version, "${revision}");
    }

    #[test]
    fn test_missing_artifact_id() {
        let raw = RawPom::parse("<project><groupId>g</groupId><version>1</version></project>", "x.pom").unwrap();
        let err = own_coordinate(&raw, None, &HashMap::new(), "x.pom").unwrap_err();
        assert!(err.to_string().contains("artifactId"));
    }
}
