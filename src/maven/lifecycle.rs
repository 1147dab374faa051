//! Plugins Maven binds to the default lifecycle for each packaging

use super::pom::DEFAULT_PLUGIN_GROUP;
use crate::domain::{ArtifactCoordinate, PluginDeclaration};
use std::collections::HashMap;

const CLEAN: (&str, &str) = ("maven-clean-plugin", "3.2.0");
const RESOURCES: (&str, &str) = ("maven-resources-plugin", "3.3.1");
const COMPILER: (&str, &str) = ("maven-compiler-plugin", "3.11.0");
const SUREFIRE: (&str, &str) = ("maven-surefire-plugin", "3.2.2");
const JAR: (&str, &str) = ("maven-jar-plugin", "3.3.0");
const WAR: (&str, &str) = ("maven-war-plugin", "3.4.0");
const PLUGIN: (&str, &str) = ("maven-plugin-plugin", "3.9.0");
const INSTALL: (&str, &str) = ("maven-install-plugin", "3.1.1");
const DEPLOY: (&str, &str) = ("maven-deploy-plugin", "3.1.1");
const SITE: (&str, &str) = ("maven-site-plugin", "3.12.1");

fn bindings(packaging: &str) -> &'static [(&'static str, &'static str)] {
    match packaging {
        "pom" => &[CLEAN, INSTALL, DEPLOY, SITE],
        "war" => &[
            CLEAN, RESOURCES, COMPILER, SUREFIRE, WAR, INSTALL, DEPLOY, SITE,
        ],
        "maven-plugin" => &[
            CLEAN, RESOURCES, COMPILER, SUREFIRE, JAR, PLUGIN, INSTALL, DEPLOY, SITE,
        ],
        _ => &[
            CLEAN, RESOURCES, COMPILER, SUREFIRE, JAR, INSTALL, DEPLOY, SITE,
        ],
    }
}

/// Default lifecycle plugins for a packaging
///
/// Versions are the defaults of the Maven 3.9 super POM; a project's
/// pluginManagement takes precedence.
pub fn default_plugins(packaging: &str) -> Vec<PluginDeclaration> {
    bindings(packaging)
        .iter()
        .map(|(artifact_id, version)| {
            PluginDeclaration::new(ArtifactCoordinate::new(
                DEFAULT_PLUGIN_GROUP,
                *artifact_id,
                *version,
            ))
        })
        .collect()
}

/// Declared plugins completed with the lifecycle defaults
///
/// A declared plugin keeps its position and its dependencies; a missing
/// version is taken from `managed` (group:artifact to version) and then from
/// the lifecycle default.
pub fn with_lifecycle(
    packaging: &str,
    declared: Vec<PluginDeclaration>,
    managed: &HashMap<String, String>,
) -> Vec<PluginDeclaration> {
    let mut plugins = declared;
    for default in default_plugins(packaging) {
        let key = default.artifact.management_key();
        match plugins
            .iter_mut()
            .find(|p| p.artifact.management_key() == key)
        {
            Some(existing) if !existing.has_version() => {
                existing.artifact.version = default.artifact.version;
            }
            Some(_) => {}
            None => {
                let mut plugin = default;
                if let Some(version) = managed.get(&key) {
                    plugin.artifact.version = version.clone();
                }
                plugins.push(plugin);
            }
        }
    }
    plugins
}
