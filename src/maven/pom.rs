//! POM document reader
//!
//! Produces the raw, uninterpolated content of one pom.xml. Inheritance and
//! `${...}` interpolation happen when the effective model is assembled.

use crate::domain::Exclusion;
use crate::error::DescriptorError;
use regex::Regex;
use roxmltree::{Document, Node};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Group used by plugins that omit `<groupId>`
pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Reference to a parent POM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub relative_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDependency {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub dependency_type: Option<String>,
    pub classifier: Option<String>,
    pub optional: bool,
    pub exclusions: Vec<Exclusion>,
}

impl RawDependency {
    /// `scope=import`, `type=pom` entry of dependencyManagement
    pub fn is_bom_import(&self) -> bool {
        self.scope
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("import"))
            && self
                .dependency_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("pom"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPlugin {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub dependencies: Vec<RawDependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRepository {
    pub id: Option<String>,
    pub url: String,
}

/// Content of one pom.xml
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: HashMap<String, String>,
    pub modules: Vec<String>,
    pub dependencies: Vec<RawDependency>,
    pub dependency_management: Vec<RawDependency>,
    pub plugins: Vec<RawPlugin>,
    pub plugin_management: Vec<RawPlugin>,
    pub repositories: Vec<RawRepository>,
    pub plugin_repositories: Vec<RawRepository>,
}

impl RawPom {
    /// Parse a POM; `location` only labels errors
    pub fn parse(xml: &str, location: &str) -> Result<Self, DescriptorError> {
        let normalized = normalize_xml_entities(xml);
        let document = Document::parse(normalized.as_ref())
            .map_err(|e| DescriptorError::parse(location, e.to_string()))?;
        let project = document.root_element();
        if project.tag_name().name() != "project" {
            return Err(DescriptorError::missing_element(location, "project"));
        }

        let build = child(&project, "build");

        Ok(Self {
            group_id: node_text(&project, "groupId"),
            artifact_id: node_text(&project, "artifactId"),
            version: node_text(&project, "version"),
            packaging: node_text(&project, "packaging"),
            parent: child(&project, "parent")
                .map(|node| parse_parent(&node, location))
                .transpose()?,
            properties: parse_properties(&project),
            modules: child(&project, "modules")
                .map(|modules| {
                    elements(&modules, "module")
                        .filter_map(|m| m.text().map(|t| t.trim().to_string()))
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            dependencies: parse_dependencies(&project),
            dependency_management: child(&project, "dependencyManagement")
                .map(|node| parse_dependencies(&node))
                .unwrap_or_default(),
            plugins: build
                .map(|node| parse_plugins(&node))
                .unwrap_or_default(),
            plugin_management: build
                .and_then(|node| child(&node, "pluginManagement"))
                .map(|node| parse_plugins(&node))
                .unwrap_or_default(),
            repositories: parse_repositories(&project, "repositories", "repository"),
            plugin_repositories: parse_repositories(
                &project,
                "pluginRepositories",
                "pluginRepository",
            ),
        })
    }

    /// groupId, falling back to the parent's
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// version, falling back to the parent's
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.version.as_str()))
    }

    pub fn packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or("jar")
    }
}

/// Replace `${key}` placeholders; unknown keys are left untouched
///
/// `pom.*` is treated as `project.*`. Nested placeholders are expanded up to
/// a fixed depth.
pub fn interpolate(value: &str, properties: &HashMap<String, String>) -> String {
    let mut current = value.trim().to_string();
    for _ in 0..8 {
        if !current.contains("${") {
            break;
        }
        let next = PLACEHOLDER_RE
            .replace_all(&current, |caps: &regex::Captures<'_>| {
                let key = &caps[1];
                let key = match key.strip_prefix("pom.") {
                    Some(rest) => Cow::Owned(format!("project.{}", rest)),
                    None => Cow::Borrowed(key),
                };
                properties
                    .get(key.as_ref())
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Whether a value still contains an unresolved placeholder
pub fn has_placeholder(value: &str) -> bool {
    PLACEHOLDER_RE.is_match(value)
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
}

fn elements<'a, 'input: 'a>(
    node: &Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |c| c.is_element() && c.tag_name().name() == tag)
}

fn node_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn parse_parent(node: &Node<'_, '_>, location: &str) -> Result<ParentRef, DescriptorError> {
    Ok(ParentRef {
        group_id: node_text(node, "groupId")
            .ok_or_else(|| DescriptorError::missing_element(location, "parent.groupId"))?,
        artifact_id: node_text(node, "artifactId")
            .ok_or_else(|| DescriptorError::missing_element(location, "parent.artifactId"))?,
        version: node_text(node, "version")
            .ok_or_else(|| DescriptorError::missing_element(location, "parent.version"))?,
        relative_path: node_text(node, "relativePath"),
    })
}

fn parse_properties(node: &Node<'_, '_>) -> HashMap<String, String> {
    child(node, "properties")
        .map(|props| {
            props
                .children()
                .filter(|c| c.is_element())
                .map(|prop| {
                    let value = prop.text().map(|t| t.trim().to_string()).unwrap_or_default();
                    (prop.tag_name().name().to_string(), value)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `<dependencies>` directly under `node`
fn parse_dependencies(node: &Node<'_, '_>) -> Vec<RawDependency> {
    child(node, "dependencies")
        .map(|deps| elements(&deps, "dependency").map(|d| parse_dependency(&d)).collect())
        .unwrap_or_default()
}

fn parse_dependency(node: &Node<'_, '_>) -> RawDependency {
    let exclusions = child(node, "exclusions")
        .map(|exclusions| {
            elements(&exclusions, "exclusion")
                .filter_map(|ex| {
                    Some(Exclusion::new(
                        node_text(&ex, "groupId")?,
                        node_text(&ex, "artifactId")?,
                    ))
                })
                .collect()
        })
        .unwrap_or_default();

    RawDependency {
        group_id: node_text(node, "groupId"),
        artifact_id: node_text(node, "artifactId"),
        version: node_text(node, "version"),
        scope: node_text(node, "scope"),
        dependency_type: node_text(node, "type"),
        classifier: node_text(node, "classifier"),
        optional: node_text(node, "optional").is_some_and(|v| v.eq_ignore_ascii_case("true")),
        exclusions,
    }
}

/// `<plugins>` directly under `node`
fn parse_plugins(node: &Node<'_, '_>) -> Vec<RawPlugin> {
    child(node, "plugins")
        .map(|plugins| {
            elements(&plugins, "plugin")
                .map(|plugin| RawPlugin {
                    group_id: node_text(&plugin, "groupId"),
                    artifact_id: node_text(&plugin, "artifactId"),
                    version: node_text(&plugin, "version"),
                    dependencies: parse_dependencies(&plugin),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_repositories(node: &Node<'_, '_>, group: &str, tag: &str) -> Vec<RawRepository> {
    child(node, group)
        .map(|repos| {
            elements(&repos, tag)
                .filter_map(|repo| {
                    Some(RawRepository {
                        id: node_text(&repo, "id"),
                        url: node_text(&repo, "url")?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Blank out entities roxmltree does not know (DTD-defined ones in old POMs)
fn normalize_xml_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            output.push(ch);
            continue;
        }

        let mut entity = String::new();
        while let Some(&next) = chars.peek() {
            entity.push(next);
            chars.next();
            if next == ';' || entity.len() > 32 {
                break;
            }
        }

        match entity.strip_suffix(';') {
            Some(name)
                if ["lt", "gt", "amp", "quot", "apos"]
                    .iter()
                    .any(|known| name.eq_ignore_ascii_case(known))
                    || name.starts_with('#') =>
            {
                output.push('&');
                output.push_str(&entity);
            }
            Some(_) => output.push(' '),
            None => {
                output.push('&');
                output.push_str(&entity);
            }
        }
    }

    Cow::Owned(output)
}
