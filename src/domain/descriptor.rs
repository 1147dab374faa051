//! Descriptor (POM) model with its parent chain

use super::{ArtifactCoordinate, PluginDeclaration};

/// A built descriptor and, transitively, the descriptors it inherits from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Coordinate of the descriptor itself (extension `pom`)
    pub coordinate: ArtifactCoordinate,
    pub parent: Option<Box<ProjectDescriptor>>,
    /// Build plugins; only populated while plugin processing is enabled
    pub plugins: Vec<PluginDeclaration>,
}

impl ProjectDescriptor {
    pub fn new(coordinate: ArtifactCoordinate) -> Self {
        Self {
            coordinate,
            parent: None,
            plugins: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: ProjectDescriptor) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn parent(&self) -> Option<&ProjectDescriptor> {
        self.parent.as_deref()
    }

    /// Ancestors from the direct parent up to the root
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.parent(),
        }
    }
}

/// Iterator over a descriptor's parent chain
pub struct Ancestors<'a> {
    next: Option<&'a ProjectDescriptor>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ProjectDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}
