//! Maven repository access and POM interpretation
//!
//! This module provides:
//! - `HttpClient` / `RepositoryTransport`: fetching from http(s) and file repositories
//! - `RawPom` / `EffectiveModel`: reading POMs and applying inheritance
//! - `MavenResolver`: the resolution collaborators backed by real repositories
//! - `load_reactor`: turning a multi-module build on disk into build units

pub mod client;
mod lifecycle;
mod model;
mod pom;
mod reactor;
mod resolver;
pub mod transport;

pub use client::HttpClient;
pub use lifecycle::{default_plugins, with_lifecycle};
pub use model::EffectiveModel;
pub use pom::{interpolate, RawPom, DEFAULT_PLUGIN_GROUP};
pub use reactor::{load_reactor, Reactor, POM_FILE_NAME};
pub use resolver::{resolve_version, MavenResolver, REMOTE_TRACKING_FILE};
pub use transport::{RepositoryTransport, Retrieved};
