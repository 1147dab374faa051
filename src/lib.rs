//! go-offline - pre-populates a Maven repository for offline builds
//!
//! This library resolves the complete artifact closure of a Maven build:
//! - build plugins and their dependencies
//! - project dependencies of every reactor module
//! - the parent POM chains of everything resolved
//! - extra "dynamic" dependencies named in configuration
//!
//! and downloads it into a target repository.

pub mod cli;
pub mod closure;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod download;
pub mod error;
pub mod logging;
pub mod maven;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod resolver;
