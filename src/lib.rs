//! specscan - container registry bundle spec scanner library
//!
//! This library provides a registry adapter abstraction that:
//! - Enumerates the images hosted in a remote registry (paginated)
//! - Obtains a short-lived authorization token per batch
//! - Fetches each image manifest and decodes the bundle spec in its labels
//!
//! Supported registries: Docker Registry v2 and, with the `ecr` feature,
//! Amazon Elastic Container Registry.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
