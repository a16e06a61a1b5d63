//! Core domain models for specscan
//!
//! This module contains the bundle spec types decoded from image labels:
//! - Spec: one bundle and its catalog metadata
//! - Plan: a service plan offered by a bundle
//! - Parameter: an input accepted by a plan

mod spec;

pub use spec::{Parameter, Plan, Spec, DEFAULT_RUNTIME};
