//! Testing utilities for devflow.
//!
//! This module provides:
//! - A demo project and sample milestones
//! - Sample artifact configs and files
//! - A scratch workspace for on-disk state

mod fixtures;

pub use fixtures::{
    demo_project, sample_artifact_configs, sample_files, sample_milestones, TestWorkspace,
};
