//! # Core Models Module
//!
//! This module contains the data structures used to represent an assembly: a tree of named
//! components, each located relative to its parent by a rigid [`pose::Pose`].
//!
//! ## Key Components
//!
//! - [`component`] - A single node of the tree with its name, local pose and metadata
//! - [`pose`] - Validated rigid-body poses and their composition
//! - [`assembly`] - The arena that owns every component and enforces the tree invariants
//! - [`ids`] - Unique identifier types for components
//! - [`error`] - Errors raised by model operations
//!
//! ## Usage
//!
//! ```ignore
//! use sysgeo::core::models::{assembly::Assembly, pose::Pose};
//! use nalgebra::Vector3;
//!
//! let mut assembly = Assembly::new("bike", "frame", Pose::identity());
//! let root = assembly.root();
//! let wheel = assembly.create_component(
//!     "front_wheel",
//!     Pose::from_translation(Vector3::new(0.6, 0.0, 0.0)),
//!     Some(root),
//! )?;
//! let world = assembly.world_pose(wheel)?;
//! ```

pub mod assembly;
pub mod component;
pub mod error;
pub mod ids;
pub mod pose;
