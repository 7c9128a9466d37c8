//! # Core Module
//!
//! This module provides the vendor-neutral building blocks of SysGeo: the in-memory assembly
//! model, the rigid-body transform utilities it relies on, and the textual file formats it can
//! be written to and read from.
//!
//! ## Architecture
//!
//! - **Assembly Representation** ([`models`]) - Components, poses, and the arena-backed assembly
//!   tree with its structural invariants
//! - **Transform Utilities** ([`transforms`]) - Conversions between rotation matrices, Euler
//!   angles, quaternions, and homogeneous transforms behind a narrow, swappable trait
//! - **File I/O** ([`io`]) - The SysML v2 textual writer and reader
//!
//! ## Key Capabilities
//!
//! - **Strict containment** - every operation preserves the tree invariant (no cycles, single
//!   ownership, unique sibling names) or fails without side effects
//! - **Pose composition** - world poses are derived on demand by composing local poses along
//!   the ancestor chain
//! - **Deterministic export** - identical trees always render to byte-identical text

pub mod io;
pub mod models;
pub mod transforms;
