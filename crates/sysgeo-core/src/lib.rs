//! # SysGeo Core Library
//!
//! A CAD-agnostic representation of mechanical assemblies (named components, parent-relative
//! poses and strict containment) together with its export to SysML v2 textual notation.
//!
//! ## Architectural Philosophy
//!
//! The library is organized in three layers so that the vendor-specific pieces never leak into
//! the generic model.
//!
//! - **[`core`]: The Foundation.** Contains the assembly model (`Assembly`, `Component`, `Pose`),
//!   the pluggable transform utilities, and file I/O for the SysML v2 subset this crate emits.
//!
//! - **[`connector`]: The Vendor Boundary.** A thin Onshape REST client that resolves
//!   credentials explicitly, signs requests, and populates an `Assembly` from the occurrences of
//!   an Onshape assembly element.
//!
//! - **[`workflows`]: The Public API.** High-level entry points that tie the connector and the
//!   exporter together, such as fetching an Onshape assembly and rendering it as SysML text.

pub mod connector;
pub mod core;
pub mod workflows;
