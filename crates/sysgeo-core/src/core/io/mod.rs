//! Provides input/output for textual assembly formats.
//!
//! The [`traits::AssemblyFile`] trait is the common interface every format implements. The
//! [`sysml`] module writes an [`Assembly`](crate::core::models::assembly::Assembly) as SysML v2
//! textual notation and reads the same subset back.

pub mod sysml;
pub mod traits;
