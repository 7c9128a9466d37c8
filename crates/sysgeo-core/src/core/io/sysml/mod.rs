//! SysML v2 textual notation.
//!
//! An assembly is written as a package holding a reusable component part definition and a
//! context definition whose single part usage is the root. Each component becomes a nested part
//! usage that redefines the pose attributes of the component definition:
//!
//! ```text
//! package MyStructure {
//!     part def Component { ... }
//!
//!     part def Context {
//!         part root : Component {
//!             attribute :>> tx = 0.0;
//!             ...
//!             part wheel subsets children { ... }
//!         }
//!     }
//! }
//! ```
//!
//! [`ExportConfig`] controls names, the reference frame and layout of the pose attributes, and
//! how angles are expressed. The reader accepts what the writer produces (with either attribute
//! style), so a file can be re-exported with different settings.

mod lexer;
mod names;

pub mod config;
pub mod error;
pub mod reader;
pub mod writer;

pub use config::{AttributeStyle, ConfigError, ExportConfig, ExportConfigBuilder, PoseFrame};
pub use error::{ExportError, ParseErrorKind, SysmlError};
pub use reader::parse;
pub use writer::{export, export_subtree, export_with};

use super::traits::AssemblyFile;
use crate::core::models::assembly::Assembly;
use std::io::{BufRead, Write};

/// The SysML v2 textual format.
pub struct SysmlFile;

impl AssemblyFile for SysmlFile {
    type Options = ExportConfig;
    type Error = SysmlError;

    fn read_from(
        reader: &mut impl BufRead,
        options: &Self::Options,
    ) -> Result<Assembly, Self::Error> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        parse(&source, options)
    }

    fn write_to(
        assembly: &Assembly,
        options: &Self::Options,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let text = export(assembly, options)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }
}
