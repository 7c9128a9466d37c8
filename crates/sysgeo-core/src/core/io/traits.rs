use crate::core::models::assembly::Assembly;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing assembly file formats.
///
/// Implementors handle format-specific parsing and serialization. Both directions share one
/// options type so that a file written with some settings can be read back with the same ones.
pub trait AssemblyFile {
    /// Format settings used for both reading and writing.
    type Options;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads an assembly from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    /// * `options` - How pose attributes are laid out and interpreted.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead, options: &Self::Options)
    -> Result<Assembly, Self::Error>;

    /// Writes an assembly to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the assembly cannot be serialized or writing fails.
    fn write_to(
        assembly: &Assembly,
        options: &Self::Options,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Reads an assembly from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(
        path: P,
        options: &Self::Options,
    ) -> Result<Assembly, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, options)
    }

    /// Writes an assembly to a file path, creating or truncating the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        assembly: &Assembly,
        options: &Self::Options,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(assembly, options, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
