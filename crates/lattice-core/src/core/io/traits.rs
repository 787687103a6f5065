use crate::core::models::job::CustomLatticeJob;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Defines the interface for loading lattice job definitions.
///
/// Implementors handle one document format and are responsible for every schema check
/// the model types rely on, so that a successfully loaded [`CustomLatticeJob`] always
/// satisfies its referential invariants.
pub trait JobDefinitionFile {
    /// The error type for load operations.
    type Error: Error + From<io::Error>;

    /// Parses a job definition from its full textual content.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or violates the schema.
    fn parse_str(content: &str) -> Result<CustomLatticeJob, Self::Error>;

    /// Reads a job definition from a reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The reader to consume until end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content cannot be parsed.
    fn read_from(reader: &mut impl Read) -> Result<CustomLatticeJob, Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::parse_str(&content)
    }

    /// Reads a job definition from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<CustomLatticeJob, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
