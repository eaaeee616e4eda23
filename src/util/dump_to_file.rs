use crate::error::{Result, ResultExt};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the printed form of a value to a file, replacing any previous content.
///
/// Used for the optimized source and the rendered control flow graphs.
pub trait DumpToFile {
    /// Fails if `path` cannot be created, e.g. because its directory does not exist.
    fn dump_to_file(&self, path: &Path) -> Result<()>;
}

impl<T: fmt::Display> DumpToFile for T {
    fn dump_to_file(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)
            .chain_err(|| format!("Output file '{}' could not be created", path.display()))?;
        write!(file, "{}", self)?;
        file.flush()?;
        Ok(())
    }
}
