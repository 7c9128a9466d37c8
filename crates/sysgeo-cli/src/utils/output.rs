use crate::error::Result;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Writes `text` to `path`, or to standard output when no path is given.
pub fn write_text(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            let mut writer = BufWriter::new(File::create(path)?);
            writer.write_all(text.as_bytes())?;
            writer.flush()?;
            info!("Wrote {} bytes to {:?}", text.len(), path);
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(text.as_bytes())?;
            lock.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_file_and_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.sysml");
        write_text("package P {\n}\n", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "package P {\n}\n");
    }
}
