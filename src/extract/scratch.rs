use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const SCRATCH_PREFIX: &str = "docker-log-shipper-";
const WAL_SUFFIX: &str = "-wal";

/// A private copy of a log database. The live file keeps being written by
/// the Docker daemon, so it is never opened directly.
///
/// The copy lives in its own temporary directory which is removed when the
/// `ScratchCopy` is dropped.
#[derive(Debug)]
pub struct ScratchCopy {
    dir: TempDir,
    path: PathBuf,
}

impl ScratchCopy {
    /// Copies `source` (and its `-wal` journal, if any) into a fresh
    /// directory under `scratch_root`, or the system temp dir when `None`.
    pub fn create(source: &Path, scratch_root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        let file_name = source
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "not a file path"))?;
        let path = dir.path().join(file_name);
        std::fs::copy(source, &path)?;

        let mut wal = source.as_os_str().to_owned();
        wal.push(WAL_SUFFIX);
        let wal = PathBuf::from(wal);
        if wal.is_file() {
            let mut target = path.as_os_str().to_owned();
            target.push(WAL_SUFFIX);
            std::fs::copy(&wal, PathBuf::from(target))?;
        }

        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the copy now, reporting failures instead of ignoring them
    /// like `Drop` has to.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}
