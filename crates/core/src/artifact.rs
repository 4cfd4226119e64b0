use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::sanitize::sanitize;

/// Give up claiming a name after this many concurrent collisions.
const MAX_CLAIM_ATTEMPTS: usize = 100;

/// Write `body` to a new brief in `dir` and return its path.
///
/// The content is written to a temp file in `dir` first and then linked into
/// place without clobbering, so the brief either exists complete or not at all
/// and no existing file is ever overwritten. If another writer takes the chosen
/// name first, the next free name is tried.
pub fn write_brief(
    dir: &Path,
    title: Option<&str>,
    fallback_base: &str,
    extension: &str,
    body: &str,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".brief-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(body.as_bytes())?;
    temp.as_file().sync_all()?;

    for _ in 0..MAX_CLAIM_ATTEMPTS {
        let path = dir.join(sanitize(title, fallback_base, extension, dir));
        match temp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(path = %path.display(), "brief written");
                return Ok(path);
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "name taken, trying next");
                temp = e.file;
            }
            Err(e) => return Err(e.error),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free brief name in {}", dir.display()),
    ))
}

/// Plain temp-then-rename write for files this tool owns, like cached transcripts.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
