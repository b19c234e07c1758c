// src/page/cache.rs
// =============================================================================
// On-disk page cache: one <name>.html file per canonical page name.
//
// Contract with the rest of the system:
// - A missing file is a normal cache miss, not an error
// - A read failure is ALSO treated as a miss (we fall through to the network;
//   only the cache benefit is lost)
// - A write failure is logged and ignored - the page content is still in
//   memory and usable for this run
//
// Writes are atomic per page: we write to a temporary file and rename it
// into place, so a concurrent reader can never observe a half-written entry.
// Rename within one directory is atomic on every platform we care about.
// =============================================================================

use std::fs;
use std::path::{Path, PathBuf};

pub struct PageCache {
    directory: PathBuf,
}

impl PageCache {
    // Creating the cache directory is the only fatal cache operation: if we
    // can't have a cache directory at all, the run configuration is broken.
    pub fn new(directory: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(directory).map_err(|source| {
            anyhow::anyhow!(
                "cannot create cache directory {}: {}",
                directory.display(),
                source
            )
        })?;
        Ok(Self {
            directory: directory.to_path_buf(),
        })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.html"))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    // Loads a cached page, or None on a miss. Unreadable entries count as
    // misses too, per the error taxonomy.
    pub fn load(&self, name: &str) -> Option<String> {
        let path = self.path_for(name);
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
            Err(error) => {
                eprintln!(
                    "  Warning: could not read cache entry {}: {}",
                    path.display(),
                    error
                );
                None
            }
        }
    }

    // Stores a page under its canonical name. Write failures only cost us
    // the cache benefit, so they are logged and swallowed here.
    pub fn store(&self, name: &str, content: &str) {
        let path = self.path_for(name);
        let temp = self.directory.join(format!("{name}.html.tmp"));

        let written = fs::write(&temp, content).and_then(|()| fs::rename(&temp, &path));
        if let Err(error) = written {
            eprintln!(
                "  Warning: could not store cache entry {}: {}",
                path.display(),
                error
            );
            // Best effort: don't leave the temp file lying around
            let _ = fs::remove_file(&temp);
        }
    }
}
