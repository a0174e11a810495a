//! Pluggable storage backends for source images and their variations.
//!
//! Everything that touches stored files — the batch renderer, the rendering
//! utility, the serializer — goes through the [`Storage`] trait so the rest
//! of the codebase is backend-agnostic. File names are storage-relative,
//! forward-slash separated strings (`photos/a.jpg`), never absolute paths.
//!
//! The production implementation is [`FileSystemStorage`]: names resolve
//! under a media root directory, and an optional public base URL turns
//! names into URLs. A backend without a base URL has no URL capability,
//! which the serializer surfaces by omitting entries.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Trait for storage backends.
///
/// `url` is an optional capability: backends that cannot produce public
/// URLs return `None` and consumers omit the affected entries.
pub trait Storage: Send + Sync {
    /// Whether a file exists under this name.
    fn exists(&self, name: &str) -> bool;

    /// Read the full contents of a file.
    ///
    /// A missing file surfaces as [`io::ErrorKind::NotFound`]; the rendering
    /// utility maps that to its missing-source error.
    fn read(&self, name: &str) -> io::Result<Vec<u8>>;

    /// Write a file, replacing any existing content under this name.
    fn write(&self, name: &str, data: &[u8]) -> io::Result<()>;

    /// Public URL for a file name, if this backend can produce one.
    fn url(&self, name: &str) -> Option<String>;
}

/// Local-filesystem storage rooted at a media directory.
pub struct FileSystemStorage {
    root: PathBuf,
    base_url: Option<String>,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: None,
        }
    }

    /// Attach a public base URL (e.g. `/media` or `https://cdn.example.com`).
    pub fn with_base_url(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: Some(base_url.into()),
        }
    }

    /// Absolute path for a storage-relative name.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl fmt::Debug for FileSystemStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystemStorage")
            .field("root", &self.root)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Storage for FileSystemStorage {
    fn exists(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.path(name))
    }

    fn write(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)
    }

    fn url(&self, name: &str) -> Option<String> {
        self.base_url.as_deref().map(|base| join_url(base, name))
    }
}

/// Join helper shared by non-filesystem backends that still map names to
/// URLs under a base.
pub fn join_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}

pub use self::memory::MemoryStorage;

/// In-memory storage for unit tests and embedding.
///
/// Uses a `Mutex` (not `RefCell`) so it is `Sync` and can sit behind the
/// same `Arc<dyn Storage>` handles as the filesystem backend.
mod memory {
    use super::{Storage, join_url};
    use std::collections::HashMap;
    use std::io;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStorage {
        files: Mutex<HashMap<String, Vec<u8>>>,
        base_url: Option<String>,
    }

    impl MemoryStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_base_url(base_url: impl Into<String>) -> Self {
            Self {
                files: Mutex::new(HashMap::new()),
                base_url: Some(base_url.into()),
            }
        }

        /// Seed a file.
        pub fn insert(&self, name: impl Into<String>, data: Vec<u8>) {
            self.files.lock().unwrap().insert(name.into(), data);
        }

        /// Names of all stored files, sorted.
        pub fn names(&self) -> Vec<String> {
            let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MemoryStorage {
        fn exists(&self, name: &str) -> bool {
            self.files.lock().unwrap().contains_key(name)
        }

        fn read(&self, name: &str) -> io::Result<Vec<u8>> {
            self.files
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))
        }

        fn write(&self, name: &str, data: &[u8]) -> io::Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(name.to_string(), data.to_vec());
            Ok(())
        }

        fn url(&self, name: &str) -> Option<String> {
            self.base_url.as_deref().map(|base| join_url(base, name))
        }
    }
}
