//! Files a task wants included in the output bundle
//!
//! A [`FileCopyEnvelope`] names a file on the host and the task that asked
//! for it. Envelopes may carry a line transform (e.g. redaction); the bundle
//! then pulls the content through a [`LineStream`] instead of copying bytes.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::Identifier;

/// Rewrites a single line while it is streamed
pub type LineTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A file collected by a task
#[derive(Clone)]
pub struct FileCopyEnvelope {
    path: PathBuf,
    identifier: Identifier,
    transform: Option<LineTransform>,
    instance: usize,
}

impl FileCopyEnvelope {
    /// Copy `path` verbatim on behalf of `identifier`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, identifier: Identifier) -> Self {
        Self {
            path: path.into(),
            identifier,
            transform: None,
            instance: 0,
        }
    }

    /// Stream `path` line by line through `transform`
    #[must_use]
    pub fn streamed(
        path: impl Into<PathBuf>,
        identifier: Identifier,
        transform: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            transform: Some(Arc::new(transform)),
            ..Self::new(path, identifier)
        }
    }

    /// Path of the file on the host
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The task that collected the file
    #[must_use]
    pub const fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Whether the content must be pulled through [`Self::open_stream`]
    #[must_use]
    pub fn is_streamed(&self) -> bool {
        self.transform.is_some()
    }

    /// Bundle-relative name: `Category/Subcategory/<file name>`
    #[must_use]
    pub fn name(&self) -> String {
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| self.path.to_string_lossy(), |n| n.to_string_lossy());
        format!("{}/{}/{}", self.identifier.category(), self.identifier.subcategory(), file_name)
    }

    /// Name under which the file is stored, with `(n)` for duplicates
    #[must_use]
    pub fn store_name(&self) -> String {
        let name = self.name();
        if self.instance == 0 {
            return name;
        }

        let (stem, ext) = split_extension(&name);
        format!("{stem}({}){ext}", self.instance)
    }

    /// Mark this envelope as another copy of an already stored name
    pub const fn mark_duplicate(&mut self) {
        self.instance += 1;
    }

    /// Open a lazy line stream over the file
    ///
    /// The file handle lives inside the returned stream and is closed when
    /// the stream is dropped, whether or not it was read to the end.
    pub fn open_stream(&self) -> io::Result<LineStream> {
        let stream = LineStream::open(&self.path)?;
        Ok(match &self.transform {
            Some(transform) => stream.with_transform(Arc::clone(transform)),
            None => stream,
        })
    }
}

/// Split `a/b/c.log` into `("a/b/c", ".log")`; dotfiles keep their name
fn split_extension(name: &str) -> (&str, &str) {
    let base_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[base_start..].rfind('.') {
        Some(0) | None => (name, ""),
        Some(dot) => name.split_at(base_start + dot),
    }
}

impl fmt::Debug for FileCopyEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCopyEnvelope")
            .field("path", &self.path)
            .field("identifier", &self.identifier)
            .field("streamed", &self.is_streamed())
            .field("instance", &self.instance)
            .finish()
    }
}

impl Serialize for FileCopyEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            path: &'a Path,
            name: String,
            stored_name: String,
            streamed: bool,
            identifier: &'a Identifier,
        }

        Envelope {
            path: &self.path,
            name: self.name(),
            stored_name: self.store_name(),
            streamed: self.is_streamed(),
            identifier: &self.identifier,
        }
        .serialize(serializer)
    }
}

/// Pull-based line iterator over an owned file handle
pub struct LineStream {
    lines: Lines<BufReader<File>>,
    transform: Option<LineTransform>,
}

impl LineStream {
    /// Open `path` for line-by-line reading
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            transform: None,
        })
    }

    /// Rewrite every line with `transform` as it is pulled
    #[must_use]
    pub fn with_transform(mut self, transform: LineTransform) -> Self {
        self.transform = Some(transform);
        self
    }
}

impl Iterator for LineStream {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        Some(line.map(|l| match &self.transform {
            Some(transform) => transform(&l),
            None => l,
        }))
    }
}

impl fmt::Debug for LineStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineStream")
            .field("transformed", &self.transform.is_some())
            .finish_non_exhaustive()
    }
}
