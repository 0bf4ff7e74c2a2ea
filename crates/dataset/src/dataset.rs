//! Lazily Grown Dataset

use alert_model::LabelSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::DatasetError;
use crate::exposition;

/// Grow-only cache of label sets backed by a line source.
///
/// Indices are materialized on first request and never re-read. One lock
/// covers both growth and reads, so callers never see a half-grown cache.
pub struct Dataset {
    inner: Mutex<Inner>,
}

struct Inner {
    source: Box<dyn BufRead + Send>,
    label_sets: Vec<LabelSet>,
    /// Total lines pulled from `source`
    lines_read: usize,
    /// Set when a growth consumed lines it could not cache
    broken: bool,
}

impl Dataset {
    /// Create a dataset over any line source
    pub fn new(source: impl BufRead + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                source: Box::new(source),
                label_sets: Vec::new(),
                lines_read: 0,
                broken: false,
            }),
        }
    }

    /// Open a dataset file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Opened dataset {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }

    /// Label sets at indices `[from, to)`, reading more of the source only
    /// when `to` is past what has been materialized so far
    pub fn get(&self, from: usize, to: usize) -> Result<Vec<LabelSet>, DatasetError> {
        if from > to {
            return Err(DatasetError::InvalidRange { from, to });
        }

        let mut inner = self.inner.lock().map_err(|_| DatasetError::LockPoisoned)?;
        if to > inner.label_sets.len() {
            inner.grow(to)?;
        }
        Ok(inner.label_sets[from..to].to_vec())
    }

    /// Number of materialized label sets
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.label_sets.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of lines consumed from the source so far
    pub fn lines_read(&self) -> usize {
        self.inner.lock().map(|i| i.lines_read).unwrap_or(0)
    }
}

impl Inner {
    /// Pull `to - len` lines and parse them in one go.
    ///
    /// A read or parse failure leaves the source ahead of the cache, so the
    /// dataset refuses to grow again; already cached indices stay readable.
    fn grow(&mut self, to: usize) -> Result<(), DatasetError> {
        if self.broken {
            return Err(DatasetError::Unusable);
        }

        let wanted = to - self.label_sets.len();
        let first_line = self.lines_read;

        let (chunk, read) = match self.read_lines(wanted) {
            Ok(lines) => lines,
            Err(e) => {
                self.broken = true;
                return Err(e.into());
            }
        };
        self.lines_read += read;

        let parsed = match exposition::parse(&chunk) {
            Ok(parsed) => parsed,
            Err(mut e) => {
                self.broken = true;
                e.line += first_line;
                return Err(e.into());
            }
        };
        debug!(
            "Dataset grew by {} label sets from {} lines ({} total)",
            parsed.len(),
            read,
            self.label_sets.len() + parsed.len()
        );
        self.label_sets.extend(parsed);

        if self.label_sets.len() < to {
            return Err(DatasetError::Exhausted {
                requested: to,
                available: self.label_sets.len(),
            });
        }
        Ok(())
    }

    /// Read up to `wanted` newline-terminated lines
    fn read_lines(&mut self, wanted: usize) -> std::io::Result<(Vec<u8>, usize)> {
        let mut chunk = Vec::new();
        let mut read = 0;
        while read < wanted {
            let n = self.source.read_until(b'\n', &mut chunk)?;
            if n == 0 {
                break;
            }
            if !chunk.ends_with(b"\n") {
                chunk.push(b'\n');
            }
            read += 1;
        }
        Ok((chunk, read))
    }
}
