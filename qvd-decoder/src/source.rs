//! Input sources.
//!
//! The decoder works on one byte slice. This module gets that slice from a
//! file (memory-mapped) or from any reader (buffered into [`Bytes`]).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};
use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use qvd_core::error::{Error, Result, ResultExt};
use qvd_core::Table;

use crate::decoder::Decoder;
use crate::header::{parse_header, FileDescriptor};

const READ_CHUNK: usize = 64 * 1024;

/// A QVD file mapped into memory
pub struct QvdFile {
    path: PathBuf,
    mmap: Mmap,
}

impl QvdFile {
    /// Open and map a file. Empty files are rejected before mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .map_err(Error::from)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let file_size = file
            .metadata()
            .map_err(Error::from)
            .with_context(|| format!("cannot stat {}", path.display()))?
            .len();

        if file_size == 0 {
            return Err(Error::input(format!("{} is empty", path.display())));
        }

        // The mapping is read-only and the file is not written while mapped
        let mmap = unsafe {
            MmapOptions::new().map(&file).map_err(|e| Error::Io {
                message: format!("failed to mmap {}", path.display()),
                source: e,
            })?
        };

        debug!(path = %path.display(), bytes = file_size, "Mapped QVD file");
        Ok(Self { path, mmap })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn read_header(&self) -> Result<FileDescriptor> {
        parse_header(self.bytes())
    }

    pub fn decode(&self, decoder: &Decoder) -> Result<Table> {
        decoder.decode(self.bytes())
    }
}

impl AsRef<[u8]> for QvdFile {
    fn as_ref(&self) -> &[u8] {
        self.bytes()
    }
}

/// Map the file at `path`.
pub fn read_path(path: impl AsRef<Path>) -> Result<QvdFile> {
    QvdFile::open(path)
}

/// Drain `reader` into one buffer.
pub fn read_from<R: Read>(mut reader: R) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::Io {
                    message: "failed to read QVD input".to_string(),
                    source: e,
                })
            }
        };
        buf.put_slice(&chunk[..n]);
    }
    debug!(bytes = buf.len(), "Read QVD input");
    Ok(buf.freeze())
}
