//! Presents a numbered sequence of files (`name_%04d.ext`) as one continuous
//! essence source.

use crate::error::{EssenceError, Result};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

/// Naming scheme for one entry in a numbered file sequence: `{stem}{index:0
/// width}{suffix}`, with `index` advancing by `increment` from `origin`.
#[derive(Debug, Clone)]
pub struct SequenceNaming {
    pub stem: String,
    pub suffix: String,
    pub width: usize,
    pub origin: u64,
    pub increment: u64,
    /// Last index in the sequence, inclusive, or `None` to continue until a
    /// file fails to open.
    pub end: Option<u64>,
}

impl SequenceNaming {
    pub fn path_for(&self, index: u64) -> PathBuf {
        PathBuf::from(format!(
            "{}{:0width$}{}",
            self.stem,
            index,
            self.suffix,
            width = self.width
        ))
    }

    fn count(&self) -> Option<u64> {
        self.end.map(|end| (end - self.origin) / self.increment + 1)
    }
}

/// Called each time the sequence wrapper opens the next file, before any
/// bytes are read from it.
pub trait NewFileHandler {
    fn on_new_file(&mut self, index: u64, path: &std::path::Path);
}

/// A `Read` source spanning every file in a [`SequenceNaming`], opened
/// lazily and advanced to the next file on EOF.
pub struct FileSequence {
    naming: SequenceNaming,
    current_index: u64,
    current: Option<File>,
    handler: Option<Box<dyn NewFileHandler>>,
}

impl FileSequence {
    pub fn new(naming: SequenceNaming) -> Self {
        let current_index = naming.origin;
        Self {
            naming,
            current_index,
            current: None,
            handler: None,
        }
    }

    pub fn set_handler(&mut self, handler: Box<dyn NewFileHandler>) {
        self.handler = Some(handler);
    }

    pub fn file_count(&self) -> Option<u64> {
        self.naming.count()
    }

    fn open_current(&mut self) -> Result<bool> {
        if self.naming.end.is_some_and(|end| self.current_index > end) {
            return Ok(false);
        }
        let path = self.naming.path_for(self.current_index);
        match File::open(&path) {
            Ok(file) => {
                if let Some(handler) = &mut self.handler {
                    handler.on_new_file(self.current_index, &path);
                }
                self.current = Some(file);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && self.naming.end.is_none() => Ok(false),
            Err(e) => Err(EssenceError::Io(e)),
        }
    }

    fn advance(&mut self) -> Result<bool> {
        self.current = None;
        self.current_index += self.naming.increment;
        self.open_current()
    }
}

impl Read for FileSequence {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            if self.current.is_none() {
                let opened = self
                    .open_current()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
                if !opened {
                    return Ok(0);
                }
            }
            let file = self.current.as_mut().expect("just opened or already present");
            let n = file.read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            let advanced = self
                .advance()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            if !advanced {
                return Ok(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn write_sequence(dir: &std::path::Path, stem: &str, indices: &[u64], body: &[u8]) {
        for i in indices {
            let path = dir.join(format!("{stem}{i:04}.dat"));
            let mut f = File::create(path).unwrap();
            f.write_all(body).unwrap();
        }
    }

    #[test]
    fn path_for_zero_pads_to_width() {
        let naming = SequenceNaming {
            stem: "clip_".into(),
            suffix: ".dat".into(),
            width: 4,
            origin: 0,
            increment: 1,
            end: Some(2),
        };
        assert_eq!(naming.path_for(7), PathBuf::from("clip_0007.dat"));
        assert_eq!(naming.count(), Some(3));
    }

    #[test]
    fn sequence_reads_across_file_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        write_sequence(dir.path(), "clip_", &[0, 1, 2], b"ab");

        let naming = SequenceNaming {
            stem: dir.path().join("clip_").to_string_lossy().to_string(),
            suffix: ".dat".into(),
            width: 4,
            origin: 0,
            increment: 1,
            end: Some(2),
        };
        let mut seq = FileSequence::new(naming);
        let mut out = Vec::new();
        seq.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"ababab");
    }

    #[test]
    fn handler_is_invoked_once_per_file() {
        struct Counter(u32);
        impl NewFileHandler for Counter {
            fn on_new_file(&mut self, _index: u64, _path: &std::path::Path) {
                self.0 += 1;
            }
        }

        let dir = tempfile::tempdir().unwrap();
        write_sequence(dir.path(), "clip_", &[0, 1], b"x");

        let naming = SequenceNaming {
            stem: dir.path().join("clip_").to_string_lossy().to_string(),
            suffix: ".dat".into(),
            width: 4,
            origin: 0,
            increment: 1,
            end: Some(1),
        };
        let mut seq = FileSequence::new(naming);
        seq.set_handler(Box::new(Counter(0)));
        let mut out = Vec::new();
        seq.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"xx");
    }

    #[test]
    fn unbounded_sequence_stops_at_first_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        write_sequence(dir.path(), "clip_", &[0, 1], b"y");

        let naming = SequenceNaming {
            stem: dir.path().join("clip_").to_string_lossy().to_string(),
            suffix: ".dat".into(),
            width: 4,
            origin: 0,
            increment: 1,
            end: None,
        };
        let mut seq = FileSequence::new(naming);
        let mut out = Vec::new();
        seq.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"yy");
    }
}
