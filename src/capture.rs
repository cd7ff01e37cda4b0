//! Frame capture files
//!
//! A capture records the raw notifications of a session so it can be
//! replayed later without a device. Layout:
//!
//! | Offset | Width | Meaning |
//! |---|---|---|
//! | 0-5 | 6 bytes | `b"GLCAP"` followed by the format version `0x01` |
//! | 6.. | repeated | u16 little-endian frame length, then the frame bytes |
//!
//! Frames are stored exactly as received, malformed ones included.
//!
//! ## Usage Example
//!
//! ```rust
//! use glasslink::capture::{CaptureReader, CaptureWriter};
//!
//! fn record() -> glasslink::Result<()> {
//!     let mut writer = CaptureWriter::new(Vec::new())?;
//!     writer.write_frame(&[0x00, 0x00, 0xab, 0x01, 1, 2])?;
//!     writer.write_frame(&[0xff, 0xff, 0xab, 0x01])?;
//!     let bytes = writer.finish()?;
//!
//!     let reader = CaptureReader::from_bytes(&bytes)?;
//!     assert_eq!(reader.total_frames(), 2);
//!     Ok(())
//! }
//! # record().unwrap();
//! ```

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{LinkError, Result};

/// File magic, including the format version byte
pub const CAPTURE_MAGIC: &[u8; 6] = b"GLCAP\x01";

/// Largest frame a capture record can hold
pub const MAX_CAPTURED_FRAME: usize = u16::MAX as usize;

/// Sequential reader over a capture loaded into memory
#[derive(Debug)]
pub struct CaptureReader {
    frames: Vec<Vec<u8>>,
    position: usize,
    path: PathBuf,
}

impl CaptureReader {
    /// Open a capture file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file =
            File::open(path).map_err(|e| LinkError::file_error(path.to_path_buf(), e))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(|e| LinkError::file_error(path.to_path_buf(), e))?;

        Self::from_bytes_with_path(&data, path.to_path_buf())
    }

    /// Parse a capture held in memory
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_path(data, PathBuf::from("<memory>"))
    }

    fn from_bytes_with_path(data: &[u8], path: PathBuf) -> Result<Self> {
        if data.len() < CAPTURE_MAGIC.len() || &data[..CAPTURE_MAGIC.len()] != CAPTURE_MAGIC {
            return Err(LinkError::capture_error(path, "missing GLCAP v1 header"));
        }

        let mut frames = Vec::new();
        let mut offset = CAPTURE_MAGIC.len();

        while offset < data.len() {
            let Some(prefix) = data.get(offset..offset + 2) else {
                return Err(LinkError::capture_error(
                    path,
                    format!("truncated length prefix at byte {}", offset),
                ));
            };
            let len = u16::from_le_bytes([prefix[0], prefix[1]]) as usize;
            let start = offset + 2;

            let Some(frame) = data.get(start..start + len) else {
                return Err(LinkError::capture_error(
                    path,
                    format!(
                        "frame at byte {} declares {} bytes but only {} remain",
                        offset,
                        len,
                        data.len() - start
                    ),
                ));
            };

            frames.push(frame.to_vec());
            offset = start + len;
        }

        debug!("Loaded capture {} with {} frames", path.display(), frames.len());
        Ok(Self { frames, position: 0, path })
    }

    /// Next recorded frame, or `None` at the end of the capture
    pub fn read_next_frame(&mut self) -> Option<&[u8]> {
        let frame = self.frames.get(self.position)?;
        self.position += 1;
        Some(frame.as_slice())
    }

    /// Total frames in the capture
    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// Index of the next frame to be read
    pub fn current_frame(&self) -> usize {
        self.position
    }

    /// Where this capture was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Records raw frames into the capture format
pub struct CaptureWriter<W: Write> {
    out: W,
    frames: usize,
}

impl CaptureWriter<BufWriter<File>> {
    /// Create (or truncate) a capture file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::create(path).map_err(|e| LinkError::file_error(path.to_path_buf(), e))?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CaptureWriter<W> {
    /// Start a capture on any writer
    pub fn new(mut out: W) -> Result<Self> {
        out.write_all(CAPTURE_MAGIC)?;
        Ok(Self { out, frames: 0 })
    }

    /// Append one raw frame
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        let len = u16::try_from(frame.len()).map_err(|_| {
            LinkError::capture_error(
                PathBuf::from("<writer>"),
                format!(
                    "frame of {} bytes exceeds {} byte record limit",
                    frame.len(),
                    MAX_CAPTURED_FRAME
                ),
            )
        })?;

        self.out.write_all(&len.to_le_bytes())?;
        self.out.write_all(frame)?;
        self.frames += 1;
        Ok(())
    }

    /// Frames written so far
    pub fn frames_written(&self) -> usize {
        self.frames
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
