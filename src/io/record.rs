//! Slice record files
//!
//! One file holds the axial slices of one modality of one subject:
//!
//! ```text
//! MRCTREC1                       8-byte magic
//! [u64 LE length][payload] ...   one record per slice
//! payload = [u32 LE rows][u32 LE cols][rows * cols f32 LE, row-major]
//! ```

use crate::{Error, Result};
use ndarray::{Array2, ArrayView2};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes at the start of every record file
pub const MAGIC: &[u8; 8] = b"MRCTREC1";

/// File extension of record files
pub const EXTENSION: &str = "rec";

/// Encode one 2-D slice as a record payload
pub fn encode_slice(slice: ArrayView2<'_, f32>) -> Vec<u8> {
    let (rows, cols) = slice.dim();
    let mut payload = Vec::with_capacity(8 + rows * cols * 4);
    payload.extend_from_slice(&(rows as u32).to_le_bytes());
    payload.extend_from_slice(&(cols as u32).to_le_bytes());
    for v in slice.iter() {
        payload.extend_from_slice(&v.to_le_bytes());
    }
    payload
}

/// Decode a record payload into a 2-D slice
pub fn decode_slice(payload: &[u8]) -> std::result::Result<Array2<f32>, String> {
    if payload.len() < 8 {
        return Err(format!("payload of {} bytes has no header", payload.len()));
    }
    let rows = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
    let cols = u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]) as usize;
    let body = &payload[8..];
    let needed = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| format!("{rows}x{cols} slice is too large"))?;
    if body.len() != needed {
        return Err(format!("{rows}x{cols} slice needs {needed} bytes, payload has {}", body.len()));
    }
    let values =
        body.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect();
    Array2::from_shape_vec((rows, cols), values).map_err(|e| e.to_string())
}

/// Writes slices to a record file
pub struct RecordWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    count: usize,
}

impl RecordWriter {
    /// Create (or truncate) a record file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(MAGIC)?;
        Ok(Self { writer, path, count: 0 })
    }

    /// Append one slice
    pub fn write_slice(&mut self, slice: ArrayView2<'_, f32>) -> Result<()> {
        let payload = encode_slice(slice);
        self.writer.write_all(&(payload.len() as u64).to_le_bytes())?;
        self.writer.write_all(&payload)?;
        self.count += 1;
        Ok(())
    }

    /// Flush and return the number of records written
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.count)
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Streams slices out of a record file
pub struct RecordReader {
    reader: BufReader<File>,
    path: PathBuf,
    failed: bool,
}

impl RecordReader {
    /// Open a record file and check its magic
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);
        let mut magic = [0u8; 8];
        reader
            .read_exact(&mut magic)
            .map_err(|e| Error::codec(&path, format!("missing header: {e}")))?;
        if &magic != MAGIC {
            return Err(Error::codec(&path, "not a slice record file"));
        }
        Ok(Self { reader, path, failed: false })
    }

    /// Read the next slice, `None` at a clean end of file
    pub fn next_slice(&mut self) -> Result<Option<Array2<f32>>> {
        let mut len_bytes = [0u8; 8];
        match self.reader.read_exact(&mut len_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        // Reading through `take` bounds the buffer by what the file holds.
        let len = u64::from_le_bytes(len_bytes);
        let mut payload = Vec::new();
        (&mut self.reader).take(len).read_to_end(&mut payload)?;
        if payload.len() as u64 != len {
            return Err(Error::codec(
                &self.path,
                format!("truncated record: header says {len} bytes, {} left", payload.len()),
            ));
        }
        decode_slice(&payload).map(Some).map_err(|m| Error::codec(&self.path, m))
    }

    /// Path of the file being read
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for RecordReader {
    type Item = Result<Array2<f32>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_slice() {
            Ok(slice) => slice.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Write every slice of `slices` into a new record file
pub fn write_records<'a>(
    path: impl AsRef<Path>,
    slices: impl IntoIterator<Item = ArrayView2<'a, f32>>,
) -> Result<usize> {
    let mut writer = RecordWriter::create(path)?;
    for slice in slices {
        writer.write_slice(slice)?;
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s1-mr.rec");
        let a = array![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let b = array![[f32::NAN]];

        assert_eq!(write_records(&path, [a.view(), b.view()]).unwrap(), 2);

        let slices: Vec<_> = RecordReader::open(&path).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0], a);
        assert!(slices[1][[0, 0]].is_nan());
    }

    #[test]
    fn test_empty_slice_is_representable() {
        let empty = Array2::<f32>::zeros((0, 4));
        let decoded = decode_slice(&encode_slice(empty.view())).unwrap();
        assert_eq!(decoded.dim(), (0, 4));
    }

    #[test]
    fn test_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.rec");
        std::fs::write(&path, b"NOTARECORDFILE").unwrap();
        assert!(matches!(RecordReader::open(&path), Err(Error::Codec { .. })));
    }

    #[test]
    fn test_truncated_record_is_an_error_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.rec");
        write_records(&path, [array![[1.0f32, 2.0]].view()]).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

        let mut reader = RecordReader::open(&path).unwrap();
        assert!(matches!(reader.next(), Some(Err(Error::Codec { .. }))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_oversized_length_header_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.rec");
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        std::fs::write(&path, bytes).unwrap();

        let mut reader = RecordReader::open(&path).unwrap();
        assert!(matches!(reader.next(), Some(Err(Error::Codec { .. }))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_decode_rejects_overflowing_dimensions() {
        let mut payload = u32::MAX.to_le_bytes().to_vec();
        payload.extend_from_slice(&u32::MAX.to_le_bytes());
        payload.extend_from_slice(&[0u8; 8]);
        assert!(decode_slice(&payload).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_size() {
        let mut payload = encode_slice(array![[1.0f32, 2.0]].view());
        payload.pop();
        assert!(decode_slice(&payload).is_err());
    }
}
