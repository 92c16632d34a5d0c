//! Minimal NIfTI-1 volume reader
//!
//! Reads single-file, uncompressed `.nii` volumes into an `(x, y, z)` array of
//! `f32`, applying the intensity scaling from the header when present.

use crate::{Error, Result};
use ndarray::{Array3, ShapeBuilder};
use std::path::Path;

const HEADER_SIZE: usize = 348;

/// Voxel data types understood by the reader
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Datatype {
    U8,
    I8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl Datatype {
    fn from_code(code: i16) -> Option<Self> {
        Some(match code {
            2 => Self::U8,
            4 => Self::I16,
            8 => Self::I32,
            16 => Self::F32,
            64 => Self::F64,
            256 => Self::I8,
            512 => Self::U16,
            768 => Self::U32,
            _ => return None,
        })
    }

    fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Byte order of a header, detected from `sizeof_hdr`
#[derive(Clone, Copy)]
struct Endian {
    little: bool,
}

impl Endian {
    fn bytes<const N: usize>(self, raw: &[u8]) -> [u8; N] {
        let mut b = [0u8; N];
        b.copy_from_slice(&raw[..N]);
        if !self.little {
            b.reverse();
        }
        b
    }

    fn i16(self, raw: &[u8]) -> i16 {
        i16::from_le_bytes(self.bytes(raw))
    }

    fn i32(self, raw: &[u8]) -> i32 {
        i32::from_le_bytes(self.bytes(raw))
    }

    fn f32(self, raw: &[u8]) -> f32 {
        f32::from_le_bytes(self.bytes(raw))
    }

    fn voxel(self, dtype: Datatype, raw: &[u8]) -> f32 {
        match dtype {
            Datatype::U8 => f32::from(raw[0]),
            Datatype::I8 => f32::from(raw[0] as i8),
            Datatype::I16 => f32::from(self.i16(raw)),
            Datatype::U16 => f32::from(u16::from_le_bytes(self.bytes(raw))),
            Datatype::I32 => self.i32(raw) as f32,
            Datatype::U32 => u32::from_le_bytes(self.bytes(raw)) as f32,
            Datatype::F32 => self.f32(raw),
            Datatype::F64 => f64::from_le_bytes(self.bytes(raw)) as f32,
        }
    }
}

/// Parsed subset of a NIfTI-1 header
#[derive(Debug, Clone, PartialEq)]
struct NiftiHeader {
    /// Volume extent along x, y, z
    dims: [usize; 3],
    datatype: Datatype,
    vox_offset: usize,
    scl_slope: f32,
    scl_inter: f32,
}

impl NiftiHeader {
    fn parse(raw: &[u8], source: &Path) -> Result<(Self, Endian)> {
        let bad = |m: String| Error::UnsupportedFormat(format!("{}: {m}", source.display()));
        if raw.len() < HEADER_SIZE {
            return Err(bad(format!("file of {} bytes is shorter than a header", raw.len())));
        }

        let sizeof_hdr = [raw[0], raw[1], raw[2], raw[3]];
        let endian = if i32::from_le_bytes(sizeof_hdr) == 348 {
            Endian { little: true }
        } else if i32::from_be_bytes(sizeof_hdr) == 348 {
            Endian { little: false }
        } else {
            return Err(bad("missing NIfTI-1 sizeof_hdr".into()));
        };
        if &raw[344..347] != b"n+1" {
            return Err(bad("not a single-file NIfTI-1 volume".into()));
        }

        let rank = endian.i16(&raw[40..]);
        if !(1..=7).contains(&rank) {
            return Err(bad(format!("invalid rank {rank}")));
        }
        let mut dims = [1usize; 3];
        for (axis, dim) in dims.iter_mut().enumerate().take(rank.min(3) as usize) {
            let extent = endian.i16(&raw[42 + 2 * axis..]);
            *dim = usize::try_from(extent).map_err(|_| bad(format!("negative extent {extent}")))?;
        }
        for axis in 3..rank as usize {
            if endian.i16(&raw[42 + 2 * axis..]) > 1 {
                return Err(bad("volumes with more than three dimensions are not supported".into()));
            }
        }

        let code = endian.i16(&raw[70..]);
        let datatype = Datatype::from_code(code).ok_or_else(|| bad(format!("datatype {code}")))?;
        let vox_offset = endian.f32(&raw[108..]).max(HEADER_SIZE as f32) as usize;

        Ok((
            Self {
                dims,
                datatype,
                vox_offset,
                scl_slope: endian.f32(&raw[112..]),
                scl_inter: endian.f32(&raw[116..]),
            },
            endian,
        ))
    }
}

/// Read a NIfTI-1 volume into an `(x, y, z)` array
pub fn read_nifti(path: impl AsRef<Path>) -> Result<Array3<f32>> {
    let path = path.as_ref();
    if path.extension().is_some_and(|e| e == "gz") {
        return Err(Error::UnsupportedFormat(format!(
            "{}: compressed volumes must be decompressed first",
            path.display()
        )));
    }
    let raw = std::fs::read(path)?;
    parse_nifti(&raw, path)
}

fn parse_nifti(raw: &[u8], source: &Path) -> Result<Array3<f32>> {
    let (header, endian) = NiftiHeader::parse(raw, source)?;
    let [nx, ny, nz] = header.dims;
    let voxels = nx * ny * nz;
    let size = header.datatype.size();
    let end = header.vox_offset + voxels * size;
    if raw.len() < end {
        return Err(Error::UnsupportedFormat(format!(
            "{}: expected {voxels} voxels, file is truncated",
            source.display()
        )));
    }

    let (slope, inter) = if header.scl_slope != 0.0 && header.scl_slope.is_finite() {
        (header.scl_slope, header.scl_inter)
    } else {
        (1.0, 0.0)
    };
    let values: Vec<f32> = raw[header.vox_offset..end]
        .chunks_exact(size)
        .map(|v| endian.voxel(header.datatype, v) * slope + inter)
        .collect();

    // NIfTI stores x fastest.
    Array3::from_shape_vec((nx, ny, nz).f(), values)
        .map_err(|e| Error::UnsupportedFormat(e.to_string()))
}
