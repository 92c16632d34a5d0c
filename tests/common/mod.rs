//! Shared fixtures: synthetic NIfTI subjects

use ndarray::Array3;
use std::path::Path;

/// Encode a little-endian float32 NIfTI-1 volume, x fastest
pub fn encode_nifti(volume: &Array3<f32>) -> Vec<u8> {
    let (nx, ny, nz) = volume.dim();
    let mut raw = vec![0u8; 352];
    raw[0..4].copy_from_slice(&348i32.to_le_bytes());
    for (i, d) in [3i16, nx as i16, ny as i16, nz as i16].iter().enumerate() {
        raw[40 + 2 * i..42 + 2 * i].copy_from_slice(&d.to_le_bytes());
    }
    raw[70..72].copy_from_slice(&16i16.to_le_bytes());
    raw[108..112].copy_from_slice(&352f32.to_le_bytes());
    raw[344..348].copy_from_slice(b"n+1\0");
    for value in volume.t().iter() {
        raw.extend_from_slice(&value.to_le_bytes());
    }
    raw
}

/// Write `<root>/<subject>/{mr,ct}.nii` with `slices` axial slices of `size`²
///
/// CT intensities are an affine map of MR so the pair is learnable.
pub fn write_subject(root: &Path, subject: &str, size: usize, slices: usize) {
    let dir = root.join(subject);
    std::fs::create_dir_all(&dir).unwrap();
    let mr = Array3::from_shape_fn((size, size, slices), |(x, y, z)| {
        ((x * 7 + y * 3 + z) % 11) as f32 / 11.0
    });
    let ct = mr.mapv(|v| 2.0 * v - 0.5);
    std::fs::write(dir.join("mr.nii"), encode_nifti(&mr)).unwrap();
    std::fs::write(dir.join("ct.nii"), encode_nifti(&ct)).unwrap();
}
