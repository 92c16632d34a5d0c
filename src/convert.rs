//! Conversion of NIfTI subject volumes into slice records

use crate::data::Modality;
use crate::io::{read_nifti, write_records};
use crate::Result;
use ndarray::Axis;
use std::path::Path;
use tracing::{debug, info};

/// Totals of a conversion run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertReport {
    pub subjects: usize,
    /// Slices written over all subjects and modalities
    pub slices: usize,
}

/// Convert every subject directory under `input` into record files
///
/// Each subdirectory `S` must hold `ct.nii` and `mr.nii`; every axial slice
/// `[:, :, i]` of a volume becomes one record of `output/S-<modality>.rec`.
/// Plain files in `input` are skipped. Any read or write failure aborts the
/// run.
pub fn convert(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ConvertReport> {
    let (input, output) = (input.as_ref(), output.as_ref());
    std::fs::create_dir_all(output)?;

    let mut subjects = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            subjects.push(entry.path());
        } else {
            debug!(file = %entry.path().display(), "skipping file");
        }
    }
    subjects.sort();

    let mut report = ConvertReport::default();
    for dir in &subjects {
        let subject =
            dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        for modality in Modality::ALL {
            let volume = read_nifti(dir.join(format!("{modality}.nii")))?;
            let path = modality.record_path(output, &subject);
            let written = write_records(&path, volume.axis_iter(Axis(2)))?;
            debug!(subject = %subject, %modality, slices = written, "wrote records");
            report.slices += written;
        }
        info!(subject = %subject, "converted subject");
        report.subjects += 1;
    }

    info!(subjects = report.subjects, slices = report.slices, "conversion finished");
    Ok(report)
}
