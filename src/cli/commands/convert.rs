//! Convert command implementation

use crate::config::ConvertArgs;
use crate::convert::convert;
use tracing::info;

pub fn run_convert(args: ConvertArgs) -> Result<(), String> {
    info!(
        input = %args.input_path.display(),
        output = %args.output_path.display(),
        "converting volumes"
    );
    let report = convert(&args.input_path, &args.output_path)
        .map_err(|e| format!("Conversion error: {e}"))?;
    info!(subjects = report.subjects, slices = report.slices, "conversion complete");
    Ok(())
}
