//! External document compression.
//!
//! The serialized report is handed to Ghostscript once, as an opaque
//! post-processing step. Compression failing (or Ghostscript being absent)
//! is not a rendering failure — the uncompressed output is already valid,
//! so problems here log a warning and leave the file as written.

use std::path::Path;
use std::process::Command;

use log::{info, warn};

/// Compress `path` in place with Ghostscript. Returns whether the
/// compressed output replaced the original.
pub fn compress_in_place(path: &Path) -> bool {
    let tmp = path.with_extension("pdf.tmp");
    let status = Command::new("gs")
        .arg("-sDEVICE=pdfwrite")
        .arg("-dCompatibilityLevel=1.5")
        .arg("-dPDFSETTINGS=/ebook")
        .arg("-dNOPAUSE")
        .arg("-dQUIET")
        .arg("-dBATCH")
        .arg(format!("-sOutputFile={}", tmp.display()))
        .arg(path)
        .status();

    match status {
        Ok(status) if status.success() => match std::fs::rename(&tmp, path) {
            Ok(()) => {
                info!("compressed {}", path.display());
                true
            }
            Err(e) => {
                warn!("could not replace output with compressed file: {e}");
                let _ = std::fs::remove_file(&tmp);
                false
            }
        },
        Ok(status) => {
            warn!("ghostscript exited with {status}; keeping uncompressed output");
            let _ = std::fs::remove_file(&tmp);
            false
        }
        Err(e) => {
            warn!("ghostscript unavailable ({e}); keeping uncompressed output");
            false
        }
    }
}
