// Reference applier: reconstruct a target from a whole-target state.
//
// Executes the instruction list in order against the source bytes, the
// way a window decoder executes a decoded window.  Callers use this to
// validate a merged delta end-to-end without going through a wire-format
// re-encoder.

use crate::error::MergeError;
use crate::whole::WholeTarget;
use crate::winst::{CopyMode, WinstOp};

/// Apply `delta` to `source`, producing the described target.
///
/// `Source` copies are bounds-checked against `source`; `SelfTarget` and
/// prior-window `Target` copies read from the output produced so far,
/// byte-by-byte when the ranges overlap (RLE-like self-copies).
pub fn apply(delta: &WholeTarget, source: &[u8]) -> Result<Vec<u8>, MergeError> {
    let mut output = Vec::new();
    output
        .try_reserve_exact(delta.length() as usize)
        .map_err(|_| MergeError::OutOfMemory)?;

    for inst in delta.instructions() {
        let size = inst.size as usize;
        match inst.op {
            WinstOp::Run { addr } => {
                let byte = delta.adds()[addr as usize];
                output.resize(output.len() + size, byte);
            }

            WinstOp::Add { addr } => {
                let at = addr as usize;
                output.extend_from_slice(&delta.adds()[at..at + size]);
            }

            WinstOp::Copy {
                addr,
                mode: CopyMode::Source,
            } => {
                let at = addr as usize;
                if at + size > source.len() {
                    return Err(MergeError::InvalidInput(format!(
                        "source copy out of range: {at}+{size} > {}",
                        source.len()
                    )));
                }
                output.extend_from_slice(&source[at..at + size]);
            }

            WinstOp::Copy { addr, .. } => {
                let at = addr as usize;
                if at >= output.len() {
                    return Err(MergeError::InvalidInput(format!(
                        "target copy out of range: {at} >= {}",
                        output.len()
                    )));
                }
                if at + size <= output.len() {
                    output.extend_from_within(at..at + size);
                } else {
                    // Overlapping self-copy: reads must see bytes written
                    // earlier by this same instruction.
                    for i in 0..size {
                        let byte = output[at + i];
                        output.push(byte);
                    }
                }
            }
        }
    }

    debug_assert_eq!(output.len() as u64, delta.length());
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
