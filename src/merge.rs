// Delta merge: compose two consecutive deltas without materializing the
// intermediate target.
//
// Given `source` = Δ(S→M) and `input` = Δ(M→T), `merge_inputs` emits
// Δ(S→T).  RUN and ADD instructions pass through with their immediate
// bytes re-heaped into the output arena; copies out of M are resolved
// against `source`'s instruction stream, splitting at instruction
// boundaries and rewriting addresses so every reference lands in S or in
// already-emitted bytes of T.  Self- and prior-target copies already
// reference T and pass through unchanged.
//
// Mirrors the semantics of xdelta3's whole-file merge (xd3_merge_inputs).

use crate::error::MergeError;
use crate::whole::WholeTarget;
use crate::winst::{CopyMode, Winst, WinstOp};

// ---------------------------------------------------------------------------
// Merge engine
// ---------------------------------------------------------------------------

/// Compose `source` (Δ(S→M)) and `input` (Δ(M→T)) into `output` (Δ(S→T)).
///
/// `output` should be freshly initialized.  On success,
/// `output.length() == input.length()`.  On error the output is
/// self-consistent but incomplete and should be dropped.
pub fn merge_inputs(
    output: &mut WholeTarget,
    source: &WholeTarget,
    input: &WholeTarget,
) -> Result<(), MergeError> {
    for iinst in input.instructions() {
        debug_assert_eq!(output.length(), iinst.position);
        match iinst.op {
            WinstOp::Run { addr } => merge_run(output, input, iinst, addr)?,
            WinstOp::Add { addr } => merge_add(output, input, iinst, addr)?,
            WinstOp::Copy { addr, mode } => match mode {
                CopyMode::Source => merge_source_copy(output, source, iinst, addr)?,
                // Note: the VCD_TARGET path is propagated untranslated
                // and is unverified against multi-window decoders.
                CopyMode::SelfTarget | CopyMode::Target => {
                    merge_target_copy(output, iinst, addr, mode)?;
                }
            },
        }
    }
    Ok(())
}

/// Re-heap a RUN's repeat byte and emit an identical RUN.
fn merge_run(
    output: &mut WholeTarget,
    input: &WholeTarget,
    iinst: &Winst,
    addr: u64,
) -> Result<(), MergeError> {
    output.append_run(iinst.size, input.adds()[addr as usize])
}

/// Re-heap an ADD's literal bytes and emit an identical ADD.
fn merge_add(
    output: &mut WholeTarget,
    input: &WholeTarget,
    iinst: &Winst,
    addr: u64,
) -> Result<(), MergeError> {
    let at = addr as usize;
    output.append_add(&input.adds()[at..at + iinst.size as usize])
}

/// Pass a target-addressed copy through unchanged.
fn merge_target_copy(
    output: &mut WholeTarget,
    iinst: &Winst,
    addr: u64,
    mode: CopyMode,
) -> Result<(), MergeError> {
    output.append_copy(iinst.size, addr, mode)
}

/// Resolve a copy out of M against `source`'s instruction stream.
///
/// Walks the source instructions covering `[addr, addr + size)`, emitting
/// one output instruction per covered segment: RUNs re-emit their repeat
/// byte, ADDs re-heap the covered slice, and copies collapse — the output
/// copy keeps the source instruction's mode with the segment offset folded
/// into its address.
fn merge_source_copy(
    output: &mut WholeTarget,
    source: &WholeTarget,
    iinst: &Winst,
    addr: u64,
) -> Result<(), MergeError> {
    let mut addr = addr;
    let mut size = iinst.size;

    let mut sinst_num = source.find_position(addr)?;

    while size > 0 {
        // A copy running past the last source instruction references
        // bytes beyond the source's length.
        let Some(sinst) = source.instructions().get(sinst_num) else {
            return Err(MergeError::InvalidInput(
                "invalid copy offset in merge".into(),
            ));
        };

        debug_assert!(addr >= sinst.position);
        let sinst_offset = addr - sinst.position;
        debug_assert!(u64::from(sinst.size) > sinst_offset);

        let sinst_left = sinst.size - sinst_offset as u32;
        let this_take = size.min(sinst_left);
        debug_assert!(this_take > 0);

        match sinst.op {
            WinstOp::Run { addr: saddr } => {
                output.append_run(this_take, source.adds()[saddr as usize])?;
            }
            WinstOp::Add { addr: saddr } => {
                let at = (saddr + sinst_offset) as usize;
                output.append_add(&source.adds()[at..at + this_take as usize])?;
            }
            WinstOp::Copy {
                addr: saddr,
                mode: smode,
            } => {
                output.append_copy(this_take, saddr + sinst_offset, smode)?;
            }
        }

        addr += u64::from(this_take);
        size -= this_take;
        sinst_num += 1;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Replace `accumulator` (Δ(S→M)) with its composition with `input`
/// (Δ(M→T)), so the accumulator becomes Δ(S→T).
///
/// Builds the composition in a fresh state and swaps it in; the previous
/// buffers are released on return.
pub fn merge_deltas(accumulator: &mut WholeTarget, input: &WholeTarget) -> Result<(), MergeError> {
    let mut output = WholeTarget::new()?;
    merge_inputs(&mut output, accumulator, input)?;
    accumulator.swap(&mut output);
    Ok(())
}

/// Reduce a chain of consecutive deltas d1..dn into a single delta from
/// the source of d1 to the target of dn.
pub fn merge_chain(deltas: Vec<WholeTarget>) -> Result<WholeTarget, MergeError> {
    let mut iter = deltas.into_iter();
    let mut accumulator = iter
        .next()
        .ok_or_else(|| MergeError::InvalidInput("merge chain requires at least one delta".into()))?;
    for input in iter {
        merge_deltas(&mut accumulator, &input)?;
    }
    Ok(accumulator)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
