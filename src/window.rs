// Decoded-window interface and the whole-target window appender.
//
// A window decoder (external to this crate) delivers, per window: the copy
// window parameters from the window header, the immediate-data stream, and
// the decoded instructions with window-local addressing.  `append_window`
// flattens one such window onto a whole-target state, rewriting copy
// addresses into source-absolute or target-absolute form so later merge
// passes never need window context again.

use crate::error::MergeError;
use crate::whole::WholeTarget;
use crate::winst::CopyMode;

// ---------------------------------------------------------------------------
// Decoded-window interface
// ---------------------------------------------------------------------------

/// Which span a window's copy window covers: the external source
/// (VCD_SOURCE) or earlier target bytes (VCD_TARGET).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSource {
    Source,
    Target,
}

/// Copy-window parameters from a window header.
#[derive(Debug, Clone, Copy)]
pub struct CopyWindow {
    pub mode: WindowSource,
    /// Offset of the copy window within the source (or earlier target).
    pub offset: u64,
    /// Length of the copy window.
    pub len: u64,
}

/// One decoded instruction, window-local addressing.
///
/// Decoders that expand double-opcode table entries deliver two of these
/// per opcode and may leave `Noop` in an unused half; the appender skips
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedInst {
    Noop,
    Run { size: u32 },
    Add { size: u32 },
    Copy { size: u32, addr: u64 },
}

/// A fully-decoded window as delivered by a window decoder.
#[derive(Debug, Clone, Copy)]
pub struct DecodedWindow<'a> {
    /// Copy window, or `None` for a window with no source span.
    pub copy_window: Option<CopyWindow>,
    /// Immediate data for ADD and RUN instructions, in instruction order.
    pub data: &'a [u8],
    /// Decoded instructions.
    pub insts: &'a [DecodedInst],
}

// ---------------------------------------------------------------------------
// Window appender
// ---------------------------------------------------------------------------

impl WholeTarget {
    /// Append one decoded window to this state.
    ///
    /// Windows must arrive in target order: window-local self-copy
    /// addresses are rebased on the state's length at entry.  A COPY whose
    /// address falls inside the copy window becomes a `Source` or `Target`
    /// copy at `copy_window.offset + addr`; one past it references this
    /// window's own output and becomes a `SelfTarget` copy.
    ///
    /// Zero-size instructions are dropped (RUN still consumes its repeat
    /// byte from the data stream, matching what a decoder read).
    pub fn append_window(&mut self, window: &DecodedWindow<'_>) -> Result<(), MergeError> {
        let base = self.length();
        let (cpy_off, cpy_len, cpy_mode) = match window.copy_window {
            Some(cw) => {
                let mode = match cw.mode {
                    WindowSource::Source => CopyMode::Source,
                    WindowSource::Target => CopyMode::Target,
                };
                (cw.offset, cw.len, mode)
            }
            None => (0, 0, CopyMode::Source),
        };

        let mut data = window.data;

        for inst in window.insts {
            match *inst {
                DecodedInst::Noop => {}

                DecodedInst::Run { size } => {
                    let (&byte, rest) = data.split_first().ok_or_else(|| {
                        MergeError::InvalidInput("data section underflow (RUN)".into())
                    })?;
                    data = rest;
                    if size > 0 {
                        self.append_run(size, byte)?;
                    }
                }

                DecodedInst::Add { size } => {
                    let size_usize = size as usize;
                    if size_usize > data.len() {
                        return Err(MergeError::InvalidInput(
                            "data section underflow (ADD)".into(),
                        ));
                    }
                    let (bytes, rest) = data.split_at(size_usize);
                    data = rest;
                    if size > 0 {
                        self.append_add(bytes)?;
                    }
                }

                DecodedInst::Copy { size, addr } => {
                    if size == 0 {
                        continue;
                    }
                    if addr < cpy_len {
                        self.append_copy(size, cpy_off + addr, cpy_mode)?;
                    } else {
                        self.append_copy(size, base + (addr - cpy_len), CopyMode::SelfTarget)?;
                    }
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
