// Whole-target instruction record.
//
// A whole-target state holds one fully-decoded delta as a flat list of
// these records plus an immediate-data arena. Positions are absolute
// target offsets; RUN/ADD addresses are arena offsets; COPY addresses are
// source or target offsets depending on the mode.

/// Where a COPY instruction draws its bytes from.
///
/// The three cases form a closed set: bytes already emitted into this
/// delta's own target, the external source (VCD_SOURCE window), or an
/// earlier window's target bytes (VCD_TARGET window).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// Already-emitted bytes of this delta's own target.
    SelfTarget,
    /// The external source.
    Source,
    /// An earlier window's target bytes.
    Target,
}

/// Operation kind with its per-kind payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinstOp {
    /// `size` repeats of the single arena byte at `addr`.
    Run { addr: u64 },
    /// `size` literal arena bytes starting at `addr`.
    Add { addr: u64 },
    /// `size` bytes from the source or target, per `mode`.
    Copy { addr: u64, mode: CopyMode },
}

/// One whole-target instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Winst {
    pub op: WinstOp,
    /// Number of target bytes this instruction produces.
    pub size: u32,
    /// Absolute target offset where those bytes begin.
    pub position: u64,
}

impl Winst {
    /// Target offset one past the last byte this instruction produces.
    pub fn end(&self) -> u64 {
        self.position + u64::from(self.size)
    }
}
