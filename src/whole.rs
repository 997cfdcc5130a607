// Whole-target state: one fully-decoded delta held in flat form.
//
// Two grow-by-doubling buffers — an immediate-data arena (`adds`) and an
// instruction vector (`inst`) — plus a running target-length counter.
// All cross-references are integer offsets into the owned buffers, so
// reallocation on growth needs no pointer fixups.
//
// Invariants maintained by the append primitives:
//   - Instructions are strictly ordered and contiguous by `position`;
//     the first starts at 0 and the last ends at `length`.
//   - RUN stores exactly one arena byte regardless of its size; ADD
//     stores exactly `size` bytes.
//   - Zero-size instructions are never stored.

use crate::error::MergeError;
use crate::winst::{CopyMode, Winst, WinstOp};

/// Allocation block quantum (matches xdelta3's XD3_ALLOCSIZE).
pub(crate) const ALLOC_QUANTUM: usize = 1 << 14;

/// Round `size` up to a multiple of `blk` (`blk` must be a power of two).
fn round_blksize(size: usize, blk: usize) -> usize {
    (size + blk - 1) & !(blk - 1)
}

/// Grow-by-doubling reservation over a `Vec`.
///
/// No-op when `additional` more units already fit. Otherwise grows
/// capacity to `round_up(2 * needed_bytes, ALLOC_QUANTUM)` worth of units,
/// keeping repeated appends amortized O(1). Allocation failure maps to
/// `OutOfMemory` and leaves the buffer untouched.
fn reserve_doubling<T>(buf: &mut Vec<T>, additional: usize) -> Result<(), MergeError> {
    let needed = buf.len() + additional;
    if needed <= buf.capacity() {
        return Ok(());
    }
    let unit = std::mem::size_of::<T>().max(1);
    let new_alloc = round_blksize(needed * unit * 2, ALLOC_QUANTUM);
    buf.try_reserve_exact(new_alloc / unit - buf.len())?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Whole-target state
// ---------------------------------------------------------------------------

/// A fully-decoded delta against a named source: instruction vector,
/// immediate-data arena, and the total target length described so far.
#[derive(Debug)]
pub struct WholeTarget {
    /// Immediate-data arena: ADD payloads and RUN repeat bytes.
    adds: Vec<u8>,
    /// Instruction vector, ordered and contiguous by `position`.
    inst: Vec<Winst>,
    /// Total target bytes described (sum of all instruction sizes).
    length: u64,
}

impl WholeTarget {
    /// Create an empty state with both buffers pre-sized to the
    /// allocation quantum.
    pub fn new() -> Result<Self, MergeError> {
        let mut adds = Vec::new();
        adds.try_reserve_exact(ALLOC_QUANTUM)?;
        let mut inst: Vec<Winst> = Vec::new();
        inst.try_reserve_exact(ALLOC_QUANTUM / std::mem::size_of::<Winst>())?;
        Ok(Self {
            adds,
            inst,
            length: 0,
        })
    }

    /// Total target bytes described by this delta.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The instruction vector.
    pub fn instructions(&self) -> &[Winst] {
        &self.inst
    }

    /// The immediate-data arena.
    pub fn adds(&self) -> &[u8] {
        &self.adds
    }

    /// True when no instructions have been appended.
    pub fn is_empty(&self) -> bool {
        self.inst.is_empty()
    }

    /// Exchange ownership of both buffers and the length counter.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    // -----------------------------------------------------------------------
    // Append primitives
    // -----------------------------------------------------------------------

    /// Reserve one instruction slot and `data_len` arena bytes.
    ///
    /// Both reservations happen before either write, so a failure leaves
    /// the state visibly unchanged.
    fn reserve_append(&mut self, data_len: usize) -> Result<(), MergeError> {
        reserve_doubling(&mut self.inst, 1)?;
        reserve_doubling(&mut self.adds, data_len)
    }

    /// Push arena bytes, returning the offset they landed at.
    fn push_adds(&mut self, bytes: &[u8]) -> u64 {
        let at = self.adds.len() as u64;
        self.adds.extend_from_slice(bytes);
        at
    }

    /// Push an instruction at the current end of the target.
    fn push_winst(&mut self, op: WinstOp, size: u32) {
        let position = self.length;
        self.inst.push(Winst { op, size, position });
        self.length += u64::from(size);
    }

    /// Append a RUN of `size` repeats of `byte`.
    pub(crate) fn append_run(&mut self, size: u32, byte: u8) -> Result<(), MergeError> {
        debug_assert!(size > 0);
        self.reserve_append(1)?;
        let addr = self.push_adds(&[byte]);
        self.push_winst(WinstOp::Run { addr }, size);
        Ok(())
    }

    /// Append an ADD of `bytes` (one target byte per arena byte).
    pub(crate) fn append_add(&mut self, bytes: &[u8]) -> Result<(), MergeError> {
        debug_assert!(!bytes.is_empty());
        self.reserve_append(bytes.len())?;
        let addr = self.push_adds(bytes);
        self.push_winst(WinstOp::Add { addr }, bytes.len() as u32);
        Ok(())
    }

    /// Append a COPY of `size` bytes from `addr` per `mode`.
    pub(crate) fn append_copy(
        &mut self,
        size: u32,
        addr: u64,
        mode: CopyMode,
    ) -> Result<(), MergeError> {
        debug_assert!(size > 0);
        self.reserve_append(0)?;
        self.push_winst(WinstOp::Copy { addr, mode }, size);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Position index
    // -----------------------------------------------------------------------

    /// Locate the instruction whose span contains target offset `addr`.
    ///
    /// Binary search over `position`; the containing index is unique
    /// because instructions are ordered and contiguous.
    pub fn find_position(&self, addr: u64) -> Result<usize, MergeError> {
        if addr >= self.length {
            return Err(MergeError::InvalidInput(
                "invalid copy offset in merge".into(),
            ));
        }

        let mut low = 0usize;
        let mut high = self.inst.len();

        while low != high {
            let mid = low + (high - low) / 2;
            let mid_lpos = self.inst[mid].position;

            if addr < mid_lpos {
                high = mid;
                continue;
            }

            let mid_hpos = mid_lpos + u64::from(self.inst[mid].size);

            if addr >= mid_hpos {
                low = mid + 1;
                continue;
            }

            return Ok(mid);
        }

        // Unreachable when the ordering invariant holds; guarded anyway.
        Err(MergeError::Internal(
            "position search failed to converge".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
