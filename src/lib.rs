//! Oximerge: VCDIFF delta merging without intermediate reconstruction.
//!
//! Given two consecutive deltas A = Δ(S→M) and B = Δ(M→T), the merge
//! engine produces a single equivalent delta Δ(S→T) without ever
//! materializing M or T.  Deltas are held as whole-target states — a flat
//! instruction list plus an immediate-data arena — built by appending
//! decoded windows (`whole`, `window`), composed by the merge engine
//! (`merge`), and checkable against real bytes with the reference applier
//! (`apply`).  Wire-format encoding and decoding of VCDIFF windows is the
//! caller's side of the boundary.
//!
//! # Quick Start
//!
//! ```
//! use oximerge::{
//!     CopyWindow, DecodedInst, DecodedWindow, WholeTarget, WindowSource, apply, merge_inputs,
//! };
//!
//! let source = b"abcdefgh";
//!
//! // A: S -> M, where M = "cdef".
//! let mut a = WholeTarget::new().unwrap();
//! a.append_window(&DecodedWindow {
//!     copy_window: Some(CopyWindow { mode: WindowSource::Source, offset: 0, len: 8 }),
//!     data: b"",
//!     insts: &[DecodedInst::Copy { size: 4, addr: 2 }],
//! })
//! .unwrap();
//!
//! // B: M -> T, where T = "cdcd".
//! let mut b = WholeTarget::new().unwrap();
//! b.append_window(&DecodedWindow {
//!     copy_window: Some(CopyWindow { mode: WindowSource::Source, offset: 0, len: 4 }),
//!     data: b"",
//!     insts: &[
//!         DecodedInst::Copy { size: 2, addr: 0 },
//!         DecodedInst::Copy { size: 2, addr: 0 },
//!     ],
//! })
//! .unwrap();
//!
//! let mut merged = WholeTarget::new().unwrap();
//! merge_inputs(&mut merged, &a, &b).unwrap();
//! assert_eq!(apply(&merged, source).unwrap(), b"cdcd");
//! ```

pub mod apply;
pub mod error;
pub mod merge;
pub mod whole;
pub mod window;
pub mod winst;

pub use apply::apply;
pub use error::MergeError;
pub use merge::{merge_chain, merge_deltas, merge_inputs};
pub use whole::WholeTarget;
pub use window::{CopyWindow, DecodedInst, DecodedWindow, WindowSource};
pub use winst::{CopyMode, Winst, WinstOp};
