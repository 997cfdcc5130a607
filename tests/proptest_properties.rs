// Property tests for delta merging.
//
// Random delta chains are built as decoded windows against random source
// bytes, merged, and checked against the reference applier.  Source-side
// deltas avoid self-copies (resolving a copy over a self-referential
// source instruction is propagation-only); input-side deltas use the full
// instruction mix.

use oximerge::{
    CopyMode, CopyWindow, DecodedInst, DecodedWindow, WholeTarget, WindowSource, WinstOp, apply,
    merge_inputs,
};
use proptest::prelude::*;

/// One raw plan entry: (kind selector, address seed, size seed, byte).
type PlanOp = (u8, u64, u64, u8);

fn plan() -> impl Strategy<Value = Vec<PlanOp>> {
    proptest::collection::vec((any::<u8>(), any::<u64>(), any::<u64>(), any::<u8>()), 0..24)
}

/// Turn a raw plan into a valid single-window delta over `src_len` source
/// bytes.
fn build_delta(src_len: usize, plan: &[PlanOp], allow_self_copies: bool) -> WholeTarget {
    let mut insts = Vec::new();
    let mut data = Vec::new();
    let mut produced: u64 = 0;

    for &(kind, a, s, byte) in plan {
        let kind = kind % if allow_self_copies { 4 } else { 3 };
        match kind {
            // RUN
            0 => {
                let size = 1 + (s % 8) as u32;
                data.push(byte);
                insts.push(DecodedInst::Run { size });
                produced += u64::from(size);
            }
            // ADD
            1 => {
                let size = 1 + (s % 8) as usize;
                for i in 0..size {
                    data.push(byte.wrapping_add(i as u8));
                }
                insts.push(DecodedInst::Add { size: size as u32 });
                produced += size as u64;
            }
            // Source COPY (falls back to ADD when there is no source).
            2 => {
                if src_len == 0 {
                    data.push(byte);
                    insts.push(DecodedInst::Add { size: 1 });
                    produced += 1;
                    continue;
                }
                let addr = a % src_len as u64;
                let max = (src_len as u64 - addr).min(16);
                let size = (1 + s % max) as u32;
                insts.push(DecodedInst::Copy { size, addr });
                produced += u64::from(size);
            }
            // Self COPY, possibly overlapping its own output.
            _ => {
                if produced == 0 {
                    data.push(byte);
                    insts.push(DecodedInst::Add { size: 1 });
                    produced += 1;
                    continue;
                }
                let local = a % produced;
                let size = 1 + (s % 8) as u32;
                insts.push(DecodedInst::Copy {
                    size,
                    addr: src_len as u64 + local,
                });
                produced += u64::from(size);
            }
        }
    }

    let mut state = WholeTarget::new().unwrap();
    let copy_window = (src_len > 0).then_some(CopyWindow {
        mode: WindowSource::Source,
        offset: 0,
        len: src_len as u64,
    });
    state
        .append_window(&DecodedWindow {
            copy_window,
            data: &data,
            insts: &insts,
        })
        .unwrap();
    state
}

/// Ordering, contiguity, and address validity (source copies within
/// `source_len`, target copies behind their own position).
fn assert_well_formed(state: &WholeTarget, source_len: u64) {
    let mut expected_pos = 0u64;
    for inst in state.instructions() {
        assert!(inst.size > 0);
        assert_eq!(inst.position, expected_pos);
        expected_pos = inst.end();
        match inst.op {
            WinstOp::Run { addr } => assert!((addr as usize) < state.adds().len()),
            WinstOp::Add { addr } => {
                assert!(addr as usize + inst.size as usize <= state.adds().len());
            }
            WinstOp::Copy { addr, mode } => match mode {
                CopyMode::Source => assert!(addr + u64::from(inst.size) <= source_len),
                CopyMode::SelfTarget | CopyMode::Target => assert!(addr < inst.position),
            },
        }
    }
    assert_eq!(expected_pos, state.length());
}

proptest! {
    // Length preservation and structural invariants of the merged state.
    #[test]
    fn prop_merge_preserves_length_and_invariants(
        src in proptest::collection::vec(any::<u8>(), 0..256),
        plan_a in plan(),
        plan_b in plan(),
    ) {
        let a = build_delta(src.len(), &plan_a, false);
        assert_well_formed(&a, src.len() as u64);
        let m = apply(&a, &src).unwrap();

        let b = build_delta(m.len(), &plan_b, true);
        assert_well_formed(&b, m.len() as u64);

        let mut out = WholeTarget::new().unwrap();
        merge_inputs(&mut out, &a, &b).unwrap();

        prop_assert_eq!(out.length(), b.length());
        assert_well_formed(&out, src.len() as u64);
    }

    // Semantic equivalence: applying the merged delta to S yields T.
    #[test]
    fn prop_merged_delta_reconstructs_target(
        src in proptest::collection::vec(any::<u8>(), 0..256),
        plan_a in plan(),
        plan_b in plan(),
    ) {
        let a = build_delta(src.len(), &plan_a, false);
        let m = apply(&a, &src).unwrap();
        let b = build_delta(m.len(), &plan_b, true);
        let t = apply(&b, &m).unwrap();

        let mut out = WholeTarget::new().unwrap();
        merge_inputs(&mut out, &a, &b).unwrap();
        prop_assert_eq!(apply(&out, &src).unwrap(), t);
    }

    // Associativity over a three-delta chain (bytewise; instruction
    // streams may differ).
    #[test]
    fn prop_merge_is_associative_bytewise(
        src in proptest::collection::vec(any::<u8>(), 0..128),
        plan_a in plan(),
        plan_b in plan(),
        plan_c in plan(),
    ) {
        let a = build_delta(src.len(), &plan_a, false);
        let m1 = apply(&a, &src).unwrap();
        let b = build_delta(m1.len(), &plan_b, false);
        let m2 = apply(&b, &m1).unwrap();
        let c = build_delta(m2.len(), &plan_c, true);
        let t = apply(&c, &m2).unwrap();

        // (A ∘ B) ∘ C
        let mut ab = WholeTarget::new().unwrap();
        merge_inputs(&mut ab, &a, &b).unwrap();
        let mut left = WholeTarget::new().unwrap();
        merge_inputs(&mut left, &ab, &c).unwrap();

        // A ∘ (B ∘ C)
        let mut bc = WholeTarget::new().unwrap();
        merge_inputs(&mut bc, &b, &c).unwrap();
        let mut right = WholeTarget::new().unwrap();
        merge_inputs(&mut right, &a, &bc).unwrap();

        let left_bytes = apply(&left, &src).unwrap();
        let right_bytes = apply(&right, &src).unwrap();
        prop_assert_eq!(&left_bytes, &t);
        prop_assert_eq!(&right_bytes, &t);
    }

    // Identity delta on the left is a no-op: merge(I, B) applied to S is
    // exactly B applied to S.
    #[test]
    fn prop_identity_source_delta_is_neutral(
        src in proptest::collection::vec(any::<u8>(), 1..256),
        plan_b in plan(),
    ) {
        let mut identity = WholeTarget::new().unwrap();
        identity
            .append_window(&DecodedWindow {
                copy_window: Some(CopyWindow {
                    mode: WindowSource::Source,
                    offset: 0,
                    len: src.len() as u64,
                }),
                data: b"",
                insts: &[DecodedInst::Copy {
                    size: src.len() as u32,
                    addr: 0,
                }],
            })
            .unwrap();

        let b = build_delta(src.len(), &plan_b, true);
        let expected = apply(&b, &src).unwrap();

        let mut out = WholeTarget::new().unwrap();
        merge_inputs(&mut out, &identity, &b).unwrap();
        prop_assert_eq!(apply(&out, &src).unwrap(), expected);
    }
}
