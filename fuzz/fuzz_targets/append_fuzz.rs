#![no_main]
use libfuzzer_sys::fuzz_target;
use oximerge::{
    CopyWindow, DecodedInst, DecodedWindow, WholeTarget, WindowSource, apply, merge_deltas,
};

/// Interpret raw bytes as a sequence of windows with arbitrary (bounded)
/// copy windows and instructions.  Nothing here keeps copies in range, so
/// appended states may be invalid; every downstream call must fail with
/// an error rather than panic.
fn build_loose(raw: &[u8]) -> Option<WholeTarget> {
    let mut state = WholeTarget::new().ok()?;

    for win in raw.chunks(32) {
        if win.len() < 8 {
            break;
        }
        let copy_window = (win[0] & 1 != 0).then_some(CopyWindow {
            mode: if win[0] & 2 != 0 {
                WindowSource::Target
            } else {
                WindowSource::Source
            },
            offset: u64::from(win[1]),
            len: u64::from(win[2]) << 4,
        });

        let mut insts = Vec::new();
        let data: Vec<u8> = win[4..].to_vec();
        for inst in win[4..].chunks_exact(4) {
            insts.push(match inst[0] % 4 {
                0 => DecodedInst::Noop,
                1 => DecodedInst::Run {
                    size: u32::from(inst[1]),
                },
                2 => DecodedInst::Add {
                    size: u32::from(inst[1] % 8),
                },
                _ => DecodedInst::Copy {
                    size: u32::from(inst[1]),
                    addr: u64::from(inst[2]) << 8 | u64::from(inst[3]),
                },
            });
        }

        if state
            .append_window(&DecodedWindow {
                copy_window,
                data: &data,
                insts: &insts,
            })
            .is_err()
        {
            break;
        }
    }

    Some(state)
}

fuzz_target!(|raw: &[u8]| {
    // Arbitrary window streams: append, find, merge, and apply must
    // return errors on bad input, never panic.
    if raw.len() < 2 {
        return;
    }
    let (raw_a, raw_b) = raw.split_at(raw.len() / 2);

    let Some(mut a) = build_loose(raw_a) else {
        return;
    };
    let Some(b) = build_loose(raw_b) else {
        return;
    };

    if a.length() > 0 {
        let _ = a.find_position(a.length() / 2);
    }
    let _ = a.find_position(u64::from(raw[0]));

    let source: Vec<u8> = (0..512usize).map(|i| (i * 7 % 256) as u8).collect();
    let _ = apply(&a, &source);

    if merge_deltas(&mut a, &b).is_ok() {
        assert_eq!(a.length(), b.length());
        let _ = apply(&a, &source);
    }
});
