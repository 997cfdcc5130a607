#![no_main]
use libfuzzer_sys::fuzz_target;
use oximerge::{
    CopyWindow, DecodedInst, DecodedWindow, WholeTarget, WindowSource, apply, merge_inputs,
};

/// Build a valid single-window delta over `src_len` source bytes from raw
/// fuzz bytes (5 per instruction: kind, two address bytes, size, byte).
fn build_delta(src_len: usize, raw: &[u8], allow_self_copies: bool) -> WholeTarget {
    let mut insts = Vec::new();
    let mut data = Vec::new();
    let mut produced: u64 = 0;

    for chunk in raw.chunks_exact(5) {
        let a = u64::from(chunk[1]) << 8 | u64::from(chunk[2]);
        let s = u64::from(chunk[3]);
        let byte = chunk[4];
        match chunk[0] % if allow_self_copies { 4 } else { 3 } {
            0 => {
                let size = 1 + (s % 8) as u32;
                data.push(byte);
                insts.push(DecodedInst::Run { size });
                produced += u64::from(size);
            }
            1 => {
                let size = 1 + (s % 8) as usize;
                data.extend(std::iter::repeat_n(byte, size));
                insts.push(DecodedInst::Add { size: size as u32 });
                produced += size as u64;
            }
            2 if src_len > 0 => {
                let addr = a % src_len as u64;
                let max = (src_len as u64 - addr).min(16);
                let size = (1 + s % max) as u32;
                insts.push(DecodedInst::Copy { size, addr });
                produced += u64::from(size);
            }
            3 if produced > 0 => {
                let size = 1 + (s % 8) as u32;
                insts.push(DecodedInst::Copy {
                    size,
                    addr: src_len as u64 + a % produced,
                });
                produced += u64::from(size);
            }
            _ => {
                data.push(byte);
                insts.push(DecodedInst::Add { size: 1 });
                produced += 1;
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

fuzz_target!(|raw: &[u8]| {
    // Valid chains must merge without error, preserve the input's length,
    // and reconstruct the same target as the unmerged chain.
    if raw.len() < 3 {
        return;
    }
    let src_len = usize::from(raw[0]) << 4 & 0xFFF;
    let source: Vec<u8> = (0..src_len).map(|i| (i % 251) as u8).collect();

    let (raw_a, raw_b) = raw[1..].split_at((raw.len() - 1) / 2);
    let a = build_delta(source.len(), raw_a, false);
    let m = apply(&a, &source).unwrap();
    let b = build_delta(m.len(), raw_b, true);
    let t = apply(&b, &m).unwrap();

    let mut out = WholeTarget::new().unwrap();
    merge_inputs(&mut out, &a, &b).unwrap();
    assert_eq!(out.length(), b.length());
    assert_eq!(apply(&out, &source).unwrap(), t);
});
