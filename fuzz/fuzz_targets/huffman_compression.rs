#![no_main]

use huffcomp::HuffmanEncoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = HuffmanEncoder::pack(data);
});
