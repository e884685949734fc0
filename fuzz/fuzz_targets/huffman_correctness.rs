#![no_main]

use std::io::Cursor;

use huffcomp::{HuffmanDecoder, HuffmanEncoder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let packed = HuffmanEncoder::pack(data).unwrap();

    let mut streamed = Vec::new();
    huffcomp::encode(&mut Cursor::new(data), &mut streamed).unwrap();
    assert_eq!(packed, streamed);

    assert_eq!(data, HuffmanDecoder::unpack(&packed).unwrap());

    let mut decoded = Vec::new();
    huffcomp::decode(&mut packed.as_slice(), &mut decoded).unwrap();
    assert_eq!(data, decoded);
});
