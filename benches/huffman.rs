use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use huffcomp::{HuffmanDecoder, HuffmanEncoder};
use lipsum::lipsum;

fn huffman_compression(c: &mut Criterion) {
    let input = lipsum(2048);
    let input = input.as_bytes();

    c.bench_function("huffman pack", |b| {
        b.iter(|| HuffmanEncoder::pack(black_box(input)))
    });

    c.bench_function("huffman encode", |b| {
        b.iter(|| {
            let mut output = Vec::new();
            huffcomp::encode(&mut Cursor::new(black_box(input)), &mut output).unwrap();
            output
        })
    });
}

fn huffman_decompression(c: &mut Criterion) {
    let input = lipsum(4096);
    let compressed = HuffmanEncoder::pack(input.as_bytes()).unwrap();

    c.bench_function("huffman unpack", |b| {
        b.iter(|| HuffmanDecoder::unpack(black_box(&compressed)))
    });

    c.bench_function("huffman decode", |b| {
        b.iter(|| {
            let mut output = Vec::new();
            huffcomp::decode(&mut black_box(compressed.as_slice()), &mut output).unwrap();
            output
        })
    });
}

criterion_group!(benches, huffman_compression, huffman_decompression);
criterion_main!(benches);
