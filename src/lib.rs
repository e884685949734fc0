//! Lossless compression of byte streams with a per-input Huffman code.
//!
//! A compressed artifact is self-describing: it carries the tree built from the
//! input's byte frequencies, the original length, and the packed codes.
//!
//! ```text
//! [u16 node count][node count x {i16 left, i16 right, i16 parent, u8 char}]
//! [u64 original byte count][payload bits, MSB first, zero padded]
//! ```
//!
//! All integers are little endian.

use std::io::{Read, Seek, Write};

pub mod bits;
pub mod error;
pub mod forest;
pub mod frequency;
pub mod huffman;
pub mod huffman_decoder;
pub mod huffman_encoder;

pub use error::{HuffmanError, Result};
pub use frequency::FrequencyTable;
pub use huffman::HuffmanTree;
pub use huffman_decoder::HuffmanDecoder;
pub use huffman_encoder::HuffmanEncoder;

/// Chunk size used for every buffered read and write.
pub const BUFFER_SIZE: usize = 1 << 16;

/// Compresses `input` into `output`. `input` is read twice, so it must be seekable.
pub fn encode<R, W>(input: &mut R, output: &mut W) -> Result<()>
where
    R: Read + Seek,
    W: Write,
{
    HuffmanEncoder::encode(input, output)
}

/// Restores the original bytes of an artifact produced by [`encode`].
pub fn decode<R, W>(input: &mut R, output: &mut W) -> Result<()>
where
    R: Read,
    W: Write,
{
    HuffmanDecoder::decode(input, output)
}
