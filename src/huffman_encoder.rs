use std::io::{BufWriter, Read, Seek, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::bits::{BitBuffer, BitStr, BitWriter};
use crate::error::{HuffmanError, Result};
use crate::frequency::{for_each_chunk, FrequencyTable};
use crate::huffman::HuffmanTree;
use crate::BUFFER_SIZE;

/// Encodes one input with the tree built from its byte frequencies.
pub struct HuffmanEncoder {
    frequencies: FrequencyTable,
    tree: HuffmanTree,
}

impl HuffmanEncoder {
    pub fn new(frequencies: FrequencyTable) -> Self {
        let tree = HuffmanTree::from_frequencies(&frequencies);
        Self { frequencies, tree }
    }

    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    pub fn frequencies(&self) -> &FrequencyTable {
        &self.frequencies
    }

    /// Tree followed by the original byte count.
    pub fn write_header<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.tree
            .write_to(writer)
            .and_then(|_| writer.write_u64::<LittleEndian>(self.frequencies.total()))
            .map_err(HuffmanError::WriteFailure)
    }

    /// Exact payload length in bits, padding excluded.
    pub fn payload_bits(&self) -> u64 {
        self.tree.encoded_bits(&self.frequencies)
    }

    fn code(&self, byte: u8) -> Result<&BitStr> {
        self.tree.code(byte).ok_or(HuffmanError::InputChanged)
    }

    /// Compresses `input` into `output`. The input is read twice: once to count
    /// bytes, then again from the start to emit their codes.
    pub fn encode<R, W>(input: &mut R, output: &mut W) -> Result<()>
    where
        R: Read + Seek,
        W: Write,
    {
        let encoder = Self::new(FrequencyTable::scan(&mut *input)?);

        let mut writer = BufWriter::with_capacity(BUFFER_SIZE, output);
        encoder.write_header(&mut writer)?;

        input.rewind().map_err(HuffmanError::SeekFailure)?;

        let mut bits = BitWriter::new(&mut writer);
        let mut seen = 0u64;
        for_each_chunk(&mut *input, |chunk| {
            for byte in chunk {
                bits.write_bits(encoder.code(*byte)?)
                    .map_err(HuffmanError::WriteFailure)?;
            }
            seen += chunk.len() as u64;
            Ok(())
        })?;

        let payload_bits = bits.bits_written();
        if seen != encoder.frequencies.total() || payload_bits != encoder.payload_bits() {
            return Err(HuffmanError::InputChanged);
        }

        bits.finish().map_err(HuffmanError::WriteFailure)?;
        writer.flush().map_err(HuffmanError::WriteFailure)?;

        log::debug!(
            "encoded {} bytes into {} payload bits with a {} node tree",
            seen,
            payload_bits,
            encoder.tree.len()
        );

        Ok(())
    }

    /// Compresses `data` entirely in memory. The result is byte for byte what
    /// [`HuffmanEncoder::encode`] writes for the same input.
    pub fn pack(data: &[u8]) -> Result<Vec<u8>> {
        let encoder = Self::new(FrequencyTable::from_bytes(data));

        let mut artifact = Vec::new();
        encoder.write_header(&mut artifact)?;

        let mut payload = BitBuffer::with_capacity(encoder.payload_bits() as usize);
        for byte in data {
            payload.push_bits(encoder.code(*byte)?);
        }
        artifact.extend(payload.to_bytes());

        Ok(artifact)
    }
}
