use std::io::{BufReader, BufWriter, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::bits::{BitBuffer, BitReader, BitSource, BYTE_SIZE};
use crate::error::{HuffmanError, Result};
use crate::huffman::HuffmanTree;
use crate::BUFFER_SIZE;

pub struct HuffmanDecoder {
    tree: HuffmanTree,
}

impl HuffmanDecoder {
    pub fn new(tree: HuffmanTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    /// Reads the tree and the original byte count that open every artifact.
    pub fn read_header<R: Read>(reader: &mut R) -> Result<(Self, u64)> {
        let tree = HuffmanTree::read_from(reader)?;
        let count = reader.read_u64::<LittleEndian>().map_err(|err| {
            HuffmanError::from_artifact_read(err, || "missing original byte count".into())
        })?;
        Ok((Self::new(tree), count))
    }

    /// Decodes exactly `count` bytes, walking the tree one bit at a time.
    ///
    /// The count alone decides when to stop; padding after the last code is never
    /// looked at. A tree made of a single leaf has an empty code, so its byte is
    /// emitted `count` times without touching `source`.
    pub fn decode_symbols<S, F>(&self, source: &mut S, count: u64, mut emit: F) -> Result<()>
    where
        S: BitSource,
        F: FnMut(u8) -> Result<()>,
    {
        let root = match self.tree.root() {
            Some(root) => root,
            None if count == 0 => return Ok(()),
            None => {
                return Err(HuffmanError::MalformedTree(format!(
                    "empty tree cannot decode {} bytes",
                    count
                )))
            }
        };

        let root_node = self.tree.node(root);
        if root_node.is_leaf() {
            for _ in 0..count {
                emit(root_node.char)?;
            }
            return Ok(());
        }

        let mut decoded = 0u64;
        let mut idx = root;
        while decoded < count {
            let bit = source
                .next_bit()
                .map_err(HuffmanError::ReadFailure)?
                .ok_or_else(|| {
                    HuffmanError::TruncatedArtifact(format!(
                        "payload ends after {} of {} bytes",
                        decoded, count
                    ))
                })?;

            let node = self.tree.node(idx);
            let next = if bit { node.right } else { node.left };
            idx = next as usize;

            let node = self.tree.node(idx);
            if node.is_leaf() {
                emit(node.char)?;
                decoded += 1;
                idx = root;
            }
        }

        Ok(())
    }

    /// Decompresses an artifact read from `input` into `output`.
    pub fn decode<R, W>(input: &mut R, output: &mut W) -> Result<()>
    where
        R: Read,
        W: Write,
    {
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, input);
        let (decoder, count) = Self::read_header(&mut reader)?;

        let mut writer = BufWriter::with_capacity(BUFFER_SIZE, output);
        let mut bits = BitReader::new(&mut reader);
        decoder.decode_symbols(&mut bits, count, |byte| {
            writer
                .write_all(&[byte])
                .map_err(HuffmanError::WriteFailure)
        })?;
        writer.flush().map_err(HuffmanError::WriteFailure)?;

        log::debug!(
            "decoded {} bytes with a {} node tree",
            count,
            decoder.tree.len()
        );

        Ok(())
    }

    /// Decompresses an artifact held in memory.
    pub fn unpack(artifact: &[u8]) -> Result<Vec<u8>> {
        let mut reader = artifact;
        let (decoder, count) = Self::read_header(&mut reader)?;

        let payload = BitBuffer::from_bytes(reader, reader.len() * BYTE_SIZE);
        let capacity = if decoder.tree.len() > 1 {
            count.min(payload.len() as u64)
        } else {
            count.min(BUFFER_SIZE as u64)
        };

        let mut decoded = Vec::with_capacity(capacity as usize);
        let mut cursor = payload.cursor();
        decoder.decode_symbols(&mut cursor, count, |byte| {
            decoded.push(byte);
            Ok(())
        })?;

        log::debug!(
            "unpacked {} bytes from {} of {} payload bits",
            count,
            cursor.position(),
            payload.len()
        );

        Ok(decoded)
    }
}
