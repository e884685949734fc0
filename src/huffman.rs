use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use itertools::Itertools;

use crate::bits::{BitStr, Bits};
use crate::error::{HuffmanError, Result};
use crate::forest::Forest;
use crate::frequency::{FrequencyTable, BYTES_COUNT};

/// Index value meaning "no such node".
pub const NO_NODE: i16 = -1;

/// A full binary tree over 256 leaves.
pub const MAX_NODES: usize = 2 * BYTES_COUNT - 1;

type CodeDictionary = Vec<Option<Bits>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanNode {
    pub left: i16,
    pub right: i16,
    pub parent: i16,
    /// Only meaningful for leaves.
    pub char: u8,
}

impl HuffmanNode {
    fn leaf(char: u8) -> Self {
        Self {
            left: NO_NODE,
            right: NO_NODE,
            parent: NO_NODE,
            char,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left == NO_NODE && self.right == NO_NODE
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i16::<LittleEndian>(self.left)?;
        writer.write_i16::<LittleEndian>(self.right)?;
        writer.write_i16::<LittleEndian>(self.parent)?;
        writer.write_u8(self.char)
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            left: reader.read_i16::<LittleEndian>()?,
            right: reader.read_i16::<LittleEndian>()?,
            parent: reader.read_i16::<LittleEndian>()?,
            char: reader.read_u8()?,
        })
    }
}

/// Huffman tree stored as a flat node array. Children always sit at lower indices
/// than their parent and the last node is the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<HuffmanNode>,
    codes: CodeDictionary,
}

impl HuffmanTree {
    /// Builds the tree by repeatedly merging the two lightest subtrees of `forest`.
    pub fn new(mut forest: Forest) -> Self {
        let mut nodes: Vec<HuffmanNode> = Vec::with_capacity(2 * forest.len());
        nodes.extend(forest.trees().iter().map(|tree| HuffmanNode::leaf(tree.char)));

        while forest.len() > 1 {
            let (m1, m2) = match forest.find_two_minimal() {
                Some((m1, Some(m2))) => (m1, m2),
                _ => break,
            };

            let left = forest.trees()[m1].node;
            let right = forest.trees()[m2].node;
            let parent = nodes.len() as i16;

            nodes[left as usize].parent = parent;
            nodes[right as usize].parent = parent;
            nodes.push(HuffmanNode {
                left,
                right,
                parent: NO_NODE,
                char: 0,
            });

            forest.merge(m1, m2, parent);
        }

        let mut tree = Self {
            nodes,
            codes: vec![None; BYTES_COUNT],
        };
        tree.build_codes();

        log::debug!(
            "built huffman tree: {} nodes, {} symbols",
            tree.nodes.len(),
            tree.codes().count()
        );

        tree
    }

    pub fn from_frequencies(frequencies: &FrequencyTable) -> Self {
        Self::new(Forest::new(frequencies))
    }

    /// Adopts an existing node array after checking that it forms a proper tree.
    pub fn from_nodes(nodes: Vec<HuffmanNode>) -> Result<Self> {
        Self::validate(&nodes)?;

        let mut tree = Self {
            nodes,
            codes: vec![None; BYTES_COUNT],
        };
        tree.build_codes();
        Ok(tree)
    }

    fn validate(nodes: &[HuffmanNode]) -> Result<()> {
        let malformed = |msg: String| -> Result<()> { Err(HuffmanError::MalformedTree(msg)) };

        if nodes.len() > MAX_NODES {
            return malformed(format!(
                "{} nodes, at most {} allowed",
                nodes.len(),
                MAX_NODES
            ));
        }

        let count = nodes.len() as i16;
        let mut seen = [false; BYTES_COUNT];

        for (idx, node) in nodes.iter().enumerate() {
            let own = idx as i16;

            if node.is_leaf() {
                if seen[node.char as usize] {
                    return malformed(format!("byte {:#04x} has two leaves", node.char));
                }
                seen[node.char as usize] = true;
            } else {
                if node.left == node.right {
                    return malformed(format!("node {} has the same child twice", idx));
                }
                for child in [node.left, node.right] {
                    if child < 0 || child >= own {
                        return malformed(format!(
                            "node {} points at child {}, which is not below it",
                            idx, child
                        ));
                    }
                    if nodes[child as usize].parent != own {
                        return malformed(format!(
                            "node {} is not the parent of its child {}",
                            idx, child
                        ));
                    }
                }
            }

            if own == count - 1 {
                if node.parent != NO_NODE {
                    return malformed(format!("root {} has parent {}", idx, node.parent));
                }
            } else {
                if node.parent <= own || node.parent >= count {
                    return malformed(format!(
                        "node {} has parent {}, outside {}..{}",
                        idx,
                        node.parent,
                        idx + 1,
                        count
                    ));
                }
                let parent = &nodes[node.parent as usize];
                if parent.left != own && parent.right != own {
                    return malformed(format!(
                        "node {} is not a child of its parent {}",
                        idx, node.parent
                    ));
                }
            }
        }

        Ok(())
    }

    fn build_codes(&mut self) {
        let mut codes: CodeDictionary = vec![None; BYTES_COUNT];
        if let Some(root) = self.root() {
            let mut path = Bits::new();
            Self::collect_codes(&self.nodes, root, &mut path, &mut codes);
        }
        self.codes = codes;

        log::trace!(
            "huffman codes: {}",
            self.codes()
                .map(|(byte, code)| format!("{:#04x}={}", byte, format_code(code)))
                .join(" ")
        );
    }

    fn collect_codes(
        nodes: &[HuffmanNode],
        idx: usize,
        path: &mut Bits,
        codes: &mut CodeDictionary,
    ) {
        let node = &nodes[idx];
        if node.is_leaf() {
            codes[node.char as usize] = Some(path.clone());
            return;
        }

        path.push(false);
        Self::collect_codes(nodes, node.left as usize, path, codes);
        path.pop();

        path.push(true);
        Self::collect_codes(nodes, node.right as usize, path, codes);
        path.pop();
    }

    pub fn nodes(&self) -> &[HuffmanNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &HuffmanNode {
        &self.nodes[idx]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the root, `None` for the empty tree.
    pub fn root(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    /// Bit path from the root to `byte`'s leaf, if `byte` is in the alphabet.
    pub fn code(&self, byte: u8) -> Option<&BitStr> {
        self.codes[byte as usize].as_deref()
    }

    pub fn codes(&self) -> impl Iterator<Item = (u8, &BitStr)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(byte, code)| code.as_deref().map(|code| (byte as u8, code)))
    }

    /// Payload size in bits when the counted input is encoded with this tree.
    pub fn encoded_bits(&self, frequencies: &FrequencyTable) -> u64 {
        self.codes()
            .map(|(byte, code)| frequencies.frequency_of(byte) * code.len() as u64)
            .sum()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.nodes.len() as u16)?;
        for node in &self.nodes {
            node.write_to(writer)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let count = reader
            .read_u16::<LittleEndian>()
            .map_err(|err| HuffmanError::from_artifact_read(err, || "missing tree size".into()))?
            as usize;

        if count > MAX_NODES {
            return Err(HuffmanError::MalformedTree(format!(
                "{} nodes, at most {} allowed",
                count, MAX_NODES
            )));
        }

        let mut nodes = Vec::with_capacity(count);
        for idx in 0..count {
            let node = HuffmanNode::read_from(reader).map_err(|err| {
                HuffmanError::from_artifact_read(err, || {
                    format!("tree ends at node {} of {}", idx, count)
                })
            })?;
            nodes.push(node);
        }

        Self::from_nodes(nodes)
    }
}

/// Renders a code as a string of `0` and `1`.
pub fn format_code(code: &BitStr) -> String {
    code.iter()
        .by_vals()
        .map(|bit| if bit { '1' } else { '0' })
        .collect()
}
