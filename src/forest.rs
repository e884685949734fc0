use crate::frequency::{FrequencyTable, BYTES_COUNT};

/// One not-yet-merged subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestTree {
    pub frequency: u64,
    pub char: u8,
    /// Index of the subtree's root in the node array under construction.
    pub node: i16,
}

/// Working set of subtrees while a huffman tree is being built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    trees: Vec<ForestTree>,
}

impl Forest {
    /// One tree per byte that occurs, in ascending byte order; tree `i` points at node `i`.
    pub fn new(frequencies: &FrequencyTable) -> Self {
        let mut trees = Vec::with_capacity(BYTES_COUNT);
        for (char, frequency) in frequencies.iter() {
            trees.push(ForestTree {
                frequency,
                char,
                node: trees.len() as i16,
            });
        }
        Self { trees }
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn trees(&self) -> &[ForestTree] {
        &self.trees
    }

    /// Positions of the lowest and second lowest frequency trees. On equal
    /// frequencies the tree seen first wins.
    pub fn find_two_minimal(&self) -> Option<(usize, Option<usize>)> {
        let mut first: Option<usize> = None;
        let mut second: Option<usize> = None;

        for (position, tree) in self.trees.iter().enumerate() {
            match first {
                Some(m1) if self.trees[m1].frequency <= tree.frequency => {
                    match second {
                        Some(m2) if self.trees[m2].frequency <= tree.frequency => {}
                        _ => second = Some(position),
                    }
                }
                _ => {
                    second = first;
                    first = Some(position);
                }
            }
        }

        first.map(|m1| (m1, second))
    }

    /// Removes the tree at `position`. The last tree takes its place.
    pub fn remove(&mut self, position: usize) -> ForestTree {
        self.trees.swap_remove(position)
    }

    /// Folds the tree at `second` into the tree at `first`, which becomes the
    /// subtree rooted at `node`.
    pub fn merge(&mut self, first: usize, second: usize, node: i16) {
        let absorbed = self.trees[second].frequency;
        let merged = &mut self.trees[first];
        merged.frequency += absorbed;
        merged.node = node;
        self.remove(second);
    }
}
