use std::io::{self, Read};

use crate::error::{HuffmanError, Result};
use crate::BUFFER_SIZE;

pub const BYTES_COUNT: usize = 256;

/// Feeds `reader` to `f` chunk by chunk until EOF, retrying interrupted reads.
pub(crate) fn for_each_chunk<R, F>(mut reader: R, mut f: F) -> Result<()>
where
    R: Read,
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut chunk = vec![0u8; BUFFER_SIZE];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => f(&chunk[..n])?,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(HuffmanError::ReadFailure(err)),
        }
    }
}

/// Occurrence count of every byte value in one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; BYTES_COUNT],
    total: u64,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self {
            counts: [0; BYTES_COUNT],
            total: 0,
        }
    }
}

impl FrequencyTable {
    /// Reads `reader` to its end, counting bytes. The reader is left exhausted.
    pub fn scan<R: Read>(reader: R) -> Result<Self> {
        let mut table = Self::default();
        for_each_chunk(reader, |chunk| {
            table.add(chunk);
            Ok(())
        })?;

        log::debug!(
            "scanned {} bytes, {} distinct values",
            table.total,
            table.distinct()
        );

        Ok(table)
    }

    pub fn from_bytes(data: &[u8]) -> Self {
        let mut table = Self::default();
        table.add(data);
        table
    }

    fn add(&mut self, data: &[u8]) {
        for byte in data {
            self.counts[*byte as usize] += 1;
        }
        self.total += data.len() as u64;
    }

    pub fn frequency_of(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Size of the alphabet: how many byte values occur at least once.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|count| **count > 0).count()
    }

    /// `(byte, count)` for every byte that occurs, in ascending byte order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(byte, count)| (byte as u8, *count))
    }
}
