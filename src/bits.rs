//! Bit packing. Bits are stored most significant first within each byte, so the
//! first bit of a stream is the `0x80` bit of its first byte.

use std::io::{self, Read, Write};

use bitvec::prelude::*;
use byteorder::{ReadBytesExt, WriteBytesExt};

pub type Bits = BitVec<u8, Msb0>;
pub type BitStr = BitSlice<u8, Msb0>;

pub const BYTE_SIZE: usize = 8;

// pending bits are handed to the inner writer once this many have piled up
const FLUSH_THRESHOLD: usize = 4096 * BYTE_SIZE;

/// Anything the decoder can pull bits from, one at a time.
pub trait BitSource {
    /// Returns `Ok(None)` once no bits are left.
    fn next_bit(&mut self) -> io::Result<Option<bool>>;
}

pub struct BitWriter<W: Write> {
    inner: W,
    pending: Bits,
    written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: BitVec::with_capacity(FLUSH_THRESHOLD + BYTE_SIZE),
            written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.pending.push(bit);
        self.written += 1;
        if self.pending.len() >= FLUSH_THRESHOLD {
            self.write_full_bytes()?;
        }
        Ok(())
    }

    pub fn write_bits(&mut self, bits: &BitStr) -> io::Result<()> {
        self.pending.extend_from_bitslice(bits);
        self.written += bits.len() as u64;
        if self.pending.len() >= FLUSH_THRESHOLD {
            self.write_full_bytes()?;
        }
        Ok(())
    }

    /// Total number of bits accepted so far, padding excluded.
    pub fn bits_written(&self) -> u64 {
        self.written
    }

    fn write_full_bytes(&mut self) -> io::Result<()> {
        let full = self.pending.len() / BYTE_SIZE;
        if full == 0 {
            return Ok(());
        }

        self.inner.write_all(&self.pending.as_raw_slice()[..full])?;

        let flushed = full * BYTE_SIZE;
        let tail = self.pending.len() - flushed;
        self.pending.copy_within(flushed.., 0);
        self.pending.truncate(tail);
        Ok(())
    }

    /// Writes out everything still pending, padding the last byte with zero bits,
    /// and hands back the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.write_full_bytes()?;

        if !self.pending.is_empty() {
            let mut last = 0u8;
            last.view_bits_mut::<Msb0>()[..self.pending.len()].copy_from_bitslice(&self.pending);
            self.inner.write_u8(last)?;
        }

        Ok(self.inner)
    }
}

pub struct BitReader<R: Read> {
    inner: R,
    byte: u8,
    remaining: usize,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            byte: 0,
            remaining: 0,
        }
    }
}

impl<R: Read> BitSource for BitReader<R> {
    fn next_bit(&mut self) -> io::Result<Option<bool>> {
        if self.remaining == 0 {
            match self.inner.read_u8() {
                Ok(byte) => {
                    self.byte = byte;
                    self.remaining = BYTE_SIZE;
                }
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(err) => return Err(err),
            }
        }

        let bit = self.byte.view_bits::<Msb0>()[BYTE_SIZE - self.remaining];
        self.remaining -= 1;
        Ok(Some(bit))
    }
}

/// An in-memory bit sequence with an exact length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bits: Bits,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bit_count: usize) -> Self {
        Self {
            bits: Bits::with_capacity(bit_count),
        }
    }

    /// Takes the first `bit_count` bits of `bytes`. A count past the end of the
    /// bytes is clamped to what is actually there.
    pub fn from_bytes(bytes: &[u8], bit_count: usize) -> Self {
        let mut bits = Bits::from_slice(bytes);
        bits.truncate(bit_count);
        Self { bits }
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn push_bits(&mut self, bits: &BitStr) {
        self.bits.extend_from_bitslice(bits);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<bool> {
        self.bits.get(idx).map(|bit| *bit)
    }

    /// Number of meaningful bits in the final byte, 0 when the length is a whole
    /// number of bytes.
    pub fn tail_bits(&self) -> u8 {
        (self.bits.len() % BYTE_SIZE) as u8
    }

    /// Packs the bits into bytes, zero-padding the final partial byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; (self.bits.len() + BYTE_SIZE - 1) / BYTE_SIZE];
        bytes.view_bits_mut::<Msb0>()[..self.bits.len()].copy_from_bitslice(&self.bits);
        bytes
    }

    /// Writes the number of meaningful bits in the final byte as a `u8`, then the
    /// packed bytes.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(self.tail_bits())?;
        writer.write_all(&self.to_bytes())
    }

    /// Reads a buffer written by [`BitBuffer::write_to`], consuming `reader` to its end.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let tail = reader.read_u8()? as usize;
        if tail >= BYTE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("final byte cannot hold {} bits", tail),
            ));
        }

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let mut bit_count = bytes.len() * BYTE_SIZE;
        if tail > 0 {
            if bytes.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "final byte is missing",
                ));
            }
            bit_count -= BYTE_SIZE - tail;
        }

        Ok(Self::from_bytes(&bytes, bit_count))
    }

    pub fn cursor(&self) -> BitCursor<'_> {
        BitCursor {
            buffer: self,
            position: 0,
        }
    }
}

pub struct BitCursor<'a> {
    buffer: &'a BitBuffer,
    position: usize,
}

impl BitCursor<'_> {
    /// Number of bits consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl BitSource for BitCursor<'_> {
    fn next_bit(&mut self) -> io::Result<Option<bool>> {
        let bit = self.buffer.get(self.position);
        if bit.is_some() {
            self.position += 1;
        }
        Ok(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(bits: &[bool]) -> Vec<u8> {
        let mut writer = BitWriter::new(Vec::new());
        for bit in bits {
            writer.write_bit(*bit).unwrap();
        }
        writer.finish().unwrap()
    }

    fn read_all<S: BitSource>(source: &mut S) -> Vec<bool> {
        let mut bits = Vec::new();
        while let Some(bit) = source.next_bit().unwrap() {
            bits.push(bit);
        }
        bits
    }

    #[test]
    fn test_bit_writer_msb_first() {
        assert_eq!(
            pack(&[true, false, false, true, true, false, false, true]),
            vec![0b1001_1001]
        );
        assert_eq!(pack(&[true, false, false, true, true]), vec![0b1001_1000]);
        assert_eq!(
            pack(&[true, false, true, true, true, false, false, true, true]),
            vec![0b1011_1001, 0b1000_0000]
        );
        assert_eq!(pack(&[]), Vec::<u8>::new());
    }

    #[test]
    fn test_bit_write_read() {
        let cases: [&[bool]; 4] = [
            &[true, false, false, true, true, false, false, true],
            &[true, false, false, true, true],
            &[true, false, true, true, true, false, false, true, true],
            &[],
        ];

        for bits in cases {
            let packed = pack(bits);
            let mut reader = BitReader::new(packed.as_slice());
            let read = read_all(&mut reader);

            assert_eq!(&read[..bits.len()], bits);
            assert_eq!(read.len(), packed.len() * BYTE_SIZE);
            assert!(read[bits.len()..].iter().all(|bit| !bit), "padding is not zero");
        }
    }

    #[test]
    fn test_bit_writer_large_stream() {
        let code = bits![u8, Msb0; 1, 0, 1];
        let mut writer = BitWriter::new(Vec::new());
        for _ in 0..20_000 {
            writer.write_bits(code).unwrap();
        }
        assert_eq!(writer.bits_written(), 60_000);

        let packed = writer.finish().unwrap();
        assert_eq!(packed.len(), 7_500);

        let mut reader = BitReader::new(packed.as_slice());
        for i in 0..60_000 {
            assert_eq!(reader.next_bit().unwrap(), Some(code[i % 3]), "bit {}", i);
        }
        assert_eq!(reader.next_bit().unwrap(), None);
    }

    #[test]
    fn test_bit_reader_reads_text() {
        let data = b"abcdefghijklmnopqrstuvwxyz";
        let mut reader = BitReader::new(&data[..]);
        let bits = read_all(&mut reader);

        assert_eq!(bits.len(), data.len() * BYTE_SIZE);
        for (idx, bit) in bits.iter().enumerate() {
            let expected = data[idx / BYTE_SIZE] & (0x80 >> (idx % BYTE_SIZE)) != 0;
            assert_eq!(*bit, expected, "bit {}", idx);
        }
    }

    #[test]
    fn test_bit_reader_empty() {
        let mut reader = BitReader::new(io::empty());
        assert_eq!(reader.next_bit().unwrap(), None);
    }

    #[test]
    fn test_bit_buffer() {
        let bits = [
            false, true, true, false, false, true, true, true, true, false, true, true, false,
            false, true, false, false, false, true, false, true,
        ];

        let mut buffer = BitBuffer::new();
        for bit in bits {
            buffer.push(bit);
        }

        assert_eq!(buffer.len(), bits.len());
        assert_eq!(buffer.tail_bits(), 5);
        for (idx, bit) in bits.iter().enumerate() {
            assert_eq!(buffer.get(idx), Some(*bit));
        }
        assert_eq!(buffer.get(bits.len()), None);

        let bytes = buffer.to_bytes();
        assert_eq!(bytes, vec![0b0110_0111, 0b1011_0010, 0b0010_1000]);

        let unpacked = BitBuffer::from_bytes(&bytes, bits.len());
        assert_eq!(unpacked, buffer);
        assert_eq!(read_all(&mut unpacked.cursor()), bits.to_vec());
    }

    #[test]
    fn test_bit_buffer_whole_bytes() {
        let mut buffer = BitBuffer::new();
        buffer.push_bits(bits![u8, Msb0; 0, 1, 0, 0, 1, 1, 0, 0]);

        assert_eq!(buffer.tail_bits(), 0);
        assert_eq!(buffer.to_bytes(), vec![0b0100_1100]);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_bit_writer_keeps_allocation() {
        let mut writer = BitWriter::new(Vec::new());
        let capacity = writer.pending.capacity();

        for i in 0..3 * FLUSH_THRESHOLD + 5 {
            writer.write_bit(i % 3 == 0).unwrap();
        }
        assert_eq!(writer.pending.capacity(), capacity);
        assert_eq!(writer.pending.len(), 5);

        let packed = writer.finish().unwrap();
        let mut reader = BitReader::new(packed.as_slice());
        for i in 0..3 * FLUSH_THRESHOLD + 5 {
            assert_eq!(reader.next_bit().unwrap(), Some(i % 3 == 0), "bit {}", i);
        }
    }

    fn write_read(buffer: &BitBuffer) -> (Vec<u8>, BitBuffer) {
        let mut bytes = Vec::new();
        buffer.write_to(&mut bytes).unwrap();
        let read = BitBuffer::read_from(&mut bytes.as_slice()).unwrap();
        (bytes, read)
    }

    #[test]
    fn test_bit_buffer_write_read() {
        // whole bytes
        let mut buffer = BitBuffer::new();
        buffer.push_bits(bits![u8, Msb0; 1, 1, 0, 0, 1, 0, 1, 0, 0, 0, 0, 1, 1, 1, 1, 0]);
        let (bytes, read) = write_read(&buffer);
        assert_eq!(bytes, vec![0, 0b1100_1010, 0b0001_1110]);
        assert_eq!(read, buffer);

        // partial final byte
        let mut buffer = BitBuffer::new();
        buffer.push_bits(bits![u8, Msb0; 1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1]);
        let (bytes, read) = write_read(&buffer);
        assert_eq!(bytes, vec![3, 0b1011_0010, 0b1110_0000]);
        assert_eq!(read, buffer);
        assert_eq!(read.len(), 11);

        // nothing at all
        let (bytes, read) = write_read(&BitBuffer::new());
        assert_eq!(bytes, vec![0]);
        assert!(read.is_empty());
    }

    #[test]
    fn test_bit_buffer_read_invalid() {
        let err = BitBuffer::read_from(&mut &[9u8, 0xff][..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err = BitBuffer::read_from(&mut &[4u8][..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err = BitBuffer::read_from(&mut io::empty()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_bit_buffer_clamps_count() {
        let buffer = BitBuffer::from_bytes(&[0xff], 100);
        assert_eq!(buffer.len(), 8);

        let mut cursor = buffer.cursor();
        assert_eq!(read_all(&mut cursor).len(), 8);
        assert_eq!(cursor.position(), 8);
    }
}
