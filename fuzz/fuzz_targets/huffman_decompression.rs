#![no_main]

use std::io::{self, Write};

use libfuzzer_sys::fuzz_target;

/// Refuses to grow past `limit` bytes. A forged byte count can ask a
/// single-leaf tree for billions of bytes.
struct Capped {
    written: usize,
    limit: usize,
}

impl Write for Capped {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written + buf.len() > self.limit {
            return Err(io::Error::new(io::ErrorKind::Other, "output limit reached"));
        }
        self.written += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let mut output = Capped {
        written: 0,
        limit: 1 << 20,
    };
    let _ = huffcomp::decode(&mut &data[..], &mut output);
});
