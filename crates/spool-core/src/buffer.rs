//! Growable byte buffer for socket I/O
//!
//! A contiguous byte vector with independent read and write cursors.
//! Consumed bytes are reclaimed by compaction before the buffer grows.

use std::io::{Read, Write};

const DEFAULT_CAPACITY: usize = 1024;

/// Growable byte buffer with read/write cursors.
pub struct Buffer {
    buf: Vec<u8>,
    read_pos: usize,
    write_pos: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Buffer {
    /// Create a buffer with the default initial capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            read_pos: 0,
            write_pos: 0,
        }
    }

    /// Bytes available to read.
    pub fn readable(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// Bytes writable without reallocating or compacting.
    pub fn writable(&self) -> usize {
        self.buf.len() - self.write_pos
    }

    /// Bytes already consumed and reclaimable by compaction.
    pub fn consumed(&self) -> usize {
        self.read_pos
    }

    /// View of the readable region without consuming it.
    pub fn peek(&self) -> &[u8] {
        &self.buf[self.read_pos..self.write_pos]
    }

    /// Make room for at least `len` more bytes, compacting or growing as
    /// needed.
    pub fn ensure_writable(&mut self, len: usize) {
        if self.writable() < len {
            self.make_space(len);
        }
        debug_assert!(self.writable() >= len);
    }

    /// Writable region. Call [`advance`](Self::advance) after filling it.
    pub fn write_slot(&mut self) -> &mut [u8] {
        let write_pos = self.write_pos;
        &mut self.buf[write_pos..]
    }

    /// Mark `len` bytes of the writable region as written.
    pub fn advance(&mut self, len: usize) {
        assert!(len <= self.writable());
        self.write_pos += len;
    }

    /// Consume `len` readable bytes.
    pub fn retrieve(&mut self, len: usize) {
        assert!(len <= self.readable());
        self.read_pos += len;
        if self.read_pos == self.write_pos {
            self.retrieve_all();
        }
    }

    /// Discard everything and reset both cursors.
    pub fn retrieve_all(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }

    /// Consume the whole readable region into an owned string (lossy for
    /// non-UTF-8 input).
    pub fn retrieve_all_to_string(&mut self) -> String {
        let s = String::from_utf8_lossy(self.peek()).into_owned();
        self.retrieve_all();
        s
    }

    /// Append a byte slice.
    pub fn append(&mut self, data: &[u8]) {
        self.ensure_writable(data.len());
        self.buf[self.write_pos..self.write_pos + data.len()].copy_from_slice(data);
        self.write_pos += data.len();
    }

    /// Append another buffer's readable region.
    pub fn append_buffer(&mut self, other: &Buffer) {
        self.append(other.peek());
    }

    /// Fill the buffer from a reader. Returns the number of bytes read;
    /// zero means end of stream.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> std::io::Result<usize> {
        self.ensure_writable(DEFAULT_CAPACITY);
        let write_pos = self.write_pos;
        let n = reader.read(&mut self.buf[write_pos..])?;
        self.write_pos += n;
        Ok(n)
    }

    /// Drain the readable region into a writer. Returns the number of
    /// bytes written.
    pub fn write_to<W: Write>(&mut self, writer: &mut W) -> std::io::Result<usize> {
        let n = writer.write(self.peek())?;
        self.retrieve(n);
        Ok(n)
    }

    fn make_space(&mut self, len: usize) {
        if self.consumed() + self.writable() >= len {
            // Compact: slide the readable region to the front.
            let readable = self.readable();
            self.buf.copy_within(self.read_pos..self.write_pos, 0);
            self.read_pos = 0;
            self.write_pos = readable;
        } else {
            self.buf.resize(self.write_pos + len, 0);
        }
    }
}
