//! Caller-owned packet buffer with front insertion
//!
//! Headers are written innermost first: each codec opens zeroed space at
//! offset 0 with [`Buffer::shift`] and fills it in place. The backing storage
//! belongs to the caller and is never reallocated.
//!
//! ```text
//! before shift(n):  |<-- payload (size) -->|<------- free ------->|
//! after shift(n):   |<- n zeroes ->|<-- payload (size) -->|<- free ->|
//!                   0                                       reserved
//! ```

use netstack_core::{Error, Result};
use std::ops::{Deref, DerefMut};

/// Fixed-capacity byte region with a used-length marker
#[derive(Debug)]
pub struct Buffer<'a> {
    data: &'a mut [u8],
    size: usize,
}

impl<'a> Buffer<'a> {
    /// Create an empty buffer over caller storage
    pub fn new(data: &'a mut [u8]) -> Self {
        Buffer { data, size: 0 }
    }

    /// Create a buffer whose first `size` bytes are already the payload
    pub fn with_payload(data: &'a mut [u8], size: usize) -> Result<Self> {
        if size > data.len() {
            return Err(Error::capacity(size, data.len()));
        }
        Ok(Buffer { data, size })
    }

    /// Forget the current content
    pub fn clear(&mut self) {
        self.size = 0;
    }

    /// Occupied length in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total capacity in bytes
    pub fn reserved(&self) -> usize {
        self.data.len()
    }

    /// Bytes still free after the current content
    pub fn available(&self) -> usize {
        self.data.len() - self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Prepend `n` zeroed bytes, sliding the current content forward
    ///
    /// Fails with [`Error::CapacityExceeded`] when `size + n` would exceed
    /// the reserved capacity. The buffer is not modified in that case.
    pub fn shift(&mut self, n: usize) -> Result<()> {
        let end = match self.size.checked_add(n) {
            Some(end) if end <= self.data.len() => end,
            _ => return Err(Error::capacity(n, self.available())),
        };

        self.data.copy_within(0..self.size, n);
        self.data[..n].fill(0);
        self.size = end;

        Ok(())
    }

    /// Copy `bytes` after the current content
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.available() {
            return Err(Error::capacity(bytes.len(), self.available()));
        }

        let end = self.size + bytes.len();
        self.data[self.size..end].copy_from_slice(bytes);
        self.size = end;

        Ok(())
    }

    /// The occupied bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// The occupied bytes, mutably
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.size]
    }
}

impl Deref for Buffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl DerefMut for Buffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}
