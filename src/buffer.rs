use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::{Error, Result};

/// An adapter-owned frame of exact length.
///
/// Inbound frames are copied into a `FrameBuffer` because the transport only
/// lends its receive buffer for the duration of the callback. Outbound frames
/// are allocated here, filled by the stack and handed to the transport by
/// value; dropping the buffer is the sole release path, so a double free is
/// unrepresentable.
pub struct FrameBuffer {
    data: Box<[u8]>,
}

impl FrameBuffer {
    /// Allocates a zeroed frame of exactly `len` bytes.
    pub fn alloc(len: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
        data.resize(len, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
        })
    }

    /// Copies a transient frame into newly owned storage.
    pub fn copy_from(frame: &[u8]) -> Result<Self> {
        let mut buffer = Self::alloc(frame.len())?;
        buffer.data.copy_from_slice(frame);
        Ok(buffer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for FrameBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for FrameBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::FrameBuffer;
    use crate::error::Error;

    #[test]
    fn alloc_is_exactly_sized_and_zeroed() {
        let buffer = FrameBuffer::alloc(42).unwrap();
        assert_eq!(buffer.len(), 42);
        assert!(buffer.as_ref().iter().all(|&b| b == 0));
    }

    #[test]
    fn copy_from_owns_an_identical_frame() {
        let mut original = [0xAAu8, 0xBB, 0xCC, 0xDD];
        let buffer = FrameBuffer::copy_from(&original).unwrap();

        // mutating the source must not affect the copy
        original[0] = 0x00;
        assert_eq!(buffer.as_ref(), &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn empty_frame() {
        let buffer = FrameBuffer::copy_from(&[]).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn allocation_failure_reports_out_of_memory() {
        // no allocator can satisfy this; the failure must surface as a status,
        // not an abort
        assert!(matches!(
            FrameBuffer::alloc(usize::MAX),
            Err(Error::OutOfMemory)
        ));
    }
}
