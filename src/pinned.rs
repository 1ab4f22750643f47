use std::io;
use std::slice;

use crate::error::HarnessError;

/// Alignment for host staging buffers; one page, so the whole
/// allocation can be locked and transferred without straddling.
const PAGE_ALIGNMENT: usize = 4096;

/// Page-aligned, memory-locked host buffer used to stage transfers.
/// Locking keeps the pages resident so a transfer engine can read them
/// without faulting; if the lock itself fails (rlimit) the buffer is
/// still usable, just not pinned, and we record that.
pub struct PinnedBuffer {
    pointer: *mut u8,
    byte_count: usize,
    locked: bool,
}

// The buffer exclusively owns its allocation.
unsafe impl Send for PinnedBuffer {}

impl PinnedBuffer {
    /// Allocate a zero-filled pinned buffer. `what` and `slot` name the
    /// buffer in the error path.
    pub fn new(byte_count: usize, what: &'static str, slot: usize) -> Result<Self, HarnessError> {
        if byte_count == 0 {
            return Err(HarnessError::Allocation {
                what,
                slot,
                detail: "zero-length buffer requested".to_string(),
            });
        }
        let mut pointer: *mut libc::c_void = std::ptr::null_mut();
        // SAFETY: pointer is a valid out-parameter; alignment is a
        // power of two and a multiple of pointer size.
        let rc = unsafe { libc::posix_memalign(&mut pointer, PAGE_ALIGNMENT, byte_count) };
        if rc != 0 || pointer.is_null() {
            return Err(HarnessError::Allocation {
                what,
                slot,
                detail: io::Error::from_raw_os_error(rc).to_string(),
            });
        }
        // SAFETY: freshly allocated region of byte_count bytes.
        unsafe { std::ptr::write_bytes(pointer as *mut u8, 0, byte_count) };
        // SAFETY: locks the region just allocated.
        let locked = unsafe { libc::mlock(pointer, byte_count) } == 0;
        Ok(Self {
            pointer: pointer as *mut u8,
            byte_count,
            locked,
        })
    }

    pub fn len(&self) -> usize {
        self.byte_count
    }

    pub fn is_empty(&self) -> bool {
        self.byte_count == 0
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the allocation is live and byte_count long.
        unsafe { slice::from_raw_parts(self.pointer, self.byte_count) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: exclusive access through &mut self.
        unsafe { slice::from_raw_parts_mut(self.pointer, self.byte_count) }
    }

    /// Copy `source` into the buffer; lengths must already agree.
    pub fn fill_from(&mut self, source: &[u8]) {
        debug_assert_eq!(source.len(), self.byte_count);
        self.as_mut_slice().copy_from_slice(source);
    }
}

impl Drop for PinnedBuffer {
    fn drop(&mut self) {
        // SAFETY: pointer came from posix_memalign and is unlocked
        // before free; errors at teardown are not actionable.
        unsafe {
            if self.locked {
                libc::munlock(self.pointer as *const libc::c_void, self.byte_count);
            }
            libc::free(self.pointer as *mut libc::c_void);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_page_aligned_and_zeroed() {
        let buffer = PinnedBuffer::new(8192, "test buffer", 0).unwrap();
        assert_eq!(buffer.pointer as usize % PAGE_ALIGNMENT, 0);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
        assert_eq!(buffer.len(), 8192);
    }

    #[test]
    fn fill_and_read_back() {
        let mut buffer = PinnedBuffer::new(16, "test buffer", 0).unwrap();
        let pattern: Vec<u8> = (0..16).collect();
        buffer.fill_from(&pattern);
        assert_eq!(buffer.as_slice(), pattern.as_slice());
    }

    #[test]
    fn zero_length_request_is_an_error() {
        let result = PinnedBuffer::new(0, "test buffer", 1);
        assert!(matches!(result, Err(HarnessError::Allocation { slot: 1, .. })));
    }
}
