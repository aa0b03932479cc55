//! Physical memory mapping for MMIO access
//!
//! This module provides safe wrappers around physical memory mapping
//! using /dev/mem. This is how the flash window and the running ROM are
//! reached from a hosted process.
//!
//! # Safety
//!
//! Accessing physical memory is inherently unsafe and requires root privileges.
//! The mapping functions ensure proper alignment and size constraints.

use crate::error::PhysMapError;

/// Memory device used for physical mappings
#[cfg(any(target_os = "linux", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd"))]
const DEV_MEM: &str = "/dev/mem";

/// A mapped region of physical memory
#[cfg(any(target_os = "linux", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd"))]
pub struct PhysMap {
    /// Pointer to the start of the requested range
    ptr: *mut u8,
    /// Length of the requested range
    len: usize,
    /// Size of the underlying page-aligned mapping
    map_size: usize,
    /// Physical address (for error reporting)
    phys_addr: u64,
}

#[cfg(any(target_os = "linux", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd"))]
impl PhysMap {
    /// Map a region of physical memory for MMIO access
    ///
    /// # Arguments
    ///
    /// * `phys_addr` - Physical address to map
    /// * `len` - Size of the region to map
    /// * `writable` - Map for writing as well as reading
    pub fn new(phys_addr: u64, len: usize, writable: bool) -> Result<Self, PhysMapError> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        // O_SYNC for uncached access
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .custom_flags(libc::O_SYNC)
            .open(DEV_MEM)
            .map_err(|source| PhysMapError::Open {
                path: DEV_MEM,
                source,
            })?;

        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let page_mask = page_size - 1;
        let offset = (phys_addr as usize) & page_mask;
        let aligned_addr = phys_addr & !(page_mask as u64);
        let map_size = (len + offset + page_mask) & !page_mask;

        let prot = if writable {
            libc::PROT_READ | libc::PROT_WRITE
        } else {
            libc::PROT_READ
        };

        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_size,
                prot,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(PhysMapError::Map {
                address: phys_addr,
                size: len,
                source: std::io::Error::last_os_error(),
            });
        }

        log::debug!(
            "Mapped {:#x} bytes at physical {:#x} ({})",
            len,
            phys_addr,
            if writable { "rw" } else { "ro" }
        );

        // Adjust pointer to account for page alignment offset
        let adjusted_ptr = unsafe { (ptr as *mut u8).add(offset) };

        Ok(Self {
            ptr: adjusted_ptr,
            len,
            map_size,
            phys_addr,
        })
    }

    /// Read a 16-bit value from the mapped region
    #[inline]
    pub fn read16(&self, offset: usize) -> u16 {
        assert!(offset + 2 <= self.len, "read past end of mapping");
        debug_assert!(offset & 1 == 0, "unaligned 16-bit read");
        unsafe { core::ptr::read_volatile(self.ptr.add(offset) as *const u16) }
    }

    /// Write a 16-bit value to the mapped region
    #[inline]
    pub fn write16(&self, offset: usize, value: u16) {
        assert!(offset + 2 <= self.len, "write past end of mapping");
        debug_assert!(offset & 1 == 0, "unaligned 16-bit write");
        unsafe {
            core::ptr::write_volatile(self.ptr.add(offset) as *mut u16, value);
        }
    }

    /// Copy the whole mapped range into a buffer
    pub fn copy_to_vec(&self) -> Vec<u8> {
        (0..self.len)
            .map(|i| unsafe { core::ptr::read_volatile(self.ptr.add(i)) })
            .collect()
    }

    /// Get the physical address of this mapping
    pub fn phys_addr(&self) -> u64 {
        self.phys_addr
    }

    /// Get the length of this mapping
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(any(target_os = "linux", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd"))]
impl Drop for PhysMap {
    fn drop(&mut self) {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let offset = (self.phys_addr as usize) & (page_size - 1);
        let original_ptr = unsafe { self.ptr.sub(offset) };

        unsafe {
            libc::munmap(original_ptr as *mut libc::c_void, self.map_size);
        }
    }
}

// The mapping is owned and only accessed through volatile reads and writes
#[cfg(any(target_os = "linux", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd"))]
unsafe impl Send for PhysMap {}

// Stub for platforms without /dev/mem
#[cfg(not(any(target_os = "linux", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd")))]
pub struct PhysMap {
    _private: (),
}

#[cfg(not(any(target_os = "linux", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd")))]
impl PhysMap {
    pub fn new(_phys_addr: u64, _len: usize, _writable: bool) -> Result<Self, PhysMapError> {
        Err(PhysMapError::NotSupported(
            "physical memory mapping needs /dev/mem",
        ))
    }

    pub fn read16(&self, _offset: usize) -> u16 { 0 }
    pub fn write16(&self, _offset: usize, _value: u16) {}
    pub fn copy_to_vec(&self) -> Vec<u8> { Vec::new() }
    pub fn phys_addr(&self) -> u64 { 0 }
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}
