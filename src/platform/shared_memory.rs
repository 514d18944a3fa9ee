//! Named file-mapping access for the shared-memory sensor feed.

use crate::core::telemetry::feed::{FeedError, FeedResult};
use crate::core::telemetry::shared_memory::{RegionOpener, SharedRegion};

/// Opens a read-only view of a named mapping each time it is asked.
#[derive(Debug, Clone)]
pub struct NamedMappingOpener {
    name: String,
}

impl NamedMappingOpener {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

impl RegionOpener for NamedMappingOpener {
    #[cfg(windows)]
    fn open(&mut self) -> FeedResult<Box<dyn SharedRegion>> {
        Ok(Box::new(windows_impl::MappedView::open(&self.name)?))
    }

    #[cfg(not(windows))]
    fn open(&mut self) -> FeedResult<Box<dyn SharedRegion>> {
        Err(FeedError::unavailable(format!(
            "shared memory '{}' is only available on Windows",
            self.name
        )))
    }
}

#[cfg(windows)]
mod windows_impl {
    use std::ffi::c_void;
    use std::io;

    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE};
    use windows_sys::Win32::System::Memory::{
        MapViewOfFile, OpenFileMappingW, UnmapViewOfFile, VirtualQuery, FILE_MAP_READ,
        MEMORY_BASIC_INFORMATION, MEMORY_MAPPED_VIEW_ADDRESS,
    };

    use super::{FeedError, FeedResult, SharedRegion};
    use crate::core::telemetry::shared_memory::region::clamp_range;

    /// A mapped view plus the mapping handle it came from. Both are
    /// released on drop.
    pub struct MappedView {
        handle: HANDLE,
        view: MEMORY_MAPPED_VIEW_ADDRESS,
        len: usize,
    }

    impl MappedView {
        pub fn open(name: &str) -> FeedResult<Self> {
            let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();

            // SAFETY: `wide` is NUL-terminated and outlives the call.
            let handle = unsafe { OpenFileMappingW(FILE_MAP_READ, 0, wide.as_ptr()) };
            if handle.is_null() {
                return Err(FeedError::unavailable(format!(
                    "OpenFileMappingW({}) failed: {}",
                    name,
                    io::Error::last_os_error()
                )));
            }

            // SAFETY: `handle` is a valid mapping handle opened above.
            let view = unsafe { MapViewOfFile(handle, FILE_MAP_READ, 0, 0, 0) };
            if view.Value.is_null() {
                let err = io::Error::last_os_error();
                // SAFETY: handle is owned here and not used afterwards.
                unsafe { CloseHandle(handle) };
                return Err(FeedError::unavailable(format!("MapViewOfFile failed: {}", err)));
            }

            let mut info: MEMORY_BASIC_INFORMATION = unsafe { std::mem::zeroed() };
            // SAFETY: `view` is a live mapping and `info` is a valid out buffer.
            let written = unsafe {
                VirtualQuery(
                    view.Value as *const c_void,
                    &mut info,
                    std::mem::size_of::<MEMORY_BASIC_INFORMATION>(),
                )
            };
            if written == 0 {
                let err = io::Error::last_os_error();
                // SAFETY: both were acquired above and are released exactly once.
                unsafe {
                    UnmapViewOfFile(view);
                    CloseHandle(handle);
                }
                return Err(FeedError::unavailable(format!("VirtualQuery failed: {}", err)));
            }

            Ok(Self {
                handle,
                view,
                len: info.RegionSize,
            })
        }
    }

    impl SharedRegion for MappedView {
        fn len(&self) -> usize {
            self.len
        }

        fn read_bytes(&self, offset: usize, len: usize) -> Vec<u8> {
            let Some(range) = clamp_range(offset, len, self.len) else {
                return Vec::new();
            };
            let mut out = vec![0u8; range.len()];
            // SAFETY: `range` lies within the committed view of `self.len` bytes.
            unsafe {
                std::ptr::copy_nonoverlapping(
                    (self.view.Value as *const u8).add(range.start),
                    out.as_mut_ptr(),
                    out.len(),
                );
            }
            out
        }
    }

    impl Drop for MappedView {
        fn drop(&mut self) {
            // SAFETY: view and handle are owned by self and released once.
            unsafe {
                UnmapViewOfFile(self.view);
                CloseHandle(self.handle);
            }
        }
    }
}
