use core::alloc::{GlobalAlloc, Layout};
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use embedded_alloc::LlffHeap;
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::AllocError;

/// Bounded scratch memory the protocol engine allocates from.
///
/// The arena starts empty and owns no memory until [`ScratchArena::init`]
/// hands it a `'static` region; its size is the arena's bound.
pub struct ScratchArena {
    heap: LlffHeap,
    initialized: AtomicBool,
    capacity: AtomicUsize,
}

impl ScratchArena {
    pub const fn new() -> Self {
        Self {
            heap: LlffHeap::empty(),
            initialized: AtomicBool::new(false),
            capacity: AtomicUsize::new(0),
        }
    }

    /// Give the arena its backing memory. Only the first call takes effect.
    pub fn init(
        &self,
        memory: &'static mut [MaybeUninit<u8>],
    ) -> Result<(), AllocError> {
        critical_section::with(|_| {
            if self.initialized.load(Ordering::Acquire) {
                return Err(AllocError::AlreadyInitialized);
            }
            let size = memory.len();
            // SAFETY: `memory` is borrowed mutably for `'static`, so nothing
            // else can touch it, and the flag above keeps this to one call.
            unsafe { self.heap.init(memory.as_mut_ptr() as usize, size) }
            self.capacity.store(size, Ordering::Relaxed);
            self.initialized.store(true, Ordering::Release);
            Ok(())
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Size of the backing region.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Bytes currently handed out, including allocator padding.
    pub fn used(&self) -> usize {
        self.heap.used()
    }

    /// Bytes still free.
    pub fn available(&self) -> usize {
        self.heap.free()
    }

    pub fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if !self.is_initialized() {
            return Err(AllocError::Uninitialized);
        }
        let layout = padded(layout);
        // SAFETY: `padded` never yields a zero-sized layout.
        let ptr = unsafe { self.heap.alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::OutOfMemory { size: layout.size() })
    }

    /// Return memory obtained from [`Self::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this arena with the same `layout`,
    /// and must not be used afterwards.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.heap.dealloc(ptr.as_ptr(), padded(layout));
    }
}

impl Default for ScratchArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-sized requests still get a distinct address.
fn padded(layout: Layout) -> Layout {
    if layout.size() == 0 {
        // An alignment taken from a valid layout is a valid alignment, and a
        // one byte size cannot overflow it.
        Layout::from_size_align(1, layout.align()).unwrap_or(layout)
    } else {
        layout
    }
}
