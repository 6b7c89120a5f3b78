//! Platform hooks the protocol engine needs regardless of transport:
//! memory, time, and a sink for its debug text.

use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_time::{Instant, Timer};

use crate::arena::ScratchArena;
use crate::error::AllocError;

/// Longest single line forwarded to the log.
const MAX_LOG_LINE: usize = 255;

/// Severity tag the engine prefixes its debug text with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    const TAGS: [(&'static str, Level); 4] = [
        ("[ERROR]", Level::Error),
        ("[WARN]", Level::Warn),
        ("[INFO]", Level::Info),
        ("[DEBUG]", Level::Debug),
    ];

    /// Split a leading severity tag off `message`.
    pub fn split(message: &str) -> (Option<Level>, &str) {
        for (tag, level) in Self::TAGS {
            if let Some(rest) = message.strip_prefix(tag) {
                return (Some(level), rest.trim_start());
            }
        }
        (None, message)
    }

    fn log(self, text: &str) {
        match self {
            Level::Error => error!("{}", text),
            Level::Warn => warn!("{}", text),
            Level::Info => info!("{}", text),
            Level::Debug => debug!("{}", text),
        }
    }
}

/// Reduce engine output to a single loggable line.
pub fn clean_line(text: &str) -> &str {
    let line = match text.find(['\r', '\n']) {
        Some(end) => &text[..end],
        None => text,
    };
    let line = line.trim_end();
    if line.len() <= MAX_LOG_LINE {
        return line;
    }
    let mut end = MAX_LOG_LINE;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

pub struct Platform<M: RawMutex> {
    arena: ScratchArena,
    /// Tag received on its own, waiting for the text that follows it.
    pending_level: BlockingMutex<M, Cell<Option<Level>>>,
}

impl<M: RawMutex> Platform<M> {
    pub const fn new() -> Self {
        Self {
            arena: ScratchArena::new(),
            pending_level: BlockingMutex::new(Cell::new(None)),
        }
    }

    pub fn arena(&self) -> &ScratchArena {
        &self.arena
    }

    pub fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        self.arena.allocate(layout).map_err(|e| {
            error!("Memory allocation failed: {}", e);
            e
        })
    }

    /// # Safety
    ///
    /// See [`ScratchArena::deallocate`].
    pub unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        self.arena.deallocate(ptr, layout)
    }

    pub async fn delay(&self, ms: u32) {
        Timer::after_millis(u64::from(ms)).await
    }

    /// Milliseconds since boot, wrapping like the engine expects.
    pub fn millis(&self) -> u32 {
        Instant::now().as_millis() as u32
    }

    /// Forward engine debug text to the log at the severity it was tagged
    /// with. Returns the number of bytes consumed.
    pub fn debug_output(&self, message: &str) -> usize {
        let (tag, rest) = Level::split(message);
        let line = clean_line(rest);
        let pending = self.pending_level.lock(|level| level.take());

        if line.is_empty() {
            // A bare tag applies to the next message.
            if let Some(level) = tag.or(pending) {
                self.pending_level.lock(|slot| slot.set(Some(level)));
            }
            return message.len();
        }

        tag.or(pending).unwrap_or(Level::Debug).log(line);
        message.len()
    }

    #[cfg(test)]
    fn pending_level(&self) -> Option<Level> {
        self.pending_level.lock(|level| level.get())
    }
}

impl<M: RawMutex> Default for Platform<M> {
    fn default() -> Self {
        Self::new()
    }
}
