use super::{
    cache::InterfaceDispatchCacheHeader, cell::InterfaceDispatchCell, DispatchCellInfo,
};
use crate::error::DispatchError;
use parking_lot::Mutex;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// Dispatch cache counters.
///
/// All counters use `Ordering::Relaxed`; they are independent and never used to
/// synchronise other memory.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    allocations: AtomicU64,
    installs: AtomicU64,
    lost_races: AtomicU64,
}

impl DispatchMetrics {
    pub fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_install(&self) {
        self.installs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lost_race(&self) {
        self.lost_races.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            installs: self.installs.load(Ordering::Relaxed),
            lost_races: self.lost_races.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub allocations: u64,
    pub installs: u64,
    pub lost_races: u64,
}

impl fmt::Display for DispatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocations: {:>8}, installs: {:>8}, lost races: {:>8}",
            self.allocations, self.installs, self.lost_races
        )
    }
}

/// Result of trying to publish a cache into a cell.
#[derive(Debug, Clone, Copy)]
pub enum InstallOutcome<'a> {
    Installed(&'a InterfaceDispatchCacheHeader),
    /// Another writer changed the cell first. Holds the word that was observed.
    Lost { observed: usize },
}

/// Owns every cache header it hands out until it is dropped.
///
/// Published header addresses stay valid for the arena's lifetime, so a stub
/// holding a stale snapshot never reads freed memory. Headers that lose an
/// install race are kept as well.
#[derive(Debug, Default)]
pub struct CacheHeaderArena {
    headers: Mutex<Vec<Box<InterfaceDispatchCacheHeader>>>,
    metrics: DispatchMetrics,
}

impl CacheHeaderArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(
        &self,
        info: &DispatchCellInfo,
    ) -> Result<&InterfaceDispatchCacheHeader, DispatchError> {
        let header = Box::new(InterfaceDispatchCacheHeader::try_from_cell_info(info)?);
        let ptr: *const InterfaceDispatchCacheHeader = &*header;
        self.headers.lock().push(header);
        self.metrics.record_allocation();
        // SAFETY: boxes are never removed or moved out of `headers` before the
        // arena is dropped, and the returned borrow cannot outlive the arena.
        Ok(unsafe { &*ptr })
    }

    /// Build a header for `info` and publish it into `cell` if the cell still holds
    /// `expected`, the snapshot the caller based its decision on.
    pub fn install(
        &self,
        cell: &InterfaceDispatchCell,
        expected: usize,
        info: &DispatchCellInfo,
    ) -> Result<InstallOutcome<'_>, DispatchError> {
        let header = self.allocate(info)?;
        match cell.compare_exchange_cache(expected, header) {
            Ok(_) => {
                self.metrics.record_install();
                tracing::trace!("published dispatch cache {:p} for {:?}", header, info.kind);
                Ok(InstallOutcome::Installed(header))
            }
            Err(observed) => {
                self.metrics.record_lost_race();
                tracing::debug!(
                    "lost dispatch cache install race on cell {:p}: expected {:#x}, observed {:#x}",
                    cell,
                    expected,
                    observed
                );
                Ok(InstallOutcome::Lost { observed })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.headers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.lock().is_empty()
    }

    pub fn stats(&self) -> DispatchStats {
        self.metrics.stats()
    }
}
