//! Cached interface dispatch.
//!
//! Every interface call site owns an [`InterfaceDispatchCell`]. The stub named by
//! the cell reads its cache word, which is one of several tagged encodings emitted
//! by the binder or installed later by the runtime. Decoding any of them yields a
//! [`DispatchCellInfo`].
use std::fmt::{self, Debug, Formatter};

pub mod arena;
pub mod cache;
pub mod cell;
pub mod encoding;

pub use arena::{CacheHeaderArena, DispatchMetrics, DispatchStats, InstallOutcome};
pub use cache::InterfaceDispatchCacheHeader;
pub use cell::{DispatchCellRun, InterfaceDispatchCell};
pub use encoding::CacheWord;

/// Opaque runtime type descriptor. Only ever handled by address.
#[repr(C)]
pub struct MethodTable {
    _opaque: [u8; 0],
}

/// Address of a [`MethodTable`]. May be null when decoded from a malformed cell.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(*const MethodTable);

// SAFETY: type descriptors are immutable and live for the whole process.
unsafe impl Send for TypeHandle {}
unsafe impl Sync for TypeHandle {}

impl TypeHandle {
    pub const NULL: Self = TypeHandle(std::ptr::null());

    pub const fn from_ptr(ptr: *const MethodTable) -> Self {
        TypeHandle(ptr)
    }

    pub fn from_addr(addr: usize) -> Self {
        TypeHandle(addr as *const MethodTable)
    }

    pub fn as_ptr(self) -> *const MethodTable {
        self.0
    }

    pub fn addr(self) -> usize {
        self.0 as usize
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Debug for TypeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({:p})", self.0)
    }
}

/// Discriminant values shared with the binder and the stubs.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DispatchCellType {
    InterfaceAndSlot = 0x0,
    MetadataToken = 0x1,
    VTableOffset = 0x2,
}

/// What a call site dispatches on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DispatchCellKind {
    InterfaceAndSlot {
        interface_type: TypeHandle,
        slot: u16,
    },
    /// Resolved later by an external resolver. At least one of the upper 20 bits is set.
    MetadataToken(u32),
    /// Monomorphic target expressed as a byte offset into the vtable.
    VTableOffset(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DispatchCellInfo {
    pub kind: DispatchCellKind,
    /// Set when the value came from a live cache (or a resolved vtable offset)
    /// rather than from the static per-site encoding.
    pub has_cache: bool,
}

impl DispatchCellInfo {
    pub fn interface_and_slot(interface_type: TypeHandle, slot: u16) -> Self {
        Self {
            kind: DispatchCellKind::InterfaceAndSlot {
                interface_type,
                slot,
            },
            has_cache: false,
        }
    }

    pub fn metadata_token(token: u32) -> Self {
        Self {
            kind: DispatchCellKind::MetadataToken(token),
            has_cache: false,
        }
    }

    pub fn vtable_offset(offset: u32) -> Self {
        Self {
            kind: DispatchCellKind::VTableOffset(offset),
            has_cache: true,
        }
    }

    pub fn with_cache(mut self, has_cache: bool) -> Self {
        self.has_cache = has_cache;
        self
    }

    pub fn cell_type(&self) -> DispatchCellType {
        match self.kind {
            DispatchCellKind::InterfaceAndSlot { .. } => DispatchCellType::InterfaceAndSlot,
            DispatchCellKind::MetadataToken(_) => DispatchCellType::MetadataToken,
            DispatchCellKind::VTableOffset(_) => DispatchCellType::VTableOffset,
        }
    }

    pub fn interface_type(&self) -> Option<TypeHandle> {
        match self.kind {
            DispatchCellKind::InterfaceAndSlot { interface_type, .. } => Some(interface_type),
            _ => None,
        }
    }

    pub fn interface_slot(&self) -> Option<u16> {
        match self.kind {
            DispatchCellKind::InterfaceAndSlot { slot, .. } => Some(slot),
            _ => None,
        }
    }

    pub fn metadata_token_value(&self) -> Option<u32> {
        match self.kind {
            DispatchCellKind::MetadataToken(token) => Some(token),
            _ => None,
        }
    }

    pub fn vtable_offset_value(&self) -> Option<u32> {
        match self.kind {
            DispatchCellKind::VTableOffset(offset) => Some(offset),
            _ => None,
        }
    }
}
