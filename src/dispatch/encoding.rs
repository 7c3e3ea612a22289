//! Bit-level encodings of a dispatch cell's cache word.
//!
//! The low two bits select the interpretation. A word with both bits clear is a
//! vtable offset when it is below [`MAX_VTABLE_OFFSET_PLUS_ONE`], otherwise a cache
//! header address.
use super::{DispatchCellType, TypeHandle};
use crate::error::DispatchError;

pub const CACHE_POINTER_POINTS_AT_CACHE: usize = 0x0;
/// Type pointer, or a 30-bit metadata token shifted left by two.
pub const CACHE_POINTER_IS_INTERFACE_POINTER_OR_METADATA_TOKEN: usize = 0x1;
pub const CACHE_POINTER_IS_INDIRECTED_INTERFACE_RELATIVE_POINTER: usize = 0x2;
pub const CACHE_POINTER_IS_INTERFACE_RELATIVE_POINTER: usize = 0x3;
pub const CACHE_POINTER_MASK: usize = 0x3;
pub const CACHE_POINTER_MASK_SHIFT: u32 = 0x2;
pub const MAX_VTABLE_OFFSET_PLUS_ONE: usize = 0x1000;

const TERMINAL_FLAGS_SHIFT: u32 = 16;

/// One snapshot of a cache word, classified by its tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CacheWord {
    VTableOffset(u32),
    Cache(usize),
    /// Masked type address, or a metadata token shifted left by two, depending on
    /// what the terminal cell of the run says.
    InterfacePointerOrMetadataToken(usize),
    IndirectedRelative(i32),
    Relative(i32),
}

impl CacheWord {
    pub fn classify(word: usize) -> Self {
        match word & CACHE_POINTER_MASK {
            CACHE_POINTER_POINTS_AT_CACHE if word < MAX_VTABLE_OFFSET_PLUS_ONE => {
                CacheWord::VTableOffset(word as u32)
            }
            CACHE_POINTER_POINTS_AT_CACHE => CacheWord::Cache(word),
            CACHE_POINTER_IS_INTERFACE_POINTER_OR_METADATA_TOKEN => {
                CacheWord::InterfacePointerOrMetadataToken(word)
            }
            CACHE_POINTER_IS_INDIRECTED_INTERFACE_RELATIVE_POINTER => {
                CacheWord::IndirectedRelative(word as i32)
            }
            _ => CacheWord::Relative(word as i32),
        }
    }
}

/// True when `word` is a genuine cache header address rather than a vtable offset
/// or one of the tagged static encodings. Never dereferences.
pub fn is_cache(word: usize) -> bool {
    (word & CACHE_POINTER_MASK) == 0 && word >= MAX_VTABLE_OFFSET_PLUS_ONE
}

/// Address a self-relative word resolves to, anchored at the cache field.
///
/// The whole word is truncated to `i32` before the add and the tag is masked off
/// afterwards.
pub fn relative_target(cache_field_addr: usize, word: usize) -> usize {
    let delta = word as i32 as isize;
    (cache_field_addr.wrapping_add_signed(delta)) & !CACHE_POINTER_MASK
}

/// Split a terminal cell's cache word into `(flags, slot)`.
pub fn decode_terminal(word: usize) -> (u16, u16) {
    (((word >> TERMINAL_FLAGS_SHIFT) & 0xffff) as u16, word as u16)
}

/// The `(flags << 16) | slot` word carried by the last cell of a run.
pub fn encode_terminal(cell_type: DispatchCellType, slot: u16) -> usize {
    debug_assert!(cell_type != DispatchCellType::VTableOffset);
    ((cell_type as usize) << TERMINAL_FLAGS_SHIFT) | slot as usize
}

pub fn encode_interface_pointer(interface_type: TypeHandle) -> Result<usize, DispatchError> {
    let addr = interface_type.addr();
    if addr & CACHE_POINTER_MASK != 0 {
        return Err(DispatchError::Misaligned(addr));
    }
    Ok(addr | CACHE_POINTER_IS_INTERFACE_POINTER_OR_METADATA_TOKEN)
}

/// Tokens are 30-bit and must have one of their upper 20 bits set.
pub fn encode_metadata_token(token: u32) -> Result<usize, DispatchError> {
    if token >> 12 == 0 {
        return Err(DispatchError::TokenTooSmall(token));
    }
    if token > (u32::MAX >> CACHE_POINTER_MASK_SHIFT) {
        return Err(DispatchError::TokenTooWide(token));
    }
    Ok(((token as usize) << CACHE_POINTER_MASK_SHIFT)
        | CACHE_POINTER_IS_INTERFACE_POINTER_OR_METADATA_TOKEN)
}

/// Encode `target` relative to the cache field at `cache_field_addr`.
///
/// With `indirect` set, `target` is the address of a slot holding the type
/// pointer; otherwise it is the type itself.
pub fn encode_relative(
    cache_field_addr: usize,
    target: usize,
    indirect: bool,
) -> Result<usize, DispatchError> {
    if target & CACHE_POINTER_MASK != 0 {
        return Err(DispatchError::Misaligned(target));
    }
    let distance = target as i128 - cache_field_addr as i128;
    let delta =
        i32::try_from(distance).map_err(|_| DispatchError::RelativeOutOfRange(distance))?;
    let tag = if indirect {
        CACHE_POINTER_IS_INDIRECTED_INTERFACE_RELATIVE_POINTER
    } else {
        CACHE_POINTER_IS_INTERFACE_RELATIVE_POINTER
    };
    Ok((delta as u32 as usize) | tag)
}
