use super::{DispatchCellInfo, DispatchCellKind, MethodTable, TypeHandle};
use crate::error::DispatchError;
use std::mem::{offset_of, size_of};

const CH_TYPE_AND_SLOT_INDEX: u32 = 0x0;
const CH_METADATA_TOKEN: u32 = 0x1;
const CH_MASK: u32 = 0x3;
const CH_SHIFT: u32 = 0x2;

/// Largest payload that survives the two-bit shift.
pub const MAX_ENCODED_PAYLOAD: u32 = u32::MAX >> CH_SHIFT;

/// Heap record a dispatch cell points at once the runtime has built a cache for it.
///
/// `interface_type` is non-null exactly when the discriminant is type-and-slot.
#[repr(C)]
#[derive(Debug)]
pub struct InterfaceDispatchCacheHeader {
    interface_type: *const MethodTable,
    slot_index_or_metadata_token_encoded: u32,
}

const _: () = assert!(offset_of!(InterfaceDispatchCacheHeader, interface_type) == 0);
const _: () = assert!(
    offset_of!(InterfaceDispatchCacheHeader, slot_index_or_metadata_token_encoded)
        == size_of::<usize>()
);

// SAFETY: the header is immutable after publication and only refers to type
// descriptors that live for the whole process.
unsafe impl Send for InterfaceDispatchCacheHeader {}
unsafe impl Sync for InterfaceDispatchCacheHeader {}

impl InterfaceDispatchCacheHeader {
    /// Build a header for either an interface/slot pair or a metadata token.
    ///
    /// Exactly one of `interface_type` (with `metadata_token == 0`) or
    /// `metadata_token` (with a null type and `interface_slot == 0`) must be given.
    /// Violations are caught only in debug builds.
    pub fn new(interface_type: TypeHandle, interface_slot: u16, metadata_token: u32) -> Self {
        let mut header = Self {
            interface_type: std::ptr::null(),
            slot_index_or_metadata_token_encoded: 0,
        };
        header.initialize(interface_type, interface_slot, metadata_token);
        header
    }

    pub fn initialize(
        &mut self,
        interface_type: TypeHandle,
        interface_slot: u16,
        metadata_token: u32,
    ) {
        if !interface_type.is_null() {
            debug_assert_eq!(metadata_token, 0);
            self.interface_type = interface_type.as_ptr();
            self.slot_index_or_metadata_token_encoded =
                CH_TYPE_AND_SLOT_INDEX | ((interface_slot as u32) << CH_SHIFT);
        } else {
            debug_assert_eq!(interface_slot, 0);
            // also rejects a header given neither a type nor a token
            debug_assert!(metadata_token >> 12 != 0);
            debug_assert!(metadata_token <= MAX_ENCODED_PAYLOAD);
            self.interface_type = std::ptr::null();
            self.slot_index_or_metadata_token_encoded =
                CH_METADATA_TOKEN | (metadata_token << CH_SHIFT);
        }
    }

    /// Checked construction from a decoded cell. Vtable offsets never get a cache.
    pub fn try_from_cell_info(info: &DispatchCellInfo) -> Result<Self, DispatchError> {
        match info.kind {
            DispatchCellKind::InterfaceAndSlot {
                interface_type,
                slot,
            } => Ok(Self::new(interface_type, slot, 0)),
            DispatchCellKind::MetadataToken(token) => {
                if token >> 12 == 0 {
                    return Err(DispatchError::TokenTooSmall(token));
                }
                if token > MAX_ENCODED_PAYLOAD {
                    return Err(DispatchError::TokenTooWide(token));
                }
                Ok(Self::new(TypeHandle::NULL, 0, token))
            }
            DispatchCellKind::VTableOffset(offset) => {
                Err(DispatchError::VTableOffsetHasNoCache(offset))
            }
        }
    }

    pub fn dispatch_cell_info(&self) -> DispatchCellInfo {
        let encoded = self.slot_index_or_metadata_token_encoded;
        let info = if (encoded & CH_MASK) == CH_TYPE_AND_SLOT_INDEX {
            DispatchCellInfo::interface_and_slot(
                TypeHandle::from_ptr(self.interface_type),
                (encoded >> CH_SHIFT) as u16,
            )
        } else {
            DispatchCellInfo::metadata_token(encoded >> CH_SHIFT)
        };
        info.with_cache(true)
    }

    pub fn interface_type(&self) -> TypeHandle {
        TypeHandle::from_ptr(self.interface_type)
    }

    pub fn encoded(&self) -> u32 {
        self.slot_index_or_metadata_token_encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_and_slot() {
        let ty = TypeHandle::from_addr(0x7f00_1000);
        let header = InterfaceDispatchCacheHeader::new(ty, 0xffff, 0);
        assert_eq!(header.encoded(), 0xffff << 2);
        let info = header.dispatch_cell_info();
        assert_eq!(info, DispatchCellInfo::interface_and_slot(ty, 0xffff).with_cache(true));
    }

    #[test]
    fn test_metadata_token() {
        let header = InterfaceDispatchCacheHeader::new(TypeHandle::NULL, 0, 0x0600_0012);
        assert_eq!(header.encoded() & CH_MASK, CH_METADATA_TOKEN);
        assert!(header.interface_type().is_null());
        let info = header.dispatch_cell_info();
        assert_eq!(info.metadata_token_value(), Some(0x0600_0012));
        assert!(info.has_cache);
    }

    #[test]
    fn test_reinitialize_switches_kind() {
        let mut header = InterfaceDispatchCacheHeader::new(TypeHandle::from_addr(0x8000), 1, 0);
        header.initialize(TypeHandle::NULL, 0, 0x2000);
        assert!(header.interface_type().is_null());
        assert_eq!(header.dispatch_cell_info().metadata_token_value(), Some(0x2000));
    }

    #[test]
    fn test_try_from_cell_info() {
        let info = DispatchCellInfo::metadata_token(0x1234_5678);
        let header = InterfaceDispatchCacheHeader::try_from_cell_info(&info).unwrap();
        assert_eq!(header.dispatch_cell_info(), info.with_cache(true));

        let cases = [
            (
                DispatchCellInfo::vtable_offset(8),
                DispatchError::VTableOffsetHasNoCache(8),
            ),
            (
                DispatchCellInfo::metadata_token(0x4000_0000),
                DispatchError::TokenTooWide(0x4000_0000),
            ),
            (
                DispatchCellInfo::metadata_token(0x5),
                DispatchError::TokenTooSmall(0x5),
            ),
        ];
        for (info, expected) in cases {
            let err = InterfaceDispatchCacheHeader::try_from_cell_info(&info).unwrap_err();
            assert_eq!(err, expected);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_type_and_token_together_is_contract_violation() {
        InterfaceDispatchCacheHeader::new(TypeHandle::from_addr(0x8000), 0, 0x2000);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_slot_without_type_is_contract_violation() {
        InterfaceDispatchCacheHeader::new(TypeHandle::NULL, 4, 0x2000);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_neither_type_nor_token_is_contract_violation() {
        InterfaceDispatchCacheHeader::new(TypeHandle::NULL, 0, 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_token_without_upper_bits_is_contract_violation() {
        InterfaceDispatchCacheHeader::new(TypeHandle::NULL, 0, 0x5);
    }
}
