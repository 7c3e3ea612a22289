use super::{
    cache::InterfaceDispatchCacheHeader,
    encoding::{self, CacheWord},
    DispatchCellInfo, DispatchCellType, MethodTable, TypeHandle,
};
use crate::{atomic::SharedWord, error::DispatchError};
use std::{
    mem::{align_of, offset_of, size_of},
    ptr::{self, NonNull},
};

/// One per interface call site.
///
/// `stub` and `cache` must stay the first two fields, in this order: generated
/// call sites and the dispatch stubs address them by fixed offsets, and the
/// runtime updates `cache` while stubs are reading it.
///
/// Cells are emitted in runs. The last cell of a run has a null stub and its cache
/// word holds `(flags << 16) | slot` for the whole run (flags 0 = interface,
/// 1 = metadata token).
#[repr(C)]
#[derive(Debug)]
pub struct InterfaceDispatchCell {
    stub: usize,
    cache: SharedWord,
}

const _: () = assert!(size_of::<InterfaceDispatchCell>() == 2 * size_of::<usize>());
const _: () = assert!(offset_of!(InterfaceDispatchCell, stub) == 0);
const _: () = assert!(offset_of!(InterfaceDispatchCell, cache) == size_of::<usize>());

impl InterfaceDispatchCell {
    pub const fn new(stub: usize, cache: usize) -> Self {
        Self {
            stub,
            cache: SharedWord::new(cache),
        }
    }

    /// The null-stub cell closing a run.
    pub fn terminal(cell_type: DispatchCellType, slot: u16) -> Self {
        Self::new(0, encoding::encode_terminal(cell_type, slot))
    }

    pub fn stub(&self) -> usize {
        self.stub
    }

    pub fn is_terminal(&self) -> bool {
        self.stub == 0
    }

    /// One acquire read of the cache word.
    pub fn cache_word(&self) -> usize {
        self.cache.snapshot()
    }

    /// Anchor for the self-relative encodings.
    pub fn cache_field_address(&self) -> usize {
        self.cache.address()
    }

    /// Overwrite the cache word with a pre-encoded value (binder-side setup).
    pub fn set_cache_word(&self, word: usize) {
        self.cache.publish(word)
    }

    /// The installed cache header, if the current snapshot is one.
    pub fn cache(&self) -> Option<NonNull<InterfaceDispatchCacheHeader>> {
        let value = self.cache.snapshot();
        if encoding::is_cache(value) {
            NonNull::new(value as *mut InterfaceDispatchCacheHeader)
        } else {
            None
        }
    }

    /// Publish `header` as this cell's cache.
    ///
    /// The header must be fully initialised before this call; the release store
    /// orders its contents before the address becomes visible to stubs.
    pub fn install_cache(&self, header: &InterfaceDispatchCacheHeader) {
        let addr = header as *const InterfaceDispatchCacheHeader as usize;
        debug_assert!(encoding::is_cache(addr));
        tracing::trace!("installing dispatch cache {:#x} into cell {:p}", addr, self);
        self.cache.publish(addr)
    }

    /// Publish `header` only if the cache word still holds `expected`.
    pub fn compare_exchange_cache(
        &self,
        expected: usize,
        header: &InterfaceDispatchCacheHeader,
    ) -> Result<usize, usize> {
        let addr = header as *const InterfaceDispatchCacheHeader as usize;
        debug_assert!(encoding::is_cache(addr));
        self.cache.compare_exchange(expected, addr)
    }

    /// Decode what the call site at `cell` dispatches on.
    ///
    /// The cache word is read exactly once; every branch works off that snapshot.
    /// When the snapshot is a static encoding, the flags and slot come from a
    /// second, unsynchronised read of the run's terminal cell.
    ///
    /// # Safety
    /// - `cell` must point into a run of cells that is closed by a terminal cell
    ///   somewhere at or after it, with provenance over that whole run.
    /// - A cache-pointer snapshot must address a live [`InterfaceDispatchCacheHeader`].
    /// - An indirected relative snapshot must resolve to a readable type-pointer slot.
    pub unsafe fn decode(cell: *const InterfaceDispatchCell) -> DispatchCellInfo {
        let this = unsafe { &*cell };
        let cache_pointer_value = this.cache.snapshot();

        match CacheWord::classify(cache_pointer_value) {
            CacheWord::VTableOffset(offset) => DispatchCellInfo::vtable_offset(offset),
            CacheWord::Cache(addr) => {
                let header = unsafe { &*(addr as *const InterfaceDispatchCacheHeader) };
                header.dispatch_cell_info()
            }
            word => {
                let terminal = unsafe { Self::terminal_word(cell) };
                let (flags, slot) = encoding::decode_terminal(terminal);
                if flags == DispatchCellType::InterfaceAndSlot as u16 {
                    let interface_type =
                        unsafe { Self::interface_type(this, word, cache_pointer_value) };
                    DispatchCellInfo::interface_and_slot(interface_type, slot)
                } else {
                    debug_assert_eq!(flags, DispatchCellType::MetadataToken as u16);
                    DispatchCellInfo::metadata_token(
                        (cache_pointer_value >> encoding::CACHE_POINTER_MASK_SHIFT) as u32,
                    )
                }
            }
        }
    }

    /// Walk forward to the run's terminal cell and read its flags/slot word.
    ///
    /// # Safety
    /// The run must be terminated; nothing here bounds the walk.
    unsafe fn terminal_word(cell: *const InterfaceDispatchCell) -> usize {
        let mut current = cell;
        while unsafe { (*current).stub } != 0 {
            current = unsafe { current.add(1) };
        }
        unsafe { (*current).cache.snapshot() }
    }

    unsafe fn interface_type(&self, word: CacheWord, snapshot: usize) -> TypeHandle {
        match word {
            CacheWord::InterfacePointerOrMetadataToken(value) => {
                TypeHandle::from_addr(value & !encoding::CACHE_POINTER_MASK)
            }
            CacheWord::Relative(_) => {
                TypeHandle::from_addr(encoding::relative_target(self.cache.address(), snapshot))
            }
            CacheWord::IndirectedRelative(_) => {
                let slot = encoding::relative_target(self.cache.address(), snapshot);
                // the tag mask only guarantees 4-byte alignment
                debug_assert!(
                    slot % align_of::<*const MethodTable>() == 0,
                    "indirection slot {slot:#x} is not pointer aligned"
                );
                TypeHandle::from_ptr(unsafe { ptr::read(slot as *const *const MethodTable) })
            }
            CacheWord::VTableOffset(_) | CacheWord::Cache(_) => unreachable!(),
        }
    }
}

/// An owned, contiguous run (or several back-to-back runs) of dispatch cells.
///
/// The terminal search here is bounded by the slice, unlike [`InterfaceDispatchCell::decode`].
#[derive(Debug)]
pub struct DispatchCellRun {
    cells: Box<[InterfaceDispatchCell]>,
}

impl DispatchCellRun {
    /// Fails unless the final cell is terminal, which guarantees every cell a terminal.
    pub fn new(cells: Vec<InterfaceDispatchCell>) -> Result<Self, DispatchError> {
        match cells.last() {
            Some(last) if last.is_terminal() => Ok(Self {
                cells: cells.into_boxed_slice(),
            }),
            _ => {
                let start = Self::find_terminal(&cells, 0)
                    .map(|t| t + 1)
                    .unwrap_or(0);
                Err(DispatchError::UnterminatedRun(start))
            }
        }
    }

    /// Index of the first terminal cell at or after `start`.
    pub fn find_terminal(cells: &[InterfaceDispatchCell], start: usize) -> Option<usize> {
        cells
            .get(start..)?
            .iter()
            .position(InterfaceDispatchCell::is_terminal)
            .map(|offset| start + offset)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[InterfaceDispatchCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Result<&InterfaceDispatchCell, DispatchError> {
        self.cells.get(index).ok_or(DispatchError::CellOutOfBounds {
            index,
            length: self.cells.len(),
        })
    }

    /// Decode the call site at `index`.
    ///
    /// # Safety
    /// Any cache pointer or indirected relative word in the cell must address live
    /// memory, as for [`InterfaceDispatchCell::decode`].
    pub unsafe fn decode(&self, index: usize) -> Result<DispatchCellInfo, DispatchError> {
        if self.cell(index)?.is_terminal() {
            return Err(DispatchError::TerminalCell(index));
        }
        Ok(unsafe { InterfaceDispatchCell::decode(self.cells.as_ptr().add(index)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::encoding::{encode_interface_pointer, encode_metadata_token};

    fn run(cells: Vec<InterfaceDispatchCell>) -> DispatchCellRun {
        DispatchCellRun::new(cells).unwrap()
    }

    #[test]
    fn test_vtable_offset_below_limit() {
        for offset in [0usize, 8, 0x100, 0xff8, 0xffc] {
            let r = run(vec![
                InterfaceDispatchCell::new(0x1111, offset),
                InterfaceDispatchCell::terminal(DispatchCellType::InterfaceAndSlot, 0),
            ]);
            let info = unsafe { r.decode(0) }.unwrap();
            assert_eq!(info, DispatchCellInfo::vtable_offset(offset as u32));
            assert!(info.has_cache);
            assert!(r.cell(0).unwrap().cache().is_none());
        }
    }

    #[test]
    fn test_cache_pointer_path() {
        let header = Box::new(InterfaceDispatchCacheHeader::new(
            TypeHandle::from_addr(0x9000),
            12,
            0,
        ));
        let r = run(vec![
            InterfaceDispatchCell::new(0x1111, 0x5),
            InterfaceDispatchCell::terminal(DispatchCellType::InterfaceAndSlot, 1),
        ]);
        r.cell(0).unwrap().install_cache(&header);
        let info = unsafe { r.decode(0) }.unwrap();
        assert_eq!(info.interface_slot(), Some(12));
        assert!(info.has_cache);
        assert_eq!(
            r.cell(0).unwrap().cache().map(|p| p.as_ptr() as *const _),
            Some(&*header as *const InterfaceDispatchCacheHeader)
        );
    }

    #[test]
    fn test_direct_type_pointer() {
        let ty = TypeHandle::from_addr(0x00ab_cd00);
        let r = run(vec![
            InterfaceDispatchCell::new(0x1111, encode_interface_pointer(ty).unwrap()),
            InterfaceDispatchCell::terminal(DispatchCellType::InterfaceAndSlot, 0x42),
        ]);
        let info = unsafe { r.decode(0) }.unwrap();
        assert_eq!(info, DispatchCellInfo::interface_and_slot(ty, 0x42));
        assert!(!info.has_cache);
    }

    #[test]
    fn test_metadata_token_via_terminal_flags() {
        let r = run(vec![
            InterfaceDispatchCell::new(0x1111, encode_metadata_token(0x0a00_0123).unwrap()),
            InterfaceDispatchCell::terminal(DispatchCellType::MetadataToken, 0),
        ]);
        let info = unsafe { r.decode(0) }.unwrap();
        assert_eq!(info.metadata_token_value(), Some(0x0a00_0123));
    }

    #[test]
    fn test_terminal_cell_is_not_decoded() {
        let r = run(vec![
            InterfaceDispatchCell::new(0x1111, 0x5),
            InterfaceDispatchCell::terminal(DispatchCellType::InterfaceAndSlot, 0),
        ]);
        assert_eq!(unsafe { r.decode(1) }, Err(DispatchError::TerminalCell(1)));
        assert_eq!(
            unsafe { r.decode(2) },
            Err(DispatchError::CellOutOfBounds { index: 2, length: 2 })
        );
    }

    #[test]
    fn test_unterminated_run_rejected() {
        let err = DispatchCellRun::new(vec![
            InterfaceDispatchCell::new(0x1111, 0x5),
            InterfaceDispatchCell::terminal(DispatchCellType::InterfaceAndSlot, 0),
            InterfaceDispatchCell::new(0x2222, 0x5),
        ])
        .unwrap_err();
        assert_eq!(err, DispatchError::UnterminatedRun(2));
        assert_eq!(
            DispatchCellRun::new(Vec::new()).unwrap_err(),
            DispatchError::UnterminatedRun(0)
        );
    }

    #[test]
    fn test_find_terminal() {
        let cells = vec![
            InterfaceDispatchCell::new(1, 0x5),
            InterfaceDispatchCell::terminal(DispatchCellType::InterfaceAndSlot, 0),
            InterfaceDispatchCell::new(2, 0x5),
            InterfaceDispatchCell::new(3, 0x5),
            InterfaceDispatchCell::terminal(DispatchCellType::InterfaceAndSlot, 1),
        ];
        assert_eq!(DispatchCellRun::find_terminal(&cells, 0), Some(1));
        assert_eq!(DispatchCellRun::find_terminal(&cells, 2), Some(4));
        assert_eq!(DispatchCellRun::find_terminal(&cells, 5), None);
        assert_eq!(DispatchCellRun::find_terminal(&cells, 9), None);
    }

    #[test]
    #[cfg(all(debug_assertions, target_pointer_width = "64"))]
    #[should_panic(expected = "not pointer aligned")]
    fn test_misaligned_indirection_slot() {
        #[repr(C)]
        struct Section {
            cells: [InterfaceDispatchCell; 2],
            words: [u32; 4],
        }
        let section = Box::new(Section {
            cells: [
                InterfaceDispatchCell::new(0x1111, 0),
                InterfaceDispatchCell::terminal(DispatchCellType::InterfaceAndSlot, 0),
            ],
            words: [0; 4],
        });
        // 4-byte aligned but not 8-byte aligned
        let slot = &section.words[1] as *const u32 as usize;
        let cell = &section.cells[0];
        let word = encoding::encode_relative(cell.cache_field_address(), slot, true).unwrap();
        cell.set_cache_word(word);
        unsafe { InterfaceDispatchCell::decode(section.cells.as_ptr()) };
    }
}
