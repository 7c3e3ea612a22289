use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BinderError {
    #[error("Dispatch cell error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Transition frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Blob stream error: {0}")]
    Blob(#[from] BlobError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("A cache header cannot be built from a vtable offset ({0:#x})")]
    VTableOffsetHasNoCache(u32),
    #[error("Metadata token {0:#x} does not fit in 30 bits")]
    TokenTooWide(u32),
    #[error("Metadata token {0:#x} has none of its upper 20 bits set")]
    TokenTooSmall(u32),
    #[error("Address {0:#x} is not 4-byte aligned and cannot carry a tag")]
    Misaligned(usize),
    #[error("Relative distance {0} does not fit in a signed 32-bit offset")]
    RelativeOutOfRange(i128),
    #[error("Dispatch cell run starting at index {0} has no terminal cell")]
    UnterminatedRun(usize),
    #[error("Cell {0} terminates its run and is not a call site")]
    TerminalCell(usize),
    #[error("Cell index {index} out of bounds (length {length})")]
    CellOutOfBounds { index: usize, length: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("Unknown target architecture: {0}")]
    UnknownArch(String),
    #[error("Unknown register {register} for {arch}")]
    UnknownRegister { arch: &'static str, register: String },
    #[error("Flags {bits:#x} contain bits not defined for {arch}: {unknown:#x}")]
    UnknownFlags {
        arch: &'static str,
        bits: u64,
        unknown: u64,
    },
    #[error("Frame needs {needed} bytes but only {available} are present")]
    Truncated { needed: usize, available: usize },
    #[error("Value {value:#x} does not fit in a {width}-byte slot")]
    ValueTooWide { value: u64, width: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BlobError {
    #[error("Truncated blob header at offset {offset}")]
    TruncatedHeader { offset: usize },
    #[error("Blob {id} at offset {offset} declares {size} bytes but only {available} remain")]
    TruncatedPayload {
        id: u32,
        offset: usize,
        size: u32,
        available: usize,
    },
    #[error("Blob {id} has size {size}, which is not DWORD aligned")]
    Misaligned { id: u32, size: u32 },
    #[error("Duplicate blob id {0}")]
    DuplicateId(u32),
    #[error("Blob {id} payload of {len} bytes is too large")]
    TooLarge { id: u32, len: usize },
}
