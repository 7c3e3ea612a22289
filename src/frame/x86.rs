//! 32-bit x86 transition frames.
//!
//! Shares its bit assignments with x64; the registers that do not exist on x86
//! simply have no flag here.

use super::{HeaderOrder, RegisterClass, SavedRegister, TransitionFrameLayout};

pub const PTFF_SAVE_EBX: u64 = 0x0000_0001;
pub const PTFF_SAVE_ESI: u64 = 0x0000_0002;
pub const PTFF_SAVE_EDI: u64 = 0x0000_0004;
pub const PTFF_SAVE_EBP: u64 = 0x0000_0008;
pub const PTFF_SAVE_ESP: u64 = 0x0000_8000;
pub const PTFF_SAVE_EAX: u64 = 0x0000_0100;
pub const PTFF_SAVE_ECX: u64 = 0x0000_0200;
pub const PTFF_SAVE_EDX: u64 = 0x0000_0400;
/// Set by the hijack handler when the hijacked method returns an object reference.
pub const PTFF_RAX_IS_GCREF: u64 = 0x0001_0000;
/// Set by the hijack handler when the hijacked method returns an interior pointer.
pub const PTFF_RAX_IS_BYREF: u64 = 0x0002_0000;
/// Deliver a pending thread abort when the transition returns.
pub const PTFF_THREAD_ABORT: u64 = 0x0010_0000;
/// The frame belongs to a hijacked call.
pub const PTFF_THREAD_HIJACK: u64 = 0x0020_0000;

/// Registers a stub may save: bounds `PInvokeTransitionFrame_MAX_SIZE`.
pub const SAVE_REGS_COUNT: usize = 5;
pub const OFFSETOF_THREAD_TRANSITION_FRAME: usize = 0x30;

/// Push order, which is also the order the stack walker reads them back in.
pub static REGISTERS: [SavedRegister; 8] = [
    SavedRegister::new("EBX", PTFF_SAVE_EBX, RegisterClass::Preserved),
    SavedRegister::new("ESI", PTFF_SAVE_ESI, RegisterClass::Preserved),
    SavedRegister::new("EDI", PTFF_SAVE_EDI, RegisterClass::Preserved),
    SavedRegister::new("EBP", PTFF_SAVE_EBP, RegisterClass::FramePointer),
    SavedRegister::new("ESP", PTFF_SAVE_ESP, RegisterClass::StackPointer),
    SavedRegister::new("EAX", PTFF_SAVE_EAX, RegisterClass::Scratch),
    SavedRegister::new("ECX", PTFF_SAVE_ECX, RegisterClass::Scratch),
    SavedRegister::new("EDX", PTFF_SAVE_EDX, RegisterClass::Scratch),
];

static EXTRA_FLAGS: [(&str, u64); 2] = [
    ("RAX_IS_GCREF", PTFF_RAX_IS_GCREF),
    ("RAX_IS_BYREF", PTFF_RAX_IS_BYREF),
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct X86;

impl TransitionFrameLayout for X86 {
    fn name(&self) -> &'static str {
        "x86"
    }

    fn pointer_size(&self) -> usize {
        4
    }

    fn flags_size(&self) -> usize {
        4
    }

    fn header_order(&self) -> HeaderOrder {
        HeaderOrder::ReturnAddressFirst
    }

    fn saved_registers(&self) -> &'static [SavedRegister] {
        &REGISTERS
    }

    fn thread_abort_flag(&self) -> u64 {
        PTFF_THREAD_ABORT
    }

    fn thread_hijack_flag(&self) -> u64 {
        PTFF_THREAD_HIJACK
    }

    fn extra_flags(&self) -> &'static [(&'static str, u64)] {
        &EXTRA_FLAGS
    }

    fn max_saved_registers(&self) -> usize {
        SAVE_REGS_COUNT
    }

    fn transition_frame_offset(&self) -> usize {
        OFFSETOF_THREAD_TRANSITION_FRAME
    }
}
