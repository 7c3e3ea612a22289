//! x64 transition frames.
//!
//! `PTFF_SAVE_RSP` sits out of bit order but is still pushed after the preserved
//! registers and before the scratch registers.

use super::{HeaderOrder, RegisterClass, SavedRegister, TransitionFrameLayout};

pub const PTFF_SAVE_RBX: u64 = 0x0000_0000_0000_0001;
pub const PTFF_SAVE_RSI: u64 = 0x0000_0000_0000_0002;
pub const PTFF_SAVE_RDI: u64 = 0x0000_0000_0000_0004;
pub const PTFF_SAVE_RBP: u64 = 0x0000_0000_0000_0008;
pub const PTFF_SAVE_R12: u64 = 0x0000_0000_0000_0010;
pub const PTFF_SAVE_R13: u64 = 0x0000_0000_0000_0020;
pub const PTFF_SAVE_R14: u64 = 0x0000_0000_0000_0040;
pub const PTFF_SAVE_R15: u64 = 0x0000_0000_0000_0080;
/// Seeds the stack walk for runtime helpers called from methods without a frame pointer.
pub const PTFF_SAVE_RSP: u64 = 0x0000_0000_0000_8000;
pub const PTFF_SAVE_RAX: u64 = 0x0000_0000_0000_0100;
pub const PTFF_SAVE_RCX: u64 = 0x0000_0000_0000_0200;
pub const PTFF_SAVE_RDX: u64 = 0x0000_0000_0000_0400;
pub const PTFF_SAVE_R8: u64 = 0x0000_0000_0000_0800;
pub const PTFF_SAVE_R9: u64 = 0x0000_0000_0000_1000;
pub const PTFF_SAVE_R10: u64 = 0x0000_0000_0000_2000;
pub const PTFF_SAVE_R11: u64 = 0x0000_0000_0000_4000;
/// Deliver a pending thread abort when the transition returns.
pub const PTFF_THREAD_ABORT: u64 = 0x0000_0000_0010_0000;
/// The frame belongs to a hijacked call.
pub const PTFF_THREAD_HIJACK: u64 = 0x0000_0000_0020_0000;

/// Registers a stub may save: bounds `PInvokeTransitionFrame_MAX_SIZE`.
pub const SAVE_REGS_COUNT: usize = 9;
pub const OFFSETOF_THREAD_TRANSITION_FRAME: usize = 0x48;

/// Push order, which is also the order the stack walker reads them back in.
pub static REGISTERS: [SavedRegister; 16] = [
    SavedRegister::new("RBX", PTFF_SAVE_RBX, RegisterClass::Preserved),
    SavedRegister::new("RSI", PTFF_SAVE_RSI, RegisterClass::Preserved),
    SavedRegister::new("RDI", PTFF_SAVE_RDI, RegisterClass::Preserved),
    SavedRegister::new("RBP", PTFF_SAVE_RBP, RegisterClass::FramePointer),
    SavedRegister::new("R12", PTFF_SAVE_R12, RegisterClass::Preserved),
    SavedRegister::new("R13", PTFF_SAVE_R13, RegisterClass::Preserved),
    SavedRegister::new("R14", PTFF_SAVE_R14, RegisterClass::Preserved),
    SavedRegister::new("R15", PTFF_SAVE_R15, RegisterClass::Preserved),
    SavedRegister::new("RSP", PTFF_SAVE_RSP, RegisterClass::StackPointer),
    SavedRegister::new("RAX", PTFF_SAVE_RAX, RegisterClass::Scratch),
    SavedRegister::new("RCX", PTFF_SAVE_RCX, RegisterClass::Scratch),
    SavedRegister::new("RDX", PTFF_SAVE_RDX, RegisterClass::Scratch),
    SavedRegister::new("R8", PTFF_SAVE_R8, RegisterClass::Scratch),
    SavedRegister::new("R9", PTFF_SAVE_R9, RegisterClass::Scratch),
    SavedRegister::new("R10", PTFF_SAVE_R10, RegisterClass::Scratch),
    SavedRegister::new("R11", PTFF_SAVE_R11, RegisterClass::Scratch),
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Amd64;

impl TransitionFrameLayout for Amd64 {
    fn name(&self) -> &'static str {
        "x64"
    }

    fn pointer_size(&self) -> usize {
        8
    }

    fn flags_size(&self) -> usize {
        8
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

    fn max_saved_registers(&self) -> usize {
        SAVE_REGS_COUNT
    }

    fn transition_frame_offset(&self) -> usize {
        OFFSETOF_THREAD_TRANSITION_FRAME
    }
}
