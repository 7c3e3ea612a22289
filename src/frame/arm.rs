//! ARM32 transition frames. Every flag stays in the low 16 bits so stubs can
//! load them with a single instruction.

use super::{HeaderOrder, RegisterClass, SavedRegister, TransitionFrameLayout};

pub const PTFF_SAVE_R4: u64 = 0x0000_0001;
pub const PTFF_SAVE_R5: u64 = 0x0000_0002;
pub const PTFF_SAVE_R6: u64 = 0x0000_0004;
// R7 is the frame pointer and lives in the header field instead.
pub const PTFF_SAVE_R7: u64 = 0x0000_0008;
pub const PTFF_SAVE_R8: u64 = 0x0000_0010;
pub const PTFF_SAVE_R9: u64 = 0x0000_0020;
pub const PTFF_SAVE_R10: u64 = 0x0000_0040;
pub const PTFF_SAVE_SP: u64 = 0x0000_0100;
pub const PTFF_SAVE_R0: u64 = 0x0000_0200;
pub const PTFF_SAVE_R1: u64 = 0x0000_0400;
pub const PTFF_SAVE_R2: u64 = 0x0000_0800;
pub const PTFF_SAVE_R3: u64 = 0x0000_1000;
/// Lets a loop hijack keep both the hijacked return address and the method's LR.
pub const PTFF_SAVE_LR: u64 = 0x0000_2000;
/// Deliver a pending thread abort when the transition returns.
pub const PTFF_THREAD_ABORT: u64 = 0x0000_4000;
/// The frame belongs to a hijacked call.
pub const PTFF_THREAD_HIJACK: u64 = 0x0000_8000;

/// Registers a stub may save: bounds `PInvokeTransitionFrame_MAX_SIZE`.
pub const SAVE_REGS_COUNT: usize = 9;
pub const OFFSETOF_THREAD_TRANSITION_FRAME: usize = 0x30;

/// Push order, which is also the order the stack walker reads them back in.
pub static REGISTERS: [SavedRegister; 13] = [
    SavedRegister::new("R4", PTFF_SAVE_R4, RegisterClass::Preserved),
    SavedRegister::new("R5", PTFF_SAVE_R5, RegisterClass::Preserved),
    SavedRegister::new("R6", PTFF_SAVE_R6, RegisterClass::Preserved),
    SavedRegister::new("R7", PTFF_SAVE_R7, RegisterClass::FramePointer),
    SavedRegister::new("R8", PTFF_SAVE_R8, RegisterClass::Preserved),
    SavedRegister::new("R9", PTFF_SAVE_R9, RegisterClass::Preserved),
    SavedRegister::new("R10", PTFF_SAVE_R10, RegisterClass::Preserved),
    SavedRegister::new("SP", PTFF_SAVE_SP, RegisterClass::StackPointer),
    SavedRegister::new("R0", PTFF_SAVE_R0, RegisterClass::Scratch),
    SavedRegister::new("R1", PTFF_SAVE_R1, RegisterClass::Scratch),
    SavedRegister::new("R2", PTFF_SAVE_R2, RegisterClass::Scratch),
    SavedRegister::new("R3", PTFF_SAVE_R3, RegisterClass::Scratch),
    SavedRegister::new("LR", PTFF_SAVE_LR, RegisterClass::LinkRegister),
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Arm;

impl TransitionFrameLayout for Arm {
    fn name(&self) -> &'static str {
        "arm"
    }

    fn pointer_size(&self) -> usize {
        4
    }

    fn flags_size(&self) -> usize {
        4
    }

    fn header_order(&self) -> HeaderOrder {
        HeaderOrder::FramePointerFirst
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
