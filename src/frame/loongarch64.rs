//! LoongArch64 transition frames.

use super::{HeaderOrder, RegisterClass, SavedRegister, TransitionFrameLayout};

pub const PTFF_SAVE_R23: u64 = 0x0000_0000_0000_0001;
pub const PTFF_SAVE_R24: u64 = 0x0000_0000_0000_0002;
pub const PTFF_SAVE_R25: u64 = 0x0000_0000_0000_0004;
pub const PTFF_SAVE_R26: u64 = 0x0000_0000_0000_0008;
pub const PTFF_SAVE_R27: u64 = 0x0000_0000_0000_0010;
pub const PTFF_SAVE_R28: u64 = 0x0000_0000_0000_0020;
pub const PTFF_SAVE_R29: u64 = 0x0000_0000_0000_0040;
pub const PTFF_SAVE_R30: u64 = 0x0000_0000_0000_0080;
pub const PTFF_SAVE_R31: u64 = 0x0000_0000_0000_0100;
pub const PTFF_SAVE_SP: u64 = 0x0000_0000_0000_0200;
pub const PTFF_SAVE_R0: u64 = 0x0000_0000_0000_0400;
pub const PTFF_SAVE_R4: u64 = 0x0000_0000_0000_0800;
pub const PTFF_SAVE_R5: u64 = 0x0000_0000_0000_1000;
pub const PTFF_SAVE_R6: u64 = 0x0000_0000_0000_2000;
pub const PTFF_SAVE_R7: u64 = 0x0000_0000_0000_4000;
pub const PTFF_SAVE_R8: u64 = 0x0000_0000_0000_8000;
pub const PTFF_SAVE_R9: u64 = 0x0000_0000_0001_0000;
pub const PTFF_SAVE_R10: u64 = 0x0000_0000_0002_0000;
pub const PTFF_SAVE_R11: u64 = 0x0000_0000_0004_0000;
pub const PTFF_SAVE_R12: u64 = 0x0000_0000_0008_0000;
pub const PTFF_SAVE_R13: u64 = 0x0000_0000_0010_0000;
pub const PTFF_SAVE_R14: u64 = 0x0000_0000_0020_0000;
pub const PTFF_SAVE_R15: u64 = 0x0000_0000_0040_0000;
pub const PTFF_SAVE_R16: u64 = 0x0000_0000_0080_0000;
pub const PTFF_SAVE_R17: u64 = 0x0000_0000_0100_0000;
pub const PTFF_SAVE_R18: u64 = 0x0000_0000_0200_0000;
pub const PTFF_SAVE_R19: u64 = 0x0000_0000_0400_0000;
pub const PTFF_SAVE_R20: u64 = 0x0000_0000_0800_0000;
pub const PTFF_SAVE_R21: u64 = 0x0000_0000_1000_0000;
pub const PTFF_SAVE_FP: u64 = 0x0000_0000_2000_0000;
/// RA may hold a GC pointer across a loop hijack.
pub const PTFF_SAVE_RA: u64 = 0x0000_0000_4000_0000;
/// Deliver a pending thread abort when the transition returns.
pub const PTFF_THREAD_ABORT: u64 = 0x0000_0000_8000_0000;
/// The frame belongs to a hijacked call.
pub const PTFF_THREAD_HIJACK: u64 = 0x0000_0001_0000_0000;

/// No narrower bound is defined here, so every register flag counts.
pub const SAVE_REGS_COUNT: usize = 31;
pub const OFFSETOF_THREAD_TRANSITION_FRAME: usize = 0x48;

/// Push order, which is also the order the stack walker reads them back in.
pub static REGISTERS: [SavedRegister; 31] = [
    SavedRegister::new("R23", PTFF_SAVE_R23, RegisterClass::Preserved),
    SavedRegister::new("R24", PTFF_SAVE_R24, RegisterClass::Preserved),
    SavedRegister::new("R25", PTFF_SAVE_R25, RegisterClass::Preserved),
    SavedRegister::new("R26", PTFF_SAVE_R26, RegisterClass::Preserved),
    SavedRegister::new("R27", PTFF_SAVE_R27, RegisterClass::Preserved),
    SavedRegister::new("R28", PTFF_SAVE_R28, RegisterClass::Preserved),
    SavedRegister::new("R29", PTFF_SAVE_R29, RegisterClass::Preserved),
    SavedRegister::new("R30", PTFF_SAVE_R30, RegisterClass::Preserved),
    SavedRegister::new("R31", PTFF_SAVE_R31, RegisterClass::Preserved),
    SavedRegister::new("SP", PTFF_SAVE_SP, RegisterClass::StackPointer),
    SavedRegister::new("R0", PTFF_SAVE_R0, RegisterClass::Scratch),
    SavedRegister::new("R4", PTFF_SAVE_R4, RegisterClass::Scratch),
    SavedRegister::new("R5", PTFF_SAVE_R5, RegisterClass::Scratch),
    SavedRegister::new("R6", PTFF_SAVE_R6, RegisterClass::Scratch),
    SavedRegister::new("R7", PTFF_SAVE_R7, RegisterClass::Scratch),
    SavedRegister::new("R8", PTFF_SAVE_R8, RegisterClass::Scratch),
    SavedRegister::new("R9", PTFF_SAVE_R9, RegisterClass::Scratch),
    SavedRegister::new("R10", PTFF_SAVE_R10, RegisterClass::Scratch),
    SavedRegister::new("R11", PTFF_SAVE_R11, RegisterClass::Scratch),
    SavedRegister::new("R12", PTFF_SAVE_R12, RegisterClass::Scratch),
    SavedRegister::new("R13", PTFF_SAVE_R13, RegisterClass::Scratch),
    SavedRegister::new("R14", PTFF_SAVE_R14, RegisterClass::Scratch),
    SavedRegister::new("R15", PTFF_SAVE_R15, RegisterClass::Scratch),
    SavedRegister::new("R16", PTFF_SAVE_R16, RegisterClass::Scratch),
    SavedRegister::new("R17", PTFF_SAVE_R17, RegisterClass::Scratch),
    SavedRegister::new("R18", PTFF_SAVE_R18, RegisterClass::Scratch),
    SavedRegister::new("R19", PTFF_SAVE_R19, RegisterClass::Scratch),
    SavedRegister::new("R20", PTFF_SAVE_R20, RegisterClass::Scratch),
    SavedRegister::new("R21", PTFF_SAVE_R21, RegisterClass::Scratch),
    SavedRegister::new("FP", PTFF_SAVE_FP, RegisterClass::FramePointer),
    SavedRegister::new("RA", PTFF_SAVE_RA, RegisterClass::LinkRegister),
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LoongArch64;

impl TransitionFrameLayout for LoongArch64 {
    fn name(&self) -> &'static str {
        "loongarch64"
    }

    fn pointer_size(&self) -> usize {
        8
    }

    fn flags_size(&self) -> usize {
        8
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
