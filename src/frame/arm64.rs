use super::{HeaderOrder, RegisterClass, SavedRegister, TransitionFrameLayout};

pub const PTFF_SAVE_X19: u64 = 0x0000_0000_0000_0001;
pub const PTFF_SAVE_X20: u64 = 0x0000_0000_0000_0002;
pub const PTFF_SAVE_X21: u64 = 0x0000_0000_0000_0004;
pub const PTFF_SAVE_X22: u64 = 0x0000_0000_0000_0008;
pub const PTFF_SAVE_X23: u64 = 0x0000_0000_0000_0010;
pub const PTFF_SAVE_X24: u64 = 0x0000_0000_0000_0020;
pub const PTFF_SAVE_X25: u64 = 0x0000_0000_0000_0040;
pub const PTFF_SAVE_X26: u64 = 0x0000_0000_0000_0080;
pub const PTFF_SAVE_X27: u64 = 0x0000_0000_0000_0100;
pub const PTFF_SAVE_X28: u64 = 0x0000_0000_0000_0200;
/// Runtime helpers called without a frame pointer seed the stack walk from SP.
pub const PTFF_SAVE_SP: u64 = 0x0000_0000_0000_0400;
pub const PTFF_SAVE_X0: u64 = 0x0000_0000_0000_0800;
pub const PTFF_SAVE_X1: u64 = 0x0000_0000_0000_1000;
pub const PTFF_SAVE_X2: u64 = 0x0000_0000_0000_2000;
pub const PTFF_SAVE_X3: u64 = 0x0000_0000_0000_4000;
pub const PTFF_SAVE_X4: u64 = 0x0000_0000_0000_8000;
pub const PTFF_SAVE_X5: u64 = 0x0000_0000_0001_0000;
pub const PTFF_SAVE_X6: u64 = 0x0000_0000_0002_0000;
pub const PTFF_SAVE_X7: u64 = 0x0000_0000_0004_0000;
pub const PTFF_SAVE_X8: u64 = 0x0000_0000_0008_0000;
pub const PTFF_SAVE_X9: u64 = 0x0000_0000_0010_0000;
pub const PTFF_SAVE_X10: u64 = 0x0000_0000_0020_0000;
pub const PTFF_SAVE_X11: u64 = 0x0000_0000_0040_0000;
pub const PTFF_SAVE_X12: u64 = 0x0000_0000_0080_0000;
pub const PTFF_SAVE_X13: u64 = 0x0000_0000_0100_0000;
pub const PTFF_SAVE_X14: u64 = 0x0000_0000_0200_0000;
pub const PTFF_SAVE_X15: u64 = 0x0000_0000_0400_0000;
pub const PTFF_SAVE_X16: u64 = 0x0000_0000_0800_0000;
pub const PTFF_SAVE_X17: u64 = 0x0000_0000_1000_0000;
pub const PTFF_SAVE_X18: u64 = 0x0000_0000_2000_0000;
pub const PTFF_SAVE_FP: u64 = 0x0000_0000_4000_0000;
pub const PTFF_SAVE_LR: u64 = 0x0000_0000_8000_0000;
/// Deliver a pending thread abort when the transition returns.
pub const PTFF_THREAD_ABORT: u64 = 0x0000_0001_0000_0000;
/// The frame belongs to a hijacked call.
pub const PTFF_THREAD_HIJACK: u64 = 0x0000_0002_0000_0000;

/// No narrower bound is defined here, so every register flag counts.
pub const SAVE_REGS_COUNT: usize = 32;
pub const OFFSETOF_THREAD_TRANSITION_FRAME: usize = 0x48;

/// Push order, which is also the order the stack walker reads them back in.
pub static REGISTERS: [SavedRegister; 32] = [
    SavedRegister::new("X19", PTFF_SAVE_X19, RegisterClass::Preserved),
    SavedRegister::new("X20", PTFF_SAVE_X20, RegisterClass::Preserved),
    SavedRegister::new("X21", PTFF_SAVE_X21, RegisterClass::Preserved),
    SavedRegister::new("X22", PTFF_SAVE_X22, RegisterClass::Preserved),
    SavedRegister::new("X23", PTFF_SAVE_X23, RegisterClass::Preserved),
    SavedRegister::new("X24", PTFF_SAVE_X24, RegisterClass::Preserved),
    SavedRegister::new("X25", PTFF_SAVE_X25, RegisterClass::Preserved),
    SavedRegister::new("X26", PTFF_SAVE_X26, RegisterClass::Preserved),
    SavedRegister::new("X27", PTFF_SAVE_X27, RegisterClass::Preserved),
    SavedRegister::new("X28", PTFF_SAVE_X28, RegisterClass::Preserved),
    SavedRegister::new("SP", PTFF_SAVE_SP, RegisterClass::StackPointer),
    SavedRegister::new("X0", PTFF_SAVE_X0, RegisterClass::Scratch),
    SavedRegister::new("X1", PTFF_SAVE_X1, RegisterClass::Scratch),
    SavedRegister::new("X2", PTFF_SAVE_X2, RegisterClass::Scratch),
    SavedRegister::new("X3", PTFF_SAVE_X3, RegisterClass::Scratch),
    SavedRegister::new("X4", PTFF_SAVE_X4, RegisterClass::Scratch),
    SavedRegister::new("X5", PTFF_SAVE_X5, RegisterClass::Scratch),
    SavedRegister::new("X6", PTFF_SAVE_X6, RegisterClass::Scratch),
    SavedRegister::new("X7", PTFF_SAVE_X7, RegisterClass::Scratch),
    SavedRegister::new("X8", PTFF_SAVE_X8, RegisterClass::Scratch),
    SavedRegister::new("X9", PTFF_SAVE_X9, RegisterClass::Scratch),
    SavedRegister::new("X10", PTFF_SAVE_X10, RegisterClass::Scratch),
    SavedRegister::new("X11", PTFF_SAVE_X11, RegisterClass::Scratch),
    SavedRegister::new("X12", PTFF_SAVE_X12, RegisterClass::Scratch),
    SavedRegister::new("X13", PTFF_SAVE_X13, RegisterClass::Scratch),
    SavedRegister::new("X14", PTFF_SAVE_X14, RegisterClass::Scratch),
    SavedRegister::new("X15", PTFF_SAVE_X15, RegisterClass::Scratch),
    SavedRegister::new("X16", PTFF_SAVE_X16, RegisterClass::Scratch),
    SavedRegister::new("X17", PTFF_SAVE_X17, RegisterClass::Scratch),
    SavedRegister::new("X18", PTFF_SAVE_X18, RegisterClass::Scratch),
    SavedRegister::new("FP", PTFF_SAVE_FP, RegisterClass::FramePointer),
    SavedRegister::new("LR", PTFF_SAVE_LR, RegisterClass::LinkRegister),
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Arm64;

impl TransitionFrameLayout for Arm64 {
    fn name(&self) -> &'static str {
        "arm64"
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
