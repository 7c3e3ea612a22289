use super::{HeaderOrder, RegisterClass, SavedRegister, TransitionFrameLayout};

pub const PTFF_SAVE_S1: u64 = 0x0000_0000_0000_0001;
pub const PTFF_SAVE_S2: u64 = 0x0000_0000_0000_0002;
pub const PTFF_SAVE_S3: u64 = 0x0000_0000_0000_0004;
pub const PTFF_SAVE_S4: u64 = 0x0000_0000_0000_0008;
pub const PTFF_SAVE_S5: u64 = 0x0000_0000_0000_0010;
pub const PTFF_SAVE_S6: u64 = 0x0000_0000_0000_0020;
pub const PTFF_SAVE_S7: u64 = 0x0000_0000_0000_0040;
pub const PTFF_SAVE_S8: u64 = 0x0000_0000_0000_0080;
pub const PTFF_SAVE_S9: u64 = 0x0000_0000_0000_0100;
pub const PTFF_SAVE_S10: u64 = 0x0000_0000_0000_0200;
pub const PTFF_SAVE_S11: u64 = 0x0000_0000_0000_0400;
pub const PTFF_SAVE_SP: u64 = 0x0000_0000_0000_0800;
pub const PTFF_SAVE_R0: u64 = 0x0000_0000_0000_1000;
pub const PTFF_SAVE_GP: u64 = 0x0000_0000_0000_2000;
pub const PTFF_SAVE_A0: u64 = 0x0000_0000_0000_4000;
pub const PTFF_SAVE_A1: u64 = 0x0000_0000_0000_8000;
pub const PTFF_SAVE_A2: u64 = 0x0000_0000_0001_0000;
pub const PTFF_SAVE_A3: u64 = 0x0000_0000_0002_0000;
pub const PTFF_SAVE_A4: u64 = 0x0000_0000_0004_0000;
pub const PTFF_SAVE_A5: u64 = 0x0000_0000_0008_0000;
pub const PTFF_SAVE_A6: u64 = 0x0000_0000_0010_0000;
pub const PTFF_SAVE_A7: u64 = 0x0000_0000_0020_0000;
pub const PTFF_SAVE_T0: u64 = 0x0000_0000_0040_0000;
pub const PTFF_SAVE_T1: u64 = 0x0000_0000_0080_0000;
pub const PTFF_SAVE_T2: u64 = 0x0000_0000_0100_0000;
pub const PTFF_SAVE_T3: u64 = 0x0000_0000_0200_0000;
pub const PTFF_SAVE_T4: u64 = 0x0000_0000_0400_0000;
pub const PTFF_SAVE_T5: u64 = 0x0000_0000_0800_0000;
pub const PTFF_SAVE_T6: u64 = 0x0000_0000_1000_0000;
pub const PTFF_SAVE_FP: u64 = 0x0000_0000_2000_0000;
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
    SavedRegister::new("S1", PTFF_SAVE_S1, RegisterClass::Preserved),
    SavedRegister::new("S2", PTFF_SAVE_S2, RegisterClass::Preserved),
    SavedRegister::new("S3", PTFF_SAVE_S3, RegisterClass::Preserved),
    SavedRegister::new("S4", PTFF_SAVE_S4, RegisterClass::Preserved),
    SavedRegister::new("S5", PTFF_SAVE_S5, RegisterClass::Preserved),
    SavedRegister::new("S6", PTFF_SAVE_S6, RegisterClass::Preserved),
    SavedRegister::new("S7", PTFF_SAVE_S7, RegisterClass::Preserved),
    SavedRegister::new("S8", PTFF_SAVE_S8, RegisterClass::Preserved),
    SavedRegister::new("S9", PTFF_SAVE_S9, RegisterClass::Preserved),
    SavedRegister::new("S10", PTFF_SAVE_S10, RegisterClass::Preserved),
    SavedRegister::new("S11", PTFF_SAVE_S11, RegisterClass::Preserved),
    SavedRegister::new("SP", PTFF_SAVE_SP, RegisterClass::StackPointer),
    SavedRegister::new("R0", PTFF_SAVE_R0, RegisterClass::Scratch),
    SavedRegister::new("GP", PTFF_SAVE_GP, RegisterClass::Scratch),
    SavedRegister::new("A0", PTFF_SAVE_A0, RegisterClass::Scratch),
    SavedRegister::new("A1", PTFF_SAVE_A1, RegisterClass::Scratch),
    SavedRegister::new("A2", PTFF_SAVE_A2, RegisterClass::Scratch),
    SavedRegister::new("A3", PTFF_SAVE_A3, RegisterClass::Scratch),
    SavedRegister::new("A4", PTFF_SAVE_A4, RegisterClass::Scratch),
    SavedRegister::new("A5", PTFF_SAVE_A5, RegisterClass::Scratch),
    SavedRegister::new("A6", PTFF_SAVE_A6, RegisterClass::Scratch),
    SavedRegister::new("A7", PTFF_SAVE_A7, RegisterClass::Scratch),
    SavedRegister::new("T0", PTFF_SAVE_T0, RegisterClass::Scratch),
    SavedRegister::new("T1", PTFF_SAVE_T1, RegisterClass::Scratch),
    SavedRegister::new("T2", PTFF_SAVE_T2, RegisterClass::Scratch),
    SavedRegister::new("T3", PTFF_SAVE_T3, RegisterClass::Scratch),
    SavedRegister::new("T4", PTFF_SAVE_T4, RegisterClass::Scratch),
    SavedRegister::new("T5", PTFF_SAVE_T5, RegisterClass::Scratch),
    SavedRegister::new("T6", PTFF_SAVE_T6, RegisterClass::Scratch),
    SavedRegister::new("FP", PTFF_SAVE_FP, RegisterClass::FramePointer),
    SavedRegister::new("RA", PTFF_SAVE_RA, RegisterClass::LinkRegister),
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RiscV64;

impl TransitionFrameLayout for RiscV64 {
    fn name(&self) -> &'static str {
        "riscv64"
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
