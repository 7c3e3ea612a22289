use super::{
    amd64::Amd64, arm::Arm, arm64::Arm64, loongarch64::LoongArch64, riscv64::RiscV64, x86::X86,
    HeaderOrder, RegisterSaveFlags, SavedRegister,
};
use crate::error::FrameError;
use enum_dispatch::enum_dispatch;
use std::{fmt, str::FromStr};

/// What a transition stub and the stack walker agree on for one architecture.
///
/// Bit values and push order are ABI shared with hand-written assembly and must
/// never be renumbered for a single architecture.
#[enum_dispatch]
pub trait TransitionFrameLayout {
    fn name(&self) -> &'static str;

    fn pointer_size(&self) -> usize;

    /// Width of the flags field: 4 on x86 and ARM32, 8 elsewhere.
    fn flags_size(&self) -> usize;

    fn header_order(&self) -> HeaderOrder;

    /// Every register a stub can save, in the order it pushes them.
    fn saved_registers(&self) -> &'static [SavedRegister];

    fn thread_abort_flag(&self) -> u64;

    fn thread_hijack_flag(&self) -> u64;

    /// Flag bits that carry information but no register slot.
    fn extra_flags(&self) -> &'static [(&'static str, u64)] {
        &[]
    }

    /// Largest register set a stub saves; sizes frame storage.
    fn max_saved_registers(&self) -> usize;

    /// Offset of the current-transition-frame pointer in the runtime's thread record.
    fn transition_frame_offset(&self) -> usize;
}

#[enum_dispatch(TransitionFrameLayout)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetArch {
    X86,
    Amd64,
    Arm,
    Arm64,
    LoongArch64,
    RiscV64,
}

impl TargetArch {
    pub const ALL: [TargetArch; 6] = [
        TargetArch::X86(X86),
        TargetArch::Amd64(Amd64),
        TargetArch::Arm(Arm),
        TargetArch::Arm64(Arm64),
        TargetArch::LoongArch64(LoongArch64),
        TargetArch::RiscV64(RiscV64),
    ];

    /// The architecture this crate was compiled for, if it has transition frames.
    pub fn host() -> Option<TargetArch> {
        if cfg!(target_arch = "x86") {
            Some(X86.into())
        } else if cfg!(target_arch = "x86_64") {
            Some(Amd64.into())
        } else if cfg!(target_arch = "arm") {
            Some(Arm.into())
        } else if cfg!(target_arch = "aarch64") {
            Some(Arm64.into())
        } else if cfg!(target_arch = "loongarch64") {
            Some(LoongArch64.into())
        } else if cfg!(target_arch = "riscv64") {
            Some(RiscV64.into())
        } else {
            None
        }
    }

    pub fn return_address_offset(&self) -> usize {
        match self.header_order() {
            HeaderOrder::ReturnAddressFirst => 0,
            HeaderOrder::FramePointerFirst => self.pointer_size(),
        }
    }

    pub fn frame_pointer_offset(&self) -> usize {
        match self.header_order() {
            HeaderOrder::ReturnAddressFirst => self.pointer_size(),
            HeaderOrder::FramePointerFirst => 0,
        }
    }

    pub fn thread_offset(&self) -> usize {
        2 * self.pointer_size()
    }

    pub fn flags_offset(&self) -> usize {
        3 * self.pointer_size()
    }

    /// Size of the fixed part; the register slots start here.
    pub fn header_size(&self) -> usize {
        let ptr = self.pointer_size();
        (self.flags_offset() + self.flags_size()).div_ceil(ptr) * ptr
    }

    pub fn register_mask(&self) -> u64 {
        self.saved_registers()
            .iter()
            .fold(0, |mask, reg| mask | reg.flag)
    }

    pub fn control_mask(&self) -> u64 {
        self.thread_abort_flag() | self.thread_hijack_flag()
    }

    pub fn known_flags_mask(&self) -> u64 {
        self.extra_flags()
            .iter()
            .fold(self.register_mask() | self.control_mask(), |mask, (_, flag)| {
                mask | flag
            })
    }

    pub fn saved_register_count(&self, flags: u64) -> usize {
        (flags & self.register_mask()).count_ones() as usize
    }

    /// Header plus one pointer-sized slot per saved register.
    pub fn frame_size(&self, flags: u64) -> usize {
        self.header_size() + self.saved_register_count(flags) * self.pointer_size()
    }

    pub fn max_frame_size(&self) -> usize {
        self.header_size() + self.max_saved_registers() * self.pointer_size()
    }

    pub fn register(&self, name: &str) -> Option<&'static SavedRegister> {
        self.saved_registers()
            .iter()
            .find(|reg| reg.name.eq_ignore_ascii_case(name))
    }

    pub fn flags(&self, bits: u64) -> RegisterSaveFlags {
        RegisterSaveFlags::new(*self, bits)
    }
}

impl fmt::Display for TargetArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetArch {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86" | "i386" | "i686" => Ok(X86.into()),
            "x64" | "amd64" | "x86_64" => Ok(Amd64.into()),
            "arm" | "arm32" => Ok(Arm.into()),
            "arm64" | "aarch64" => Ok(Arm64.into()),
            "loongarch64" => Ok(LoongArch64.into()),
            "riscv64" => Ok(RiscV64.into()),
            _ => Err(FrameError::UnknownArch(s.to_string())),
        }
    }
}
