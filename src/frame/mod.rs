//! PInvoke transition frames.
//!
//! A transition stub pushes a fixed header (frame pointer, return address, owning
//! thread, flags) followed by one slot per saved register. Which registers were
//! saved, and in which order they sit, is described by the per-architecture
//! [`RegisterSaveFlags`]; the stack walker reads the frame back with the same
//! description.
//!
//! [`TargetArch`] gives every architecture's layout on any host, so frames for a
//! foreign target can be built and inspected byte-for-byte. [`native`] holds the
//! `#[repr(C)]` frame of the architecture this crate is compiled for.
use crate::error::FrameError;
use std::fmt;

pub mod amd64;
pub mod arch;
pub mod arm;
pub mod arm64;
pub mod builder;
pub mod loongarch64;
pub mod native;
pub mod riscv64;
pub mod view;
pub mod x86;

pub use arch::{TargetArch, TransitionFrameLayout};
pub use builder::TransitionFrameBuilder;
pub use view::TransitionFrameView;

/// Which of the two code-address fields a frame starts with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HeaderOrder {
    /// x86 and x64.
    ReturnAddressFirst,
    /// ARM32, ARM64, LoongArch64 and RISC-V64 push FP before LR.
    FramePointerFirst,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RegisterClass {
    /// Callee-saved.
    Preserved,
    /// Saved through a flag only by mistake; frames keep it in the header.
    FramePointer,
    StackPointer,
    /// Caller-saved.
    Scratch,
    LinkRegister,
}

/// A register a transition stub can push, with the flag bit that says it did.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SavedRegister {
    pub name: &'static str,
    pub flag: u64,
    pub class: RegisterClass,
}

impl SavedRegister {
    pub const fn new(name: &'static str, flag: u64, class: RegisterClass) -> Self {
        Self { name, flag, class }
    }
}

/// A flags word interpreted for one architecture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegisterSaveFlags {
    arch: TargetArch,
    bits: u64,
}

impl RegisterSaveFlags {
    pub fn new(arch: TargetArch, bits: u64) -> Self {
        Self { arch, bits }
    }

    /// Rejects bits the architecture does not define.
    pub fn checked(arch: TargetArch, bits: u64) -> Result<Self, FrameError> {
        let unknown = bits & !arch.known_flags_mask();
        if unknown != 0 {
            return Err(FrameError::UnknownFlags {
                arch: arch.name(),
                bits,
                unknown,
            });
        }
        Ok(Self::new(arch, bits))
    }

    pub fn arch(&self) -> TargetArch {
        self.arch
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn contains(&self, flag: u64) -> bool {
        flag != 0 && self.bits & flag == flag
    }

    pub fn insert(&mut self, flag: u64) {
        self.bits |= flag;
    }

    pub fn thread_abort(&self) -> bool {
        self.contains(self.arch.thread_abort_flag())
    }

    pub fn thread_hijack(&self) -> bool {
        self.contains(self.arch.thread_hijack_flag())
    }

    /// Number of trailing register slots in a frame carrying these flags.
    pub fn saved_count(&self) -> usize {
        self.arch.saved_register_count(self.bits)
    }

    /// Saved registers in push order.
    pub fn saved_registers(&self) -> impl Iterator<Item = &'static SavedRegister> {
        let bits = self.bits;
        self.arch
            .saved_registers()
            .iter()
            .filter(move |reg| bits & reg.flag != 0)
    }
}

impl fmt::Display for RegisterSaveFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.saved_registers().map(|reg| reg.name).collect();
        names.extend(
            self.arch
                .extra_flags()
                .iter()
                .filter(|(_, flag)| self.contains(*flag))
                .map(|(name, _)| *name),
        );
        if self.thread_abort() {
            names.push("THREAD_ABORT");
        }
        if self.thread_hijack() {
            names.push("THREAD_HIJACK");
        }
        let unknown = self.bits & !self.arch.known_flags_mask();
        if names.is_empty() && unknown == 0 {
            return write!(f, "0");
        }
        write!(f, "{}", names.join("|"))?;
        if unknown != 0 {
            if !names.is_empty() {
                write!(f, "|")?;
            }
            write!(f, "{:#x}", unknown)?;
        }
        Ok(())
    }
}

pub(crate) fn read_slot(bytes: &[u8], offset: usize, width: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(&bytes[offset..offset + width]);
    u64::from_le_bytes(buf)
}

pub(crate) fn write_slot(
    bytes: &mut [u8],
    offset: usize,
    width: usize,
    value: u64,
) -> Result<(), FrameError> {
    if width < 8 && value >> (width * 8) != 0 {
        return Err(FrameError::ValueTooWide { value, width });
    }
    bytes[offset..offset + width].copy_from_slice(&value.to_le_bytes()[..width]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_registers_follow_push_order() {
        let arch: TargetArch = amd64::Amd64.into();
        let flags = RegisterSaveFlags::new(
            arch,
            amd64::PTFF_SAVE_RAX | amd64::PTFF_SAVE_RSP | amd64::PTFF_SAVE_RBX,
        );
        let names: Vec<_> = flags.saved_registers().map(|r| r.name).collect();
        assert_eq!(names, ["RBX", "RSP", "RAX"]);
        assert_eq!(flags.saved_count(), 3);
    }

    #[test]
    fn test_control_bits_are_not_registers() {
        let arch: TargetArch = arm::Arm.into();
        let flags = RegisterSaveFlags::new(
            arch,
            arm::PTFF_THREAD_ABORT | arm::PTFF_THREAD_HIJACK | arm::PTFF_SAVE_LR,
        );
        assert!(flags.thread_abort());
        assert!(flags.thread_hijack());
        assert_eq!(flags.saved_count(), 1);
        assert_eq!(flags.to_string(), "LR|THREAD_ABORT|THREAD_HIJACK");
    }

    #[test]
    fn test_checked_rejects_unknown_bits() {
        let arch: TargetArch = amd64::Amd64.into();
        // 0x80000 is not defined on x64
        let err = RegisterSaveFlags::checked(arch, amd64::PTFF_SAVE_RBX | 0x8_0000).unwrap_err();
        assert_eq!(
            err,
            FrameError::UnknownFlags {
                arch: "x64",
                bits: 0x8_0001,
                unknown: 0x8_0000
            }
        );
        assert_eq!(RegisterSaveFlags::new(arch, 0x8_0000).to_string(), "0x80000");
        assert_eq!(RegisterSaveFlags::new(arch, 0).to_string(), "0");
    }

    #[test]
    fn test_x86_extra_flags_display() {
        let arch: TargetArch = x86::X86.into();
        let flags = RegisterSaveFlags::checked(
            arch,
            x86::PTFF_SAVE_EAX | x86::PTFF_RAX_IS_GCREF | x86::PTFF_THREAD_HIJACK,
        )
        .unwrap();
        assert_eq!(flags.to_string(), "EAX|RAX_IS_GCREF|THREAD_HIJACK");
        assert_eq!(flags.saved_count(), 1);
    }

    #[test]
    fn test_slot_helpers() {
        let mut bytes = [0u8; 12];
        write_slot(&mut bytes, 4, 4, 0xdead_beef).unwrap();
        assert_eq!(read_slot(&bytes, 4, 4), 0xdead_beef);
        assert_eq!(
            write_slot(&mut bytes, 0, 4, 0x1_0000_0000),
            Err(FrameError::ValueTooWide {
                value: 0x1_0000_0000,
                width: 4
            })
        );
    }
}
