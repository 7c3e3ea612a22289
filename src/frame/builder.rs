use super::{write_slot, RegisterClass, RegisterSaveFlags, TargetArch, TransitionFrameLayout};
use crate::error::FrameError;
use std::collections::BTreeMap;

/// Lays a transition frame out in target byte order, the way a stub pushes it.
///
/// Registers can be added in any order; [`build`](Self::build) emits them in the
/// architecture's push order.
#[derive(Debug, Clone)]
pub struct TransitionFrameBuilder {
    arch: TargetArch,
    frame_pointer: u64,
    return_address: u64,
    thread: u64,
    flags: u64,
    values: BTreeMap<u64, u64>,
}

impl TransitionFrameBuilder {
    pub fn new(arch: TargetArch) -> Self {
        Self {
            arch,
            frame_pointer: 0,
            return_address: 0,
            thread: 0,
            flags: 0,
            values: BTreeMap::new(),
        }
    }

    pub fn frame_pointer(mut self, value: u64) -> Self {
        self.frame_pointer = value;
        self
    }

    pub fn return_address(mut self, value: u64) -> Self {
        self.return_address = value;
        self
    }

    pub fn thread(mut self, value: u64) -> Self {
        self.thread = value;
        self
    }

    pub fn save(self, register: &str, value: u64) -> Result<Self, FrameError> {
        let reg = self
            .arch
            .register(register)
            .ok_or_else(|| FrameError::UnknownRegister {
                arch: self.arch.name(),
                register: register.to_string(),
            })?;
        Ok(self.save_flag(reg.flag, value))
    }

    /// Record `value` for the register selected by `flag`. Unknown flags are
    /// caught by [`build`](Self::build).
    pub fn save_flag(mut self, flag: u64, value: u64) -> Self {
        self.flags |= flag;
        self.values.insert(flag, value);
        self
    }

    pub fn thread_abort(mut self) -> Self {
        self.flags |= self.arch.thread_abort_flag();
        self
    }

    pub fn thread_hijack(mut self) -> Self {
        self.flags |= self.arch.thread_hijack_flag();
        self
    }

    /// Set a non-register flag such as x86's `RAX_IS_GCREF`.
    pub fn flag(mut self, flag: u64) -> Self {
        self.flags |= flag;
        self
    }

    pub fn build(&self) -> Result<Vec<u8>, FrameError> {
        let flags = RegisterSaveFlags::checked(self.arch, self.flags)?;
        let arch = self.arch;
        let ptr = arch.pointer_size();
        let mut bytes = vec![0u8; arch.frame_size(self.flags)];

        write_slot(&mut bytes, arch.frame_pointer_offset(), ptr, self.frame_pointer)?;
        write_slot(&mut bytes, arch.return_address_offset(), ptr, self.return_address)?;
        write_slot(&mut bytes, arch.thread_offset(), ptr, self.thread)?;
        write_slot(&mut bytes, arch.flags_offset(), arch.flags_size(), self.flags)?;

        let mut offset = arch.header_size();
        for reg in flags.saved_registers() {
            if reg.class == RegisterClass::FramePointer {
                tracing::warn!(
                    "{} frame saves {} through a flag; frames keep it in the frame pointer field",
                    arch,
                    reg.name
                );
            }
            let value = self.values.get(&reg.flag).copied().unwrap_or(0);
            write_slot(&mut bytes, offset, ptr, value)?;
            offset += ptr;
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{amd64, arm};

    #[test]
    fn test_x64_layout_bytes() {
        let arch: TargetArch = amd64::Amd64.into();
        let bytes = TransitionFrameBuilder::new(arch)
            .return_address(0x1122)
            .frame_pointer(0x3344)
            .thread(0x5566)
            .save("rax", 0xaa)
            .unwrap()
            .save("rbx", 0xbb)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(bytes.len(), 32 + 2 * 8);
        assert_eq!(u64::from_le_bytes(bytes[0..8].try_into().unwrap()), 0x1122);
        assert_eq!(u64::from_le_bytes(bytes[8..16].try_into().unwrap()), 0x3344);
        assert_eq!(u64::from_le_bytes(bytes[16..24].try_into().unwrap()), 0x5566);
        assert_eq!(
            u64::from_le_bytes(bytes[24..32].try_into().unwrap()),
            amd64::PTFF_SAVE_RAX | amd64::PTFF_SAVE_RBX
        );
        // RBX is preserved and precedes the scratch RAX
        assert_eq!(u64::from_le_bytes(bytes[32..40].try_into().unwrap()), 0xbb);
        assert_eq!(u64::from_le_bytes(bytes[40..48].try_into().unwrap()), 0xaa);
    }

    #[test]
    fn test_arm_header_is_fp_first() {
        let arch: TargetArch = arm::Arm.into();
        let bytes = TransitionFrameBuilder::new(arch)
            .frame_pointer(0x10)
            .return_address(0x20)
            .thread_abort()
            .build()
            .unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), 0x10);
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 0x20);
        assert_eq!(
            u32::from_le_bytes(bytes[12..16].try_into().unwrap()) as u64,
            arm::PTFF_THREAD_ABORT
        );
    }

    #[test]
    fn test_errors() {
        let arch: TargetArch = arm::Arm.into();
        assert_eq!(
            TransitionFrameBuilder::new(arch).save("x19", 1).unwrap_err(),
            FrameError::UnknownRegister {
                arch: "arm",
                register: "x19".to_string()
            }
        );
        assert_eq!(
            TransitionFrameBuilder::new(arch)
                .frame_pointer(0x1_0000_0000)
                .build()
                .unwrap_err(),
            FrameError::ValueTooWide {
                value: 0x1_0000_0000,
                width: 4
            }
        );
        assert!(matches!(
            TransitionFrameBuilder::new(arch).flag(0x80).build(),
            Err(FrameError::UnknownFlags { unknown: 0x80, .. })
        ));
    }
}
