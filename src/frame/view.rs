use super::{read_slot, RegisterSaveFlags, SavedRegister, TargetArch, TransitionFrameLayout};
use crate::error::FrameError;

/// Read-only view of a transition frame laid out for `arch`, as the stack walker
/// sees it.
///
/// The number of trailing register slots is the popcount of the register flags,
/// computed when the view is made.
#[derive(Debug, Clone, Copy)]
pub struct TransitionFrameView<'a> {
    arch: TargetArch,
    bytes: &'a [u8],
    flags: RegisterSaveFlags,
}

impl<'a> TransitionFrameView<'a> {
    pub fn parse(arch: TargetArch, bytes: &'a [u8]) -> Result<Self, FrameError> {
        let header = arch.header_size();
        if bytes.len() < header {
            return Err(FrameError::Truncated {
                needed: header,
                available: bytes.len(),
            });
        }
        let bits = read_slot(bytes, arch.flags_offset(), arch.flags_size());
        let flags = RegisterSaveFlags::checked(arch, bits)?;
        let needed = arch.frame_size(bits);
        if bytes.len() < needed {
            return Err(FrameError::Truncated {
                needed,
                available: bytes.len(),
            });
        }
        Ok(Self {
            arch,
            bytes: &bytes[..needed],
            flags,
        })
    }

    pub fn arch(&self) -> TargetArch {
        self.arch
    }

    pub fn frame_pointer(&self) -> u64 {
        self.slot(self.arch.frame_pointer_offset())
    }

    pub fn return_address(&self) -> u64 {
        self.slot(self.arch.return_address_offset())
    }

    pub fn thread(&self) -> u64 {
        self.slot(self.arch.thread_offset())
    }

    pub fn flags(&self) -> RegisterSaveFlags {
        self.flags
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// `(register, value)` for every saved register, in push order.
    pub fn saved_registers(&self) -> impl Iterator<Item = (&'static SavedRegister, u64)> + '_ {
        let ptr = self.arch.pointer_size();
        let base = self.arch.header_size();
        self.flags
            .saved_registers()
            .enumerate()
            .map(move |(i, reg)| (reg, self.slot(base + i * ptr)))
    }

    pub fn register(&self, name: &str) -> Option<u64> {
        self.saved_registers()
            .find(|(reg, _)| reg.name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    fn slot(&self, offset: usize) -> u64 {
        read_slot(self.bytes, offset, self.arch.pointer_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{arm64, TransitionFrameBuilder};

    #[test]
    fn test_view_reads_header() {
        let arch: TargetArch = arm64::Arm64.into();
        let bytes = TransitionFrameBuilder::new(arch)
            .frame_pointer(0xf000)
            .return_address(0xa000)
            .thread(0x7000)
            .thread_hijack()
            .save("lr", 0x1234)
            .unwrap()
            .build()
            .unwrap();
        let view = TransitionFrameView::parse(arch, &bytes).unwrap();
        assert_eq!(view.frame_pointer(), 0xf000);
        assert_eq!(view.return_address(), 0xa000);
        assert_eq!(view.thread(), 0x7000);
        assert!(view.flags().thread_hijack());
        assert!(!view.flags().thread_abort());
        assert_eq!(view.register("LR"), Some(0x1234));
        assert_eq!(view.register("X0"), None);
        assert_eq!(view.size(), 40);
    }

    #[test]
    fn test_truncated_frames() {
        let arch: TargetArch = arm64::Arm64.into();
        assert_eq!(
            TransitionFrameView::parse(arch, &[0u8; 8]).unwrap_err(),
            FrameError::Truncated {
                needed: 32,
                available: 8
            }
        );

        let bytes = TransitionFrameBuilder::new(arch)
            .save("x19", 1)
            .unwrap()
            .save("x20", 2)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            TransitionFrameView::parse(arch, &bytes[..40]).unwrap_err(),
            FrameError::Truncated {
                needed: 48,
                available: 40
            }
        );
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let arch: TargetArch = arm64::Arm64.into();
        let mut bytes = TransitionFrameBuilder::new(arch).build().unwrap();
        bytes.extend_from_slice(&[0xff; 16]);
        let view = TransitionFrameView::parse(arch, &bytes).unwrap();
        assert_eq!(view.size(), 32);
        assert_eq!(view.saved_registers().count(), 0);
    }
}
