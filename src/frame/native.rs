//! The transition frame of the architecture this crate is built for.
//!
//! Field order and widths must match what the assembly stubs push.
#![cfg(any(
    target_arch = "x86",
    target_arch = "x86_64",
    target_arch = "arm",
    target_arch = "aarch64",
    target_arch = "loongarch64",
    target_arch = "riscv64"
))]

use super::{RegisterSaveFlags, TargetArch, TransitionFrameLayout};
use std::{ffi::c_void, mem::size_of, ptr, slice};

/// Opaque runtime thread record.
#[repr(C)]
pub struct Thread {
    _opaque: [u8; 0],
}

#[cfg(target_arch = "x86")]
const HOST: TargetArch = TargetArch::X86(super::x86::X86);
#[cfg(target_arch = "x86_64")]
const HOST: TargetArch = TargetArch::Amd64(super::amd64::Amd64);
#[cfg(target_arch = "arm")]
const HOST: TargetArch = TargetArch::Arm(super::arm::Arm);
#[cfg(target_arch = "aarch64")]
const HOST: TargetArch = TargetArch::Arm64(super::arm64::Arm64);
#[cfg(target_arch = "loongarch64")]
const HOST: TargetArch = TargetArch::LoongArch64(super::loongarch64::LoongArch64);
#[cfg(target_arch = "riscv64")]
const HOST: TargetArch = TargetArch::RiscV64(super::riscv64::RiscV64);

#[cfg(any(target_arch = "x86", target_arch = "arm"))]
pub type FrameFlags = u32;
#[cfg(not(any(target_arch = "x86", target_arch = "arm")))]
pub type FrameFlags = u64;

#[repr(C)]
pub struct PInvokeTransitionFrame {
    #[cfg(any(
        target_arch = "arm",
        target_arch = "aarch64",
        target_arch = "loongarch64",
        target_arch = "riscv64"
    ))]
    pub frame_pointer: *mut c_void,
    pub return_address: *mut c_void,
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub frame_pointer: *mut c_void,
    /// Saves a thread lookup per method; may be invalid on paths that never need it.
    pub thread: *mut Thread,
    pub flags: FrameFlags,
    preserved_regs: [usize; 0],
}

impl PInvokeTransitionFrame {
    pub const HEADER_SIZE: usize = size_of::<PInvokeTransitionFrame>();

    pub fn new(
        frame_pointer: *mut c_void,
        return_address: *mut c_void,
        thread: *mut Thread,
        flags: FrameFlags,
    ) -> Self {
        Self {
            frame_pointer,
            return_address,
            thread,
            flags,
            preserved_regs: [],
        }
    }

    pub fn arch() -> TargetArch {
        HOST
    }

    pub fn register_flags(&self) -> RegisterSaveFlags {
        RegisterSaveFlags::new(Self::arch(), u64::from(self.flags))
    }

    /// Bytes the stub had to reserve for this frame.
    pub fn size(&self) -> usize {
        Self::arch().frame_size(u64::from(self.flags))
    }

    /// `PInvokeTransitionFrame_MAX_SIZE`.
    pub fn max_size() -> usize {
        Self::arch().max_frame_size()
    }

    /// The saved register slots, one per set register flag, in push order.
    ///
    /// Takes a raw pointer because the slots lie past the end of the struct, where a
    /// `&PInvokeTransitionFrame` grants no access.
    ///
    /// # Safety
    /// `frame` must point at a frame followed in memory by the slots its flags
    /// announce, as laid down by a transition stub, and must carry provenance over
    /// the header and every slot. The slots must stay unmodified for `'a`.
    pub unsafe fn preserved_regs<'a>(frame: *const Self) -> &'a [usize] {
        let flags = unsafe { u64::from(ptr::addr_of!((*frame).flags).read()) };
        let count = RegisterSaveFlags::new(Self::arch(), flags).saved_count();
        let base = unsafe { ptr::addr_of!((*frame).preserved_regs) } as *const usize;
        unsafe { slice::from_raw_parts(base, count) }
    }
}
