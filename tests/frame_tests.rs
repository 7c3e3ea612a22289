use dotnet_binder::{
    error::FrameError,
    frame::{
        amd64, arm64, loongarch64, riscv64, x86, RegisterSaveFlags, TargetArch,
        TransitionFrameBuilder, TransitionFrameLayout, TransitionFrameView,
    },
};

/// Every other register of the architecture, so both push-order halves show up.
fn alternate_registers(arch: TargetArch) -> Vec<(&'static str, u64)> {
    arch.saved_registers()
        .iter()
        .step_by(2)
        .enumerate()
        .map(|(i, reg)| (reg.name, 0x100 + i as u64))
        .collect()
}

#[test]
fn builder_and_view_agree_for_every_arch() {
    for arch in TargetArch::ALL {
        let saved = alternate_registers(arch);
        let mut builder = TransitionFrameBuilder::new(arch)
            .frame_pointer(0x7ff0)
            .return_address(0x4010)
            .thread(0x9000)
            .thread_abort();
        for (name, value) in &saved {
            builder = builder.save(name, *value).unwrap();
        }
        let bytes = builder.build().unwrap();
        assert_eq!(bytes.len(), arch.header_size() + saved.len() * arch.pointer_size());

        let view = TransitionFrameView::parse(arch, &bytes).unwrap();
        assert_eq!(view.frame_pointer(), 0x7ff0, "{arch}");
        assert_eq!(view.return_address(), 0x4010, "{arch}");
        assert_eq!(view.thread(), 0x9000, "{arch}");
        assert!(view.flags().thread_abort());
        assert!(!view.flags().thread_hijack());
        assert_eq!(view.saved_registers().count(), view.flags().saved_count());

        // registers come back in push order, which is how they were listed
        let read: Vec<_> = view
            .saved_registers()
            .map(|(reg, value)| (reg.name, value))
            .collect();
        assert_eq!(read, saved, "{arch}");
    }
}

#[test]
fn x64_push_order_places_rsp_before_scratch() {
    let arch: TargetArch = amd64::Amd64.into();
    let bytes = TransitionFrameBuilder::new(arch)
        .save("RAX", 1)
        .unwrap()
        .save("RSP", 2)
        .unwrap()
        .save("R15", 3)
        .unwrap()
        .save("RBX", 4)
        .unwrap()
        .build()
        .unwrap();
    let view = TransitionFrameView::parse(arch, &bytes).unwrap();
    let names: Vec<_> = view.saved_registers().map(|(reg, _)| reg.name).collect();
    assert_eq!(names, ["RBX", "R15", "RSP", "RAX"]);
    assert_eq!(view.register("rsp"), Some(2));
}

#[test]
fn x86_hijack_return_kind() {
    let arch: TargetArch = x86::X86.into();
    let bytes = TransitionFrameBuilder::new(arch)
        .thread_hijack()
        .flag(x86::PTFF_RAX_IS_BYREF)
        .save("eax", 0x1234)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(bytes.len(), 16 + 4);
    let view = TransitionFrameView::parse(arch, &bytes).unwrap();
    assert!(view.flags().contains(x86::PTFF_RAX_IS_BYREF));
    assert!(!view.flags().contains(x86::PTFF_RAX_IS_GCREF));
    assert_eq!(view.flags().to_string(), "EAX|RAX_IS_BYREF|THREAD_HIJACK");
}

#[test]
fn flags_width_is_enforced_on_32_bit_targets() {
    let arch: TargetArch = x86::X86.into();
    let mut bytes = TransitionFrameBuilder::new(arch).build().unwrap();
    // the top bit of the 4-byte flags word is not defined on x86
    assert_eq!(bytes[12..16], [0, 0, 0, 0]);
    bytes[15] = 0x80;
    assert!(matches!(
        TransitionFrameView::parse(arch, &bytes),
        Err(FrameError::UnknownFlags { .. })
    ));
}

#[test]
fn control_bits_share_layout_on_64_bit_risc_targets() {
    let la: TargetArch = loongarch64::LoongArch64.into();
    let rv: TargetArch = riscv64::RiscV64.into();
    for arch in [la, rv] {
        assert_eq!(arch.transition_frame_offset(), 0x48);
        assert_eq!(arch.header_size(), 32);
        assert!(arch.thread_abort_flag() > arch.register_mask());
    }
    assert_eq!(la.register("RA").map(|r| r.flag), Some(loongarch64::PTFF_SAVE_RA));
    assert_eq!(rv.register("RA").map(|r| r.flag), Some(riscv64::PTFF_SAVE_RA));
}

#[test]
fn decoded_flags_render_names() {
    let arch: TargetArch = arm64::Arm64.into();
    let flags = RegisterSaveFlags::checked(
        arch,
        arm64::PTFF_SAVE_X19 | arm64::PTFF_SAVE_SP | arm64::PTFF_THREAD_ABORT,
    )
    .unwrap();
    assert_eq!(flags.to_string(), "X19|SP|THREAD_ABORT");
    assert_eq!(arch.frame_size(flags.bits()), 32 + 2 * 8);
}
