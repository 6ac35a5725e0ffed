//! Spec §8 scenarios 2-3 and the "Boundary behaviors" list.

use telemetry_core::{Channel, RegistrationError};
use telemetry_sinks::{DummySink, SinkHandle};

#[test]
fn disabling_and_reenabling_fields_flips_the_expected_mask_bits() {
    let channel = Channel::new("mixed");
    channel.add_sink(SinkHandle::new(DummySink::new()));

    let v1: i32 = 1;
    let v2: i32 = 2;
    let v3: i32 = 3;
    let v4: i32 = 4;
    let v5: i32 = 5;
    let v6: i32 = 6;
    let v7: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0];

    let id1 = unsafe { channel.register_scalar("v1", &v1) }.unwrap();
    unsafe { channel.register_scalar("v2", &v2) }.unwrap();
    unsafe { channel.register_scalar("v3", &v3) }.unwrap();
    unsafe { channel.register_scalar("v4", &v4) }.unwrap();
    let id5 = unsafe { channel.register_scalar("v5", &v5) }.unwrap();
    unsafe { channel.register_scalar("v6", &v6) }.unwrap();
    unsafe { channel.register_vector("v7", &v7) }.unwrap();

    assert!(channel.take_snapshot(0));
    let mask = channel.active_flags();
    assert_eq!(mask[0], 0b1111_1111);

    // 6 x i32 (24) + v7's 4-byte length prefix + 4 x f32 (16) = 44 bytes.
    let expected_size: usize = 6 * 4 + 4 + 4 * 4;
    let measured: usize = {
        let mut total = 0usize;
        for i in 0..7 {
            total += if i == 6 { 4 + 16 } else { 4 };
        }
        total
    };
    assert_eq!(measured, expected_size);

    channel.set_enabled(id1, false);
    assert!(channel.take_snapshot(0));
    assert_eq!(channel.active_flags()[0], 0b1111_1110);

    channel.set_enabled(id1, true);
    channel.set_enabled(id5, false);
    assert!(channel.take_snapshot(0));
    assert_eq!(channel.active_flags()[0], 0b1110_1111);
}

#[test]
fn dynamic_vector_resizing_preserves_the_schema_hash() {
    let channel = Channel::new("vec_chan");
    let sink = SinkHandle::new(DummySink::new());
    channel.add_sink(sink.clone());

    let mut vect: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0];
    unsafe { channel.register_vector("vect", &vect) }.unwrap();

    assert!(channel.take_snapshot(0));
    let hash_after_first = channel.schema().hash;

    vect.extend([5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    assert!(channel.take_snapshot(0));
    assert_eq!(channel.schema().hash, hash_after_first);

    vect.truncate(5);
    assert!(channel.take_snapshot(0));
    assert_eq!(channel.schema().hash, hash_after_first);

    sink.stop();
}

#[test]
fn boundary_behaviors_match_spec_table() {
    let channel = Channel::new("boundaries");
    channel.add_sink(SinkHandle::new(DummySink::new()));

    let bad: i32 = 0;
    assert_eq!(
        unsafe { channel.register_scalar("bad name", &bad) }.unwrap_err(),
        RegistrationError::NameInvalid("bad name".to_string())
    );

    let a: i32 = 1;
    unsafe { channel.register_scalar("a", &a) }.unwrap();
    assert!(channel.take_snapshot(0));

    let b: i32 = 2;
    assert!(matches!(
        unsafe { channel.register_scalar("b", &b) },
        Err(RegistrationError::FrozenSchema(_))
    ));

    assert!(matches!(
        unsafe { channel.register_scalar("a", &a) },
        Err(RegistrationError::AlreadyRegistered(_))
    ));
}

#[test]
fn unregister_then_mismatched_reregistration_is_a_type_mismatch() {
    let channel = Channel::new("reuse");
    let a: i32 = 1;
    let id = unsafe { channel.register_scalar("a", &a) }.unwrap();
    channel.unregister(id);
    let v: Vec<i32> = vec![1];
    assert!(matches!(
        unsafe { channel.register_vector("a", &v) },
        Err(RegistrationError::TypeMismatch(_))
    ));
}

#[test]
fn disabling_every_field_still_snapshots_with_empty_payload() {
    let channel = Channel::new("all_disabled");
    channel.add_sink(SinkHandle::new(DummySink::new()));
    let a: i32 = 1;
    let id = unsafe { channel.register_scalar("a", &a) }.unwrap();
    channel.set_enabled(id, false);
    assert!(channel.take_snapshot(0));
    assert_eq!(channel.active_flags(), vec![0u8]);
}
