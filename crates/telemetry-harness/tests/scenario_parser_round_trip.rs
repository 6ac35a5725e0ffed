//! Spec §8 scenarios 5-6: the independent `telemetry-parser` decoder reading
//! schemas and snapshots produced by `telemetry-core`, with no shared code
//! between the two beyond the happen-to-match hash algorithm.

mod common;

use std::collections::HashMap;

use common::{Point3D, Pose, Quaternion};
use telemetry_core::{schema_to_text, Channel};
use telemetry_parser::{parse_schema, parse_snapshot, NumberValue, SnapshotView};

#[test]
fn nested_pose_snapshot_decodes_to_slash_joined_numeric_paths() {
    let channel = Channel::new("robot");
    channel.add_sink(telemetry_sinks::SinkHandle::new(telemetry_sinks::DummySink::new()));

    let pose = Pose {
        position: Point3D { x: 1.0, y: 2.0, z: 3.0 },
        rotation: Quaternion { w: 4.0, x: 5.0, y: 6.0, z: 7.0 },
    };
    unsafe { channel.register_custom("pose", &pose) }.unwrap();
    assert!(channel.take_snapshot_now());

    let core_schema = channel.schema();
    let text = schema_to_text(&core_schema);
    let parsed_schema = parse_schema(&text).expect("schema text must parse");
    assert_eq!(parsed_schema.hash, core_schema.hash);

    let mut payload = vec![0u8; 56];
    {
        let mut cursor: &mut [u8] = &mut payload;
        write_pose(&pose, &mut cursor);
    }
    let active_mask = channel.active_flags();
    let view = SnapshotView {
        schema_hash: parsed_schema.hash,
        timestamp: 0,
        active_mask: &active_mask,
        payload: &payload,
    };

    let mut numbers: HashMap<String, f64> = HashMap::new();
    let mut customs_seen = 0usize;
    let matched = parse_snapshot(
        &parsed_schema,
        view,
        |path: &str, value: NumberValue| {
            numbers.insert(path.to_string(), value.as_f64());
        },
        |_path: &str, _raw: &[u8], _type_name: &str| {
            customs_seen += 1;
        },
    )
    .unwrap();

    assert!(matched);
    assert_eq!(customs_seen, 0);
    assert_eq!(numbers["pose/position/x"], 1.0);
    assert_eq!(numbers["pose/position/y"], 2.0);
    assert_eq!(numbers["pose/position/z"], 3.0);
    assert_eq!(numbers["pose/rotation/w"], 4.0);
    assert_eq!(numbers["pose/rotation/x"], 5.0);
    assert_eq!(numbers["pose/rotation/y"], 6.0);
    assert_eq!(numbers["pose/rotation/z"], 7.0);
}

#[test]
fn array_and_vector_of_composites_decode_with_bracketed_indices() {
    let channel = Channel::new("swarm");
    channel.add_sink(telemetry_sinks::SinkHandle::new(telemetry_sinks::DummySink::new()));

    let points: [Point3D; 3] = [
        Point3D { x: 1.0, y: 2.0, z: 3.0 },
        Point3D { x: 4.0, y: 5.0, z: 6.0 },
        Point3D { x: 7.0, y: 8.0, z: 9.0 },
    ];
    let quats: Vec<Quaternion> = vec![
        Quaternion { w: 20.0, x: 21.0, y: 22.0, z: 23.0 },
        Quaternion { w: 30.0, x: 31.0, y: 32.0, z: 33.0 },
    ];

    unsafe { channel.register_custom_array("points", &points) }.unwrap();
    unsafe { channel.register_custom_vector("quats", &quats) }.unwrap();
    assert!(channel.take_snapshot_now());

    let core_schema = channel.schema();
    let text = schema_to_text(&core_schema);
    let parsed_schema = parse_schema(&text).unwrap();

    let mut payload = Vec::new();
    for p in &points {
        let mut buf = [0u8; 24];
        {
            let mut cursor: &mut [u8] = &mut buf;
            write_point(p, &mut cursor);
        }
        payload.extend_from_slice(&buf);
    }
    payload.extend_from_slice(&(quats.len() as u32).to_le_bytes());
    for q in &quats {
        let mut buf = [0u8; 32];
        {
            let mut cursor: &mut [u8] = &mut buf;
            write_quat(q, &mut cursor);
        }
        payload.extend_from_slice(&buf);
    }

    let active_mask = channel.active_flags();
    let view = SnapshotView {
        schema_hash: parsed_schema.hash,
        timestamp: 0,
        active_mask: &active_mask,
        payload: &payload,
    };

    let mut numbers: HashMap<String, f64> = HashMap::new();
    let matched = parse_snapshot(
        &parsed_schema,
        view,
        |path: &str, value: NumberValue| {
            numbers.insert(path.to_string(), value.as_f64());
        },
        |_path: &str, _raw: &[u8], _type_name: &str| {},
    )
    .unwrap();

    assert!(matched);
    assert_eq!(numbers["points[0]/x"], 1.0);
    assert_eq!(numbers["points[2]/z"], 9.0);
    assert_eq!(numbers["quats[1]/w"], 30.0);
}

fn write_point(p: &Point3D, dest: &mut &mut [u8]) {
    for v in [p.x, p.y, p.z] {
        write_f64(v, dest);
    }
}

fn write_quat(q: &Quaternion, dest: &mut &mut [u8]) {
    for v in [q.w, q.x, q.y, q.z] {
        write_f64(v, dest);
    }
}

fn write_pose(p: &Pose, dest: &mut &mut [u8]) {
    write_point(&p.position, dest);
    write_quat(&p.rotation, dest);
}

fn write_f64(v: f64, dest: &mut &mut [u8]) {
    let bytes = v.to_le_bytes();
    let (head, tail) = std::mem::take(dest).split_at_mut(8);
    head.copy_from_slice(&bytes);
    *dest = tail;
}
