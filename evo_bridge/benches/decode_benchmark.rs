//! Decode and event serialization benchmarks

use criterion::{Criterion, criterion_group, criterion_main};
use evo_bridge::{BridgeEvent, decode, parse_mapping};
use std::hint::black_box;
use std::sync::Arc;

/// Mapping resembling a small robot state struct.
fn robot_mapping() -> String {
    let mut mapping = String::from("state.state:0:uint8_t\n");
    mapping.push_str("state.sensor_state.raw_data:2:uint16_t[16]\n");
    mapping.push_str("state.sensor_state.data:40:double[16]\n");
    for i in 0..32 {
        mapping.push_str(&format!("state.drive_state.axis_{i}.position:{}:double\n", 200 + i * 16));
        mapping.push_str(&format!("state.drive_state.axis_{i}.speed:{}:float\n", 208 + i * 16));
        mapping.push_str(&format!("state.drive_state.axis_{i}.enabled:{}:bool\n", 212 + i * 16));
    }
    mapping
}

/// Benchmark decoding a full 4 KiB snapshot
fn bench_decode(c: &mut Criterion) {
    let layout = parse_mapping(&robot_mapping()).unwrap();
    let snapshot: Vec<u8> = (0..4096).map(|i| (i % 251) as u8).collect();

    c.bench_function("decode_robot_state", |b| {
        b.iter(|| black_box(decode(black_box(&snapshot), &layout)));
    });
}

/// Benchmark snapshot comparison used for change suppression
fn bench_snapshot_compare(c: &mut Criterion) {
    let a = vec![0x5Au8; 4096];
    let b_buf = a.clone();

    c.bench_function("compare_4k_snapshot", |b| {
        b.iter(|| black_box(black_box(&a) == black_box(&b_buf)));
    });
}

/// Benchmark serializing a state event to its wire form
fn bench_state_json(c: &mut Criterion) {
    let layout = parse_mapping(&robot_mapping()).unwrap();
    let snapshot = vec![0u8; 4096];
    let event = BridgeEvent::State(Arc::new(decode(&snapshot, &layout)));

    c.bench_function("state_event_to_json", |b| {
        b.iter(|| black_box(event.to_json().unwrap()));
    });
}

/// Benchmark parsing the mapping block
fn bench_parse_mapping(c: &mut Criterion) {
    let mapping = robot_mapping();

    c.bench_function("parse_mapping_99_fields", |b| {
        b.iter(|| black_box(parse_mapping(black_box(&mapping)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_decode,
    bench_snapshot_compare,
    bench_state_json,
    bench_parse_mapping
);
criterion_main!(benches);
