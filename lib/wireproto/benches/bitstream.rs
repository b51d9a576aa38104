use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wireproto::bitstream::BitStream;

fn compressed_roundtrip(c: &mut Criterion) {
    c.bench_function("compressed_u32 write+read", |b| {
        b.iter(|| {
            let mut bs = BitStream::new();
            bs.write_compressed_u32(black_box(0xDEAD_BEEF));
            black_box(bs.read_compressed_u32())
        })
    });
}

fn quaternion_roundtrip(c: &mut Criterion) {
    c.bench_function("norm_quat write+read", |b| {
        b.iter(|| {
            let mut bs = BitStream::new();
            bs.write_norm_quat(
                black_box(0.5),
                black_box(-0.5),
                black_box(0.5),
                black_box(-0.5),
            );
            black_box(bs.read_norm_quat())
        })
    });
}

fn huffman_string(c: &mut Criterion) {
    let msg = "the quick brown fox jumps over the lazy dog".repeat(4);
    c.bench_function("huffman string encode", |b| {
        b.iter(|| {
            let mut bs = BitStream::new();
            bs.write_compressed_string(black_box(&msg), None);
            black_box(bs.bytes_used())
        })
    });
}

criterion_group!(benches, compressed_roundtrip, quaternion_roundtrip, huffman_string);
criterion_main!(benches);
