//! Wire codec benchmarks
//!
//! Measures the request encoders and response decoders of both protocols:
//! - QUIC varint encode/decode
//! - HPACK and QPACK literal header blocks
//! - HTTP/2 request encoding with body chunking
//! - HTTP/2 and HTTP/3 response read loops over in-memory buffers
//!
//! Run with: cargo bench --bench wire_codec

use bytes::{Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use wireprobe::http::h2::{
    self,
    codec::FrameCodec,
    frames::{DataFrame, HeadersFrame},
    hpack::{encode_header_block, HeaderBlockDecoder},
};
use wireprobe::http::h3::{self, qpack, varint};
use wireprobe::http::Message;

fn request(body_len: usize) -> Message {
    Message::new()
        .header(":method", "POST")
        .header(":scheme", "https")
        .header(":authority", "example.com")
        .header(":path", "/upload?kind=bench")
        .header("user-agent", "wireprobe-bench")
        .header("accept", "*/*")
        .header("x-id", "8f0e3c1e-6c52-4a4f-9b55-2fa1cf7fd8a1")
        .body(vec![0x5au8; body_len])
}

// ========== Varint ==========

fn bench_varint(c: &mut Criterion) {
    let mut group = c.benchmark_group("varint");

    for value in [37u64, 15_293, 494_878_333, 151_288_809_941_952_652] {
        group.bench_with_input(BenchmarkId::new("encode", value), &value, |b, &v| {
            let mut buf = BytesMut::with_capacity(8);
            b.iter(|| {
                buf.clear();
                varint::encode(black_box(v), &mut buf);
                black_box(&buf);
            });
        });

        let mut encoded = BytesMut::new();
        varint::encode(value, &mut encoded);
        group.bench_with_input(BenchmarkId::new("decode", value), &encoded, |b, encoded| {
            b.iter(|| {
                let mut buf = &encoded[..];
                black_box(varint::decode(&mut buf).unwrap());
            });
        });
    }

    group.finish();
}

// ========== Header blocks ==========

fn bench_header_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("header_blocks");
    let message = request(0);

    group.bench_function("hpack_encode", |b| {
        b.iter(|| black_box(encode_header_block(black_box(message.headers()))));
    });

    let block = encode_header_block(message.headers());
    group.bench_function("hpack_decode", |b| {
        let mut decoder = HeaderBlockDecoder::new();
        b.iter(|| {
            decoder.push_fragment(black_box(&block));
            black_box(decoder.finish().unwrap());
        });
    });

    group.bench_function("qpack_encode", |b| {
        b.iter(|| black_box(qpack::encode_header_block(black_box(message.headers()))));
    });

    let block = qpack::encode_header_block(message.headers());
    group.bench_function("qpack_decode", |b| {
        b.iter(|| black_box(qpack::decode_header_block(black_box(&block)).unwrap()));
    });

    group.finish();
}

// ========== Request encoding ==========

fn bench_request_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_encode");

    for size in [0usize, 1024, 65_536, 1024 * 1024] {
        let message = request(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("h2", size), &message, |b, m| {
            b.iter(|| black_box(h2::client::encode_request(black_box(m))));
        });
        group.bench_with_input(BenchmarkId::new("h3", size), &message, |b, m| {
            b.iter(|| black_box(h3::frames::encode_request(black_box(m))));
        });
    }

    group.finish();
}

// ========== Response read loops ==========

fn h2_response_wire(body_len: usize) -> Bytes {
    let mut encoder = hpack::Encoder::new();
    let block = encoder.encode(vec![
        (&b":status"[..], &b"200"[..]),
        (&b"content-type"[..], &b"application/octet-stream"[..]),
    ]);

    let mut wire = BytesMut::new();
    wire.extend_from_slice(&FrameCodec::encode_headers_frame(&HeadersFrame::new(
        1,
        Bytes::from(block),
        false,
        true,
    )));

    let body = vec![0xa5u8; body_len];
    let mut chunks = body.chunks(16_384).peekable();
    while let Some(chunk) = chunks.next() {
        let last = chunks.peek().is_none();
        let frame = DataFrame::new(1, Bytes::copy_from_slice(chunk), last);
        wire.extend_from_slice(&FrameCodec::encode_data_frame(&frame));
    }
    wire.freeze()
}

fn bench_response_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("response_decode");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    for size in [1024usize, 65_536, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));

        let wire = h2_response_wire(size);
        group.bench_with_input(BenchmarkId::new("h2", size), &wire, |b, wire| {
            b.iter(|| {
                let mut reader = Cursor::new(&wire[..]);
                black_box(h2::client::read_response(&mut reader).unwrap());
            });
        });

        let response = Message::new()
            .header(":status", "200")
            .body(vec![0xa5u8; size]);
        let wire = h3::frames::encode_request(&response);
        group.bench_with_input(BenchmarkId::new("h3", size), &wire, |b, wire| {
            let timed_out = AtomicBool::new(false);
            b.iter(|| {
                let mut reader = &wire[..];
                let decoded = runtime
                    .block_on(h3::client::read_response(&mut reader, &timed_out))
                    .unwrap();
                black_box(decoded);
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = codecs;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(500);
    targets =
        bench_varint,
        bench_header_blocks,
        bench_request_encode
}

criterion_group! {
    name = read_loops;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = bench_response_decode
}

criterion_main!(codecs, read_loops);
