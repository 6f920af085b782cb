//! processor/pipeline.rs
//! Synchronous seal and open paths for one file.
//!
//! Seal: metadata → split(read size) → compress → collect(cipher size) →
//! encrypt → sink.
//! Open: metadata → split(cipher size + overhead) → decrypt, check final
//! position → collect(read size) → decompress → sink.
//!
//! Each path holds at most one read chunk plus one collector buffer in
//! memory, never the whole file. Decoded output reaches the sink in windows
//! no larger than the read chunk size.

use std::io::Write;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::debug;

use crate::chunk::{Chunk, ChunkCollector, Splitter};
use crate::compression::{
    init_compression, init_decompression, CompressionState, DecompressionState, DECOMPRESS_WINDOW,
};
use crate::container::{encode_metadata, read_metadata, Metadata};
use crate::crypto::{
    decrypt_chunk, encrypt_chunk, init_decryption, init_encryption, verify_final_position, DecryptState,
    EncryptState, SecretKey, CHUNK_OVERHEAD,
};
use crate::io::{open_output, InputSource, OutputSink};
use crate::processor::progress::{Phase, WeightedProgress};
use crate::processor::types::ProcessorConfig;
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;
use crate::utils::{file_extension, percent};

/// Result of one successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub output_name: String,
    pub telemetry: TelemetrySnapshot,
    /// Input bytes consumed, including any metadata region.
    pub bytes_in: u64,
}

/// True if `name` carries the configured container extension.
pub fn is_container(config: &ProcessorConfig, name: &str) -> bool {
    let wanted = config.container_extension.trim_start_matches('.').to_ascii_lowercase();
    file_extension(name).is_some_and(|ext| ext == wanted)
}

/// Seal or open, depending on the input name.
pub fn process_file(
    config: &ProcessorConfig,
    input: &InputSource,
    key: &SecretKey,
    sink: OutputSink,
    on_progress: &mut dyn FnMut(u8),
) -> Result<PipelineOutput, StreamError> {
    if is_container(config, &input.name()) {
        open_container(config, input, key, sink, on_progress)
    } else {
        seal_file(config, input, key, sink, on_progress)
    }
}

/// Plain file → container.
pub fn seal_file(
    config: &ProcessorConfig,
    input: &InputSource,
    key: &SecretKey,
    sink: OutputSink,
    on_progress: &mut dyn FnMut(u8),
) -> Result<PipelineOutput, StreamError> {
    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();

    let input_name = input.name();
    let output_name = format!("{}.{}", input_name, config.container_extension.trim_start_matches('.'));

    let mut source = input.open()?;
    let total_len = source.total_len()?;

    let (enc, header) = init_encryption(key, config.cipher_suite)?;
    let meta = Metadata::new(input_name.as_str(), &header, config.codec, config.cipher_chunk_size);
    let meta_bytes = encode_metadata(&meta)?;

    let mut out = open_output(sink, &output_name)?;
    timer.time(Stage::Write, || out.write_all(&meta_bytes))?;
    counters.add_metadata(meta_bytes.len());
    on_progress(0);

    debug!(input = %input_name, len = total_len, codec = ?config.codec, suite = ?config.cipher_suite, "sealing");

    let mut sealer = Sealer {
        enc,
        compressor: init_compression(config.codec, config.compression_level)?,
        collector: ChunkCollector::new(config.cipher_chunk_size),
        out,
        timer,
        counters,
        progress: WeightedProgress::default(),
        compressed_total: 0,
        sealed_total: 0,
        on_progress,
    };

    if total_len == 0 {
        sealer.push(&[], true, 100.0)?;
    } else {
        let mut splitter = Splitter::new(&mut source, config.read_chunk_size, 0)?;
        while let Some(chunk) = sealer.timer.time(Stage::Read, || splitter.next()) {
            let chunk = chunk?;
            let read_pct = f32::from(percent(chunk.id + 1, chunk.total_chunks));
            sealer.push(&chunk.data, chunk.is_last(), read_pct)?;
        }
    }

    let Sealer { mut out, mut timer, counters, .. } = sealer;
    timer.time(Stage::Write, || out.flush())?;
    timer.finish();

    Ok(PipelineOutput {
        output_name,
        telemetry: TelemetrySnapshot::from(&counters, &timer),
        bytes_in: total_len,
    })
}

/// Container → original file.
pub fn open_container(
    config: &ProcessorConfig,
    input: &InputSource,
    key: &SecretKey,
    sink: OutputSink,
    on_progress: &mut dyn FnMut(u8),
) -> Result<PipelineOutput, StreamError> {
    let mut timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();

    let mut source = input.open()?;
    let total_len = source.total_len()?;
    let (meta, payload_offset) = timer.time(Stage::Read, || read_metadata(&mut source))?;
    counters.add_metadata(payload_offset as usize);

    let header = meta.stream_header()?;
    let dec = init_decryption(key, &header)?;
    let decompressor = init_decompression(meta.codec)?.with_window(config.read_chunk_size.min(DECOMPRESS_WINDOW));

    let output_name = meta.file_name.clone();
    let out = open_output(sink, &output_name)?;
    on_progress(0);

    debug!(input = %input.name(), output = %output_name, len = total_len, "opening");

    let mut opener = Opener {
        dec,
        decompressor,
        collector: ChunkCollector::new(config.read_chunk_size),
        out,
        timer,
        counters,
        progress: WeightedProgress::default(),
        opened_total: 0,
        drained_total: 0,
        on_progress,
    };

    let mut splitter = Splitter::new(&mut source, meta.chunk_size + CHUNK_OVERHEAD, payload_offset)?;
    while let Some(chunk) = opener.timer.time(Stage::Read, || splitter.next()) {
        opener.push(&chunk?)?;
    }

    let Opener { mut out, mut timer, counters, .. } = opener;
    timer.time(Stage::Write, || out.flush())?;
    timer.finish();

    Ok(PipelineOutput {
        output_name,
        telemetry: TelemetrySnapshot::from(&counters, &timer),
        bytes_in: total_len,
    })
}

struct Sealer<'a> {
    enc: EncryptState,
    compressor: CompressionState,
    collector: ChunkCollector,
    out: Box<dyn Write + Send>,
    timer: TelemetryTimer,
    counters: TelemetryCounters,
    progress: WeightedProgress,
    compressed_total: u64,
    sealed_total: u64,
    on_progress: &'a mut dyn FnMut(u8),
}

impl Sealer<'_> {
    fn push(&mut self, data: &[u8], is_final: bool, read_pct: f32) -> Result<(), StreamError> {
        let Self {
            enc,
            compressor,
            collector,
            out,
            timer,
            counters,
            progress,
            compressed_total,
            sealed_total,
            on_progress,
        } = self;

        let compressed = timer.time(Stage::Compress, || compressor.push(data, is_final))?;
        counters.add_chunk_in();
        counters.add_plain(data.len());
        counters.add_compressed(compressed.len());
        *compressed_total += compressed.len() as u64;

        if let Some(p) = progress.update(Phase::First, read_pct) {
            (*on_progress)(p);
        }

        collector.push(&compressed, is_final, |piece: Bytes, last: bool| -> Result<(), StreamError> {
            let sealed = timer.time(Stage::Encrypt, || encrypt_chunk(enc, &piece, last))?;
            timer.time(Stage::Write, || out.write_all(&sealed))?;
            counters.add_chunk_out();
            counters.add_cipher_chunk(sealed.len());
            *sealed_total += piece.len() as u64;
            Ok(())
        })?;

        let sealed_pct = share(*sealed_total, *compressed_total, is_final) * read_pct;
        if let Some(p) = progress.update(Phase::Second, sealed_pct) {
            (*on_progress)(p);
        }
        Ok(())
    }
}

struct Opener<'a> {
    dec: DecryptState,
    decompressor: DecompressionState,
    collector: ChunkCollector,
    out: Box<dyn Write + Send>,
    timer: TelemetryTimer,
    counters: TelemetryCounters,
    progress: WeightedProgress,
    opened_total: u64,
    drained_total: u64,
    on_progress: &'a mut dyn FnMut(u8),
}

impl Opener<'_> {
    fn push(&mut self, chunk: &Chunk) -> Result<(), StreamError> {
        let Self {
            dec,
            decompressor,
            collector,
            out,
            timer,
            counters,
            progress,
            opened_total,
            drained_total,
            on_progress,
        } = self;

        let opened = timer.time(Stage::Decrypt, || decrypt_chunk(dec, &chunk.data))?;
        verify_final_position(&opened, chunk.is_last())?;
        counters.add_chunk_in();
        counters.add_cipher_chunk(chunk.len());
        counters.add_compressed(opened.data.len());
        *opened_total += opened.data.len() as u64;

        let read_pct = f32::from(percent(chunk.id + 1, chunk.total_chunks));
        if let Some(p) = progress.update(Phase::First, read_pct) {
            (*on_progress)(p);
        }

        collector.push(&opened.data, opened.is_final, |piece: Bytes, last: bool| -> Result<(), StreamError> {
            let started = Instant::now();
            let mut writing = Duration::ZERO;
            let mut plain_len = 0;
            decompressor.push_into(&piece, last, |window: &[u8]| -> Result<(), StreamError> {
                let write_started = Instant::now();
                out.write_all(window)?;
                writing += write_started.elapsed();
                plain_len += window.len();
                Ok(())
            })?;
            timer.add_stage_time(Stage::Decompress, started.elapsed().saturating_sub(writing));
            timer.add_stage_time(Stage::Write, writing);

            counters.add_chunk_out();
            counters.add_plain(plain_len);
            *drained_total += piece.len() as u64;
            Ok(())
        })?;

        let drained_pct = share(*drained_total, *opened_total, opened.is_final) * read_pct;
        if let Some(p) = progress.update(Phase::Second, drained_pct) {
            (*on_progress)(p);
        }
        Ok(())
    }
}

/// Fraction of `total` already passed downstream.
fn share(done: u64, total: u64, is_final: bool) -> f32 {
    if is_final || total == 0 {
        return if is_final { 1.0 } else { 0.0 };
    }
    (done as f64 / total as f64).min(1.0) as f32
}
