#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use filecrypt_core::compression::{
        compress_chunk, decompress_chunk, init_compression, init_decompression, CompressionCodec, CompressionError,
        DECOMPRESS_WINDOW,
    };

    const CODECS: [CompressionCodec; 2] = [CompressionCodec::Deflate, CompressionCodec::Zstd];

    fn sample(len: usize) -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog. "
            .iter()
            .cycle()
            .take(len)
            .copied()
            .collect()
    }

    /// Compress `data` in `step`-sized pushes, then decompress the output in
    /// `split`-sized pushes.
    fn round_trip(codec: CompressionCodec, data: &[u8], step: usize, split: usize) -> Vec<u8> {
        let mut enc = init_compression(codec, None).unwrap();
        let mut compressed = Vec::new();
        let pieces: Vec<&[u8]> = data.chunks(step.max(1)).collect();
        for (i, piece) in pieces.iter().enumerate() {
            compressed.extend(compress_chunk(&mut enc, piece, i + 1 == pieces.len()).unwrap());
        }
        if pieces.is_empty() {
            compressed.extend(compress_chunk(&mut enc, &[], true).unwrap());
        }
        assert!(enc.is_finished());

        let mut dec = init_decompression(codec).unwrap();
        let mut plain = Vec::new();
        let pieces: Vec<&[u8]> = compressed.chunks(split.max(1)).collect();
        for (i, piece) in pieces.iter().enumerate() {
            plain.extend(decompress_chunk(&mut dec, piece, i + 1 == pieces.len()).unwrap());
        }
        plain
    }

    // # ✅ 1. Round trips
    #[test]
    fn both_codecs_round_trip_and_shrink_text() {
        let data = sample(64 * 1024);
        for codec in CODECS {
            let mut enc = init_compression(codec, None).unwrap();
            let compressed = compress_chunk(&mut enc, &data, true).unwrap();
            assert!(compressed.len() < data.len() / 4, "{:?} should compress repetitive text", codec);
            assert_eq!(round_trip(codec, &data, 1000, 7), data);
        }
    }

    #[test]
    fn empty_stream_round_trips() {
        for codec in CODECS {
            assert!(round_trip(codec, &[], 1, 1).is_empty());
        }
    }

    #[test]
    fn explicit_levels_are_honoured() {
        let data = sample(10_000);
        for (codec, level) in [(CompressionCodec::Deflate, 0), (CompressionCodec::Deflate, 9), (CompressionCodec::Zstd, 19)] {
            let mut enc = init_compression(codec, Some(level)).unwrap();
            let out = compress_chunk(&mut enc, &data, true).unwrap();
            let mut dec = init_decompression(codec).unwrap();
            assert_eq!(decompress_chunk(&mut dec, &out, true).unwrap(), data);
        }
    }

    // # ✅ 2. State lifecycle and errors
    #[test]
    fn push_after_final_is_rejected() {
        for codec in CODECS {
            let mut enc = init_compression(codec, None).unwrap();
            let out = compress_chunk(&mut enc, b"abc", true).unwrap();
            assert!(matches!(compress_chunk(&mut enc, b"more", false), Err(CompressionError::Finished)));

            let mut dec = init_decompression(codec).unwrap();
            decompress_chunk(&mut dec, &out, true).unwrap();
            assert!(matches!(decompress_chunk(&mut dec, &out, true), Err(CompressionError::Finished)));
        }
    }

    #[test]
    fn out_of_range_levels_fail_at_init() {
        assert!(matches!(
            init_compression(CompressionCodec::Deflate, Some(10)),
            Err(CompressionError::InvalidLevel { codec: "deflate", level: 10 })
        ));
        assert!(matches!(
            init_compression(CompressionCodec::Zstd, Some(0)),
            Err(CompressionError::InvalidLevel { codec: "zstd", level: 0 })
        ));
    }

    #[test]
    fn garbage_input_fails_to_decompress() {
        for codec in CODECS {
            let mut dec = init_decompression(codec).unwrap();
            let res = decompress_chunk(&mut dec, &[0xFF; 64], true);
            assert!(matches!(res, Err(CompressionError::CodecProcessFailed { .. })), "{:?}", codec);
        }
    }

    #[test]
    fn byte_counters_track_both_sides() {
        let data = sample(5000);
        let mut enc = init_compression(CompressionCodec::Zstd, None).unwrap();
        let mut total_out = 0;
        for piece in data.chunks(1000) {
            total_out += compress_chunk(&mut enc, piece, false).unwrap().len();
        }
        total_out += compress_chunk(&mut enc, &[], true).unwrap().len();
        assert_eq!(enc.bytes_in(), 5000);
        assert_eq!(enc.bytes_out(), total_out as u64);
        assert_eq!(enc.codec(), CompressionCodec::Zstd);
    }

    #[test]
    fn codec_ids_are_stable() {
        assert_eq!(CompressionCodec::Deflate.id(), 1);
        assert_eq!(CompressionCodec::from_id(2).unwrap(), CompressionCodec::Zstd);
        assert!(matches!(CompressionCodec::from_id(9), Err(CompressionError::UnsupportedCodec { codec_id: 9 })));
        assert_eq!(CompressionCodec::default(), CompressionCodec::Deflate);
    }

    #[test]
    fn truncated_stream_fails_on_final_push() {
        for codec in CODECS {
            let mut enc = init_compression(codec, None).unwrap();
            let out = compress_chunk(&mut enc, &sample(4096), true).unwrap();

            let mut dec = init_decompression(codec).unwrap();
            let res = decompress_chunk(&mut dec, &out[..out.len() - 3], true);
            assert!(matches!(res, Err(CompressionError::CodecProcessFailed { .. })), "{:?}", codec);
            assert!(dec.is_finished());
        }
    }

    #[test]
    fn bytes_after_end_of_stream_are_rejected() {
        for codec in CODECS {
            let mut enc = init_compression(codec, None).unwrap();
            let mut out = compress_chunk(&mut enc, b"short", true).unwrap();
            out.extend_from_slice(b"junk");

            let mut dec = init_decompression(codec).unwrap();
            let res = decompress_chunk(&mut dec, &out, true);
            assert!(matches!(res, Err(CompressionError::CodecProcessFailed { .. })), "{:?}", codec);
        }
    }

    // # ✅ 3. Bounded output windows
    #[test]
    fn zeros_inflate_in_bounded_windows() {
        let data = vec![0u8; 4 * 1024 * 1024];
        for codec in CODECS {
            let mut enc = init_compression(codec, None).unwrap();
            let compressed = compress_chunk(&mut enc, &data, true).unwrap();
            assert!(compressed.len() < 64 * 1024);

            let mut dec = init_decompression(codec).unwrap().with_window(100_000);
            assert_eq!(dec.window_size(), 100_000);
            let mut largest = 0;
            let mut total = 0;
            dec.push_into(&compressed, true, |piece: &[u8]| -> Result<(), CompressionError> {
                assert!(piece.iter().all(|&b| b == 0));
                largest = largest.max(piece.len());
                total += piece.len();
                Ok(())
            })
            .unwrap();

            assert!(largest <= 100_000, "{:?} emitted {} bytes at once", codec, largest);
            assert_eq!(total, data.len());
            assert_eq!(dec.bytes_out(), data.len() as u64);
        }
    }

    #[test]
    fn default_window_caps_each_piece() {
        let data = vec![7u8; 3 * DECOMPRESS_WINDOW];
        let mut enc = init_compression(CompressionCodec::Deflate, None).unwrap();
        let compressed = compress_chunk(&mut enc, &data, true).unwrap();

        let mut dec = init_decompression(CompressionCodec::Deflate).unwrap();
        let mut pieces = Vec::new();
        dec.push_into(&compressed, true, |piece: &[u8]| -> Result<(), CompressionError> {
            pieces.push(piece.len());
            Ok(())
        })
        .unwrap();
        assert!(pieces.len() >= 3);
        assert!(pieces.iter().all(|&n| n <= DECOMPRESS_WINDOW));
    }

    #[test]
    fn emitter_error_stops_decoding() {
        let mut enc = init_compression(CompressionCodec::Zstd, None).unwrap();
        let compressed = compress_chunk(&mut enc, &vec![1u8; 500_000], true).unwrap();

        let mut dec = init_decompression(CompressionCodec::Zstd).unwrap().with_window(1000);
        let mut calls = 0;
        let res = dec.push_into(&compressed, true, |_: &[u8]| -> Result<(), CompressionError> {
            calls += 1;
            if calls == 3 {
                return Err(CompressionError::Finished);
            }
            Ok(())
        });
        assert!(matches!(res, Err(CompressionError::Finished)));
        assert_eq!(calls, 3);
    }

    // # ✅ 4. Arbitrary chunk boundaries
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_round_trip_any_boundaries(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            step in 1usize..700,
            split in 1usize..300,
            zstd in any::<bool>(),
        ) {
            let codec = if zstd { CompressionCodec::Zstd } else { CompressionCodec::Deflate };
            prop_assert_eq!(round_trip(codec, &data, step, split), data);
        }
    }
}
