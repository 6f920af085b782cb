#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use filecrypt_core::crypto::{
        decrypt_chunk, derive_nonce_12_tls_style, derive_stream_key, encrypt_chunk, encrypt_framed, init_decryption,
        init_encryption, verify_final_position, CipherSuite, CryptoError, FrameDecoder, FrameError, FramedDecryptor,
        NonceError, SecretKey, StreamHeader, CHUNK_OVERHEAD,
    };

    const SUITES: [CipherSuite; 2] = [CipherSuite::Aes256Gcm, CipherSuite::ChaCha20Poly1305];

    fn key(b: u8) -> SecretKey {
        SecretKey::new([b; 32])
    }

    /// Seal `parts` as one stream, the last part flagged final.
    fn seal_all(key: &SecretKey, suite: CipherSuite, parts: &[&[u8]]) -> (StreamHeader, Vec<Vec<u8>>) {
        let (mut enc, header) = init_encryption(key, suite).unwrap();
        let sealed = parts
            .iter()
            .enumerate()
            .map(|(i, p)| encrypt_chunk(&mut enc, p, i + 1 == parts.len()).unwrap())
            .collect();
        (header, sealed)
    }

    // # ✅ 1. Round trip
    #[test]
    fn three_chunks_round_trip_on_both_suites() {
        let parts: [&[u8]; 3] = [b"alpha", b"", b"omega!"];
        for suite in SUITES {
            let (header, sealed) = seal_all(&key(7), suite, &parts);
            assert_eq!(header.suite, suite);

            let mut dec = init_decryption(&key(7), &header).unwrap();
            for (i, (ct, pt)) in sealed.iter().zip(parts).enumerate() {
                assert_eq!(ct.len(), pt.len() + CHUNK_OVERHEAD);
                let opened = decrypt_chunk(&mut dec, ct).unwrap();
                verify_final_position(&opened, i == 2).unwrap();
                assert_eq!(&opened.data[..], pt);
            }
            assert!(dec.is_finished());
            assert_eq!(dec.chunks_opened(), 3);
        }
    }

    #[test]
    fn headers_are_fresh_per_stream() {
        let (_, a) = init_encryption(&key(1), CipherSuite::default()).unwrap();
        let (_, b) = init_encryption(&key(1), CipherSuite::default()).unwrap();
        assert_ne!(a.salt, b.salt);
        assert!(a.salt.iter().any(|&x| x != 0));
    }

    // # ✅ 2. Authentication failures
    #[test]
    fn wrong_key_fails_on_first_chunk() {
        let (header, sealed) = seal_all(&key(1), CipherSuite::ChaCha20Poly1305, &[b"secret"]);
        let mut dec = init_decryption(&key(2), &header).unwrap();
        let err = decrypt_chunk(&mut dec, &sealed[0]).unwrap_err();
        assert!(matches!(err, CryptoError::TagMismatch));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn failed_open_closes_the_stream() {
        let (header, mut sealed) = seal_all(&key(9), CipherSuite::Aes256Gcm, &[b"one", b"two"]);
        let mut dec = init_decryption(&key(9), &header).unwrap();

        sealed[0][0] ^= 0x80;
        assert!(matches!(decrypt_chunk(&mut dec, &sealed[0]), Err(CryptoError::TagMismatch)));
        assert!(dec.is_finished());
        assert_eq!(dec.chunks_opened(), 1);
        assert!(matches!(decrypt_chunk(&mut dec, &sealed[1]), Err(CryptoError::StreamFinished)));
    }

    #[test]
    fn bit_flip_in_middle_chunk_fails_before_final() {
        let (header, mut sealed) = seal_all(&key(3), CipherSuite::Aes256Gcm, &[b"one", b"two", b"three"]);
        sealed[1][2] ^= 0x01;

        let mut dec = init_decryption(&key(3), &header).unwrap();
        let first = decrypt_chunk(&mut dec, &sealed[0]).unwrap();
        assert!(!first.is_final);
        assert!(matches!(decrypt_chunk(&mut dec, &sealed[1]), Err(CryptoError::TagMismatch)));
    }

    #[test]
    fn reordered_chunks_fail() {
        let (header, sealed) = seal_all(&key(4), CipherSuite::ChaCha20Poly1305, &[b"a", b"b", b"c"]);
        let mut dec = init_decryption(&key(4), &header).unwrap();
        assert!(matches!(decrypt_chunk(&mut dec, &sealed[1]), Err(CryptoError::TagMismatch)));
    }

    #[test]
    fn tampered_header_changes_the_key() {
        let (mut header, sealed) = seal_all(&key(5), CipherSuite::ChaCha20Poly1305, &[b"payload"]);
        header.salt[0] ^= 0xFF;
        let mut dec = init_decryption(&key(5), &header).unwrap();
        assert!(matches!(decrypt_chunk(&mut dec, &sealed[0]), Err(CryptoError::TagMismatch)));
    }

    #[test]
    fn truncated_stream_is_caught_by_final_position() {
        let (header, sealed) = seal_all(&key(6), CipherSuite::Aes256Gcm, &[b"a", b"b", b"c"]);
        let mut dec = init_decryption(&key(6), &header).unwrap();

        decrypt_chunk(&mut dec, &sealed[0]).unwrap();
        let second = decrypt_chunk(&mut dec, &sealed[1]).unwrap();
        let err = verify_final_position(&second, true).unwrap_err();
        assert!(matches!(err, CryptoError::FinalTagMismatch { is_last: true, is_final: false }));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn early_final_is_a_position_mismatch() {
        let (header, sealed) = seal_all(&key(6), CipherSuite::Aes256Gcm, &[b"only"]);
        let mut dec = init_decryption(&key(6), &header).unwrap();
        let opened = decrypt_chunk(&mut dec, &sealed[0]).unwrap();
        assert!(matches!(
            verify_final_position(&opened, false),
            Err(CryptoError::FinalTagMismatch { is_last: false, is_final: true })
        ));
    }

    #[test]
    fn nothing_is_accepted_after_final() {
        let (mut enc, header) = init_encryption(&key(8), CipherSuite::ChaCha20Poly1305).unwrap();
        let last = encrypt_chunk(&mut enc, b"end", true).unwrap();
        assert!(enc.is_finished());
        assert!(matches!(encrypt_chunk(&mut enc, b"more", false), Err(CryptoError::StreamFinished)));

        let mut dec = init_decryption(&key(8), &header).unwrap();
        assert!(decrypt_chunk(&mut dec, &last).unwrap().is_final);
        assert!(matches!(decrypt_chunk(&mut dec, &last), Err(CryptoError::StreamFinished)));
    }

    // # ✅ 3. Header encoding
    #[test]
    fn header_bytes_and_hex_round_trip() {
        let header = StreamHeader::generate(CipherSuite::Aes256Gcm);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"FCS1");
        assert_eq!(bytes[4], 1);
        assert_eq!(bytes[6..8], [0x01u8, 0x00]);
        assert_eq!(StreamHeader::from_bytes(&bytes).unwrap(), header);
        assert_eq!(StreamHeader::from_hex(&header.to_hex()).unwrap(), header);
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let good = StreamHeader::generate(CipherSuite::ChaCha20Poly1305).to_bytes();

        assert!(matches!(StreamHeader::from_bytes(&good[..23]), Err(CryptoError::InvalidHeader(_))));

        let mut bad_magic = good;
        bad_magic[0] = b'X';
        assert!(matches!(StreamHeader::from_bytes(&bad_magic), Err(CryptoError::InvalidHeader(_))));

        let mut bad_version = good;
        bad_version[4] = 9;
        assert!(matches!(StreamHeader::from_bytes(&bad_version), Err(CryptoError::InvalidHeader(_))));

        let mut bad_reserved = good;
        bad_reserved[5] = 1;
        assert!(matches!(StreamHeader::from_bytes(&bad_reserved), Err(CryptoError::InvalidHeader(_))));

        let mut bad_suite = good;
        bad_suite[6] = 0x09;
        assert!(matches!(
            StreamHeader::from_bytes(&bad_suite),
            Err(CryptoError::UnsupportedCipher { cipher_id: 0x0009 })
        ));

        let mut zero_salt = good;
        zero_salt[8..].fill(0);
        assert!(matches!(
            StreamHeader::from_bytes(&zero_salt),
            Err(CryptoError::Nonce(NonceError::InvalidSalt))
        ));

        assert!(matches!(StreamHeader::from_hex("zz"), Err(CryptoError::InvalidHeader(_))));
    }

    // # ✅ 4. Keys, KDF and nonces
    #[test]
    fn secret_key_checks_length_and_redacts() {
        assert!(matches!(
            SecretKey::from_slice(&[0u8; 31]),
            Err(CryptoError::InvalidKeyLen { expected: 32, actual: 31 })
        ));
        let k = SecretKey::from_slice(&[0xAB; 32]).unwrap();
        assert_eq!(k.as_bytes(), &[0xAB; 32]);
        assert_eq!(format!("{:?}", k), "SecretKey([REDACTED])");
    }

    #[test]
    fn stream_key_depends_on_key_and_header() {
        let h1 = StreamHeader::generate(CipherSuite::Aes256Gcm);
        let h2 = StreamHeader::generate(CipherSuite::Aes256Gcm);
        let a = derive_stream_key(&key(1), &h1).unwrap();
        assert_eq!(a, derive_stream_key(&key(1), &h1).unwrap());
        assert_ne!(a, derive_stream_key(&key(2), &h1).unwrap());
        assert_ne!(a, derive_stream_key(&key(1), &h2).unwrap());
        assert_ne!(&a, key(1).as_bytes());
    }

    #[test]
    fn nonce_counter_is_xored_into_the_tail() {
        let salt = [0x11u8; 16];
        let n0 = derive_nonce_12_tls_style(&salt, 0).unwrap();
        let n1 = derive_nonce_12_tls_style(&salt, 1).unwrap();
        assert_eq!(n0, [0x11u8; 12]);
        assert_eq!(n1[4], 0x10);
        assert_eq!(&n1[..4], &n0[..4]);
        assert!(matches!(derive_nonce_12_tls_style(&[0u8; 16], 0), Err(NonceError::InvalidSalt)));
    }

    // # ✅ 5. Framed transport
    fn framed_stream(key: &SecretKey, parts: &[&[u8]]) -> (StreamHeader, Vec<u8>) {
        let (mut enc, header) = init_encryption(key, CipherSuite::ChaCha20Poly1305).unwrap();
        let mut wire = Vec::new();
        for (i, p) in parts.iter().enumerate() {
            wire.extend(encrypt_framed(&mut enc, p, i + 1 == parts.len()).unwrap());
        }
        (header, wire)
    }

    #[test]
    fn frames_without_final_are_rejected_at_finish() {
        let (mut enc, header) = init_encryption(&key(9), CipherSuite::ChaCha20Poly1305).unwrap();
        let wire = encrypt_framed(&mut enc, b"not the end", false).unwrap();

        let mut rx = FramedDecryptor::new(init_decryption(&key(9), &header).unwrap());
        assert_eq!(rx.push(&wire).unwrap().len(), 1);
        assert!(matches!(rx.finish(), Err(CryptoError::Frame(FrameError::MissingFinal))));
    }

    #[test]
    fn trailing_bytes_are_rejected_at_finish() {
        let (header, mut wire) = framed_stream(&key(9), &[b"x", b"y"]);
        wire.extend_from_slice(&[1, 2]);

        let mut rx = FramedDecryptor::new(init_decryption(&key(9), &header).unwrap());
        assert_eq!(rx.push(&wire).unwrap().len(), 2);
        assert!(matches!(rx.finish(), Err(CryptoError::Frame(FrameError::Truncated { buffered: 2 }))));
    }

    #[test]
    fn oversized_frame_is_rejected_before_buffering_it() {
        let mut decoder = FrameDecoder::new(10);
        decoder.push(&100u32.to_le_bytes());
        assert_eq!(decoder.next_frame(), Err(FrameError::TooLarge { len: 100, max: 10 }));
    }

    #[test]
    fn partial_frame_waits_for_more_bytes() {
        let mut decoder = FrameDecoder::default();
        decoder.push(&[3, 0, 0]);
        assert_eq!(decoder.next_frame(), Ok(None));
        decoder.push(&[0, b'a', b'b']);
        assert_eq!(decoder.next_frame(), Ok(None));
        decoder.push(b"c");
        assert_eq!(decoder.next_frame().unwrap().as_deref(), Some(&b"abc"[..]));
        assert_eq!(decoder.buffered(), 0);
        assert!(decoder.finish().is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_framed_stream_survives_any_split(
            parts in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..200), 1..6),
            cuts in proptest::collection::vec(1usize..64, 1..40),
        ) {
            let refs: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
            let (header, wire) = framed_stream(&key(10), &refs);

            let mut rx = FramedDecryptor::new(init_decryption(&key(10), &header).unwrap());
            let mut opened = Vec::new();
            let mut rest = &wire[..];
            for cut in cuts.iter().cycle() {
                if rest.is_empty() {
                    break;
                }
                let (head, tail) = rest.split_at((*cut).min(rest.len()));
                opened.extend(rx.push(head).unwrap());
                rest = tail;
            }
            rx.finish().unwrap();

            prop_assert_eq!(opened.len(), parts.len());
            for (i, (chunk, part)) in opened.iter().zip(&parts).enumerate() {
                prop_assert_eq!(&chunk.data[..], &part[..]);
                prop_assert_eq!(chunk.is_final, i + 1 == parts.len());
            }
        }
    }
}
