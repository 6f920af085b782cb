#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use filecrypt_core::compression::CompressionCodec;
    use filecrypt_core::container::{
        decode_metadata, encode_metadata, read_metadata, ContainerError, Metadata, METADATA_PREFIX_LEN,
    };
    use filecrypt_core::crypto::{CipherSuite, StreamHeader};

    fn meta() -> Metadata {
        let header = StreamHeader::generate(CipherSuite::ChaCha20Poly1305);
        Metadata::new("report.pdf", &header, CompressionCodec::Zstd, 4096)
    }

    // # ✅ 1. Encode / decode
    #[test]
    fn metadata_round_trips_through_a_container() {
        let m = meta();
        let mut container = encode_metadata(&m).unwrap();
        let meta_len = container.len() as u64;
        container.extend_from_slice(b"payload bytes");

        let mut source = Bytes::from(container);
        let (decoded, offset) = read_metadata(&mut source).unwrap();
        assert_eq!(decoded, m);
        assert_eq!(offset, meta_len);
        assert_eq!(&source[offset as usize..], b"payload bytes");
        assert_eq!(decoded.stream_header().unwrap().suite, CipherSuite::ChaCha20Poly1305);
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let bytes = encode_metadata(&meta()).unwrap();
        let json = std::str::from_utf8(&bytes[METADATA_PREFIX_LEN + 4..bytes.len() - 4]).unwrap();
        assert!(json.contains("\"fileName\":\"report.pdf\""));
        assert!(json.contains("\"chunkSize\":4096"));
        assert!(json.contains("\"codec\":\"zstd\""));
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let header = StreamHeader::generate(CipherSuite::Aes256Gcm).to_hex();
        let json = format!("{{\"fileName\":\"a.txt\",\"header\":\"{}\"}}", header);

        let mut body = b"HJM1".to_vec();
        body.extend_from_slice(json.as_bytes());
        body.extend_from_slice(&crc32fast::hash(json.as_bytes()).to_le_bytes());

        let m = decode_metadata(&body).unwrap();
        assert_eq!(m.codec, CompressionCodec::Deflate);
        assert_eq!(m.chunk_size, 30 * 1024 * 1024);
    }

    // # ✅ 2. Rejections
    fn body_of(m: &Metadata) -> Vec<u8> {
        encode_metadata(m).unwrap()[METADATA_PREFIX_LEN..].to_vec()
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut body = body_of(&meta());
        body[0] = b'Z';
        assert!(matches!(decode_metadata(&body), Err(ContainerError::InvalidMagic { .. })));
    }

    #[test]
    fn checksum_catches_edited_json() {
        let mut body = body_of(&meta());
        body[10] ^= 0x20;
        assert!(matches!(decode_metadata(&body), Err(ContainerError::ChecksumMismatch { .. })));
    }

    #[test]
    fn short_inputs_are_rejected() {
        assert!(matches!(decode_metadata(b"HJM"), Err(ContainerError::TooShort { have: 3, need: 8 })));

        let mut two = Bytes::from_static(&[1, 0]);
        assert!(matches!(read_metadata(&mut two), Err(ContainerError::TooShort { have: 2, need: 4 })));

        let mut truncated = Bytes::from(encode_metadata(&meta()).unwrap()[..20].to_vec());
        assert!(matches!(read_metadata(&mut truncated), Err(ContainerError::TooShort { have: 20, .. })));
    }

    #[test]
    fn absurd_length_prefix_is_rejected() {
        let mut src = Bytes::from(vec![0xFF, 0xFF, 0xFF, 0x7F, 0, 0]);
        assert!(matches!(read_metadata(&mut src), Err(ContainerError::MetadataTooLarge { .. })));
    }

    #[test]
    fn unusable_chunk_size_is_rejected() {
        let mut m = meta();
        m.chunk_size = 0;
        assert!(matches!(decode_metadata(&body_of(&m)), Err(ContainerError::InvalidChunkSize(0))));
    }

    #[test]
    fn invalid_header_is_rejected() {
        let mut m = meta();
        m.header = "00".repeat(24);
        assert!(matches!(decode_metadata(&body_of(&m)), Err(ContainerError::InvalidHeader(_))));
    }

    #[test]
    fn non_json_body_is_rejected() {
        let junk = b"not json at all";
        let mut body = b"HJM1".to_vec();
        body.extend_from_slice(junk);
        body.extend_from_slice(&crc32fast::hash(junk).to_le_bytes());
        assert!(matches!(decode_metadata(&body), Err(ContainerError::InvalidJson(_))));
    }
}
