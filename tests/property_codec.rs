//! Property-based tests for the word codec and chunk addressing
//!
//! Uses proptest to check packing invariants across random inputs

use proptest::prelude::*;
use wordstore::{ChunkedData, Word, WordCodec};

proptest! {
    #[test]
    fn prop_round_trip_pads_to_whole_words(
        width in 1usize..=6,
        bytes in prop::collection::vec(any::<u8>(), 0..200)
    ) {
        let codec = WordCodec::new(width).unwrap();
        let words = codec.encode(&bytes);
        prop_assert_eq!(words.len(), bytes.len().div_ceil(width));

        let decoded = codec.decode(&words);
        let mut expected = bytes.clone();
        expected.resize(words.len() * width, 0);
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn prop_words_stay_below_limit(
        width in 1usize..=6,
        bytes in prop::collection::vec(any::<u8>(), 1..64)
    ) {
        let codec = WordCodec::new(width).unwrap();
        for word in codec.encode(&bytes) {
            prop_assert!(word < codec.word_limit());
        }
    }

    #[test]
    fn prop_digit_extraction(value in 0u64..(1u64 << 48), j in 0usize..6) {
        let codec = WordCodec::default();
        let expected = (value / 256u64.pow((5 - j) as u32)) % 256;
        prop_assert_eq!(u64::from(codec.extract_byte(value, j)), expected);

        // The host's float formula agrees for every representable word
        prop_assert_eq!(codec.host_extract_byte(value as f64, j), expected as f64);
    }

    #[test]
    fn prop_extracted_bytes_reassemble(value in 0u64..(1u64 << 48)) {
        let codec = WordCodec::default();
        let bytes: Vec<u8> = (0..6).map(|j| codec.extract_byte(value, j)).collect();
        prop_assert_eq!(codec.encode_word(&bytes), value);
    }

    #[test]
    fn prop_host_reads_away_from_boundaries(
        chunk_size in 2usize..50,
        len in 1usize..400
    ) {
        let stream: Vec<Word> = (1..=len as Word).collect();
        let data = ChunkedData::from_stream(&stream, chunk_size, 1);

        for index in 1..=len {
            let read = data.read(index as i64);
            if index % chunk_size != 0 {
                prop_assert_eq!(read, data.word(index - 1));
            } else if data.num_chunks() > 1 {
                // Boundary index: next chunk's selector, this chunk's offset
                let chunk = (index / chunk_size).min(data.num_chunks() - 1);
                prop_assert_eq!(read, Some(data.chunks()[chunk][chunk_size - 1]));
            }
        }
    }
}
