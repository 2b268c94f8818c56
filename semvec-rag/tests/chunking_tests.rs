//! Property tests for chunk coverage, size and overlap.

use semvec_rag::chunking::{BoundaryChunker, Chunk, Chunker, chunk};
use proptest::prelude::*;

/// Rebuild the original text by dropping each chunk's overlap with its predecessor.
fn stitch(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    let mut covered = 0;
    for chunk in chunks {
        assert!(chunk.start <= covered, "gap before chunk {}", chunk.index);
        out.extend(chunk.text.chars().skip(covered - chunk.start));
        covered = chunk.end;
    }
    out
}

fn arb_text() -> impl Strategy<Value = String> {
    // Words, sentence ends, paragraph breaks and some multi-byte characters.
    proptest::collection::vec(
        prop_oneof![
            "[a-zé]{1,9}".prop_map(|w| format!("{w} ")),
            Just(". ".to_string()),
            Just("!\n".to_string()),
            Just("\n\n".to_string()),
        ],
        1..120,
    )
    .prop_map(|parts| parts.concat())
}

/// **Property: window chunks reconstruct the input exactly**
/// *For any* non-empty text, chunk size and overlap fraction, removing each
/// chunk's overlap and concatenating yields the original text; every chunk
/// is at most `chunk_size` characters; consecutive chunks overlap by exactly
/// `round(chunk_size * overlap_fraction)` characters.
mod prop_window_chunks {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn cover_text_with_exact_overlap(
            text in arb_text(),
            chunk_size in 1usize..200,
            overlap_fraction in 0.0f32..0.95,
        ) {
            let overlap = (chunk_size as f32 * overlap_fraction).round() as usize;
            prop_assume!(overlap < chunk_size);

            let chunks = chunk(&text, chunk_size, overlap_fraction);

            prop_assert_eq!(stitch(&chunks), text.clone());
            prop_assert!(chunks.iter().all(|c| c.char_len() <= chunk_size));
            for (i, c) in chunks.iter().enumerate() {
                prop_assert_eq!(c.index, i);
            }
            for pair in chunks.windows(2) {
                prop_assert_eq!(pair[0].end - pair[1].start, overlap);
                prop_assert_eq!(pair[0].char_len(), chunk_size);
            }
        }

        #[test]
        fn short_text_is_one_chunk(text in arb_text(), extra in 0usize..50) {
            let chunk_size = text.chars().count() + extra;
            let chunks = chunk(&text, chunk_size, 0.2);
            prop_assert_eq!(chunks.len(), 1);
            prop_assert_eq!(&chunks[0].text, &text);
        }
    }
}

/// **Property: boundary chunks cover the input without gaps**
/// *For any* text, boundary-aware chunks stay within `chunk_size`, never
/// leave a gap, always move forward and end at the end of the text.
mod prop_boundary_chunks {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn cover_text_without_gaps(
            text in arb_text(),
            chunk_size in 1usize..200,
            overlap_fraction in 0.0f32..0.9,
        ) {
            let chunks = BoundaryChunker::new(chunk_size, overlap_fraction).chunk(&text);

            prop_assert_eq!(stitch(&chunks), text.clone());
            prop_assert!(chunks.iter().all(|c| c.char_len() <= chunk_size && c.char_len() > 0));
            for pair in chunks.windows(2) {
                prop_assert!(pair[1].start > pair[0].start);
                prop_assert!(pair[1].start <= pair[0].end);
            }
            prop_assert_eq!(chunks.last().map(|c| c.end), Some(text.chars().count()));
        }
    }
}
