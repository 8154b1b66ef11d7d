use proptest::prelude::*;
use serelay::core::relay::{EscapeDetector, ESCAPE_SEQUENCE};

/// Offset of the byte completing the first escape sequence. The session
/// starts as if a carriage return had just been typed.
fn first_occurrence(data: &[u8]) -> Option<usize> {
    let mut framed = Vec::with_capacity(data.len() + 1);
    framed.push(b'\r');
    framed.extend_from_slice(data);
    framed
        .windows(ESCAPE_SEQUENCE.len())
        .position(|w| w == ESCAPE_SEQUENCE)
        .map(|start| start + ESCAPE_SEQUENCE.len() - 2)
}

/// Feeds `data` to a fresh detector in chunks cut at `cuts`, returning the
/// absolute offset of the byte that completed the sequence.
fn detect(data: &[u8], cuts: &[usize]) -> Option<usize> {
    let mut bounds: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
    bounds.push(0);
    bounds.push(data.len());
    bounds.sort_unstable();
    bounds.dedup();

    let mut detector = EscapeDetector::new();
    let mut hit = None;
    for pair in bounds.windows(2) {
        if let Some(i) = detector.find(&data[pair[0]..pair[1]]) {
            hit.get_or_insert(pair[0] + i);
        }
    }
    hit
}

// Bytes drawn mostly from the sequence's own alphabet so near misses are common
fn console_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            3 => Just(b'\r'),
            3 => Just(b'~'),
            3 => Just(b'.'),
            1 => any::<u8>(),
        ],
        0..64,
    )
}

proptest! {
    #[test]
    fn chunking_does_not_change_detection(
        data in console_bytes(),
        cuts in prop::collection::vec(any::<usize>(), 0..8),
    ) {
        prop_assert_eq!(detect(&data, &cuts), first_occurrence(&data));
    }

    #[test]
    fn embedded_sequence_is_always_found(
        prefix in console_bytes(),
        suffix in console_bytes(),
        cuts in prop::collection::vec(any::<usize>(), 0..8),
    ) {
        let mut data = prefix.clone();
        data.extend_from_slice(ESCAPE_SEQUENCE);
        data.extend_from_slice(&suffix);

        let found = detect(&data, &cuts);
        prop_assert!(found.is_some());
        prop_assert!(found.unwrap() <= prefix.len() + ESCAPE_SEQUENCE.len() - 1);
    }

    #[test]
    fn input_without_sequence_never_fires(
        data in prop::collection::vec(any::<u8>(), 0..256)
            .prop_filter("contains escape", |d| first_occurrence(d).is_none()),
    ) {
        let mut detector = EscapeDetector::new();
        for byte in &data {
            prop_assert!(!detector.scan(std::slice::from_ref(byte)));
        }
    }
}
