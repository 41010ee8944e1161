//! Error handling tests: port range and numeric input validation

use portsweep::target::parse_port_input;
use portsweep::{PortRange, ScanError};
use proptest::prelude::*;

#[test]
fn test_documented_bad_ranges_rejected() {
    for (start, end) in [(0, 100), (100, 50), (1, 70000)] {
        match PortRange::new(start, end) {
            Err(ScanError::InvalidRange { start: s, end: e }) => {
                assert_eq!((s, e), (start, end));
            }
            other => panic!("expected InvalidRange for {}-{}, got {:?}", start, end, other),
        }
    }
}

#[test]
fn test_non_numeric_port_input() {
    for input in ["abc", "22a", "1.5", " ", "eighty"] {
        assert!(matches!(parse_port_input(input), Err(ScanError::InvalidInput(_))));
    }
}

proptest! {
    #[test]
    fn prop_range_accepts_exactly_valid_bounds(start in 0u32..70_000, end in 0u32..70_000) {
        let valid = start >= 1 && end <= 65_535 && start <= end;
        let result = PortRange::new(start, end);
        prop_assert_eq!(result.is_ok(), valid);

        if let Ok(range) = result {
            prop_assert_eq!(range.len(), (end - start + 1) as usize);
            prop_assert_eq!(range.iter().next(), Some(start as u16));
            prop_assert_eq!(range.iter().last(), Some(end as u16));
        }
    }

    #[test]
    fn prop_numeric_input_round_trips(n in 0u32..1_000_000) {
        prop_assert_eq!(parse_port_input(&format!("  {}\n", n)).unwrap(), n);
    }
}
