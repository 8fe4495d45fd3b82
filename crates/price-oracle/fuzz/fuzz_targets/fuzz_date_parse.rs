//! Fuzz target for the date header parser.
//!
//! ## Running
//!
//! ```bash
//! cd crates/price-oracle
//! cargo +nightly fuzz run fuzz_date_parse
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use price_oracle::{parse_date, validate_date};

fuzz_target!(|data: &[u8]| {
    let Ok(date) = parse_date(data) else {
        return;
    };

    // Accepted dates are always inside the component ranges
    assert!((1..=31).contains(&date.day));
    assert!((1..=12).contains(&date.month));
    assert!((2018..=3000).contains(&date.year));
    assert!(date.hour <= 23 && date.minute <= 59 && date.second <= 59);

    // Freshness is strict
    let timestamp = date.timestamp();
    assert_eq!(validate_date(data, timestamp - 1), Ok(timestamp));
    assert!(validate_date(data, timestamp).is_err());
});
