//! Fuzz target for the feed file reader.
//!
//! Arbitrary bytes must produce a table or an error, never a panic.

#![no_main]

use feedcheck::FeedReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }
    let _ = FeedReader::new().read_bytes("stop_times.txt", data);
});
