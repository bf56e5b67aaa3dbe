//! Fuzz target for the whole pipeline.
//!
//! Arbitrary stop_times and shapes contents go through loading and every
//! default rule. No rule may fail.

#![no_main]

use arbitrary::Arbitrary;
use feedcheck::{FeedCheck, FeedCheckConfig, FeedReader};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    stop_times: &'a [u8],
    shapes: &'a [u8],
}

const STOPS: &[u8] = b"stop_id,stop_lat,stop_lon\nA,45.0,7.0\nB,45.01,7.01\n";
const TRIPS: &[u8] = b"route_id,service_id,trip_id,shape_id\nR,WK,T1,S1\n";

fuzz_target!(|input: Input| {
    if input.stop_times.len() + input.shapes.len() > 50_000 {
        return;
    }
    let reader = FeedReader::new();
    let mut tables = Vec::new();
    for (name, bytes) in [
        ("stops.txt", STOPS),
        ("trips.txt", TRIPS),
        ("stop_times.txt", input.stop_times),
        ("shapes.txt", input.shapes),
    ] {
        if let Ok((table, _)) = reader.read_bytes(name, bytes) {
            tables.push(table);
        }
    }

    let checker = FeedCheck::with_config(FeedCheckConfig {
        parallel: false,
        ..FeedCheckConfig::default()
    });
    if let Ok(result) = checker.validate_tables(tables) {
        assert!(result.summary.rules_failed.is_empty());
    }
});
