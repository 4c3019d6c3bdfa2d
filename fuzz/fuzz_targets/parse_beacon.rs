#![no_main]

use libfuzzer_sys::fuzz_target;
use tracebus::networking::wire::parse_beacon;

fuzz_target!(|data: &[u8]| {
    let _ = parse_beacon(data);
});
