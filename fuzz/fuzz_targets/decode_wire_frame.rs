#![no_main]

use libfuzzer_sys::fuzz_target;
use tracebus::core::codec::decode_frame_limited;
use tracebus::networking::wire::InboundCommand;

// Frame bodies never arrive on the wire unbounded; mirror the cap `read_frame`
// applies before calling into the codec.
const MAX_FRAME_LEN: usize = 4096;

fuzz_target!(|data: &[u8]| {
    let _ = decode_frame_limited::<InboundCommand>(data, MAX_FRAME_LEN);
});
