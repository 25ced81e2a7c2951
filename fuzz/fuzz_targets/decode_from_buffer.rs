#![no_main]

use libfuzzer_sys::fuzz_target;
use transform_lab::engine::{decode_image, EngineLimits};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // keep allocations small so the fuzzer explores codec paths, not memory
    let limits = match EngineLimits::custom(4_000_000, 4_096) {
        Ok(limits) => limits,
        Err(_) => return,
    };
    let _ = decode_image(data, &limits);
});
