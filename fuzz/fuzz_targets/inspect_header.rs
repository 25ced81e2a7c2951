#![no_main]

use libfuzzer_sys::fuzz_target;
use transform_lab::engine::inspect_header;

fuzz_target!(|data: &[u8]| {
    let _ = inspect_header(data);
});
