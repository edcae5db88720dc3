#![no_main]

use compat_uqm::rmp;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = rmp::parse_map(text);
    }
});
