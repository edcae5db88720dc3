#![no_main]

use compat_uqm::ls2;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = ls2::parse_index(text);
    }
});
