#![no_main]

use compat_uqm::descriptor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = descriptor::parse_descriptors(text);
    }
});
