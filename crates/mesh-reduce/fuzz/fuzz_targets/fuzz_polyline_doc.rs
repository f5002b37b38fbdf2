#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Parsing arbitrary documents must never panic.
    let _ = mesh_reduce::polylines_from_str(text, "fuzz");
});
