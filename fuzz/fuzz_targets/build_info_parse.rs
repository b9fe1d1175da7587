#![no_main]

//! Fuzz target for reading persisted snapshots back.
//!
//! Malformed documents must come back as errors. Anything accepted must re-render to a
//! document that parses to the same snapshot.

use camino::Utf8Path;
use libfuzzer_sys::fuzz_target;
use vertrack_core::persist::{parse_build_info, parse_sdk_info, render_build_info};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let path = Utf8Path::new("fuzz/BuildInfo.json");

    let _ = parse_sdk_info(path, text);

    if let Ok(snapshot) = parse_build_info(path, text) {
        let rendered = render_build_info(&snapshot).expect("accepted snapshot renders");
        let reparsed = parse_build_info(path, &rendered).expect("rendered snapshot parses");
        assert_eq!(reparsed, snapshot);
    }
});
