#![no_main]

//! Fuzz target for manifest and file-name version extraction.
//!
//! Arbitrary text goes through every extraction path a probe applies to files it does not
//! control. None of them may panic.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use vertrack_probes::{extract_json_key, extract_xml_attribute, parse_manifest_file_name, split_spec};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    text: &'a str,
    element: &'a str,
    attribute: &'a str,
    contains: Option<&'a str>,
    delimiter: char,
    key_path: Vec<&'a str>,
}

fuzz_target!(|input: Input<'_>| {
    if let Ok(values) =
        extract_xml_attribute(input.text, input.element, input.attribute, input.contains)
    {
        for value in &values {
            let _ = split_spec(value, input.delimiter);
        }
    }

    // Both halves are slices of the input.
    let (name, version) = split_spec(input.text, input.delimiter);
    assert!(input.text.contains(name));
    assert!(input.text.contains(version));

    if let Some((name, version)) = parse_manifest_file_name(input.text) {
        assert!(!name.is_empty() && !version.is_empty());
        assert!(input.text.starts_with(name));
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(input.text) {
        let _ = extract_json_key(&value, &input.key_path);
    }
});
