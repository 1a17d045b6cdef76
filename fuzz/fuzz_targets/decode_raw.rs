#![no_main]

use errorkube_core::{RawEvent, decode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as an encoded payload.
    let _ = decode(RawEvent::encoded(Some("fuzz"), data));

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(raw) = RawEvent::from_json(text) {
        let event = decode(raw);
        let _ = serde_json::to_string(&event);
    }

    if let Ok(records) = RawEvent::parse_array(text) {
        for raw in records {
            let _ = decode(raw);
        }
    }
});
