#![no_main]

use libfuzzer_sys::fuzz_target;
use spindex::codec::vbyte;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode or fail cleanly; whatever decodes must
    // re-encode to the same bytes
    if let Ok(values) = vbyte::decode_all(data) {
        let reencoded = vbyte::encode_all(&values);
        // Codes with redundant leading zero groups decode but are not canonical
        if reencoded.len() == data.len() {
            assert_eq!(reencoded, data);
        }
    }
});
