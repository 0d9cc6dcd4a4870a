#![no_main]

use libfuzzer_sys::fuzz_target;
use spindex::codec::postings;

fuzz_target!(|data: &str| {
    // Index lines and pair lists from damaged files must fail cleanly
    if let Ok((_, _, body)) = postings::parse_line(data) {
        let _ = postings::parse_postings(body);
        let _ = postings::parse_vbyte_pairs(body);
        let _ = postings::parse_gamma_pairs(body);
    }
    let _ = postings::parse_gap_pairs(data);
});
