#![no_main]

use libfuzzer_sys::fuzz_target;
use spindex::codec::gamma;

fuzz_target!(|input: (Vec<u32>, Vec<u8>)| {
    let (values, bytes) = input;

    // Decoding arbitrary bytes must never panic
    let _ = gamma::decode(&bytes, bytes.len());

    // Every non-zero value survives a round trip
    let values: Vec<u32> = values.into_iter().filter(|&v| v > 0).collect();
    let stream = gamma::encode_all(&values).unwrap();
    assert_eq!(stream.decode_all().unwrap(), values);
});
