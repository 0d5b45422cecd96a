#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = gomodscan::extract_bytes(data, &gomodscan::ScanConfig::default());
});
