#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use onerep::config::ConfigLoader;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data) {
        let loader = ConfigLoader::default();
        let _ = loader.load_from_str(yaml, Path::new("fuzz.yaml"));
    }
});
