#![no_main]
use libfuzzer_sys::fuzz_target;

// Arbitrary text must be rejected by parse or validate, never panic.
fuzz_target!(|data: &str| {
    if let Ok(cfg) = blinds_config::load_toml(data) {
        let _ = cfg.validate();
    }
});
