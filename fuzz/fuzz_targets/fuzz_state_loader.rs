#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(saved) = blinds_config::load_state_toml(data) {
        let c = saved.clamped();
        assert!(c.position <= 100);
        assert!(c.tilt_position.is_none_or(|t| t <= 100));
    }
});
