use blinds_config::PersistedPosition;
use blinds_core::persist;

#[test]
fn missing_file_is_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let got = persist::load(&dir.path().join("state.toml")).expect("load");
    assert_eq!(got, None);
}

#[test]
fn save_then_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    // parent directory is created on demand
    let path = dir.path().join("var").join("state.toml");
    let pos = PersistedPosition {
        position: 63,
        tilt_position: Some(20),
    };
    persist::save(&path, &pos).expect("save");
    assert_eq!(persist::load(&path).expect("load"), Some(pos));
    assert!(!path.with_extension("new").exists());
}

#[test]
fn hand_edited_values_are_clamped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.toml");
    std::fs::write(&path, "position = 180\n").expect("write");
    let got = persist::load(&path).expect("load").expect("some");
    assert_eq!(got.position, 100);
    assert_eq!(got.tilt_position, None);
}

#[test]
fn garbage_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.toml");
    std::fs::write(&path, "position = \"half\"\n").expect("write");
    let err = persist::load(&path).expect_err("bad state");
    assert!(format!("{err:#}").contains("parse state"));
}
