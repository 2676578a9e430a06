//! Types shared across rayon workers must stay Sync + Send

fn assert_sync_send<T: Sync + Send>() {}

#[test]
fn test_flatloc_config_is_sync_send() {
    assert_sync_send::<flatloc_core::FlatlocConfig>();
}

#[test]
fn test_file_systems_are_sync_send() {
    assert_sync_send::<flatloc_core::RealFileSystem>();
    assert_sync_send::<flatloc_core::MockFileSystem>();
}

#[test]
fn test_results_are_send() {
    fn assert_send<T: Send>() {}
    assert_send::<flatloc_core::CoreError>();
    assert_send::<flatloc_core::FlattenedFile>();
    assert_send::<flatloc_core::LocalizationTable>();
}
