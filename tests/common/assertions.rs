//! Custom test assertions for integration tests

use imagegen_dl::Event;
use std::path::Path;

/// Collect the events already queued on `events` without waiting
pub fn drain_events(events: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}

/// Assert that files exist in the directory
pub fn assert_files_exist(dir: &Path, expected_files: &[&str]) {
    for filename in expected_files {
        let path = dir.join(filename);
        assert!(
            path.exists(),
            "Expected file '{}' to exist in {:?}",
            filename,
            dir
        );
    }
}

/// Assert that the directory holds exactly `expected_files`
pub fn assert_dir_contains_only(dir: &Path, expected_files: &[&str]) {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|e| {
            e.expect("Failed to read entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    let mut expected: Vec<&str> = expected_files.to_vec();
    expected.sort();
    assert_eq!(names, expected, "Unexpected contents of {:?}", dir);
}

/// Assert that every file decodes as a JPEG image
pub fn assert_jpegs(paths: &[std::path::PathBuf]) {
    for path in paths {
        let bytes = std::fs::read(path).expect("Failed to read converted file");
        assert_eq!(
            image::guess_format(&bytes).expect("Unrecognised image format"),
            image::ImageFormat::Jpeg,
            "{:?} is not a JPEG",
            path
        );
    }
}
