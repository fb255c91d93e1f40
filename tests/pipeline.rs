//! End-to-end conversion tests.
//!
//! Tests that decode real video require fixture files from
//! `tests/fixtures/generate_fixtures.sh` and return early when they are
//! missing.

use std::fs;
use std::path::Path;

use gifmaker::{
    ConvertOptions, FolderLocator, FrameRate, FrameSource, GifMaker, GifMakerError, VideoFile,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn count_gif_frames(path: &Path) -> usize {
    let file = fs::File::open(path).expect("Failed to open GIF");
    let mut decoder = gif::DecodeOptions::new()
        .read_info(file)
        .expect("Failed to read GIF header");
    let mut frames = 0;
    while decoder
        .read_next_frame()
        .expect("Failed to decode GIF frame")
        .is_some()
    {
        frames += 1;
    }
    frames
}

fn gifs_in(folder: &Path) -> usize {
    fs::read_dir(folder)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "gif"))
        .count()
}

#[test]
fn open_nonexistent_file() {
    let result = VideoFile::open("this_file_does_not_exist.mp4");
    let error = result.unwrap_err();
    assert!(
        error.to_string().contains("Failed to open video file"),
        "Error message should mention file open failure: {error}",
    );
}

#[test]
fn open_invalid_file() {
    let folder = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid = folder.path().join("invalid.mp4");
    fs::write(&invalid, b"this is not a video file").unwrap();

    assert!(VideoFile::open(&invalid).is_err());
}

#[test]
fn folder_with_only_text_files_converts_nothing() {
    let folder = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(folder.path().join("notes.txt"), b"hello").unwrap();
    fs::write(folder.path().join("todo.txt"), b"world").unwrap();

    let mut maker = GifMaker::new(ConvertOptions::new());
    let report = maker
        .convert_folder(folder.path())
        .expect("An empty batch is not an error");

    assert!(report.is_empty());
    assert_eq!(gifs_in(folder.path()), 0);
}

#[test]
fn broken_videos_do_not_stop_the_batch() {
    let folder = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(folder.path().join("a.mp4"), b"garbage").unwrap();
    fs::write(folder.path().join("b.mov"), b"more garbage").unwrap();

    let mut maker = GifMaker::new(ConvertOptions::new());
    let report = maker
        .convert_folder(folder.path())
        .expect("Per-video failures are not batch failures");

    assert_eq!(report.failed(), 2);
    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.failures[0].path, folder.path().join("a.mp4"));
    assert_eq!(report.failures[1].path, folder.path().join("b.mov"));
    assert_eq!(gifs_in(folder.path()), 0);
    // No temporary files left behind either.
    assert_eq!(fs::read_dir(folder.path()).unwrap().count(), 2);
}

#[test]
fn missing_folder_is_reported() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let error = FolderLocator::new(root.path())
        .require("does-not-exist")
        .unwrap_err();
    assert!(matches!(error, GifMakerError::FolderNotFound { .. }));
}

#[test]
fn fixture_frame_rate_is_read_at_open() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let video = VideoFile::open(path).expect("Failed to open fixture");
    assert_eq!(video.frame_rate(), FrameRate::from_fps(30).unwrap());
    assert_eq!((video.width(), video.height()), (640, 480));
}

#[test]
fn fixture_converts_to_one_hundred_fifty_frames() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let folder = tempfile::tempdir().expect("Failed to create temp dir");
    let video = folder.path().join("clip.mp4");
    fs::copy(path, &video).expect("Failed to copy fixture");
    fs::write(folder.path().join("readme.txt"), b"not a video").unwrap();

    let mut maker = GifMaker::new(ConvertOptions::new());
    let report = maker
        .convert_folder(folder.path())
        .expect("Batch should run");

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 0);
    let gif = folder.path().join("clip.gif");
    assert_eq!(report.converted[0].path, gif);
    assert_eq!(report.converted[0].frame_count, 150);
    assert_eq!(count_gif_frames(&gif), 150);
}

#[test]
fn rerunning_produces_same_frame_count() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let folder = tempfile::tempdir().expect("Failed to create temp dir");
    let video = folder.path().join("again.mp4");
    fs::copy(path, &video).expect("Failed to copy fixture");

    let mut maker = GifMaker::new(ConvertOptions::new());
    let first = maker.convert_video(&video).expect("First run");
    let second = maker.convert_video(&video).expect("Second run");

    assert_eq!(first.frame_count, second.frame_count);
    assert_eq!(gifs_in(folder.path()), 1);
}
