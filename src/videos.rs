//! Enumerating the videos inside a folder.
//!
//! Only the folder's immediate children are considered. A file counts as a
//! video when its extension is one of [`VIDEO_EXTENSIONS`], compared
//! case-insensitively so `IMG_0001.MOV` is picked up too.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::GifMakerError;

/// Extensions (without the dot) recognised as video files.
pub const VIDEO_EXTENSIONS: [&str; 2] = ["mov", "mp4"];

/// Returns `true` if the path has a video extension.
pub fn is_video_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}

/// List the video files directly inside `folder`, sorted by path.
///
/// Subdirectories are not descended into. Only regular files are listed:
/// directories that happen to carry a video extension and symlinks are
/// ignored. An empty vector means the folder
/// holds no videos.
///
/// # Errors
///
/// Returns [`GifMakerError::ReadDirectory`] if the folder cannot be listed.
pub fn find_videos<P: AsRef<Path>>(folder: P) -> Result<Vec<PathBuf>, GifMakerError> {
    let folder = folder.as_ref();
    let read_error = |source| GifMakerError::ReadDirectory {
        path: folder.to_path_buf(),
        source,
    };

    let mut videos = Vec::new();
    for entry in fs::read_dir(folder).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        // Symlinks are not followed: only regular files count.
        if entry.file_type().map_err(read_error)?.is_file() && is_video_path(&path) {
            videos.push(path);
        }
    }
    videos.sort();

    log::debug!("Found {} video(s) in {}", videos.len(), folder.display());
    Ok(videos)
}

/// The GIF written for `video`: same folder and stem, `.gif` extension.
pub fn gif_path_for<P: AsRef<Path>>(video: P) -> PathBuf {
    video.as_ref().with_extension("gif")
}
