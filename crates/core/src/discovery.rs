use std::{
    io,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::types::VideoTask;

fn has_video_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension() else {
        return false;
    };
    let ext = ext.to_string_lossy().to_lowercase();
    extensions
        .iter()
        .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext))
}

/// Find video files in `dir`, walking subdirectories when `recursive`.
/// Hidden files and directories are skipped. Results are sorted by path.
pub fn discover_videos(
    dir: &Path,
    extensions: &[String],
    recursive: bool,
) -> io::Result<Vec<VideoTask>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("input directory {} does not exist", dir.display()),
        ));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_video_extension(path, extensions))
        .collect();

    paths.sort();
    Ok(paths.into_iter().map(VideoTask::new).collect())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn exts() -> Vec<String> {
        vec!["mp4".to_string(), ".mov".to_string(), "webm".to_string()]
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn names(tasks: &[VideoTask]) -> Vec<String> {
        tasks.iter().map(|t| t.file_name()).collect()
    }

    #[test]
    fn finds_matching_extensions_case_insensitively() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("b.MP4"));
        touch(&dir.path().join("a.mov"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("noext"));

        let tasks = discover_videos(dir.path(), &exts(), false).unwrap();
        assert_eq!(names(&tasks), vec!["a.mov", "b.MP4"]);
    }

    #[test]
    fn recursion_is_optional() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("top.mp4"));
        touch(&dir.path().join("Ads").join("nested.webm"));
        touch(&dir.path().join(".hidden").join("skip.mp4"));

        let flat = discover_videos(dir.path(), &exts(), false).unwrap();
        assert_eq!(names(&flat), vec!["top.mp4"]);

        let deep = discover_videos(dir.path(), &exts(), true).unwrap();
        assert_eq!(names(&deep), vec!["nested.webm", "top.mp4"]);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = discover_videos(&dir.path().join("nope"), &exts(), true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
