//! Deterministic choice of the file to stream.

use std::path::Path;

use super::{FileChoice, StreamError};
use crate::engine::JobFile;

/// Extensions players can handle.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "ts", "m2ts",
];

/// Outcome of file selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    File(FileChoice),
    Choose(Vec<FileChoice>),
}

pub fn is_video(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Pick the file to serve.
///
/// A hint must name an existing file. Without one, video files at least half
/// the size of the largest video are plausible: exactly one means the largest
/// video wins (lowest index on ties), several means the caller must choose.
/// A torrent with no video falls back to its only file, or asks to choose.
pub fn select_file(files: &[JobFile], hint: Option<usize>) -> Result<Selection, StreamError> {
    if let Some(index) = hint {
        return files
            .iter()
            .find(|f| f.index == index)
            .map(|f| Selection::File(f.into()))
            .ok_or(StreamError::InvalidFileIndex(index));
    }

    if files.is_empty() {
        return Err(StreamError::NoFiles);
    }

    let videos: Vec<&JobFile> = files.iter().filter(|f| is_video(&f.name)).collect();

    let Some(largest) = videos
        .iter()
        .copied()
        .reduce(|best, f| if f.size > best.size { f } else { best })
    else {
        return Ok(match files {
            [only] => Selection::File(only.into()),
            _ => Selection::Choose(files.iter().map(FileChoice::from).collect()),
        });
    };

    let plausible: Vec<&JobFile> = videos
        .iter()
        .copied()
        .filter(|f| f.size.saturating_mul(2) >= largest.size)
        .collect();

    if plausible.len() > 1 {
        Ok(Selection::Choose(
            plausible.into_iter().map(FileChoice::from).collect(),
        ))
    } else {
        Ok(Selection::File(largest.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(index: usize, name: &str, size: u64) -> JobFile {
        JobFile {
            index,
            name: name.to_string(),
            size,
        }
    }

    #[test]
    fn test_is_video() {
        assert!(is_video("Movie.2021.MKV"));
        assert!(is_video("dir/episode.m2ts"));
        assert!(!is_video("subs.srt"));
        assert!(!is_video("README"));
    }

    #[test]
    fn test_single_movie_with_extras() {
        let files = vec![
            file(0, "sample.mkv", 50),
            file(1, "movie.mkv", 4000),
            file(2, "movie.nfo", 1),
        ];
        assert_eq!(
            select_file(&files, None).unwrap(),
            Selection::File(FileChoice {
                name: "movie.mkv".to_string(),
                index: 1,
                size: 4000
            })
        );
    }

    #[test]
    fn test_season_pack_asks_to_choose() {
        let files = vec![
            file(0, "S01E01.mkv", 1000),
            file(1, "S01E02.mkv", 980),
            file(2, "S01E03.mkv", 400),
            file(3, "cover.jpg", 5),
        ];
        match select_file(&files, None).unwrap() {
            Selection::Choose(choices) => {
                let indexes: Vec<_> = choices.iter().map(|c| c.index).collect();
                assert_eq!(indexes, vec![0, 1]);
            }
            other => panic!("expected Choose, got {:?}", other),
        }
    }

    #[test]
    fn test_hint_selects_file() {
        let files = vec![file(0, "a.mkv", 1000), file(1, "b.mkv", 1000)];
        match select_file(&files, Some(1)).unwrap() {
            Selection::File(choice) => assert_eq!(choice.name, "b.mkv"),
            other => panic!("expected File, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_hint() {
        let files = vec![file(0, "a.mkv", 1000)];
        assert!(matches!(
            select_file(&files, Some(5)),
            Err(StreamError::InvalidFileIndex(5))
        ));
    }

    #[test]
    fn test_no_video_single_file() {
        let files = vec![file(0, "archive.iso", 1000)];
        assert!(matches!(
            select_file(&files, None).unwrap(),
            Selection::File(FileChoice { index: 0, .. })
        ));
    }

    #[test]
    fn test_no_video_multiple_files() {
        let files = vec![file(0, "a.iso", 1000), file(1, "b.txt", 10)];
        match select_file(&files, None).unwrap() {
            Selection::Choose(choices) => assert_eq!(choices.len(), 2),
            other => panic!("expected Choose, got {:?}", other),
        }
    }

    #[test]
    fn test_equal_sized_videos_are_both_plausible() {
        let files = vec![file(0, "a.mp4", 10), file(1, "b.mp4", 10)];
        assert!(matches!(
            select_file(&files, None).unwrap(),
            Selection::Choose(_)
        ));
    }

    #[test]
    fn test_empty_torrent() {
        assert!(matches!(select_file(&[], None), Err(StreamError::NoFiles)));
    }
}
