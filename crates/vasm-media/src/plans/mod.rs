//! Encode plan builders, one per job variant.
//!
//! Builders are pure: they validate their parameters and return plan values
//! without touching the filesystem. Plans that need a concat list carry the
//! list content and the path it must be written to.

mod audio_mix;
mod slideshow;
mod subtitle;
mod thumbnail;

pub use audio_mix::{build_audio_mix, ducking_graph, AudioMixPlan, MUSIC_LIST_NAME};
pub use slideshow::{
    build_slideshow, sequence_image_name, SlideshowPlan, SlideshowTiming, SEGMENT_LIST_NAME,
};
pub use subtitle::build_subtitle_burn;
pub use thumbnail::{build_thumbnail, layout_lines, ThumbnailLine, ThumbnailPlan, ThumbnailStyle};

use std::path::{Path, PathBuf};

use crate::concat::ConcatList;
use crate::error::{MediaError, MediaResult};

/// Write a concat list next to the files it names.
pub(crate) async fn write_concat_list(path: &Path, list: &ConcatList) -> MediaResult<()> {
    tokio::fs::write(path, list.render()).await?;
    Ok(())
}

/// Shared parent directory and bare file names of `files`.
///
/// Concat list entries resolve relative to the list file, so every entry
/// must live in the directory the list is written to.
pub(crate) fn common_directory(files: &[PathBuf]) -> MediaResult<(PathBuf, Vec<String>)> {
    let first = files
        .first()
        .ok_or_else(|| MediaError::invalid_plan("file list is empty"))?;
    let dir = first.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

    let mut names = Vec::with_capacity(files.len());
    for file in files {
        let parent = file.parent().unwrap_or_else(|| Path::new("."));
        if parent != dir {
            return Err(MediaError::invalid_plan(format!(
                "{} is not in {}",
                file.display(),
                dir.display()
            )));
        }
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                MediaError::invalid_plan(format!("{} has no file name", file.display()))
            })?;
        names.push(name);
    }

    Ok((dir, names))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_directory() {
        let files = vec![PathBuf::from("/w/j/a.jpg"), PathBuf::from("/w/j/b.jpg")];
        let (dir, names) = common_directory(&files).unwrap();
        assert_eq!(dir, PathBuf::from("/w/j"));
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_common_directory_rejects_mixed_dirs() {
        let files = vec![PathBuf::from("/w/j/a.jpg"), PathBuf::from("/w/k/b.jpg")];
        assert!(matches!(
            common_directory(&files),
            Err(MediaError::InvalidPlan(_))
        ));
        assert!(common_directory(&[]).is_err());
    }
}
