//! Gesture pool discovery from a directory of preview clips

use std::path::Path;
use tracing::{debug, error, info};

use crate::types::GestureId;

/// Collect the file stems of every clip with `extension` in `dir`.
///
/// The result is sorted so the pool does not depend on directory listing
/// order. A missing or unreadable directory yields an empty pool.
pub fn discover_pool<P: AsRef<Path>>(dir: P, extension: &str) -> Vec<GestureId> {
    let dir = dir.as_ref();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Cannot read clip directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut pool: Vec<GestureId> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str()).map(GestureId::from))
        .collect();

    pool.sort();
    pool.dedup();

    debug!(?pool, "Discovered gesture clips");
    info!("Found {} gesture clips in {}", pool.len(), dir.display());
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScratchDir;

    #[test]
    fn collects_matching_stems_sorted() {
        let dir = ScratchDir::new("pool-discovery");
        for name in ["NUM_2.mp4", "EGO_1.MP4", "notes.txt", "ETC_9.mp4"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("EGO_5.mp4")).unwrap();

        let pool = discover_pool(dir.path(), "mp4");
        let names: Vec<&str> = pool.iter().map(GestureId::as_str).collect();
        assert_eq!(names, ["EGO_1", "ETC_9", "NUM_2"]);
    }

    #[test]
    fn missing_directory_is_empty_pool() {
        assert!(discover_pool("/nonexistent/gesture-clips", "mp4").is_empty());
    }
}
