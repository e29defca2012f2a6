//! Helpers for the command line front end and benches: dataset discovery,
//! expected-payload sidecars and frame statistics.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff"];

/// Summary statistics for a luminance plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LumaStats {
    /// Darkest value
    pub min: u8,
    /// Brightest value
    pub max: u8,
    /// Mean value
    pub avg: u8,
}

/// Compute min/max/avg for luminance values
pub fn luma_stats(luma: &[u8]) -> LumaStats {
    if luma.is_empty() {
        return LumaStats { min: 0, max: 0, avg: 0 };
    }
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    for &v in luma {
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
    }
    LumaStats {
        min,
        max,
        avg: (sum / luma.len() as u64) as u8,
    }
}

/// Dataset root from `INVSCAN_DATASET_ROOT`, defaulting to `benches/images`
pub fn dataset_root_from_env() -> PathBuf {
    env::var("INVSCAN_DATASET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("benches/images"))
}

/// Image limit from `INVSCAN_BATCH_LIMIT`; unset or `0` means the whole dataset
pub fn batch_limit_from_env() -> Option<usize> {
    env::var("INVSCAN_BATCH_LIMIT")
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v != 0)
}

/// Payload a photo is expected to decode to, read from a `.txt` sidecar
///
/// `shelf/IMG_0042.jpg` pairs with `shelf/IMG_0042.txt`. Blank lines and `#`
/// comments are skipped; the first remaining line is the payload.
pub fn expected_payload<P: AsRef<Path>>(image_path: P) -> Option<String> {
    let sidecar = image_path.as_ref().with_extension("txt");
    let content = fs::read_to_string(sidecar).ok()?;
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// Sorted image paths under `root`, optionally truncated to `limit`
pub fn dataset_iter<P: AsRef<Path>>(root: P, limit: Option<usize>) -> impl Iterator<Item = PathBuf> {
    let mut images = collect_images(root.as_ref());
    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}

fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("skipping {}: {e}", dir.display());
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                    images.push(path);
                }
            }
        }
    }

    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before UNIX epoch")
            .as_nanos();
        let sequence = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("invscan_tools_{nanos}_{sequence}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn test_luma_stats() {
        assert_eq!(luma_stats(&[]), LumaStats { min: 0, max: 0, avg: 0 });
        assert_eq!(luma_stats(&[10, 20, 30]), LumaStats { min: 10, max: 30, avg: 20 });
    }

    #[test]
    fn test_dataset_iter_recurses_sorts_and_limits() {
        let root = temp_dir();
        fs::create_dir_all(root.join("hall")).unwrap();
        for name in ["b.JPG", "a.png", "notes.txt", "hall/c.jpeg"] {
            fs::write(root.join(name), b"x").unwrap();
        }

        let all: Vec<PathBuf> = dataset_iter(&root, None).collect();
        assert_eq!(
            all,
            vec![root.join("a.png"), root.join("b.JPG"), root.join("hall/c.jpeg")]
        );
        assert_eq!(dataset_iter(&root, Some(1)).count(), 1);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn test_expected_payload_sidecar() {
        let root = temp_dir();
        let image = root.join("IMG_0042.jpg");
        assert_eq!(expected_payload(&image), None);

        fs::write(root.join("IMG_0042.txt"), "# label\n\n  INV-0042  \nignored\n").unwrap();
        assert_eq!(expected_payload(&image).as_deref(), Some("INV-0042"));
        let _ = fs::remove_dir_all(root);
    }
}
