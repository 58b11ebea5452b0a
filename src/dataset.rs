//! Local test image set.
//!
//! The set is laid out as two sibling directories:
//! - `color/`: input photographs (`*.png`)
//! - `mask/`: ground-truth segmentation masks (`*.png`)
//!
//! Files are sorted by name in each directory and paired by position, so the
//! n-th color image belongs with the n-th mask. Both directories must hold the
//! same number of images.

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

pub const COLOR_DIR: &str = "color";
pub const MASK_DIR: &str = "mask";

/// One color image with its ground-truth mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestSample {
    pub id: usize,
    pub color_path: PathBuf,
    pub mask_path: PathBuf,
}

impl TestSample {
    pub fn load_color(&self) -> Result<RgbImage> {
        let image = image::open(&self.color_path)
            .with_context(|| format!("open color image {}", self.color_path.display()))?;
        Ok(image.into_rgb8())
    }

    pub fn load_mask(&self) -> Result<DynamicImage> {
        image::open(&self.mask_path)
            .with_context(|| format!("open mask image {}", self.mask_path.display()))
    }

    /// Decodes the color image and re-encodes it as PNG for upload.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.load_color()?)
    }
}

/// Sorted, paired listing of the test images under one root.
#[derive(Clone, Debug)]
pub struct TestImageSet {
    root: PathBuf,
    samples: Vec<TestSample>,
}

impl TestImageSet {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let colors = list_pngs(&root.join(COLOR_DIR))?;
        let masks = list_pngs(&root.join(MASK_DIR))?;
        if colors.len() != masks.len() {
            return Err(anyhow!(
                "{} has {} color images but {} masks",
                root.display(),
                colors.len(),
                masks.len()
            ));
        }
        if colors.is_empty() {
            return Err(anyhow!("no test images found under {}", root.display()));
        }
        let samples = colors
            .into_iter()
            .zip(masks)
            .enumerate()
            .map(|(id, (color_path, mask_path))| TestSample {
                id,
                color_path,
                mask_path,
            })
            .collect::<Vec<_>>();
        log::debug!("loaded {} test samples from {}", samples.len(), root.display());
        Ok(Self { root, samples })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&TestSample> {
        self.samples.get(id)
    }

    /// Like `get`, with an error naming the valid id range.
    pub fn sample(&self, id: usize) -> Result<&TestSample> {
        self.get(id).ok_or_else(|| {
            anyhow!(
                "image id {} out of range; expected 0..={}",
                id,
                self.samples.len().saturating_sub(1)
            )
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestSample> {
        self.samples.iter()
    }
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .context("encode png")?;
    Ok(bytes.into_inner())
}

fn list_pngs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("list directory {}", dir.display()))?
            .path();
        let is_png = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]))
            .save(path)
            .unwrap();
    }

    fn image_root(names: &[&str], masks: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(COLOR_DIR)).unwrap();
        std::fs::create_dir(dir.path().join(MASK_DIR)).unwrap();
        for name in names {
            write_png(&dir.path().join(COLOR_DIR).join(name), 4, 3);
        }
        for name in masks {
            write_png(&dir.path().join(MASK_DIR).join(name), 4, 3);
        }
        dir
    }

    #[test]
    fn pairs_sorted_color_and_mask_files() {
        let dir = image_root(&["b.png", "a.png"], &["b_mask.png", "a_mask.png"]);
        std::fs::write(dir.path().join(COLOR_DIR).join("notes.txt"), "skip").unwrap();

        let set = TestImageSet::open(dir.path()).unwrap();
        assert_eq!(set.len(), 2);
        let first = set.get(0).unwrap();
        assert!(first.color_path.ends_with("a.png"));
        assert!(first.mask_path.ends_with("a_mask.png"));
        assert!(set.get(2).is_none());
        assert!(set.sample(2).is_err());
    }

    #[test]
    fn mismatched_counts_are_rejected() {
        let dir = image_root(&["a.png", "b.png"], &["a.png"]);
        let err = TestImageSet::open(dir.path()).unwrap_err();
        assert!(err.to_string().contains("2 color images but 1 masks"));
    }

    #[test]
    fn empty_set_is_rejected() {
        let dir = image_root(&[], &[]);
        assert!(TestImageSet::open(dir.path()).is_err());
    }

    #[test]
    fn encoded_png_round_trips_dimensions() {
        let dir = image_root(&["a.png"], &["a.png"]);
        let set = TestImageSet::open(dir.path()).unwrap();
        let bytes = set.get(0).unwrap().encode_png().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }
}
