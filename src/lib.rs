//! segviz - segmentation demo client
//!
//! Browses a local set of test images and their ground-truth masks, sends an
//! image to a remote segmentation service, and turns the returned per-pixel
//! class map into a color image for display.
//!
//! # Layout
//!
//! - [`palette`]: class index -> color tables
//! - [`label_map`]: validated per-pixel label grids
//! - [`decode`]: label map -> RGB raster
//! - [`overlay`]: mask over source image blending
//! - [`dataset`]: local test image set
//! - [`client`]: HTTP inference client
//! - [`config`]: file + environment configuration
//! - [`ui`]: terminal progress and legend output
//!
//! The decode core is pure and synchronous. Only `client` and `dataset`
//! perform I/O.

pub mod client;
pub mod config;
pub mod dataset;
pub mod decode;
pub mod error;
pub mod label_map;
pub mod overlay;
pub mod palette;
pub mod ui;

pub use client::{ClientConfig, InferenceClient};
pub use dataset::{TestImageSet, TestSample};
pub use decode::{decode, decode_with_mode, ColorImage, DecodeMode, SegmentationDecoder};
pub use error::DecodeError;
pub use label_map::LabelMap;
pub use overlay::blend;
pub use palette::{ClassPalette, PaletteEntry, Rgb, CATEGORY_COLORS};
