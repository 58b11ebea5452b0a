use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{ClientConfig, DEFAULT_PREDICT_URL, DEFAULT_TIMEOUT_SECS, MAX_RESPONSE_BYTES};
use crate::overlay::{validate_alpha, DEFAULT_ALPHA};
use crate::palette::{ClassPalette, PaletteEntry};

const DEFAULT_IMAGES_DIR: &str = "images";
const DEFAULT_NUM_CLASSES: usize = 8;

#[derive(Debug, Deserialize, Default)]
struct SegvizConfigFile {
    api: Option<ApiConfigFile>,
    images_dir: Option<PathBuf>,
    num_classes: Option<usize>,
    overlay: Option<OverlayConfigFile>,
    palette: Option<Vec<PaletteEntry>>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfigFile {
    url: Option<String>,
    timeout_secs: Option<u64>,
    max_response_bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    alpha: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct SegvizConfig {
    pub api: ClientConfig,
    pub images_dir: PathBuf,
    pub num_classes: usize,
    pub overlay_alpha: f32,
    pub palette: ClassPalette,
}

impl SegvizConfig {
    /// Loads `SEGVIZ_CONFIG` (if set), applies env overrides, validates.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SEGVIZ_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SegvizConfigFile) -> Self {
        let api = ClientConfig {
            url: file
                .api
                .as_ref()
                .and_then(|api| api.url.clone())
                .unwrap_or_else(|| DEFAULT_PREDICT_URL.to_string()),
            timeout: Duration::from_secs(
                file.api
                    .as_ref()
                    .and_then(|api| api.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            max_response_bytes: file
                .api
                .as_ref()
                .and_then(|api| api.max_response_bytes)
                .unwrap_or(MAX_RESPONSE_BYTES),
        };
        Self {
            api,
            images_dir: file
                .images_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR)),
            num_classes: file.num_classes.unwrap_or(DEFAULT_NUM_CLASSES),
            overlay_alpha: file
                .overlay
                .and_then(|overlay| overlay.alpha)
                .unwrap_or(DEFAULT_ALPHA),
            palette: file.palette.map(ClassPalette::new).unwrap_or_default(),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("SEGVIZ_API_URL") {
            if !url.trim().is_empty() {
                self.api.url = url;
            }
        }
        if let Ok(dir) = std::env::var("SEGVIZ_IMAGES_DIR") {
            if !dir.trim().is_empty() {
                self.images_dir = PathBuf::from(dir);
            }
        }
        if let Ok(classes) = std::env::var("SEGVIZ_NUM_CLASSES") {
            self.num_classes = classes
                .trim()
                .parse()
                .map_err(|_| anyhow!("SEGVIZ_NUM_CLASSES must be a non-negative integer"))?;
        }
        if let Ok(timeout) = std::env::var("SEGVIZ_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("SEGVIZ_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.api.timeout = Duration::from_secs(seconds);
        }
        if let Ok(alpha) = std::env::var("SEGVIZ_ALPHA") {
            self.overlay_alpha = alpha
                .trim()
                .parse()
                .map_err(|_| anyhow!("SEGVIZ_ALPHA must be a number between 0 and 1"))?;
        }
        Ok(())
    }

    /// Re-checks invariants; the CLI calls this again after applying flags.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api.url)
            .with_context(|| format!("invalid inference url '{}'", self.api.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "inference url must use http or https, got '{}'",
                url.scheme()
            ));
        }
        if self.api.timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        if self.api.max_response_bytes == 0 {
            return Err(anyhow!("max_response_bytes must be greater than zero"));
        }
        if self.num_classes > self.palette.len() {
            return Err(anyhow!(
                "num_classes {} exceeds palette size {}",
                self.num_classes,
                self.palette.len()
            ));
        }
        validate_alpha(self.overlay_alpha)?;
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SegvizConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
