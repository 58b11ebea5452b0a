//! segviz - browse test images and visualize segmentation predictions
//!
//! Subcommands:
//! 1. `list`    - list the paired color images and ground-truth masks
//! 2. `show`    - copy one sample's color image and mask to an output directory
//! 3. `predict` - send one sample to the inference service, write the decoded
//!    mask and an overlay, print the legend
//! 4. `decode`  - decode a saved prediction JSON offline
//! 5. `legend`  - print the class palette

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use image::ImageFormat;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use segviz::client::parse_prediction;
use segviz::config::SegvizConfig;
use segviz::ui::Ui;
use segviz::{blend, DecodeMode, InferenceClient, SegmentationDecoder, TestImageSet, TestSample};

const PREDICTED_MASK_FILE: &str = "predicted_mask.png";
const OVERLAY_FILE: &str = "overlay.png";

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Test image root holding color/ and mask/ directories.
    #[arg(long, global = true, env = "SEGVIZ_IMAGES_DIR")]
    images: Option<PathBuf>,
    /// Prediction endpoint URL.
    #[arg(long, global = true, env = "SEGVIZ_API_URL")]
    url: Option<String>,
    /// Number of classes the model predicts.
    #[arg(long, global = true)]
    num_classes: Option<usize>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, global = true, default_value = "auto", value_name = "MODE")]
    ui: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List test samples.
    List,
    /// Write a sample's color image and ground-truth mask to a directory.
    Show {
        #[arg(default_value_t = 1)]
        id: usize,
        #[arg(long, default_value = "segviz_out")]
        out: PathBuf,
    },
    /// Request a prediction for a sample and write the decoded mask.
    Predict {
        #[arg(default_value_t = 1)]
        id: usize,
        #[arg(long, default_value = "segviz_out")]
        out: PathBuf,
        /// Mask opacity for the overlay (0..=1).
        #[arg(long)]
        alpha: Option<f32>,
        /// Fail on labels outside 0..num_classes instead of drawing them as void.
        #[arg(long)]
        strict: bool,
    },
    /// Decode a saved `{"prediction": [[...]]}` response.
    Decode {
        #[arg(long)]
        labels: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        strict: bool,
    },
    /// Print the class legend.
    Legend,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let stderr_tty = std::io::stderr().is_terminal();
    let stdout_tty = std::io::stdout().is_terminal();
    let ui = Ui::from_args(Some(&args.ui), stderr_tty, stdout_tty);

    let mut cfg = SegvizConfig::load()?;
    if let Some(images) = args.images {
        cfg.images_dir = images;
    }
    if let Some(url) = args.url {
        cfg.api.url = url;
    }
    if let Some(num_classes) = args.num_classes {
        cfg.num_classes = num_classes;
    }
    if let Command::Predict {
        alpha: Some(alpha), ..
    } = &args.command
    {
        cfg.overlay_alpha = *alpha;
    }
    cfg.validate()?;

    match args.command {
        Command::List => list(&cfg),
        Command::Show { id, out } => show(&cfg, &ui, id, &out),
        Command::Predict {
            id, out, strict, ..
        } => predict(&cfg, &ui, id, &out, decode_mode(strict)),
        Command::Decode {
            labels,
            out,
            strict,
        } => decode_file(&cfg, &ui, &labels, &out, decode_mode(strict)),
        Command::Legend => {
            ui.write_legend(&mut std::io::stdout().lock(), &cfg.palette)?;
            Ok(())
        }
    }
}

fn list(cfg: &SegvizConfig) -> Result<()> {
    let set = TestImageSet::open(&cfg.images_dir)?;
    for sample in set.iter() {
        println!(
            "{:>4}  {}  {}",
            sample.id,
            sample.color_path.display(),
            sample.mask_path.display()
        );
    }
    log::info!("{} samples under {}", set.len(), set.root().display());
    Ok(())
}

fn show(cfg: &SegvizConfig, ui: &Ui, id: usize, out: &Path) -> Result<()> {
    let set = TestImageSet::open(&cfg.images_dir)?;
    let sample = set.sample(id)?;
    std::fs::create_dir_all(out).with_context(|| format!("create {}", out.display()))?;

    let _stage = ui.stage("Write sample images");
    let color_out = out.join(format!("{}_color.png", id));
    let mask_out = out.join(format!("{}_mask.png", id));
    sample
        .load_color()?
        .save_with_format(&color_out, ImageFormat::Png)
        .with_context(|| format!("write {}", color_out.display()))?;
    sample
        .load_mask()?
        .save_with_format(&mask_out, ImageFormat::Png)
        .with_context(|| format!("write {}", mask_out.display()))?;
    println!("color image: {}", color_out.display());
    println!("ground-truth mask: {}", mask_out.display());
    Ok(())
}

fn predict(cfg: &SegvizConfig, ui: &Ui, id: usize, out: &Path, mode: DecodeMode) -> Result<()> {
    let decoder = SegmentationDecoder::new(cfg.palette.clone(), cfg.num_classes)?.with_mode(mode);
    let client = InferenceClient::new(cfg.api.clone())?;
    let set = TestImageSet::open(&cfg.images_dir)?;
    let sample: &TestSample = set.sample(id)?;
    std::fs::create_dir_all(out).with_context(|| format!("create {}", out.display()))?;

    let color = {
        let _stage = ui.stage("Load image");
        sample.load_color()?
    };
    let png = {
        let _stage = ui.stage("Encode image");
        segviz::dataset::encode_png(&color)?
    };
    let labels = {
        let _stage = ui.stage("Request prediction");
        client.predict(&png)?
    };
    log::info!(
        "prediction for sample {}: {}x{} labels from {}",
        id,
        labels.width(),
        labels.height(),
        client.url()
    );

    let mask = {
        let _stage = ui.stage("Decode mask");
        decoder.decode(&labels)?
    };
    let histogram = decoder.class_histogram(&labels);
    log::debug!("class histogram: {:?}", histogram);
    let out_of_range = histogram.last().copied().unwrap_or(0);
    if out_of_range > 0 && decoder.mode() == DecodeMode::Lenient {
        log::warn!(
            "{} pixels carry labels outside 0..{}; drawn as void",
            out_of_range,
            decoder.num_classes()
        );
    }

    let mask_path = out.join(PREDICTED_MASK_FILE);
    let overlay_path = out.join(OVERLAY_FILE);
    {
        let _stage = ui.stage("Write mask + overlay");
        mask.as_rgb_image()
            .save_with_format(&mask_path, ImageFormat::Png)
            .with_context(|| format!("write {}", mask_path.display()))?;
        if color.dimensions() == (mask.width(), mask.height()) {
            blend(&color, &mask, cfg.overlay_alpha)?
                .save_with_format(&overlay_path, ImageFormat::Png)
                .with_context(|| format!("write {}", overlay_path.display()))?;
        } else {
            log::warn!(
                "prediction is {}x{} but image is {}x{}; skipping overlay",
                mask.width(),
                mask.height(),
                color.width(),
                color.height()
            );
        }
    }

    let mut stdout = std::io::stdout().lock();
    ui.write_legend(&mut stdout, decoder.palette())?;
    ui.write_coverage(&mut stdout, decoder.palette(), &histogram)?;
    println!("predicted mask written to {}", mask_path.display());
    Ok(())
}

fn decode_file(
    cfg: &SegvizConfig,
    ui: &Ui,
    labels: &Path,
    out: &Path,
    mode: DecodeMode,
) -> Result<()> {
    let decoder = SegmentationDecoder::new(cfg.palette.clone(), cfg.num_classes)?.with_mode(mode);
    let body = std::fs::read(labels)
        .map_err(|e| anyhow!("failed to read prediction file {}: {}", labels.display(), e))?;
    let labels = parse_prediction(&body)?;
    let mask = {
        let _stage = ui.stage("Decode mask");
        decoder.decode(&labels)?
    };
    mask.as_rgb_image()
        .save_with_format(out, ImageFormat::Png)
        .with_context(|| format!("write {}", out.display()))?;
    println!("decoded mask written to {}", out.display());
    Ok(())
}

fn decode_mode(strict: bool) -> DecodeMode {
    if strict {
        DecodeMode::Strict
    } else {
        DecodeMode::Lenient
    }
}
