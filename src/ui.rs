use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::{Duration, Instant};

use crate::palette::ClassPalette;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

/// Terminal output for the CLI: stage progress on stderr, legend on stdout.
///
/// Spinners are drawn only when stderr is a terminal; color swatches only
/// when stdout is, so redirected legends stay plain text.
#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    stderr_tty: bool,
    stdout_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, stderr_tty: bool, stdout_tty: bool) -> Self {
        Self {
            mode,
            stderr_tty,
            stdout_tty,
        }
    }

    pub fn from_args(ui_flag: Option<&str>, stderr_tty: bool, stdout_tty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, stderr_tty, stdout_tty)
    }

    /// Pretty output on a stream with the given terminal state.
    fn pretty(&self, tty: bool) -> bool {
        tty && self.mode != UiMode::Plain
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        let spinner = self.pretty(self.stderr_tty).then(|| stage_spinner(name));
        if spinner.is_none() {
            eprintln!("==> {}", name);
        }
        StageGuard {
            name: name.to_string(),
            start: Instant::now(),
            spinner,
        }
    }

    /// Writes one legend line per palette entry. Pretty mode prints a
    /// truecolor swatch next to each class name.
    pub fn write_legend<W: Write>(
        &self,
        out: &mut W,
        palette: &ClassPalette,
    ) -> std::io::Result<()> {
        for (idx, entry) in palette.entries().iter().enumerate() {
            let [r, g, b] = entry.rgb.channels();
            if self.pretty(self.stdout_tty) {
                writeln!(
                    out,
                    "\x1b[48;2;{r};{g};{b}m        \x1b[0m {idx} {}",
                    entry.name
                )?;
            } else {
                writeln!(out, "{idx:>2} {:<14} ({r}, {g}, {b})", entry.name)?;
            }
        }
        Ok(())
    }

    /// Writes per-class pixel share, as returned by
    /// `SegmentationDecoder::class_histogram`.
    pub fn write_coverage<W: Write>(
        &self,
        out: &mut W,
        palette: &ClassPalette,
        histogram: &[u64],
    ) -> std::io::Result<()> {
        let total: u64 = histogram.iter().sum();
        if total == 0 {
            return Ok(());
        }
        let Some((out_of_range, classes)) = histogram.split_last() else {
            return Ok(());
        };
        for (idx, count) in classes.iter().enumerate() {
            let name = palette
                .entries()
                .get(idx)
                .map(|entry| entry.name.as_str())
                .unwrap_or("?");
            writeln!(out, "{:<14} {:>6.2}%", name, percent(*count, total))?;
        }
        if *out_of_range > 0 {
            writeln!(
                out,
                "{:<14} {:>6.2}%",
                "out-of-range",
                percent(*out_of_range, total)
            )?;
        }
        Ok(())
    }
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let message = format!("✔ {} ({})", self.name, format_duration(elapsed));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

fn stage_spinner(name: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_draw_target(ProgressDrawTarget::stderr());
    spinner.enable_steady_tick(Duration::from_millis(120));
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(format!("{name}…"));
    spinner
}

fn percent(count: u64, total: u64) -> f64 {
    count as f64 * 100.0 / total as f64
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{ClassPalette, Rgb};

    #[test]
    fn plain_legend_lists_every_class() {
        let ui = Ui::from_args(Some("plain"), true, true);
        let mut out = Vec::new();
        ui.write_legend(&mut out, &ClassPalette::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 8);
        assert!(text.lines().nth(1).unwrap().contains("flat"));
        assert!(text.contains("(0, 0, 142)"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn legend_swatches_follow_stdout_terminal() {
        let palette = ClassPalette::from_colors([Rgb(1, 2, 3)]);

        let ui = Ui::from_args(Some("pretty"), true, true);
        let mut out = Vec::new();
        ui.write_legend(&mut out, &palette).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("48;2;1;2;3m"));

        // stderr is a terminal but stdout is redirected to a file
        let ui = Ui::from_args(Some("pretty"), true, false);
        let mut out = Vec::new();
        ui.write_legend(&mut out, &palette).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains('\x1b'));

        let ui = Ui::from_args(None, false, true);
        let mut out = Vec::new();
        ui.write_legend(&mut out, &palette).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("48;2;1;2;3m"));
    }

    #[test]
    fn coverage_reports_out_of_range_share() {
        let ui = Ui::from_args(Some("plain"), false, false);
        let palette = ClassPalette::from_colors([Rgb::VOID, Rgb(1, 1, 1)]);
        let mut out = Vec::new();
        ui.write_coverage(&mut out, &palette, &[1, 2, 1]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("class_1"));
        assert!(text.contains(" 50.00%"));
        assert!(text.contains("out-of-range"));
    }
}
