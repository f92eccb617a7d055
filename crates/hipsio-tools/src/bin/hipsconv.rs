use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use hipsio::header::format_header;
use hipsio::render::{
    hips2ani_with_context, hips2img, png_path, AnimationContext, AnimationOptions,
};
use hipsio::stretch::{BandSelection, DisplayOptions};

/// Convert HIPS image cubes to PNG/GIF, or wrap raw float32 data as HIPS.
#[derive(Parser, Debug)]
#[command(name = "hipsconv", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render bands to <file stem>.png
    Png {
        file: PathBuf,

        /// Comma-separated band indices: one for gray, three or more for RGB
        /// (the first three are used)
        #[arg(long, value_delimiter = ',', conflicts_with = "sum")]
        bands: Option<Vec<usize>>,

        /// Show the sum of all bands in gray
        #[arg(long)]
        sum: bool,

        /// Disable the 2.5/97.5 percentile stretch
        #[arg(long)]
        no_stretch: bool,
    },

    /// Animate the bands into a looping GIF
    Ani {
        file: PathBuf,
        output: PathBuf,

        #[arg(long, default_value_t = 0.0)]
        vmin: f32,

        #[arg(long, default_value_t = 0.1)]
        vmax: f32,

        /// Milliseconds per frame
        #[arg(long, default_value_t = 50)]
        delay: u32,

        /// Companion HIPS file with scene height
        #[arg(long)]
        height: Option<PathBuf>,

        /// Whitespace-delimited waveform table
        #[arg(long)]
        waveform: Option<PathBuf>,
    },

    /// Prepend a HIPS header to a raw float32 payload
    Encode {
        raw: PathBuf,
        bands: i64,
        res_x: i64,
        res_y: i64,
        output: PathBuf,

        #[arg(long, default_value = "HIPS")]
        tag: String,

        #[arg(long, default_value_t = 0)]
        fmt: i64,
    },
}

fn read_err(path: &Path, e: impl std::fmt::Display) -> String {
    format!("Error reading '{}': {}", path.display(), e)
}

fn png(
    file: &Path,
    bands: Option<Vec<usize>>,
    sum: bool,
    no_stretch: bool,
) -> Result<String, String> {
    let selection = match (sum, bands) {
        (true, _) => BandSelection::Sum,
        (false, Some(order)) => BandSelection::Bands(order),
        (false, None) => BandSelection::default(),
    };
    let options = DisplayOptions {
        bands: selection,
        stretch: !no_stretch,
        save: true,
    };
    let raster = hips2img(file, &options).map_err(|e| read_err(file, e))?;
    Ok(format!(
        "Wrote {} ({} x {})\n",
        png_path(file).display(),
        raster.width(),
        raster.height()
    ))
}

fn ani(
    file: &Path,
    output: PathBuf,
    options: AnimationOptions,
    height: Option<&Path>,
    waveform: Option<&Path>,
) -> Result<String, String> {
    let context = AnimationContext::load(height, waveform)
        .map_err(|e| format!("Error loading context: {}", e))?;
    let options = AnimationOptions {
        save: Some(output.clone()),
        ..options
    };
    let frames = hips2ani_with_context(file, &context, &options).map_err(|e| read_err(file, e))?;
    Ok(format!("Wrote {} frames to {}\n", frames.len(), output.display()))
}

fn encode(
    raw: &Path,
    dims: (i64, i64, i64),
    output: &Path,
    tag: &str,
    fmt: i64,
) -> Result<String, String> {
    let (bands, res_x, res_y) = dims;
    let payload = std::fs::read(raw).map_err(|e| read_err(raw, e))?;
    let expected = [bands, res_x, res_y]
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(usize::try_from(d).ok()?))
        .ok_or_else(|| format!("Invalid shape: {} x {} x {}", bands, res_x, res_y))?;
    let needed = expected.saturating_mul(4);
    if payload.len() < needed {
        return Err(format!(
            "'{}' holds {} bytes, {} x {} x {} float32 samples need {}",
            raw.display(),
            payload.len(),
            bands,
            res_x,
            res_y,
            needed
        ));
    }

    let mut bytes = format_header(tag, bands, res_x, res_y, fmt, 4)
        .map_err(|e| format!("Invalid tag: {}", e))?;
    bytes.extend_from_slice(&payload[payload.len() - needed..]);
    std::fs::write(output, &bytes)
        .map_err(|e| format!("Error writing '{}': {}", output.display(), e))?;
    log::debug!("wrapped {} payload bytes", needed);
    Ok(format!("Wrote {} ({} bytes)\n", output.display(), bytes.len()))
}

fn run<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    match cli.command {
        Command::Png {
            file,
            bands,
            sum,
            no_stretch,
        } => png(&file, bands, sum, no_stretch),
        Command::Ani {
            file,
            output,
            vmin,
            vmax,
            delay,
            height,
            waveform,
        } => {
            let options = AnimationOptions {
                vmin,
                vmax,
                frame_delay_ms: delay,
                ..AnimationOptions::default()
            };
            ani(&file, output, options, height.as_deref(), waveform.as_deref())
        }
        Command::Encode {
            raw,
            bands,
            res_x,
            res_y,
            output,
            tag,
            fmt,
        } => encode(&raw, (bands, res_x, res_y), &output, &tag, fmt),
    }
}

fn main() {
    env_logger::init();
    match run(std::env::args_os()) {
        Ok(output) => print!("{}", output),
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hipsio::HipsImage;

    fn cube(dir: &Path) -> PathBuf {
        let path = dir.join("scene.hips");
        let img = HipsImage::from_fn(3, 4, 3, |r, c, b| (r * 4 + c) as f32 * 0.01 + b as f32);
        hipsio::write_hips(&path, &img, "SCENE", 0).unwrap();
        path
    }

    fn arg(p: &Path) -> &str {
        p.to_str().unwrap()
    }

    #[test]
    fn png_default_bands() {
        let dir = tempfile::tempdir().unwrap();
        let path = cube(dir.path());
        let out = run(["hipsconv", "png", arg(&path)]).unwrap();
        assert!(out.contains("(4 x 3)"));
        assert!(dir.path().join("scene.png").exists());
    }

    #[test]
    fn png_single_band_and_sum() {
        let dir = tempfile::tempdir().unwrap();
        let path = cube(dir.path());
        assert!(run(["hipsconv", "png", arg(&path), "--bands", "2"]).is_ok());
        assert!(run(["hipsconv", "png", arg(&path), "--sum", "--no-stretch"]).is_ok());
        assert!(run(["hipsconv", "png", arg(&path), "--bands", "0,9,1"]).is_err());
    }

    #[test]
    fn ani_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = cube(dir.path());
        let table = dir.path().join("wave.txt");
        std::fs::write(&table, "1 0.2\n2 0.4\n3 0.1\n").unwrap();
        let gif = dir.path().join("scene.gif");
        let out = run([
            "hipsconv",
            "ani",
            arg(&path),
            arg(&gif),
            "--vmax",
            "0.2",
            "--height",
            arg(&path),
            "--waveform",
            arg(&table),
        ])
        .unwrap();
        assert!(out.starts_with("Wrote 3 frames"));
        assert!(gif.exists());
    }

    #[test]
    fn encode_raw_payload() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("payload.f32");
        let samples: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        std::fs::write(&raw, &samples).unwrap();
        let out_path = dir.path().join("wrapped.hips");
        run(["hipsconv", "encode", arg(&raw), "1", "2", "2", arg(&out_path)]).unwrap();

        let decoded = hipsio::read_hips(&out_path).unwrap();
        assert_eq!(decoded.header.tag, "HIPS");
        assert_eq!(decoded.image.as_slice(), &[2.0, 1.0, 4.0, 3.0]);
    }

    #[test]
    fn encode_short_payload() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("payload.f32");
        std::fs::write(&raw, [0u8; 8]).unwrap();
        let out_path = dir.path().join("wrapped.hips");
        let err =
            run(["hipsconv", "encode", arg(&raw), "1", "2", "2", arg(&out_path)]).unwrap_err();
        assert!(err.contains("need 16"));
    }

    #[test]
    fn encode_rejects_tag_with_space() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("payload.f32");
        std::fs::write(&raw, [0u8; 16]).unwrap();
        let out_path = dir.path().join("wrapped.hips");
        let err = run([
            "hipsconv",
            "encode",
            arg(&raw),
            "1",
            "2",
            "2",
            arg(&out_path),
            "--tag",
            "MY SCENE",
        ])
        .unwrap_err();
        assert!(err.starts_with("Invalid tag"));
        assert!(!out_path.exists());
    }

    #[test]
    fn unknown_subcommand() {
        assert!(run(["hipsconv", "frobnicate"]).is_err());
    }
}
