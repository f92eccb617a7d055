use std::path::PathBuf;
use std::process;

use clap::Parser;
use hipsio::stats::ImageStats;
use hipsio::DecodedHips;

/// Print header fields and sample statistics for a HIPS file.
#[derive(Parser, Debug)]
#[command(name = "hipsinfo", version)]
struct Cli {
    /// Also print per-band statistics
    #[arg(short, long)]
    verbose: bool,

    /// Count (and with -v, list) distinct sample values
    #[arg(long)]
    unique: bool,

    file: PathBuf,
}

fn format_stats(out: &mut String, indent: &str, stats: &ImageStats) {
    out.push_str(&format!("{}Min: {}\n", indent, stats.min));
    out.push_str(&format!("{}Max: {}\n", indent, stats.max));
    out.push_str(&format!("{}Mean: {}\n", indent, stats.mean));
    out.push_str(&format!("{}Std: {}\n", indent, stats.std));
}

fn format_hips_info(
    name: &str,
    decoded: &DecodedHips,
    verbose: bool,
    unique: bool,
) -> Result<String, String> {
    let h = &decoded.header;
    let img = &decoded.image;
    let mut out = String::new();
    out.push_str(&format!("{}: HIPS {}\n", name, h.tag));
    out.push_str(&format!("  Header length: {} bytes\n", h.header_length));
    out.push_str(&format!("  Bands: {}\n", h.bands));
    out.push_str(&format!("  Resolution: {} x {}\n", h.res_x, h.res_y));
    out.push_str(&format!("  Format code: {}\n", h.fmt));
    out.push_str(&format!("  Shape (rows, cols, bands): {:?}\n", img.shape()));

    let stats = ImageStats::compute(img, unique);
    format_stats(&mut out, "  ", &stats);
    if let Some(values) = &stats.unique {
        out.push_str(&format!("  Unique values: {}\n", values.len()));
        if verbose {
            out.push_str(&format!("    {:?}\n", values));
        }
    }

    if verbose {
        for b in 0..img.bands() {
            let plane = img
                .band(b)
                .map_err(|e| format!("Error reading band {} of '{}': {}", b, name, e))?;
            out.push_str(&format!("  Band {}:\n", b));
            format_stats(&mut out, "    ", &ImageStats::from_samples(&plane, false));
        }
    }
    Ok(out)
}

fn run<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let path = &cli.file;

    let data = std::fs::read(path)
        .map_err(|e| format!("Error reading '{}': {}", path.display(), e))?;
    let decoded = hipsio::decode_hips(&data)
        .map_err(|e| format!("Error parsing '{}': {}", path.display(), e))?;

    format_hips_info(
        &path.display().to_string(),
        &decoded,
        cli.verbose,
        cli.unique,
    )
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
