//! Raster and animation export built on the `image` crate.
//!
//! Static rendering goes through [`prepare_display`] and is written as PNG.
//! Animations show one band per frame in gray with fixed `[vmin, vmax]`
//! scaling and are written as looping GIFs. An [`AnimationContext`] can add
//! a scene-height panel to the right of each frame and a waveform strip
//! below it.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{
    imageops, Delay, DynamicImage, Frame, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage,
};

use crate::error::Result;
use crate::image::{read_hips, HipsImage};
use crate::stretch::{prepare_display, stretch_band, ColorMode, DisplayImage, DisplayOptions};
use crate::table::{read_table, WaveformTable};

/// Pixels between the band frame and the height panel.
const PANEL_GAP: u32 = 4;
/// Minimum height of the waveform strip.
const STRIP_MIN_HEIGHT: u32 = 64;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const STRIP_BACKGROUND: Rgba<u8> = Rgba([24, 24, 24, 255]);
const MARKER: Rgba<u8> = Rgba([230, 40, 40, 255]);
const SERIES_COLORS: [Rgba<u8>; 4] = [
    Rgba([80, 160, 255, 255]),
    Rgba([120, 220, 120, 255]),
    Rgba([250, 200, 60, 255]),
    Rgba([200, 120, 250, 255]),
];

/// Options for band animations.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationOptions {
    /// Sample value drawn as black.
    pub vmin: f32,
    /// Sample value drawn as white.
    pub vmax: f32,
    pub frame_delay_ms: u32,
    /// Extra time the last frame stays up before the loop restarts.
    pub repeat_delay_ms: u32,
    /// Write an animated GIF here.
    pub save: Option<PathBuf>,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        AnimationOptions {
            vmin: 0.0,
            vmax: 0.1,
            frame_delay_ms: 50,
            repeat_delay_ms: 1000,
            save: None,
        }
    }
}

/// Auxiliary data drawn alongside each animation frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationContext {
    /// Scene height cube; its first band is shown.
    pub height: Option<HipsImage>,
    /// Reflectance/waveform table: column 0 is the x axis.
    pub waveform: Option<WaveformTable>,
}

impl AnimationContext {
    /// Loads whichever companion files are given.
    pub fn load(height: Option<&Path>, waveform: Option<&Path>) -> Result<Self> {
        let height = match height {
            Some(p) => Some(read_hips(p)?.image),
            None => None,
        };
        let waveform = match waveform {
            Some(p) => Some(read_table(p)?),
            None => None,
        };
        Ok(AnimationContext { height, waveform })
    }

    pub fn is_empty(&self) -> bool {
        self.height.is_none() && self.waveform.is_none()
    }
}

fn to_u8(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// Converts display samples to an 8-bit gray or RGB raster.
pub fn to_raster(display: &DisplayImage) -> DynamicImage {
    let cols = display.cols;
    let channels = display.mode.channels();
    let at = |x: u32, y: u32, ch: usize| {
        display.data[(y as usize * cols + x as usize) * channels + ch]
    };
    let (w, h) = (display.cols as u32, display.rows as u32);
    match display.mode {
        ColorMode::Gray => {
            DynamicImage::ImageLuma8(GrayImage::from_fn(w, h, |x, y| Luma([to_u8(at(x, y, 0))])))
        }
        ColorMode::Rgb => DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([
                to_u8(at(x, y, 0)),
                to_u8(at(x, y, 1)),
                to_u8(at(x, y, 2)),
            ])
        })),
    }
}

/// `<path without extension>.png`.
pub fn png_path(path: &Path) -> PathBuf {
    path.with_extension("png")
}

/// Renders the HIPS file at `path` for display, optionally saving a PNG next
/// to it.
pub fn hips2img<P: AsRef<Path>>(path: P, options: &DisplayOptions) -> Result<DynamicImage> {
    let path = path.as_ref();
    let decoded = read_hips(path)?;
    let display = prepare_display(&decoded.image, options)?;
    let raster = to_raster(&display);
    if options.save {
        let out = png_path(path);
        raster.save(&out)?;
        log::info!("wrote {}", out.display());
    }
    Ok(raster)
}

/// Gray rendering of a row-major plane scaled from `[vmin, vmax]`.
fn plane_to_rgba(plane: &[f32], rows: usize, cols: usize, vmin: f32, vmax: f32) -> RgbaImage {
    let span = vmax - vmin;
    RgbaImage::from_fn(cols as u32, rows as u32, |x, y| {
        let v = to_u8((plane[y as usize * cols + x as usize] - vmin) / span);
        Rgba([v, v, v, 255])
    })
}

fn put(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_line(img: &mut RgbaImage, from: (i64, i64), to: (i64, i64), color: Rgba<u8>) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Maps `v` in `[lo, hi]` onto `0..=extent`.
fn scale(v: f64, lo: f64, hi: f64, extent: u32) -> i64 {
    if hi > lo {
        ((v - lo) / (hi - lo) * f64::from(extent)).round() as i64
    } else {
        0
    }
}

/// Draws every data column of `table` against column 0, plus a marker for
/// the current band.
fn waveform_strip(
    table: &WaveformTable,
    width: u32,
    height: u32,
    band: usize,
    bands: usize,
) -> RgbaImage {
    let mut strip = RgbaImage::from_pixel(width, height, STRIP_BACKGROUND);
    let xs = table.column(0).unwrap_or_default();
    let x_range = min_max(xs.iter().copied());
    let y_range = min_max((1..table.columns()).flat_map(|c| table.column(c).unwrap_or_default()));
    let (Some((x_lo, x_hi)), Some((y_lo, y_hi))) = (x_range, y_range) else {
        return strip;
    };
    let (w, h) = (width.saturating_sub(1), height.saturating_sub(1));

    for c in 1..table.columns() {
        let ys = table.column(c).unwrap_or_default();
        let color = SERIES_COLORS[(c - 1) % SERIES_COLORS.len()];
        let points: Vec<(i64, i64)> = xs
            .iter()
            .zip(&ys)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| {
                let px = scale(x, x_lo, x_hi, w);
                let py = i64::from(h) - scale(y, y_lo, y_hi, h);
                (px, py)
            })
            .collect();
        if let [single] = points.as_slice() {
            put(&mut strip, single.0, single.1, color);
        }
        for pair in points.windows(2) {
            draw_line(&mut strip, pair[0], pair[1], color);
        }
    }

    let marker_x = if table.rows() == bands {
        scale(xs[band], x_lo, x_hi, w)
    } else if bands > 1 {
        (band as f64 / (bands - 1) as f64 * f64::from(w)).round() as i64
    } else {
        0
    };
    draw_line(&mut strip, (marker_x, 0), (marker_x, i64::from(h)), MARKER);
    strip
}

/// Renders one animation frame per band of `image`.
pub fn animation_frames(
    image: &HipsImage,
    options: &AnimationOptions,
    context: &AnimationContext,
) -> Result<Vec<RgbaImage>> {
    let (rows, cols, bands) = image.shape();
    let frame_w = cols as u32;
    let frame_h = rows as u32;

    let height_panel = match &context.height {
        Some(h) if h.bands() > 0 => {
            let mut plane = h.band(0)?;
            stretch_band(&mut plane);
            Some(plane_to_rgba(&plane, h.rows(), h.cols(), 0.0, 1.0))
        }
        _ => None,
    };
    let (canvas_w, top_h) = match &height_panel {
        Some(p) => (frame_w + PANEL_GAP + p.width(), frame_h.max(p.height())),
        None => (frame_w, frame_h),
    };
    let strip_h = match context.waveform {
        Some(_) => STRIP_MIN_HEIGHT.max(top_h / 3),
        None => 0,
    };

    let mut frames = Vec::with_capacity(bands);
    for b in 0..bands {
        let plane = image.band(b)?;
        let frame = plane_to_rgba(&plane, rows, cols, options.vmin, options.vmax);
        if context.is_empty() {
            frames.push(frame);
            continue;
        }

        let mut canvas = RgbaImage::from_pixel(canvas_w, top_h + strip_h, BACKGROUND);
        imageops::overlay(&mut canvas, &frame, 0, 0);
        if let Some(panel) = &height_panel {
            imageops::overlay(&mut canvas, panel, i64::from(frame_w + PANEL_GAP), 0);
        }
        if let Some(table) = &context.waveform {
            let strip = waveform_strip(table, canvas_w, strip_h, b, bands);
            imageops::overlay(&mut canvas, &strip, 0, i64::from(top_h));
        }
        frames.push(canvas);
    }
    log::debug!("rendered {} animation frames", frames.len());
    Ok(frames)
}

/// Writes `frames` as an endlessly looping animated GIF.
pub fn write_gif<P: AsRef<Path>>(
    path: P,
    frames: &[RgbaImage],
    options: &AnimationOptions,
) -> Result<()> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    let mut encoder = GifEncoder::new(file);
    encoder.set_repeat(Repeat::Infinite)?;
    let last = frames.len().saturating_sub(1);
    let gif_frames = frames.iter().enumerate().map(|(i, img)| {
        let ms = if i == last {
            options.frame_delay_ms + options.repeat_delay_ms
        } else {
            options.frame_delay_ms
        };
        Frame::from_parts(img.clone(), 0, 0, Delay::from_numer_denom_ms(ms, 1))
    });
    encoder.encode_frames(gif_frames)?;
    log::info!("wrote {} frames to {}", frames.len(), path.as_ref().display());
    Ok(())
}

/// Animates the bands of the HIPS file at `path`, saving a GIF when
/// `options.save` is set.
pub fn hips2ani<P: AsRef<Path>>(path: P, options: &AnimationOptions) -> Result<Vec<RgbaImage>> {
    hips2ani_with_context(path, &AnimationContext::default(), options)
}

/// Like [`hips2ani`], drawing `context` alongside every frame.
pub fn hips2ani_with_context<P: AsRef<Path>>(
    path: P,
    context: &AnimationContext,
    options: &AnimationOptions,
) -> Result<Vec<RgbaImage>> {
    let decoded = read_hips(path)?;
    let frames = animation_frames(&decoded.image, options, context)?;
    if let Some(out) = &options.save {
        write_gif(out, &frames, options)?;
    }
    Ok(frames)
}
