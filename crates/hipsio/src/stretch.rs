//! Band selection and percentile contrast stretch for display.
//!
//! Display works on at most three bands. A single band (or a single-band
//! cube) is shown in gray, three or more selected bands as an RGB composite
//! of the first three, and
//! [`BandSelection::Sum`] collapses every band into one gray plane first.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::image::HipsImage;
use crate::stats::percentile_of_sorted;

/// Lower percentile subtracted by the stretch.
pub const STRETCH_LOW: f64 = 2.5;
/// Upper percentile the stretch divides by.
pub const STRETCH_HIGH: f64 = 97.5;

/// Which bands of the cube to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandSelection {
    /// NaN-ignoring sum of all bands, shown in gray.
    Sum,
    /// Explicit band indices: one for gray, three or more for RGB (only the
    /// first three are used). Two indices are rejected.
    Bands(Vec<usize>),
}

impl Default for BandSelection {
    fn default() -> Self {
        BandSelection::Bands(vec![0, 1, 2])
    }
}

/// Options for turning a cube into a displayable raster.
///
/// Built fresh per call; `Default` yields bands `[0, 1, 2]` with stretching
/// on and no file output.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOptions {
    pub bands: BandSelection,
    pub stretch: bool,
    /// Write `<input stem>.png` next to the input file.
    pub save: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            bands: BandSelection::default(),
            stretch: true,
            save: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Gray,
    Rgb,
}

impl ColorMode {
    pub fn channels(self) -> usize {
        match self {
            ColorMode::Gray => 1,
            ColorMode::Rgb => 3,
        }
    }
}

/// Display-ready samples: one or three interleaved channels per pixel,
/// nominally in [0, 1] when stretched.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayImage {
    pub rows: usize,
    pub cols: usize,
    pub mode: ColorMode,
    pub data: Vec<f32>,
}

impl DisplayImage {
    /// Interleaves row-major planes into one display image.
    fn from_planes(rows: usize, cols: usize, planes: &[Vec<f32>]) -> Self {
        let mode = if planes.len() == 3 {
            ColorMode::Rgb
        } else {
            ColorMode::Gray
        };
        let mut data = Vec::with_capacity(rows * cols * planes.len());
        for i in 0..rows * cols {
            for plane in planes {
                data.push(plane[i]);
            }
        }
        DisplayImage {
            rows,
            cols,
            mode,
            data,
        }
    }
}

/// Percentile stretch of one band plane: `(v - p2.5) / p97.5`, clipped to
/// [0, 1]. NaN samples stay NaN; an all-NaN plane is returned unchanged.
pub fn stretch_band(plane: &mut [f32]) {
    let mut sorted: Vec<f32> = plane.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return;
    }
    sorted.sort_by(f32::total_cmp);
    let low = percentile_of_sorted(&sorted, STRETCH_LOW) as f32;
    let high = percentile_of_sorted(&sorted, STRETCH_HIGH) as f32;
    for v in plane.iter_mut() {
        let s = (*v - low) / high;
        *v = if s < 0.0 {
            0.0
        } else if s > 1.0 {
            1.0
        } else {
            s
        };
    }
}

/// Sums all bands per pixel, skipping NaN samples.
pub fn sum_bands(image: &HipsImage) -> Vec<f32> {
    image
        .as_slice()
        .chunks(image.bands().max(1))
        .map(|px| px.iter().filter(|v| !v.is_nan()).sum::<f32>())
        .take(image.rows() * image.cols())
        .collect()
}

/// Selects, collapses and stretches bands of `image` for display.
pub fn prepare_display(image: &HipsImage, options: &DisplayOptions) -> Result<DisplayImage> {
    let (rows, cols, bands) = image.shape();
    let mut planes = match &options.bands {
        BandSelection::Sum if bands == 0 => vec![vec![0.0; rows * cols]],
        BandSelection::Sum => vec![sum_bands(image)],
        BandSelection::Bands(order) => {
            let chosen: &[usize] = match order.len() {
                0 => return Err(Error::InvalidSelection(0)),
                _ if bands == 1 => &order[..1],
                1 => &order[..],
                2 => return Err(Error::InvalidSelection(2)),
                _ => &order[..3],
            };
            chosen
                .iter()
                .map(|&b| image.band(b))
                .collect::<Result<Vec<_>>>()?
        }
    };

    if options.stretch {
        for plane in &mut planes {
            stretch_band(plane);
        }
    }
    log::debug!(
        "prepared {}x{} display from {} band(s), stretch={}",
        rows,
        cols,
        planes.len(),
        options.stretch
    );
    Ok(DisplayImage::from_planes(rows, cols, &planes))
}
