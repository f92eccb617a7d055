//! HIPS image cube decoding and encoding.
//!
//! The payload is never located through the header length. Instead the whole
//! file is reinterpreted as float32 samples and the last
//! `bands * res_x * res_y` samples are taken, which skips the header text
//! implicitly. Those samples are laid out band by band; each band plane is
//! transposed and then rotated 90 degrees counter-clockwise three times so
//! rows run top to bottom in display order.

use alloc::vec;
use alloc::vec::Vec;

use crate::endian::{bytes_to_f32, f32_to_bytes, SampleOrder, SAMPLE_SIZE};
use crate::error::{Error, Result};
use crate::header::{format_header, parse_header, HipsHeader};

/// A decoded image cube with logical axes (row, column, band).
///
/// Samples are stored row-major: the band index varies fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct HipsImage {
    rows: usize,
    cols: usize,
    bands: usize,
    data: Vec<f32>,
}

/// `rows * cols * bands`, or `None` on overflow.
fn sample_count(rows: usize, cols: usize, bands: usize) -> Option<usize> {
    rows.checked_mul(cols)?.checked_mul(bands)
}

/// Like [`sample_count`] for constructors that cannot report an error.
fn sample_count_or_panic(rows: usize, cols: usize, bands: usize) -> usize {
    match sample_count(rows, cols, bands) {
        Some(n) => n,
        None => panic!("image shape {rows}x{cols}x{bands} overflows usize"),
    }
}

impl HipsImage {
    /// Wraps `data` laid out in (row, column, band) order.
    pub fn from_vec(rows: usize, cols: usize, bands: usize, data: Vec<f32>) -> Result<Self> {
        let expected = sample_count(rows, cols, bands).ok_or(Error::InvalidShape {
                bands: bands as i64,
                res_x: cols as i64,
                res_y: rows as i64,
            })?;
        if data.len() != expected {
            return Err(Error::InsufficientData {
                expected,
                available: data.len(),
            });
        }
        Ok(HipsImage {
            rows,
            cols,
            bands,
            data,
        })
    }

    /// An image of the given shape filled with zeros.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols * bands` overflows `usize`.
    pub fn zeros(rows: usize, cols: usize, bands: usize) -> Self {
        HipsImage {
            rows,
            cols,
            bands,
            data: vec![0.0; sample_count_or_panic(rows, cols, bands)],
        }
    }

    /// Builds an image by evaluating `f(row, col, band)` for every sample.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols * bands` overflows `usize`.
    pub fn from_fn<F>(rows: usize, cols: usize, bands: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        let mut data = Vec::with_capacity(sample_count_or_panic(rows, cols, bands));
        for r in 0..rows {
            for c in 0..cols {
                for b in 0..bands {
                    data.push(f(r, c, b));
                }
            }
        }
        HipsImage {
            rows,
            cols,
            bands,
            data,
        }
    }

    /// `(rows, cols, bands)`, i.e. `(res_y, res_x, bands)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.rows, self.cols, self.bands)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All samples in (row, column, band) order.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    fn index(&self, row: usize, col: usize, band: usize) -> usize {
        (row * self.cols + col) * self.bands + band
    }

    /// Sample at `(row, col, band)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize, band: usize) -> Option<f32> {
        if row < self.rows && col < self.cols && band < self.bands {
            Some(self.data[self.index(row, col, band)])
        } else {
            None
        }
    }

    /// Overwrites one sample. Panics when out of bounds.
    pub fn set(&mut self, row: usize, col: usize, band: usize, value: f32) {
        assert!(
            row < self.rows && col < self.cols && band < self.bands,
            "sample index out of bounds"
        );
        let i = self.index(row, col, band);
        self.data[i] = value;
    }

    /// Copies one band out as a row-major `rows x cols` plane.
    pub fn band(&self, band: usize) -> Result<Vec<f32>> {
        if band >= self.bands {
            return Err(Error::InvalidBand {
                index: band,
                bands: self.bands,
            });
        }
        Ok(self
            .data
            .iter()
            .skip(band)
            .step_by(self.bands)
            .copied()
            .collect())
    }
}

/// Maps output position `(row, col, band)` to its offset in the band-major
/// payload tail. Shared by decoding and encoding so they stay inverse.
fn payload_offset(rows: usize, cols: usize, row: usize, col: usize, band: usize) -> usize {
    band * rows * cols + row * cols + (cols - 1 - col)
}

/// Rearranges a band-major payload tail into (row, column, band) order.
fn reorient(tail: &[f32], rows: usize, cols: usize, bands: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(tail.len());
    for r in 0..rows {
        for c in 0..cols {
            for b in 0..bands {
                out.push(tail[payload_offset(rows, cols, r, c, b)]);
            }
        }
    }
    out
}

/// Inverse of [`reorient`].
fn disorient(image: &HipsImage) -> Vec<f32> {
    let (rows, cols, bands) = image.shape();
    let mut tail = vec![0.0f32; image.len()];
    for r in 0..rows {
        for c in 0..cols {
            for b in 0..bands {
                tail[payload_offset(rows, cols, r, c, b)] = image.data[image.index(r, c, b)];
            }
        }
    }
    tail
}

/// A decoded file: the image plus the header it was read with.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedHips {
    pub image: HipsImage,
    pub header: HipsHeader,
}

impl DecodedHips {
    /// Splits into `(image, bands, res_x, res_y, fmt)`.
    pub fn into_parts(self) -> (HipsImage, i64, i64, i64, i64) {
        let h = self.header;
        (self.image, h.bands, h.res_x, h.res_y, h.fmt)
    }
}

/// Decodes a complete HIPS file held in memory, assuming native sample order.
///
/// The result always has shape `(res_y, res_x, bands)`, and each band is read
/// from the payload as `res_y` rows of `res_x` samples with the columns
/// mirrored. Loaders that reshape the tail to `(bands, res_x, res_y)` and
/// apply `rot90(plane.T, 3)` agree with this on square planes only; for
/// non-square planes they return a `(res_x, res_y, bands)` array, so code
/// that relies on that layout must transpose each plane.
pub fn decode_hips(data: &[u8]) -> Result<DecodedHips> {
    decode_hips_with_order(data, SampleOrder::Native)
}

/// Decodes a complete HIPS file held in memory.
pub fn decode_hips_with_order(data: &[u8], order: SampleOrder) -> Result<DecodedHips> {
    let header = parse_header(data)?;
    let expected = header.element_count().ok_or(Error::InvalidShape {
        bands: header.bands,
        res_x: header.res_x,
        res_y: header.res_y,
    })?;

    let available = data.len() / SAMPLE_SIZE;
    if available < expected {
        return Err(Error::InsufficientData {
            expected,
            available,
        });
    }

    let samples = bytes_to_f32(data, order);
    let tail = &samples[samples.len() - expected..];

    let bands = header.bands as usize;
    let cols = header.res_x as usize;
    let rows = header.res_y as usize;
    let image = HipsImage {
        rows,
        cols,
        bands,
        data: reorient(tail, rows, cols, bands),
    };
    log::debug!(
        "decoded HIPS cube {}x{}x{} ({} leading samples skipped)",
        rows,
        cols,
        bands,
        samples.len() - expected
    );
    Ok(DecodedHips { image, header })
}

/// Encodes `image` as a HIPS byte stream in native sample order.
///
/// Fails with [`Error::InvalidTag`] when `tag` would not parse back as a
/// single header token.
pub fn encode_hips(image: &HipsImage, tag: &str, fmt: i64) -> Result<Vec<u8>> {
    encode_hips_with_order(image, tag, fmt, SampleOrder::Native)
}

/// Encodes `image` as a HIPS byte stream.
///
/// The header is padded with newlines to a sample boundary so the payload
/// lines up with the float32 grid the decoder reads.
pub fn encode_hips_with_order(
    image: &HipsImage,
    tag: &str,
    fmt: i64,
    order: SampleOrder,
) -> Result<Vec<u8>> {
    let mut out = format_header(
        tag,
        image.bands as i64,
        image.cols as i64,
        image.rows as i64,
        fmt,
        SAMPLE_SIZE,
    )?;
    out.reserve(image.len() * SAMPLE_SIZE);
    out.extend_from_slice(&f32_to_bytes(&disorient(image), order));
    log::debug!(
        "encoded HIPS cube {}x{}x{} into {} bytes",
        image.rows,
        image.cols,
        image.bands,
        out.len()
    );
    Ok(out)
}

/// Reads and decodes the HIPS file at `path` with a single read.
#[cfg(feature = "std")]
pub fn read_hips<P: AsRef<std::path::Path>>(path: P) -> Result<DecodedHips> {
    let data = std::fs::read(path.as_ref())?;
    log::debug!("read {} bytes from {}", data.len(), path.as_ref().display());
    decode_hips(&data)
}

/// Encodes `image` and writes it to `path`.
#[cfg(feature = "std")]
pub fn write_hips<P: AsRef<std::path::Path>>(
    path: P,
    image: &HipsImage,
    tag: &str,
    fmt: i64,
) -> Result<()> {
    std::fs::write(path, encode_hips(image, tag, fmt)?)?;
    Ok(())
}
