#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod endian;
pub mod error;
pub mod header;
pub mod image;
pub mod stats;
pub mod stretch;
pub mod table;

#[cfg(feature = "array")]
pub mod array;

#[cfg(feature = "render")]
pub mod render;

pub use endian::SampleOrder;
pub use error::{Error, ErrorKind, Result};
pub use header::{parse_header, HipsHeader};
pub use image::{decode_hips, encode_hips, DecodedHips, HipsImage};

#[cfg(feature = "std")]
pub use header::read_header;
#[cfg(feature = "std")]
pub use image::{read_hips, write_hips};
