//! Byte-order handling for HIPS float32 samples.
//!
//! HIPS files carry no byte-order marker: samples are written in the native
//! order of the machine that produced them, which in practice is
//! little-endian. Decoding therefore defaults to [`SampleOrder::Native`], with
//! explicit little/big orders available for files moved between platforms.

use alloc::vec::Vec;

use bytemuck::pod_collect_to_vec;

/// Size in bytes of one float32 sample.
pub const SAMPLE_SIZE: usize = 4;

/// Byte order of the float32 samples in a HIPS payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleOrder {
    /// Whatever the running platform uses.
    #[default]
    Native,
    Little,
    Big,
}

impl SampleOrder {
    /// Resolves `Native` to the concrete order of this platform.
    pub fn resolve(self) -> SampleOrder {
        match self {
            SampleOrder::Native if cfg!(target_endian = "big") => SampleOrder::Big,
            SampleOrder::Native => SampleOrder::Little,
            other => other,
        }
    }

    fn is_native(self) -> bool {
        match self.resolve() {
            SampleOrder::Big => cfg!(target_endian = "big"),
            _ => cfg!(target_endian = "little"),
        }
    }
}

/// Reinterprets `bytes` as a stream of float32 samples starting at byte 0.
///
/// Trailing bytes that do not fill a whole sample are dropped, so the sample
/// grid is always aligned to the start of the buffer.
pub fn bytes_to_f32(bytes: &[u8], order: SampleOrder) -> Vec<f32> {
    let whole = bytes.len() - bytes.len() % SAMPLE_SIZE;
    let mut samples: Vec<f32> = pod_collect_to_vec(&bytes[..whole]);
    if !order.is_native() {
        for v in &mut samples {
            *v = f32::from_bits(v.to_bits().swap_bytes());
        }
    }
    samples
}

/// Serializes float32 samples in the requested byte order.
pub fn f32_to_bytes(samples: &[f32], order: SampleOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * SAMPLE_SIZE);
    for &v in samples {
        let bytes = match order.resolve() {
            SampleOrder::Big => v.to_be_bytes(),
            _ => v.to_le_bytes(),
        };
        out.extend_from_slice(&bytes);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn little_endian_decoding() {
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(bytes_to_f32(&bytes, SampleOrder::Little), vec![1.5]);
    }

    #[test]
    fn big_endian_decoding() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-2.25f32).to_be_bytes());
        bytes.extend_from_slice(&100.0f32.to_be_bytes());
        assert_eq!(bytes_to_f32(&bytes, SampleOrder::Big), vec![-2.25, 100.0]);
    }

    #[test]
    fn native_matches_platform() {
        let bytes = 3.0f32.to_ne_bytes();
        assert_eq!(bytes_to_f32(&bytes, SampleOrder::Native), vec![3.0]);
    }

    #[test]
    fn partial_trailing_sample_is_dropped() {
        let mut bytes = 7.0f32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(bytes_to_f32(&bytes, SampleOrder::Little), vec![7.0]);
    }

    #[test]
    fn unaligned_input_slice() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&0.5f32.to_le_bytes());
        let samples = bytes_to_f32(&buf[1..], SampleOrder::Little);
        assert_eq!(samples, vec![0.5]);
    }

    #[test]
    fn encoding_orders() {
        assert_eq!(f32_to_bytes(&[1.0], SampleOrder::Big), 1.0f32.to_be_bytes());
        assert_eq!(f32_to_bytes(&[1.0], SampleOrder::Little), 1.0f32.to_le_bytes());
        assert_eq!(f32_to_bytes(&[1.0], SampleOrder::Native), 1.0f32.to_ne_bytes());
    }

    #[test]
    fn native_resolves_to_concrete_order() {
        assert_ne!(SampleOrder::Native.resolve(), SampleOrder::Native);
        assert_eq!(SampleOrder::Big.resolve(), SampleOrder::Big);
    }
}
