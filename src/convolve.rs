//! 3x3 stencil filters over a flattened image plane.
//!
//! The plane is addressed as a 1-D buffer; `width` is the length of one row in
//! bytes. Luma samples are one byte apart, chroma samples two (U and V are
//! interleaved), so the two planes use different neighbor offset tables:
//!
//! ```text
//! luma:   x-w-1  x-w  x-w+1     chroma: x-w-2  x-w  x-w+2
//!         x-1    x    x+1               x-2    x    x+2
//!         x+w-1  x+w  x+w+1             x+w-2  x+w  x+w+2
//! ```
//!
//! Neighbors that fall before the start or past the end of the buffer read as
//! zero. Rows are not otherwise separated: the left neighbor of the first
//! sample in a row is the last sample of the previous row.

use crate::filter::Plane;

// Taps are applied in 16.16 fixed point.
const FRAC_BITS: u32 = 16;
const ONE: i64 = 1 << FRAC_BITS;

/// A 3x3 filter mask in row-major order.
///
/// The mask is applied as a convolution: the neighbor at table position `k`
/// is weighted by `weights[8 - k]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mask(pub [f32; 9]);

impl Mask {
    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    /// The weights in 16.16 fixed point, normalized so they sum to exactly
    /// one. A mask whose weights cancel out is only scaled.
    pub fn fixed_point(&self) -> [i64; 9] {
        let sum = self.sum();
        let normalize = sum.abs() > f32::EPSILON;
        let scale = if normalize { ONE as f32 / sum } else { ONE as f32 };

        let mut taps = self.0.map(|w| (w * scale).round() as i64);
        if normalize {
            // Rounding residue goes to the center tap.
            taps[4] += ONE - taps.iter().sum::<i64>();
        }
        taps
    }
}

/// Directional relief mask.
pub const EMBOSS: Mask = Mask([-2.0, -1.0, 0.0, -1.0, 1.0, 1.0, 0.0, 1.0, 2.0]);

/// Low-pass blur weights. They sum to 0.9997 and are renormalized when
/// applied, so flat regions keep their level.
pub const GAUSSIAN: Mask = Mask([
    0.0113, 0.0838, 0.0113, //
    0.0838, 0.6193, 0.0838, //
    0.0113, 0.0838, 0.0113, //
]);

impl Plane {
    /// Distance in bytes between horizontally adjacent samples.
    const fn sample_step(self) -> isize {
        match self {
            Plane::Luma => 1,
            Plane::Chroma => 2,
        }
    }

    pub fn neighbor_offsets(self, width: usize) -> [isize; 9] {
        let w = width as isize;
        let s = self.sample_step();
        [-w - s, -w, -w + s, -s, 0, s, w - s, w, w + s]
    }
}

/// Read a sample, treating anything outside the buffer as zero.
#[inline]
fn sample(data: &[u8], idx: isize) -> i64 {
    if idx < 0 {
        return 0;
    }
    data.get(idx as usize).map_or(0, |&v| i64::from(v))
}

/// Drop the fraction, then clamp to the byte range.
#[inline]
fn store(sum: i64) -> u8 {
    (sum >> FRAC_BITS).clamp(0, 255) as u8
}

/// Convolve `data` in place, using `scratch` as the output buffer.
///
/// `scratch` is cleared and grown as needed, so one buffer can be reused
/// across frames.
pub fn convolve_into(
    data: &mut [u8],
    width: usize,
    plane: Plane,
    mask: &Mask,
    scratch: &mut Vec<u8>,
) {
    if width == 0 || data.is_empty() {
        return;
    }

    let offsets = plane.neighbor_offsets(width);
    let taps = mask.fixed_point();
    scratch.clear();
    scratch.reserve(data.len());

    for x in 0..data.len() {
        let center = x as isize;
        let sum: i64 = offsets
            .iter()
            .zip(taps.iter().rev())
            .map(|(off, tap)| sample(data, center + off) * tap)
            .sum();
        scratch.push(store(sum));
    }

    data.copy_from_slice(scratch);
}

/// Convolve `data` in place with a freshly allocated output buffer.
pub fn convolve(data: &mut [u8], width: usize, plane: Plane, mask: &Mask) {
    let mut scratch = Vec::with_capacity(data.len());
    convolve_into(data, width, plane, mask, &mut scratch);
}
