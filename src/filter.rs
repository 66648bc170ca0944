//! Per-plane color filters for NV12 frames.
//!
//! Point filters rewrite each byte from its own value (or its position in the
//! interleaved chroma plane). Emboss and Gaussian are 3x3 stencils, see
//! [`crate::convolve`].
//!
//! In the chroma plane even bytes are Cb (U) and odd bytes are Cr (V).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::convolve::{self, EMBOSS, GAUSSIAN};
use crate::error::Error;
use crate::frame::PlanarFrame;

/// Neutral chroma value (no color difference).
const NEUTRAL_CHROMA: u8 = 128;
const SEPIA_CB: u8 = 114;
const SEPIA_CR: u8 = 144;
const PINKY_GAIN: f32 = 1.2;

/// Which plane of an NV12 frame a buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Luma,
    Chroma,
}

/// The selectable frame filters, declared in selector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    None,
    Sepia,
    Grayscale,
    Invert,
    Emboss,
    Gaussian,
    Pinky,
    NoRed,
    NoBlue,
}

impl FilterKind {
    /// Every filter, in selector order.
    pub const ALL: [FilterKind; 9] = [
        FilterKind::None,
        FilterKind::Sepia,
        FilterKind::Grayscale,
        FilterKind::Invert,
        FilterKind::Emboss,
        FilterKind::Gaussian,
        FilterKind::Pinky,
        FilterKind::NoRed,
        FilterKind::NoBlue,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a selector value. Out-of-range values give `None`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The next filter, wrapping from the last back to `None`.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::None => "none",
            FilterKind::Sepia => "sepia",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Invert => "invert",
            FilterKind::NoRed => "nored",
            FilterKind::NoBlue => "noblue",
            FilterKind::Emboss => "emboss",
            FilterKind::Gaussian => "gaussian",
            FilterKind::Pinky => "pinky",
        }
    }

    /// Planes this filter changes when applied to a whole frame.
    pub fn planes(self) -> &'static [Plane] {
        match self {
            FilterKind::None => &[],
            FilterKind::Sepia | FilterKind::Grayscale | FilterKind::NoRed | FilterKind::NoBlue => {
                &[Plane::Chroma]
            }
            FilterKind::Invert
            | FilterKind::Emboss
            | FilterKind::Gaussian
            | FilterKind::Pinky => &[Plane::Luma, Plane::Chroma],
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == key)
            .ok_or_else(|| Error::UnknownFilter(s.to_string()))
    }
}

/// Fix Cb/Cr to a sepia tone.
pub fn sepia(data: &mut [u8]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = if i % 2 == 0 { SEPIA_CB } else { SEPIA_CR };
    }
}

/// Neutralize all chroma.
pub fn grayscale(data: &mut [u8]) {
    data.fill(NEUTRAL_CHROMA);
}

pub fn invert(data: &mut [u8]) {
    for byte in data.iter_mut() {
        *byte = 255 - *byte;
    }
}

/// Neutralize Cr.
pub fn no_red(data: &mut [u8]) {
    for byte in data.iter_mut().skip(1).step_by(2) {
        *byte = NEUTRAL_CHROMA;
    }
}

/// Neutralize Cb.
pub fn no_blue(data: &mut [u8]) {
    for byte in data.iter_mut().step_by(2) {
        *byte = NEUTRAL_CHROMA;
    }
}

/// Brighten the darker half of the luma range.
pub fn pinky_luma(data: &mut [u8]) {
    for byte in data.iter_mut().filter(|b| **b < 128) {
        *byte = scale(*byte, PINKY_GAIN);
    }
}

/// Boost Cb.
pub fn pinky_chroma(data: &mut [u8]) {
    for byte in data.iter_mut().step_by(2) {
        *byte = scale(*byte, PINKY_GAIN);
    }
}

/// Multiply and truncate, saturating at 255.
#[inline]
fn scale(value: u8, gain: f32) -> u8 {
    (value as f32 * gain) as u8
}

/// Apply `kind` to one plane buffer in place.
///
/// `width` is the plane's row length in bytes; only the stencil filters use
/// it. `FilterKind::None` leaves the buffer untouched.
pub fn apply(kind: FilterKind, plane: Plane, data: &mut [u8], width: usize) {
    let mut scratch = Vec::new();
    apply_with_scratch(kind, plane, data, width, &mut scratch);
}

/// Like [`apply`], reusing `scratch` for the stencil output.
pub fn apply_with_scratch(
    kind: FilterKind,
    plane: Plane,
    data: &mut [u8],
    width: usize,
    scratch: &mut Vec<u8>,
) {
    trace!(filter = %kind, ?plane, len = data.len(), width, "applying filter");

    match kind {
        FilterKind::None => {}
        FilterKind::Sepia => sepia(data),
        FilterKind::Grayscale => grayscale(data),
        FilterKind::Invert => invert(data),
        FilterKind::NoRed => no_red(data),
        FilterKind::NoBlue => no_blue(data),
        FilterKind::Emboss => convolve::convolve_into(data, width, plane, &EMBOSS, scratch),
        FilterKind::Gaussian => convolve::convolve_into(data, width, plane, &GAUSSIAN, scratch),
        FilterKind::Pinky => match plane {
            Plane::Luma => pinky_luma(data),
            Plane::Chroma => pinky_chroma(data),
        },
    }
}

/// Apply `kind` to the planes of `frame` it is defined for.
pub fn apply_frame(kind: FilterKind, frame: &mut PlanarFrame) {
    let mut scratch = Vec::new();
    apply_frame_with_scratch(kind, frame, &mut scratch);
}

/// Like [`apply_frame`], reusing `scratch` for the stencil output.
pub fn apply_frame_with_scratch(kind: FilterKind, frame: &mut PlanarFrame, scratch: &mut Vec<u8>) {
    // One UV row holds width/2 (U, V) pairs, so both planes share a row length.
    let width = frame.width() as usize;
    let (y_plane, uv_plane) = frame.planes_mut();

    for plane in kind.planes() {
        let data = match plane {
            Plane::Luma => &mut *y_plane,
            Plane::Chroma => &mut *uv_plane,
        };
        apply_with_scratch(kind, *plane, data, width, scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 37 % 256) as u8).collect()
    }

    #[test]
    fn sepia_fixes_chroma() {
        let mut data = ramp(8);
        apply(FilterKind::Sepia, Plane::Chroma, &mut data, 4);
        assert_eq!(data, vec![114, 144, 114, 144, 114, 144, 114, 144]);
    }

    #[test]
    fn grayscale_neutralizes_chroma() {
        for n in [0, 1, 7, 64] {
            let mut data = ramp(n);
            apply(FilterKind::Grayscale, Plane::Chroma, &mut data, 4);
            assert_eq!(data, vec![128; n]);
        }
    }

    #[test]
    fn invert_luma_ramp() {
        let mut data: Vec<u8> = (0..16).map(|i| i * 10).collect();
        apply(FilterKind::Invert, Plane::Luma, &mut data, 4);
        let expected: Vec<u8> = (0..16).map(|i| 255 - i * 10).collect();
        assert_eq!(data, expected);
        assert_eq!(data[0], 255);
        assert_eq!(data[15], 105);
    }

    #[test]
    fn invert_is_involution() {
        let original: Vec<u8> = (0..=255).collect();
        let mut data = original.clone();
        invert(&mut data);
        assert_ne!(data, original);
        invert(&mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn channel_zeroing() {
        let mut data = vec![10, 20, 30, 40];
        no_red(&mut data);
        assert_eq!(data, vec![10, 128, 30, 128]);

        let mut data = vec![10, 20, 30, 40];
        no_blue(&mut data);
        assert_eq!(data, vec![128, 20, 128, 40]);
    }

    #[test]
    fn channel_zeroing_is_idempotent() {
        for kind in [FilterKind::NoRed, FilterKind::NoBlue] {
            let mut once = ramp(20);
            apply(kind, Plane::Chroma, &mut once, 4);
            let mut twice = once.clone();
            apply(kind, Plane::Chroma, &mut twice, 4);
            assert_eq!(once, twice, "{}", kind);
        }
    }

    #[test]
    fn pinky_rules() {
        let mut luma = vec![0, 10, 100, 127, 128, 200];
        apply(FilterKind::Pinky, Plane::Luma, &mut luma, 6);
        assert_eq!(luma, vec![0, 12, 120, 152, 128, 200]);

        let mut chroma = vec![100, 100, 250, 250];
        apply(FilterKind::Pinky, Plane::Chroma, &mut chroma, 4);
        assert_eq!(chroma, vec![120, 100, 255, 250]);
    }

    #[test]
    fn none_is_passthrough() {
        let original = ramp(32);
        let mut data = original.clone();
        apply(FilterKind::None, Plane::Luma, &mut data, 8);
        assert_eq!(data, original);
    }

    #[test]
    fn selector_cycle() {
        let mut kind = FilterKind::default();
        assert_eq!(kind, FilterKind::None);
        for expected in FilterKind::ALL.iter().skip(1) {
            kind = kind.next();
            assert_eq!(kind, *expected);
        }
        assert_eq!(kind.next(), FilterKind::None);

        assert_eq!(FilterKind::from_index(3), Some(FilterKind::Invert));
        assert_eq!(FilterKind::from_index(4), Some(FilterKind::Emboss));
        assert_eq!(FilterKind::from_index(6), Some(FilterKind::Pinky));
        assert_eq!(FilterKind::from_index(8), Some(FilterKind::NoBlue));
        assert_eq!(FilterKind::from_index(9), None);
        assert_eq!(FilterKind::Pinky.next(), FilterKind::NoRed);
        assert_eq!(FilterKind::NoBlue.next(), FilterKind::None);
        for (i, kind) in FilterKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn parse_names() {
        for kind in FilterKind::ALL {
            assert_eq!(kind.name().parse::<FilterKind>().unwrap(), kind);
        }
        assert_eq!("No-Red".parse::<FilterKind>().unwrap(), FilterKind::NoRed);
        assert!(matches!(
            "vignette".parse::<FilterKind>(),
            Err(Error::UnknownFilter(_))
        ));
    }

    #[test]
    fn frame_plane_selection() {
        let mut frame = PlanarFrame::filled(4, 4, 40, 60, 70).unwrap();
        apply_frame(FilterKind::Sepia, &mut frame);
        assert_eq!(frame.y_plane(), &[40; 16]);
        assert_eq!(frame.uv_plane(), &[114, 144, 114, 144, 114, 144, 114, 144]);

        let mut frame = PlanarFrame::filled(4, 4, 40, 60, 70).unwrap();
        apply_frame(FilterKind::Invert, &mut frame);
        assert_eq!(frame.y_plane(), &[215; 16]);
        assert_eq!(frame.uv_plane(), &[195, 185, 195, 185, 195, 185, 195, 185]);

        let mut frame = PlanarFrame::filled(4, 4, 40, 60, 70).unwrap();
        apply_frame(FilterKind::None, &mut frame);
        assert_eq!(frame, PlanarFrame::filled(4, 4, 40, 60, 70).unwrap());
    }
}
