//! NV12 camera frames and conversion to and from packed RGB.
//!
//! NV12 is a semi-planar YUV 4:2:0 layout:
//! - **Y plane**: one luma byte per pixel (`width * height` bytes)
//! - **UV plane**: interleaved chroma at half resolution (`width * height / 2`
//!   bytes). Each (U, V) byte pair covers a 2x2 block of pixels, so one UV row
//!   is `width` bytes long.
//!
//! Conversion uses the full-range BT.601 matrix that camera preview and JPEG
//! pipelines produce:
//!
//! ```text
//! R = Y + 1.402 * (V - 128)
//! G = Y - 0.344 * (U - 128) - 0.714 * (V - 128)
//! B = Y + 1.772 * (U - 128)
//! ```

use std::fmt;

use image::RgbImage;

use crate::error::{Error, Result};

// 10-bit fixed point (x1024).
const V_TO_R: i32 = 1436;
const U_TO_G: i32 = 352;
const V_TO_G: i32 = 731;
const U_TO_B: i32 = 1815;

const R_TO_Y: i32 = 306;
const G_TO_Y: i32 = 601;
const B_TO_Y: i32 = 117;
const R_TO_U: i32 = -173;
const G_TO_U: i32 = -339;
const B_TO_U: i32 = 512;
const R_TO_V: i32 = 512;
const G_TO_V: i32 = -429;
const B_TO_V: i32 = -83;

#[inline(always)]
fn clamp_u8(val: i32) -> u8 {
    val.clamp(0, 255) as u8
}

/// Pixel layouts a capture source may hand over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Nv12,
    Nv21,
    I420,
    Yv12,
    Yuyv,
    Uyvy,
    Rgb565,
    Rgb888,
    Rgba8888,
    Bgra8888,
}

impl PixelFormat {
    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Nv12 => "NV12",
            PixelFormat::Nv21 => "NV21",
            PixelFormat::I420 => "I420",
            PixelFormat::Yv12 => "YV12",
            PixelFormat::Yuyv => "YUYV",
            PixelFormat::Uyvy => "UYVY",
            PixelFormat::Rgb565 => "RGB565",
            PixelFormat::Rgb888 => "RGB888",
            PixelFormat::Rgba8888 => "RGBA8888",
            PixelFormat::Bgra8888 => "BGRA8888",
        }
    }

    /// Whether the filter engine can run on frames of this format.
    pub fn is_filterable(self) -> bool {
        self == PixelFormat::Nv12
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One NV12 frame with owned luma and chroma planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanarFrame {
    width: u32,
    height: u32,
    y_plane: Vec<u8>,
    uv_plane: Vec<u8>,
}

impl PlanarFrame {
    /// Wrap existing planes, checking their sizes against the dimensions.
    pub fn new(width: u32, height: u32, y_plane: Vec<u8>, uv_plane: Vec<u8>) -> Result<Self> {
        if width % 2 != 0 || height % 2 != 0 {
            return Err(Error::OddDimensions { width, height });
        }

        let y_len = width as usize * height as usize;
        if y_plane.len() != y_len {
            return Err(Error::PlaneSize {
                plane: "Y",
                expected: y_len,
                actual: y_plane.len(),
            });
        }
        if uv_plane.len() != y_len / 2 {
            return Err(Error::PlaneSize {
                plane: "UV",
                expected: y_len / 2,
                actual: uv_plane.len(),
            });
        }

        Ok(Self {
            width,
            height,
            y_plane,
            uv_plane,
        })
    }

    /// A frame filled with one YUV value.
    pub fn filled(width: u32, height: u32, y: u8, u: u8, v: u8) -> Result<Self> {
        let y_len = width as usize * height as usize;
        let uv_plane = [u, v].repeat(y_len / 4);
        Self::new(width, height, vec![y; y_len], uv_plane)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn y_plane(&self) -> &[u8] {
        &self.y_plane
    }

    pub fn uv_plane(&self) -> &[u8] {
        &self.uv_plane
    }

    /// Mutable access to both planes at once.
    pub fn planes_mut(&mut self) -> (&mut [u8], &mut [u8]) {
        (&mut self.y_plane, &mut self.uv_plane)
    }

    /// Convert a packed RGB image. Chroma is averaged over each 2x2 block.
    pub fn from_rgb(img: &RgbImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        if width % 2 != 0 || height % 2 != 0 {
            return Err(Error::OddDimensions { width, height });
        }

        let w = width as usize;
        let h = height as usize;
        let mut y_plane = vec![0u8; w * h];
        let mut uv_plane = vec![0u8; w * h / 2];

        for row in (0..h).step_by(2) {
            for col in (0..w).step_by(2) {
                let mut u_sum = 0;
                let mut v_sum = 0;

                for (dy, dx) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                    let px = img.get_pixel((col + dx) as u32, (row + dy) as u32);
                    let [r, g, b] = px.0.map(i32::from);

                    y_plane[(row + dy) * w + col + dx] =
                        clamp_u8((R_TO_Y * r + G_TO_Y * g + B_TO_Y * b + 512) >> 10);
                    u_sum += R_TO_U * r + G_TO_U * g + B_TO_U * b;
                    v_sum += R_TO_V * r + G_TO_V * g + B_TO_V * b;
                }

                // Average of four samples: divide by 4 * 1024.
                let uv_idx = (row / 2) * w + col;
                uv_plane[uv_idx] = clamp_u8(((u_sum + 2048) >> 12) + 128);
                uv_plane[uv_idx + 1] = clamp_u8(((v_sum + 2048) >> 12) + 128);
            }
        }

        Ok(Self {
            width,
            height,
            y_plane,
            uv_plane,
        })
    }

    /// Convert to packed RGB.
    pub fn to_rgb(&self) -> RgbImage {
        let w = self.width as usize;
        let mut img = RgbImage::new(self.width, self.height);

        for (x, y, px) in img.enumerate_pixels_mut() {
            let (col, row) = (x as usize, y as usize);
            let uv_idx = (row / 2) * w + (col / 2) * 2;
            let u = self.uv_plane[uv_idx] as i32 - 128;
            let v = self.uv_plane[uv_idx + 1] as i32 - 128;
            let luma = (self.y_plane[row * w + col] as i32) << 10;

            px.0 = [
                clamp_u8((luma + V_TO_R * v + 512) >> 10),
                clamp_u8((luma - U_TO_G * u - V_TO_G * v + 512) >> 10),
                clamp_u8((luma + U_TO_B * u + 512) >> 10),
            ];
        }

        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn plane_sizes_validated() {
        assert!(PlanarFrame::new(4, 2, vec![0; 8], vec![0; 4]).is_ok());

        let err = PlanarFrame::new(4, 2, vec![0; 7], vec![0; 4]).unwrap_err();
        assert!(matches!(err, Error::PlaneSize { plane: "Y", .. }));

        let err = PlanarFrame::new(4, 2, vec![0; 8], vec![0; 8]).unwrap_err();
        assert!(matches!(
            err,
            Error::PlaneSize {
                plane: "UV",
                expected: 4,
                actual: 8
            }
        ));

        let err = PlanarFrame::new(3, 2, vec![0; 6], vec![0; 3]).unwrap_err();
        assert!(matches!(err, Error::OddDimensions { .. }));
    }

    #[test]
    fn filled_frame_layout() {
        let frame = PlanarFrame::filled(4, 4, 50, 100, 200).unwrap();
        assert_eq!(frame.y_plane(), &[50; 16]);
        assert_eq!(frame.uv_plane(), &[100, 200, 100, 200, 100, 200, 100, 200]);
    }

    #[test]
    fn neutral_chroma_renders_gray() {
        let frame = PlanarFrame::filled(4, 2, 90, 128, 128).unwrap();
        let rgb = frame.to_rgb();
        assert!(rgb.pixels().all(|p| *p == Rgb([90, 90, 90])));
    }

    #[test]
    fn gray_image_has_neutral_chroma() {
        let img = RgbImage::from_fn(6, 4, |x, _| {
            let v = (x * 40) as u8;
            Rgb([v, v, v])
        });
        let frame = PlanarFrame::from_rgb(&img).unwrap();
        assert!(frame.uv_plane().iter().all(|&c| c == 128));
        assert_eq!(&frame.y_plane()[..6], &[0, 40, 80, 120, 160, 200]);
    }

    #[test]
    fn color_survives_conversion() {
        let img = RgbImage::from_pixel(4, 4, Rgb([200, 40, 90]));
        let back = PlanarFrame::from_rgb(&img).unwrap().to_rgb();
        for px in back.pixels() {
            for (a, b) in px.0.iter().zip([200u8, 40, 90]) {
                assert!((*a as i32 - b as i32).abs() <= 2, "{:?}", px);
            }
        }
    }

    #[test]
    fn format_names() {
        assert_eq!(PixelFormat::Nv12.to_string(), "NV12");
        assert!(PixelFormat::Nv12.is_filterable());
        assert!(!PixelFormat::Nv21.is_filterable());
        assert!(!PixelFormat::Rgba8888.is_filterable());
    }
}
