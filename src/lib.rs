//! # face-filter
//!
//! Color filters for NV12 camera frames and landmark-anchored sticker
//! compositing.
//!
//! This crate provides:
//! - **Filter Engine**: point filters (sepia, grayscale, invert, no-red,
//!   no-blue, pinky) and 3x3 stencils (emboss, Gaussian) over the luma and
//!   interleaved chroma planes of an NV12 frame
//! - **Overlay Compositor**: mustache, glasses, ears and hat sprites sized and
//!   positioned from 68-point facial landmarks, drawn with a binary alpha mask
//! - **Frame Processor**: the per-frame loop tying both together
//!
//! Face detection is out of scope: landmarks are an input.
//!
//! ## Pipeline
//!
//! 1. Check the frame format; only NV12 frames are filtered
//! 2. Apply the selected filter to the planes it is defined for
//! 3. Convert the frame to RGB
//! 4. For every face, draw each selected accessory
//!
//! ## Quick Start
//!
//! ```rust
//! use face_filter::{
//!     AccessoryKind, AccessorySprite, BoundingBox, Face, FilterKind, FrameProcessor,
//!     LandmarkSet, PixelFormat, PlanarFrame, Point, Settings,
//! };
//! use image::{Rgba, RgbaImage};
//!
//! let settings = Settings {
//!     filter: FilterKind::Sepia,
//!     accessories: vec![AccessoryKind::Mustache],
//!     ..Settings::default()
//! };
//! let sprite = AccessorySprite::new(RgbaImage::from_pixel(4, 2, Rgba([40, 20, 10, 255])));
//! let mut processor =
//!     FrameProcessor::new(settings).with_sprite(AccessoryKind::Mustache, sprite);
//!
//! // A mid-gray 64x48 camera frame
//! let mut frame = PlanarFrame::filled(64, 48, 128, 128, 128).unwrap();
//!
//! // Landmarks usually come from a face alignment model
//! let landmarks = LandmarkSet::new(vec![Point::new(32, 24); 68]).unwrap();
//! let face = Face::new(landmarks).with_bbox(BoundingBox::new(16, 8, 32, 32));
//!
//! let rendered = processor.render(PixelFormat::Nv12, &mut frame, &[face]);
//! println!("{:?}, {} sticker pixels", rendered.status, rendered.pixels_drawn);
//! ```
//!
//! ## Custom Targets
//!
//! Implement the [`CompositeTarget`] trait to draw stickers into your own
//! pixel grids:
//!
//! ```rust
//! use face_filter::CompositeTarget;
//!
//! struct Canvas { /* ... */ }
//!
//! impl CompositeTarget for Canvas {
//!     fn dimensions(&self) -> (u32, u32) { (640, 480) }
//!     fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
//!         // Called only for in-bounds pixels
//!     }
//! }
//! ```

pub mod config;
pub mod convolve;
mod error;
pub mod filter;
pub mod frame;
pub mod landmarks;
pub mod overlay;
pub mod pipeline;
mod types;

pub use config::Settings;
pub use error::{Error, Result};
pub use filter::{apply, apply_frame, FilterKind, Plane};
pub use frame::{PixelFormat, PlanarFrame};
pub use landmarks::{Face, Landmark, LandmarkSet, Region, NUM_LANDMARKS};
pub use overlay::{
    composite, draw_landmarks, placements, AccessoryKind, AccessorySprite, CompositeTarget,
    Placement,
};
pub use pipeline::{FrameProcessor, FrameStatus, Rendered};
pub use types::{BoundingBox, Point};
