//! Per-frame processing: filter, convert, decorate.

use std::collections::HashMap;
use std::time::Instant;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::filter::{self, FilterKind};
use crate::frame::{PixelFormat, PlanarFrame};
use crate::landmarks::Face;
use crate::overlay::{self, AccessoryKind, AccessorySprite, CompositeTarget};

/// What [`FrameProcessor::process`] did to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The planes were rewritten by this filter.
    Filtered(FilterKind),
    /// No filter is selected; the frame is unchanged.
    Passthrough,
    /// The frame was left untouched because its format cannot be filtered.
    UnsupportedFormat(PixelFormat),
}

/// A frame converted to RGB with stickers drawn on it.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub image: RgbImage,
    pub status: FrameStatus,
    /// Sprite pixels written onto the image.
    pub pixels_drawn: usize,
}

/// Owns the selection state, sprite artwork and scratch memory needed to
/// process a stream of frames.
#[derive(Debug, Default)]
pub struct FrameProcessor {
    settings: Settings,
    sprites: HashMap<AccessoryKind, AccessorySprite>,
    scratch: Vec<u8>,
}

impl FrameProcessor {
    pub fn new(settings: Settings) -> Self {
        if settings.hardware_acceleration {
            info!("hardware acceleration requested; filters run on the CPU");
        }
        Self {
            settings,
            sprites: HashMap::new(),
            scratch: Vec::new(),
        }
    }

    /// Register the artwork for an accessory, replacing any previous sprite.
    pub fn with_sprite(mut self, kind: AccessoryKind, sprite: AccessorySprite) -> Self {
        self.set_sprite(kind, sprite);
        self
    }

    pub fn set_sprite(&mut self, kind: AccessoryKind, sprite: AccessorySprite) {
        self.sprites.insert(kind, sprite);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Apply the selected filter to `frame` in place.
    ///
    /// Frames in any format other than NV12 are left untouched.
    pub fn process(&mut self, format: PixelFormat, frame: &mut PlanarFrame) -> FrameStatus {
        if !format.is_filterable() {
            warn!(%format, "unsupported pixel format, frame left unfiltered");
            return FrameStatus::UnsupportedFormat(format);
        }

        let kind = self.settings.filter;
        if kind == FilterKind::None {
            return FrameStatus::Passthrough;
        }

        let start = Instant::now();
        filter::apply_frame_with_scratch(kind, frame, &mut self.scratch);
        debug!(
            filter = %kind,
            width = frame.width(),
            height = frame.height(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "filtered frame"
        );

        FrameStatus::Filtered(kind)
    }

    /// Draw every selected accessory on every face. Accessories without a
    /// registered sprite are skipped. Returns the number of pixels written.
    pub fn decorate<T: CompositeTarget + ?Sized>(&self, faces: &[Face], target: &mut T) -> usize {
        let mut written = 0;

        for face in faces {
            for &kind in &self.settings.accessories {
                let Some(sprite) = self.sprites.get(&kind) else {
                    debug!(accessory = %kind, "no sprite loaded, skipping");
                    continue;
                };
                written += overlay::composite(kind, sprite, face, target);
            }
        }

        written
    }

    /// Filter `frame`, convert it to RGB and draw the selected accessories.
    pub fn render(
        &mut self,
        format: PixelFormat,
        frame: &mut PlanarFrame,
        faces: &[Face],
    ) -> Rendered {
        let status = self.process(format, frame);
        let mut image = frame.to_rgb();
        let pixels_drawn = self.decorate(faces, &mut image);

        Rendered {
            image,
            status,
            pixels_drawn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{LandmarkSet, NUM_LANDMARKS};
    use crate::types::{BoundingBox, Point};
    use image::{Rgb, Rgba, RgbaImage};

    fn face() -> Face {
        let mut points = vec![Point::new(8, 8); NUM_LANDMARKS];
        points[33] = Point::new(8, 10);
        Face::new(LandmarkSet::new(points).unwrap()).with_bbox(BoundingBox::new(0, 0, 8, 8))
    }

    fn settings(filter: FilterKind, accessories: Vec<AccessoryKind>) -> Settings {
        Settings {
            filter,
            accessories,
            ..Settings::default()
        }
    }

    #[test]
    fn passthrough_without_filter() {
        let mut processor = FrameProcessor::default();
        let mut frame = PlanarFrame::filled(4, 4, 10, 20, 30).unwrap();
        let original = frame.clone();

        assert_eq!(
            processor.process(PixelFormat::Nv12, &mut frame),
            FrameStatus::Passthrough
        );
        assert_eq!(frame, original);
    }

    #[test]
    fn unsupported_format_is_untouched() {
        let mut processor = FrameProcessor::new(settings(FilterKind::Invert, vec![]));
        let mut frame = PlanarFrame::filled(4, 4, 10, 20, 30).unwrap();
        let original = frame.clone();

        for format in [PixelFormat::Nv21, PixelFormat::Rgba8888] {
            assert_eq!(
                processor.process(format, &mut frame),
                FrameStatus::UnsupportedFormat(format)
            );
            assert_eq!(frame, original);
        }
    }

    #[test]
    fn filter_applies_every_frame() {
        let mut processor = FrameProcessor::new(settings(FilterKind::Invert, vec![]));
        let mut frame = PlanarFrame::filled(4, 4, 10, 20, 30).unwrap();

        assert_eq!(
            processor.process(PixelFormat::Nv12, &mut frame),
            FrameStatus::Filtered(FilterKind::Invert)
        );
        assert_eq!(frame.y_plane(), &[245; 16]);

        processor.process(PixelFormat::Nv12, &mut frame);
        assert_eq!(frame, PlanarFrame::filled(4, 4, 10, 20, 30).unwrap());
    }

    #[test]
    fn selection_changes_between_frames() {
        let mut processor = FrameProcessor::default();
        processor.settings_mut().cycle_filter();
        assert_eq!(processor.settings().filter, FilterKind::Sepia);

        let mut frame = PlanarFrame::filled(2, 2, 10, 20, 30).unwrap();
        processor.process(PixelFormat::Nv12, &mut frame);
        assert_eq!(frame.uv_plane(), &[114, 144]);
    }

    #[test]
    fn missing_sprite_is_skipped() {
        let processor =
            FrameProcessor::new(settings(FilterKind::None, vec![AccessoryKind::Mustache]));
        let mut target = RgbImage::new(16, 16);
        assert_eq!(processor.decorate(&[face()], &mut target), 0);
        assert!(target.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn render_draws_over_filtered_frame() {
        let sprite = AccessorySprite::new(RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255])));
        let mut processor = FrameProcessor::new(settings(
            FilterKind::Grayscale,
            vec![AccessoryKind::Mustache],
        ))
        .with_sprite(AccessoryKind::Mustache, sprite);

        let mut frame = PlanarFrame::filled(16, 16, 0, 90, 200).unwrap();
        let rendered = processor.render(PixelFormat::Nv12, &mut frame, &[face()]);

        assert_eq!(rendered.status, FrameStatus::Filtered(FilterKind::Grayscale));
        // 4x4 mustache centered on (8, 10).
        assert_eq!(rendered.pixels_drawn, 16);
        assert_eq!(*rendered.image.get_pixel(6, 8), Rgb([255, 255, 255]));
        assert_eq!(*rendered.image.get_pixel(0, 0), Rgb([0, 0, 0]));
    }
}
