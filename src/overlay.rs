//! Landmark-anchored sticker compositing.
//!
//! Each accessory derives a size and one or more anchor points from the face,
//! resizes its sprite to that size with bilinear interpolation, centers it on
//! the anchor and copies every pixel with non-zero alpha onto the target.
//! There is no blending: alpha is a binary mask. Pixels that would land
//! outside the target are dropped.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Error;
use crate::landmarks::{Face, Landmark, Region};
use crate::types::{BoundingBox, Point};

/// Stickers that can be drawn on a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessoryKind {
    Mustache,
    Glasses,
    Ear,
    Hat,
}

impl AccessoryKind {
    pub const ALL: [AccessoryKind; 4] = [
        AccessoryKind::Mustache,
        AccessoryKind::Glasses,
        AccessoryKind::Ear,
        AccessoryKind::Hat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AccessoryKind::Mustache => "mustache",
            AccessoryKind::Glasses => "glasses",
            AccessoryKind::Ear => "ear",
            AccessoryKind::Hat => "hat",
        }
    }

    /// The next accessory, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Conventional sprite file name. For `Ear` this is the left-side asset;
    /// see [`paired_asset_path`] for its partner.
    pub fn default_asset(self) -> &'static str {
        match self {
            AccessoryKind::Mustache => "mustache.png",
            AccessoryKind::Glasses => "glasses.png",
            AccessoryKind::Ear => "ear_l.png",
            AccessoryKind::Hat => "hat.png",
        }
    }
}

impl fmt::Display for AccessoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessoryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == key)
            .ok_or_else(|| Error::UnknownAccessory(s.to_string()))
    }
}

/// Derive the file name of the mirrored half of a sprite pair.
///
/// The character five positions from the end of the file name (the side
/// marker in `name_l.png`) is replaced with `r`. Returns `None` when the name
/// has nothing in front of its four-character extension.
pub fn paired_asset_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let mut chars: Vec<char> = name.chars().collect();
    if chars.len() < 6 {
        return None;
    }
    let marker = chars.len() - 5;
    chars[marker] = 'r';
    Some(path.with_file_name(chars.into_iter().collect::<String>()))
}

/// An addressable RGB(A) pixel grid the compositor draws into.
pub trait CompositeTarget {
    /// Grid size as (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Overwrite the color channels of one in-bounds pixel.
    fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]);
}

impl CompositeTarget for RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbImage::dimensions(self)
    }

    fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        self.put_pixel(x, y, Rgb(rgb));
    }
}

impl CompositeTarget for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }

    fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let px = self.get_pixel_mut(x, y);
        px.0[..3].copy_from_slice(&rgb);
    }
}

/// Sprite artwork for one accessory.
///
/// Accessories drawn on both sides of the face (ears) use the mirrored image
/// for the second side. When no mirrored image is supplied it is derived by
/// flipping the primary horizontally.
#[derive(Debug, Clone)]
pub struct AccessorySprite {
    primary: RgbaImage,
    mirrored: Option<RgbaImage>,
}

impl AccessorySprite {
    pub fn new(primary: RgbaImage) -> Self {
        Self {
            primary,
            mirrored: None,
        }
    }

    pub fn with_mirrored(mut self, mirrored: RgbaImage) -> Self {
        self.mirrored = Some(mirrored);
        self
    }

    pub fn primary(&self) -> &RgbaImage {
        &self.primary
    }

    pub fn mirrored(&self) -> Cow<'_, RgbaImage> {
        match &self.mirrored {
            Some(img) => Cow::Borrowed(img),
            None => Cow::Owned(imageops::flip_horizontal(&self.primary)),
        }
    }

    fn side(&self, side: Side) -> Cow<'_, RgbaImage> {
        match side {
            Side::Primary => Cow::Borrowed(&self.primary),
            Side::Mirrored => self.mirrored(),
        }
    }
}

/// Which image of an [`AccessorySprite`] a placement draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Primary,
    Mirrored,
}

/// Where and how large one sprite instance is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Point the sprite is centered on.
    pub anchor: Point,
    pub width: u32,
    pub height: u32,
    pub side: Side,
}

impl Placement {
    pub fn top_left(&self) -> Point {
        Point::new(
            self.anchor.x.saturating_sub((self.width / 2) as i32),
            self.anchor.y.saturating_sub((self.height / 2) as i32),
        )
    }

    /// Whether any part of the placement lands on a `width` x `height` grid.
    pub fn overlaps(&self, (width, height): (u32, u32)) -> bool {
        let top_left = self.top_left();
        let (x0, y0) = (i64::from(top_left.x), i64::from(top_left.y));
        x0 < i64::from(width)
            && y0 < i64::from(height)
            && x0 + i64::from(self.width) > 0
            && y0 + i64::from(self.height) > 0
    }
}

/// Largest sticker side, in pixels. Bigger placements come from bogus
/// landmarks and are skipped.
pub const MAX_STICKER_SIDE: i64 = 4096;

/// Compute the placements of `accessory` on `face`.
///
/// `sprite_size` is the (width, height) of the unscaled primary sprite; the
/// ear and hat keep its aspect ratio. Degenerate geometry (a zero, negative or
/// oversized size, or an anchor outside the `i32` range) yields no
/// placements.
pub fn placements(
    accessory: AccessoryKind,
    sprite_size: (u32, u32),
    face: &Face,
) -> Vec<Placement> {
    let lm = &face.landmarks;
    let at = |landmark: Landmark| {
        let p = lm.get(landmark);
        (i64::from(p.x), i64::from(p.y))
    };

    // Ear and hat: a line above the brows, mirrored from the nose base.
    let forehead_y = || {
        at(Landmark::RightBrowInner).1 + at(Landmark::LeftBrowInner).1 - at(Landmark::NoseBase).1
    };

    let (width, height, anchors) = match accessory {
        AccessoryKind::Mustache => {
            let bounds = face.bounds();
            (
                i64::from(bounds.width) / 2,
                i64::from(bounds.height) / 2,
                vec![(at(Landmark::NoseBase), Side::Primary)],
            )
        }
        AccessoryKind::Glasses => (
            i64::from(face.bounds().width),
            3 * (at(Landmark::RightEyeLower).1 - at(Landmark::RightBrowCenter).1),
            vec![(at(Landmark::NoseBridgeTop), Side::Primary)],
        ),
        AccessoryKind::Ear => {
            let y = forehead_y();
            (
                aspect_width(y.abs(), sprite_size),
                y.abs(),
                vec![
                    ((at(Landmark::RightBrowCenter).0, y), Side::Primary),
                    ((at(Landmark::LeftBrowCenter).0, y), Side::Mirrored),
                ],
            )
        }
        AccessoryKind::Hat => {
            let y = forehead_y();
            (
                aspect_width(y.abs(), sprite_size),
                y.abs(),
                vec![((at(Landmark::NoseBridgeTop).0, y), Side::Primary)],
            )
        }
    };

    if !(1..=MAX_STICKER_SIDE).contains(&width) || !(1..=MAX_STICKER_SIDE).contains(&height) {
        debug!(%accessory, width, height, "degenerate sticker size, skipping");
        return Vec::new();
    }

    let placed: Option<Vec<Placement>> = anchors
        .into_iter()
        .map(|((x, y), side)| {
            Some(Placement {
                anchor: Point::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?),
                width: width as u32,
                height: height as u32,
                side,
            })
        })
        .collect();

    placed.unwrap_or_else(|| {
        debug!(%accessory, "sticker anchor out of range, skipping");
        Vec::new()
    })
}

/// Width that keeps the sprite's aspect ratio at `height`.
fn aspect_width(height: i64, (sprite_w, sprite_h): (u32, u32)) -> i64 {
    if sprite_h == 0 {
        return 0;
    }
    (height as f64 / f64::from(sprite_h) * f64::from(sprite_w)) as i64
}

/// Resize `sprite` to the placement size with bilinear interpolation.
pub fn resize_sprite(sprite: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    imageops::resize(sprite, width, height, FilterType::Triangle)
}

/// Copy the opaque pixels of `sprite` onto `target` with its top-left corner
/// at `top_left`, clipped to the target. Returns the number of pixels written.
pub fn blit<T: CompositeTarget + ?Sized>(
    sprite: &RgbaImage,
    top_left: Point,
    target: &mut T,
) -> usize {
    let (target_w, target_h) = target.dimensions();
    let (sprite_w, sprite_h) = sprite.dimensions();

    // Visible part of the sprite, in sprite coordinates.
    let x0 = (-(top_left.x as i64)).clamp(0, sprite_w as i64);
    let y0 = (-(top_left.y as i64)).clamp(0, sprite_h as i64);
    let x1 = (target_w as i64 - top_left.x as i64).clamp(x0, sprite_w as i64);
    let y1 = (target_h as i64 - top_left.y as i64).clamp(y0, sprite_h as i64);

    let mut written = 0;
    for sy in y0..y1 {
        for sx in x0..x1 {
            let px = sprite.get_pixel(sx as u32, sy as u32);
            if px[3] == 0 {
                continue;
            }
            let dx = (top_left.x as i64 + sx) as u32;
            let dy = (top_left.y as i64 + sy) as u32;
            target.put_rgb(dx, dy, [px[0], px[1], px[2]]);
            written += 1;
        }
    }
    written
}

/// Draw `accessory` for `face` onto `target`. Returns the number of pixels
/// written.
pub fn composite<T: CompositeTarget + ?Sized>(
    accessory: AccessoryKind,
    sprite: &AccessorySprite,
    face: &Face,
    target: &mut T,
) -> usize {
    let mut written = 0;

    for placement in placements(accessory, sprite.primary().dimensions(), face) {
        if !placement.overlaps(target.dimensions()) {
            trace!(%accessory, ?placement, "sticker off frame");
            continue;
        }
        trace!(%accessory, ?placement, "placing sticker");
        let image = sprite.side(placement.side);
        let resized = resize_sprite(&image, placement.width, placement.height);
        written += blit(&resized, placement.top_left(), target);
    }

    written
}

/// Radius of the landmark markers, in pixels.
pub const MARKER_RADIUS: i32 = 5;

const OUTLINE_COLOR: [u8; 3] = [255, 255, 255];

/// Marker color for a landmark region.
pub fn region_color(region: Region) -> [u8; 3] {
    match region {
        Region::Jaw => [255, 0, 0],
        Region::RightBrow => [0, 255, 0],
        Region::LeftBrow => [0, 127, 0],
        Region::NoseBridge => [127, 0, 0],
        Region::NoseBase => [0, 0, 255],
        Region::RightEye => [0, 0, 127],
        Region::LeftEye => [255, 255, 0],
        Region::OuterMouth => [0, 255, 255],
        Region::InnerMouth => [255, 0, 255],
    }
}

/// Mark every landmark of `face` with a filled dot in its region's color and
/// outline the face box in white. Returns the number of pixel writes.
pub fn draw_landmarks<T: CompositeTarget + ?Sized>(face: &Face, target: &mut T) -> usize {
    let mut written = 0;

    for region in Region::ALL {
        let color = region_color(region);
        for &p in face.landmarks.region(region) {
            written += fill_disc(p, MARKER_RADIUS, color, target);
        }
    }

    written + outline(face.bounds(), OUTLINE_COLOR, target)
}

/// Inclusive pixel range `[lo, hi]` clipped to `0..len`, or `None` when empty.
fn clip(lo: i64, hi: i64, len: u32) -> Option<(u32, u32)> {
    let lo = lo.max(0);
    let hi = hi.min(i64::from(len) - 1);
    (lo <= hi).then_some((lo as u32, hi as u32))
}

fn fill_disc<T: CompositeTarget + ?Sized>(
    center: Point,
    radius: i32,
    color: [u8; 3],
    target: &mut T,
) -> usize {
    let (width, height) = target.dimensions();
    let (cx, cy, r) = (i64::from(center.x), i64::from(center.y), i64::from(radius));
    let Some((x0, x1)) = clip(cx - r, cx + r, width) else {
        return 0;
    };
    let Some((y0, y1)) = clip(cy - r, cy + r, height) else {
        return 0;
    };

    let mut written = 0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (dx, dy) = (i64::from(x) - cx, i64::from(y) - cy);
            if dx * dx + dy * dy <= r * r {
                target.put_rgb(x, y, color);
                written += 1;
            }
        }
    }
    written
}

/// One-pixel rectangle border, clipped to the target.
fn outline<T: CompositeTarget + ?Sized>(
    bbox: BoundingBox,
    color: [u8; 3],
    target: &mut T,
) -> usize {
    if bbox.width <= 0 || bbox.height <= 0 {
        return 0;
    }

    let (width, height) = target.dimensions();
    let left = i64::from(bbox.x);
    let top = i64::from(bbox.y);
    let right = left + i64::from(bbox.width) - 1;
    let bottom = top + i64::from(bbox.height) - 1;

    let mut written = 0;
    if let Some((x0, x1)) = clip(left, right, width) {
        for y in [top, bottom] {
            if let Some((y, _)) = clip(y, y, height) {
                for x in x0..=x1 {
                    target.put_rgb(x, y, color);
                    written += 1;
                }
            }
        }
    }
    if let Some((y0, y1)) = clip(top, bottom, height) {
        for x in [left, right] {
            if let Some((x, _)) = clip(x, x, width) {
                for y in y0..=y1 {
                    target.put_rgb(x, y, color);
                    written += 1;
                }
            }
        }
    }
    written
}
