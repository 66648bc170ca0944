//! Named access to the 68-point facial landmark layout.
//!
//! Landmarks come from an external shape predictor (dlib's 68-point
//! convention). "Left" and "right" are from the subject's point of view, so the
//! right eyebrow (17-21) appears on the left side of an unmirrored image.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{BoundingBox, Point};

/// Number of points in the supported landmark layout.
pub const NUM_LANDMARKS: usize = 68;

/// Anatomical regions of the 68-point layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Jawline, ear to ear (0-16).
    Jaw,
    RightBrow,
    LeftBrow,
    /// Bridge of the nose, top to tip (27-30).
    NoseBridge,
    /// Nostrils and nose base (31-35).
    NoseBase,
    RightEye,
    LeftEye,
    OuterMouth,
    InnerMouth,
}

impl Region {
    /// Every region, in point order.
    pub const ALL: [Region; 9] = [
        Region::Jaw,
        Region::RightBrow,
        Region::LeftBrow,
        Region::NoseBridge,
        Region::NoseBase,
        Region::RightEye,
        Region::LeftEye,
        Region::OuterMouth,
        Region::InnerMouth,
    ];

    pub const fn indices(self) -> RangeInclusive<usize> {
        match self {
            Region::Jaw => 0..=16,
            Region::RightBrow => 17..=21,
            Region::LeftBrow => 22..=26,
            Region::NoseBridge => 27..=30,
            Region::NoseBase => 31..=35,
            Region::RightEye => 36..=41,
            Region::LeftEye => 42..=47,
            Region::OuterMouth => 48..=59,
            Region::InnerMouth => 60..=67,
        }
    }

    pub fn len(self) -> usize {
        let range = self.indices();
        range.end() - range.start() + 1
    }
}

/// Individual landmarks the compositor anchors on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    /// Center of the right eyebrow (19).
    RightBrowCenter,
    /// Inner end of the right eyebrow (21).
    RightBrowInner,
    /// Inner end of the left eyebrow (22).
    LeftBrowInner,
    /// Center of the left eyebrow (24).
    LeftBrowCenter,
    /// Top of the nose bridge, between the eyes (27).
    NoseBridgeTop,
    /// Bottom center of the nose (33).
    NoseBase,
    /// Lower lid of the right eye, outer side (41).
    RightEyeLower,
}

impl Landmark {
    pub const fn index(self) -> usize {
        match self {
            Landmark::RightBrowCenter => 19,
            Landmark::RightBrowInner => 21,
            Landmark::LeftBrowInner => 22,
            Landmark::LeftBrowCenter => 24,
            Landmark::NoseBridgeTop => 27,
            Landmark::NoseBase => 33,
            Landmark::RightEyeLower => 41,
        }
    }
}

/// The 68 landmark points of one face, in image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() != NUM_LANDMARKS {
            return Err(Error::LandmarkCount {
                expected: NUM_LANDMARKS,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn get(&self, landmark: Landmark) -> Point {
        self.points[landmark.index()]
    }

    /// All points of a region, in layout order.
    pub fn region(&self, region: Region) -> &[Point] {
        &self.points[region.indices()]
    }

    /// The `i`-th point of a region, or `None` past the region's end.
    pub fn part(&self, region: Region, i: usize) -> Option<Point> {
        self.region(region).get(i).copied()
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }
}

impl TryFrom<Vec<Point>> for LandmarkSet {
    type Error = Error;

    fn try_from(points: Vec<Point>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<LandmarkSet> for Vec<Point> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}

impl std::ops::Index<usize> for LandmarkSet {
    type Output = Point;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.points[idx]
    }
}

/// A detected face: landmarks plus the detector's box when one is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(rename = "points")]
    pub landmarks: LandmarkSet,
}

impl Face {
    pub fn new(landmarks: LandmarkSet) -> Self {
        Self {
            bbox: None,
            landmarks,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Face rectangle used for sizing; falls back to the landmark extents.
    pub fn bounds(&self) -> BoundingBox {
        self.bbox.unwrap_or_else(|| self.landmarks.bounds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_landmarks() -> LandmarkSet {
        let points = (0..NUM_LANDMARKS as i32).map(|i| Point::new(i, i * 2)).collect();
        LandmarkSet::new(points).unwrap()
    }

    #[test]
    fn regions_cover_layout_once() {
        let total: usize = Region::ALL.iter().map(|r| r.len()).sum();
        assert_eq!(total, NUM_LANDMARKS);

        let mut next = 0;
        for region in Region::ALL {
            assert_eq!(*region.indices().start(), next);
            next = region.indices().end() + 1;
        }
    }

    #[test]
    fn rejects_wrong_point_count() {
        let err = LandmarkSet::new(vec![Point::zero(); 5]).unwrap_err();
        assert!(matches!(
            err,
            Error::LandmarkCount {
                expected: 68,
                actual: 5
            }
        ));
    }

    #[test]
    fn named_accessors() {
        let set = numbered_landmarks();
        assert_eq!(set.get(Landmark::NoseBase), Point::new(33, 66));
        assert_eq!(set.get(Landmark::NoseBridgeTop), Point::new(27, 54));
        assert_eq!(set.part(Region::Jaw, 16), Some(Point::new(16, 32)));
        assert_eq!(set.part(Region::Jaw, 17), None);
        assert_eq!(set.part(Region::LeftEye, 0), Some(Point::new(42, 84)));
        assert_eq!(set.region(Region::InnerMouth).len(), 8);
    }

    #[test]
    fn face_bounds_fall_back_to_landmarks() {
        let face = Face::new(numbered_landmarks());
        assert_eq!(face.bounds(), BoundingBox::new(0, 0, 67, 134));

        let bbox = BoundingBox::new(5, 5, 10, 10);
        assert_eq!(face.with_bbox(bbox).bounds(), bbox);
    }

    #[test]
    fn face_from_json() {
        let points: Vec<_> = (0..68).map(|i| format!(r#"{{"x":{i},"y":1}}"#)).collect();
        let json = format!(r#"{{"points":[{}]}}"#, points.join(","));
        let face: Face = serde_json::from_str(&json).unwrap();
        assert!(face.bbox.is_none());
        assert_eq!(face.landmarks[67], Point::new(67, 1));

        let short = r#"{"points":[{"x":0,"y":0}]}"#;
        assert!(serde_json::from_str::<Face>(short).is_err());
    }
}
