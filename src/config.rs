//! Filter and sticker selection.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::FilterKind;
use crate::overlay::AccessoryKind;

/// What the frame processor does to each frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Filter applied to every frame.
    pub filter: FilterKind,

    /// Stickers drawn on every detected face, in drawing order.
    pub accessories: Vec<AccessoryKind>,

    /// Passed through to an external transform backend; the built-in filters
    /// always run on the CPU.
    pub hardware_acceleration: bool,
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let settings = serde_json::from_reader(BufReader::new(file))?;
        Ok(settings)
    }

    /// Advance to the next filter, wrapping back to `None`.
    pub fn cycle_filter(&mut self) -> FilterKind {
        self.filter = self.filter.next();
        self.filter
    }

    /// Replace the active sticker with the next one in turn. With no sticker
    /// active, the first accessory is selected.
    pub fn cycle_accessory(&mut self) -> AccessoryKind {
        let next = self
            .accessories
            .last()
            .map_or(AccessoryKind::ALL[0], |kind| kind.next());
        self.accessories = vec![next];
        next
    }

    pub fn toggle_accessory(&mut self, kind: AccessoryKind) {
        if let Some(pos) = self.accessories.iter().position(|k| *k == kind) {
            self.accessories.remove(pos);
        } else {
            self.accessories.push(kind);
        }
    }
}
