//! Cell identity for the chart grid.
//!
//! A `CellKey` uniquely identifies one editable cell: a field on one surface
//! of one tooth. Its string form `"{tooth}-{surface}-{field}"` is the
//! identifier the presentation layer and the navigation graph share.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::{Field, ParseKeyError, Surface, ToothId, ALL_TEETH};

/// Unique identifier for a cell in the chart grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub tooth: ToothId,
    pub surface: Surface,
    pub field: Field,
}

impl CellKey {
    #[inline]
    pub fn new(tooth: ToothId, surface: Surface, field: Field) -> Self {
        Self { tooth, surface, field }
    }

    /// Every cell of the grid: teeth in catalogue order, then surface, then field.
    pub fn all() -> impl Iterator<Item = CellKey> {
        ALL_TEETH.iter().flat_map(|tooth| {
            Surface::ALL.into_iter().flat_map(move |surface| {
                Field::ALL.into_iter().map(move |field| CellKey::new(*tooth, surface, field))
            })
        })
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.tooth, self.surface, self.field)
    }
}

impl FromStr for CellKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Field names contain underscores, never dashes, so splitting on the
        // first two dashes is unambiguous.
        let mut parts = s.splitn(3, '-');
        let (Some(tooth), Some(surface), Some(field)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseKeyError::Malformed(s.to_string()));
        };
        Ok(Self {
            tooth: tooth.parse()?,
            surface: surface.parse()?,
            field: field.parse()?,
        })
    }
}

impl Serialize for CellKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
