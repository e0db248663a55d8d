//! Attribute cardinality.
//!
//! An attribute array is either shared per point (`len == points`) or unique
//! per face corner (`len == corners`). The scope is inferred from the length
//! alone; when both counts coincide the per-corner reading wins.

use crate::error::MeshError;
use crate::soup::PolygonSoup;

/// How an attribute array is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeScope {
    /// No data supplied
    Absent,
    /// Indexed by point id
    PerPoint,
    /// Indexed by flat corner index
    PerCorner,
}

impl AttributeScope {
    /// Infer the scope of an array named `attribute` with `len` elements.
    pub fn resolve(attribute: &'static str, len: usize, soup: &PolygonSoup) -> Result<Self, MeshError> {
        Self::from_counts(attribute, len, soup.point_count(), soup.corner_count())
    }

    pub fn from_counts(
        attribute: &'static str,
        len: usize,
        points: usize,
        corners: usize,
    ) -> Result<Self, MeshError> {
        if len == 0 {
            Ok(Self::Absent)
        } else if len == corners {
            Ok(Self::PerCorner)
        } else if len == points {
            Ok(Self::PerPoint)
        } else {
            Err(MeshError::AttributeLength {
                attribute,
                len,
                points,
                corners,
            })
        }
    }

    pub fn is_present(self) -> bool {
        self != Self::Absent
    }

    /// Index into an array of this scope for `corner`, whose point is `point`.
    #[inline]
    pub fn index(self, point: u32, corner: usize) -> usize {
        match self {
            Self::PerCorner => corner,
            Self::PerPoint | Self::Absent => point as usize,
        }
    }
}
