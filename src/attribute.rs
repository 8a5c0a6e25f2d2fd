use std::iter::FromIterator;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Attribute channels a point cloud may carry.
///
/// `PointsRgbNormals` and `Mesh` are composites that occupy their own bit;
/// use [`AttributeMask::decompose`] to expand them into their constituents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Points,
    Rgb,
    Normals,
    Triangles,
    PointsRgbNormals,
    Mesh,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Points,
        Attribute::Rgb,
        Attribute::Normals,
        Attribute::Triangles,
        Attribute::PointsRgbNormals,
        Attribute::Mesh,
    ];

    pub fn bit(self) -> u8 {
        match self {
            Attribute::Points => 1 << 0,
            Attribute::Rgb => 1 << 1,
            Attribute::Normals => 1 << 2,
            Attribute::Triangles => 1 << 3,
            Attribute::PointsRgbNormals => 1 << 6,
            Attribute::Mesh => 1 << 7,
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(self, Attribute::PointsRgbNormals | Attribute::Mesh)
    }

    /// Simple attributes a flag stands for. A simple attribute is its own constituent.
    pub fn constituents(self) -> &'static [Attribute] {
        match self {
            Attribute::Points => &[Attribute::Points],
            Attribute::Rgb => &[Attribute::Rgb],
            Attribute::Normals => &[Attribute::Normals],
            Attribute::Triangles => &[Attribute::Triangles],
            Attribute::PointsRgbNormals => {
                &[Attribute::Points, Attribute::Rgb, Attribute::Normals]
            }
            Attribute::Mesh => &[Attribute::Points, Attribute::Triangles],
        }
    }
}

/// 8-bit accumulation of [`Attribute`] flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeMask(u8);

impl AttributeMask {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Sets the bit of `attribute`, and only that bit.
    pub fn compose(self, attribute: Attribute) -> Self {
        Self(self.0 | attribute.bit())
    }

    pub fn has(self, attribute: Attribute) -> bool {
        self.0 & attribute.bit() != 0
    }

    /// The mask exactly as composed
    pub fn declared_bits(self) -> u8 {
        self.0
    }

    /// The mask with each composite replaced by its constituent bits.
    pub fn decompose(self) -> Self {
        self.iter()
            .flat_map(|attribute| attribute.constituents().iter().copied())
            .collect()
    }

    /// Whether `attribute` is present either directly or through a composite.
    pub fn provides(self, attribute: Attribute) -> bool {
        self.decompose().has(attribute)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Attribute> {
        Attribute::ALL.into_iter().filter(move |a| self.has(*a))
    }
}

impl From<Attribute> for AttributeMask {
    fn from(attribute: Attribute) -> Self {
        Self::empty().compose(attribute)
    }
}

impl BitOr<Attribute> for AttributeMask {
    type Output = AttributeMask;

    fn bitor(self, rhs: Attribute) -> Self::Output {
        self.compose(rhs)
    }
}

impl BitOr for AttributeMask {
    type Output = AttributeMask;

    fn bitor(self, rhs: AttributeMask) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOr for Attribute {
    type Output = AttributeMask;

    fn bitor(self, rhs: Attribute) -> Self::Output {
        AttributeMask::from(self).compose(rhs)
    }
}

impl BitOrAssign<Attribute> for AttributeMask {
    fn bitor_assign(&mut self, rhs: Attribute) {
        *self = self.compose(rhs);
    }
}

impl FromIterator<Attribute> for AttributeMask {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::compose)
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    const SIMPLE: [Attribute; 4] = [
        Attribute::Points,
        Attribute::Rgb,
        Attribute::Normals,
        Attribute::Triangles,
    ];

    #[test]
    fn bit_layout() {
        let bits = Attribute::ALL.iter().map(|a| a.bit()).collect_vec();
        assert_eq!(bits, vec![1, 2, 4, 8, 64, 128]);
    }

    #[test]
    fn composition_is_order_independent() {
        for (a, b) in SIMPLE.iter().cartesian_product(SIMPLE.iter()) {
            let ab = AttributeMask::empty().compose(*a).compose(*b);
            let ba = AttributeMask::empty().compose(*b).compose(*a);
            assert_eq!(ab, ba);
        }
        for subset in SIMPLE.iter().copied().powerset() {
            let forward: AttributeMask = subset.iter().copied().collect();
            let backward: AttributeMask = subset.iter().rev().copied().collect();
            assert_eq!(forward, backward);
        }
    }

    #[test]
    fn composition_is_idempotent() {
        for a in Attribute::ALL {
            let once = AttributeMask::empty().compose(a);
            assert_eq!(once.compose(a), once);
        }
    }

    #[test]
    fn composites_set_only_their_own_bit() {
        let mask = AttributeMask::empty().compose(Attribute::PointsRgbNormals);
        assert_eq!(mask.declared_bits(), 0b0100_0000);
        assert!(!mask.has(Attribute::Points));

        let mask = AttributeMask::empty().compose(Attribute::Mesh);
        assert_eq!(mask.declared_bits(), 0b1000_0000);
        assert!(!mask.has(Attribute::Triangles));
    }

    #[test]
    fn decompose_expands_composites() {
        let mask = AttributeMask::from(Attribute::PointsRgbNormals).decompose();
        assert_eq!(
            mask,
            Attribute::Points | Attribute::Rgb | Attribute::Normals
        );

        let mask = (Attribute::Mesh | Attribute::Rgb).decompose();
        assert_eq!(mask.declared_bits(), 0b0000_1011);
        assert!(mask.iter().all(|a| !a.is_composite()));
        assert!((Attribute::Mesh | Attribute::Rgb).provides(Attribute::Triangles));
    }

    #[test]
    fn operators() {
        let mut mask = AttributeMask::empty();
        mask |= Attribute::Points;
        mask |= Attribute::Normals;
        assert_eq!(mask, Attribute::Points | Attribute::Normals);
        assert_eq!(mask.iter().collect_vec(), vec![Attribute::Points, Attribute::Normals]);
    }
}
