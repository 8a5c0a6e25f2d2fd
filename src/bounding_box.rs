use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::point_cloud::Coordinate;

/// Axis-aligned bounds over the rows of a points buffer, of any spatial dimension
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<T: Coordinate> {
    pub min: DVector<T>,
    pub max: DVector<T>,
}

impl<T: Coordinate> BoundingBox<T> {
    pub fn new(min: DVector<T>, max: DVector<T>) -> BoundingBox<T> {
        BoundingBox { min, max }
    }

    /// Bounds of the given rows, or `None` when there are no rows.
    pub fn from_rows<'a, I: IntoIterator<Item = &'a [T]>>(rows: I) -> Option<Self> {
        let mut rows = rows.into_iter();
        let first = rows.next()?;
        let mut b = Self {
            min: DVector::from_column_slice(first),
            max: DVector::from_column_slice(first),
        };
        for row in rows {
            b.extend(row);
        }
        Some(b)
    }

    pub fn dim(&self) -> usize {
        self.min.len()
    }

    pub fn size(&self) -> DVector<T> {
        self.max.zip_map(&self.min, |max, min| max - min)
    }

    pub fn min_size(&self) -> T {
        self.size().iter().fold(T::infinity(), |acc, v| acc.min(*v))
    }

    pub fn max_size(&self) -> T {
        self.size().iter().fold(T::neg_infinity(), |acc, v| acc.max(*v))
    }

    /// Number of `unit` sized cells needed to cover each axis.
    /// `None` if a count does not fit in `usize`.
    pub fn ceil(&self, unit: T) -> Option<Vec<usize>> {
        self.size().iter().map(|s| (*s / unit).ceil().to_usize()).collect()
    }

    pub fn min(&self) -> &DVector<T> {
        &self.min
    }

    pub fn max(&self) -> &DVector<T> {
        &self.max
    }

    pub fn center(&self) -> DVector<T> {
        let half = T::one() / (T::one() + T::one());
        self.max.zip_map(&self.min, |max, min| (max + min) * half)
    }

    /// Grows the box to include `p`. Components beyond the box's dimension are ignored.
    pub fn extend(&mut self, p: &[T]) {
        for (i, v) in p.iter().enumerate().take(self.dim()) {
            self.min[i] = self.min[i].min(*v);
            self.max[i] = self.max[i].max(*v);
        }
    }
}
