use std::iter::FromIterator;

use log::debug;
use nalgebra::{Point2, Point3, Scalar};
use num_traits::Float;

use crate::attribute::{Attribute, AttributeMask};
use crate::bounding_box::BoundingBox;
use crate::color::Color;
use crate::dense_buffer::DenseBuffer;
use crate::error::{PointCloudError, Result};

/// Element type of point coordinates and normals
pub trait Coordinate: Float + Scalar + Default + Send + Sync {}

impl<T: Float + Scalar + Default + Send + Sync> Coordinate for T {}

/// Points with optional colors, normals and triangle connectivity.
///
/// Each channel lives in its own [`DenseBuffer`] and is (re)allocated on demand.
/// `rows` and `cols` mirror the points buffer as of the last `set_points` and are
/// not reset by [`PointCloud::clear`]; check [`PointCloud::has_storage`] before
/// trusting them after a clear.
///
/// The colors buffer is expected to have one row per point. This is not enforced,
/// see [`PointCloud::is_color_aligned`].
#[derive(Clone, Debug, Default)]
pub struct PointCloud<T: Coordinate> {
    attributes: AttributeMask,
    points: DenseBuffer<T>,
    colors: DenseBuffer<u8>,
    normals: DenseBuffer<T>,
    triangles: DenseBuffer<u32>,
    rows: usize,
    cols: usize,
}

impl<T: Coordinate> PointCloud<T> {
    /// Cloud with a `rows x cols` points buffer and no other channel.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let mut cloud = Self::default();
        cloud.set_points(rows, cols)?;
        Ok(cloud)
    }

    /// Allocates every buffer `attributes` selects, composites included.
    /// The triangles buffer is left empty since its size is unrelated to the point count.
    pub fn with_attributes(
        attributes: AttributeMask,
        rows: usize,
        cols: usize,
        color_channels: usize,
    ) -> Result<Self> {
        let mut cloud = Self::default();
        let provided = attributes.decompose();
        if provided.has(Attribute::Points) {
            cloud.set_points(rows, cols)?;
        }
        if provided.has(Attribute::Rgb) {
            cloud.set_colors(rows, color_channels)?;
        }
        if provided.has(Attribute::Normals) {
            cloud.normals = DenseBuffer::new(rows, cols)?;
        }
        cloud.attributes = attributes;
        Ok(cloud)
    }

    pub fn attributes(&self) -> AttributeMask {
        self.attributes
    }

    /// Declares an attribute without touching any buffer.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes |= attribute;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// number of points actually stored
    pub fn len(&self) -> usize {
        self.points.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the points buffer currently holds storage.
    /// A cloud with points of zero columns has a length but no storage.
    pub fn has_storage(&self) -> bool {
        !self.points.is_empty()
    }

    /// Reallocates the points buffer, discarding its content.
    pub fn set_points(&mut self, rows: usize, cols: usize) -> Result<()> {
        self.points = DenseBuffer::new(rows, cols)?;
        self.rows = rows;
        self.cols = cols;
        self.attributes |= Attribute::Points;
        debug!("points buffer set to {}x{}", rows, cols);
        Ok(())
    }

    /// Reallocates the colors buffer, discarding its content.
    /// The row and column counters are left untouched.
    pub fn set_colors(&mut self, rows: usize, channels: usize) -> Result<()> {
        self.colors = DenseBuffer::new(rows, channels)?;
        self.attributes |= Attribute::Rgb;
        debug!("colors buffer set to {}x{}", rows, channels);
        Ok(())
    }

    /// Reallocates the normals buffer with one row per point.
    pub fn set_normals(&mut self, rows: usize) -> Result<()> {
        self.normals = DenseBuffer::new(rows, self.cols)?;
        self.attributes |= Attribute::Normals;
        debug!("normals buffer set to {}x{}", rows, self.cols);
        Ok(())
    }

    /// Reallocates the triangles buffer to hold `count` index triples.
    pub fn set_triangles(&mut self, count: usize) -> Result<()> {
        self.triangles = DenseBuffer::new(count, 3)?;
        self.attributes |= Attribute::Triangles;
        debug!("triangles buffer set to {} triangles", count);
        Ok(())
    }

    /// Drops the connectivity together with the `Triangles` and `Mesh` attributes.
    pub fn clear_triangles(&mut self) {
        self.triangles.clear();
        self.attributes = self
            .attributes
            .iter()
            .filter(|a| !matches!(a, Attribute::Triangles | Attribute::Mesh))
            .collect();
    }

    /// Releases every buffer. The row/column counters and attributes are kept.
    pub fn clear(&mut self) {
        self.points.clear();
        self.colors.clear();
        self.normals.clear();
        self.triangles.clear();
    }

    pub fn points(&self) -> &DenseBuffer<T> {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut DenseBuffer<T> {
        &mut self.points
    }

    pub fn colors(&self) -> &DenseBuffer<u8> {
        &self.colors
    }

    pub fn colors_mut(&mut self) -> &mut DenseBuffer<u8> {
        &mut self.colors
    }

    pub fn normals(&self) -> &DenseBuffer<T> {
        &self.normals
    }

    pub fn normals_mut(&mut self) -> &mut DenseBuffer<T> {
        &mut self.normals
    }

    pub fn triangles(&self) -> &DenseBuffer<u32> {
        &self.triangles
    }

    pub fn triangles_mut(&mut self) -> &mut DenseBuffer<u32> {
        &mut self.triangles
    }

    /// Raw pointer to the row-major coordinates, valid until the next resize or clear.
    pub fn points_ptr(&self) -> *const T {
        self.points.as_ptr()
    }

    /// Row-major coordinates of every point
    pub fn points_slice(&self) -> &[T] {
        self.points.as_slice()
    }

    pub fn point(&self, index: usize) -> Result<&[T]> {
        self.points.row(index)
    }

    pub fn set_point(&mut self, index: usize, coords: &[T]) -> Result<()> {
        write_row(&mut self.points, index, coords)
    }

    pub fn point2(&self, index: usize) -> Result<Point2<T>> {
        Ok(Point2::new(
            *self.points.get(index, 0)?,
            *self.points.get(index, 1)?,
        ))
    }

    pub fn point3(&self, index: usize) -> Result<Point3<T>> {
        Ok(Point3::new(
            *self.points.get(index, 0)?,
            *self.points.get(index, 1)?,
            *self.points.get(index, 2)?,
        ))
    }

    pub fn color(&self, index: usize) -> Result<Color> {
        let row = self.colors.row(index)?;
        Color::from_channels(row).ok_or(PointCloudError::IndexOutOfRange {
            row: index,
            col: Color::CHANNELS - 1,
            rows: self.colors.rows(),
            cols: self.colors.cols(),
        })
    }

    /// Writes the leading three channels of the color row; extra channels are kept.
    pub fn set_color(&mut self, index: usize, color: Color) -> Result<()> {
        let (rows, cols) = self.colors.dims();
        let row = self.colors.row_mut(index)?;
        if row.len() < Color::CHANNELS {
            return Err(PointCloudError::IndexOutOfRange {
                row: index,
                col: Color::CHANNELS - 1,
                rows,
                cols,
            });
        }
        row[..Color::CHANNELS].copy_from_slice(&color.channels());
        Ok(())
    }

    pub fn normal(&self, index: usize) -> Result<&[T]> {
        self.normals.row(index)
    }

    pub fn set_normal(&mut self, index: usize, normal: &[T]) -> Result<()> {
        write_row(&mut self.normals, index, normal)
    }

    pub fn triangle(&self, index: usize) -> Result<[u32; 3]> {
        let t = &self.triangles;
        Ok([*t.get(index, 0)?, *t.get(index, 1)?, *t.get(index, 2)?])
    }

    pub fn set_triangle(&mut self, index: usize, triangle: [u32; 3]) -> Result<()> {
        write_row(&mut self.triangles, index, &triangle)
    }

    /// true when there are no colors or exactly one color row per point
    pub fn is_color_aligned(&self) -> bool {
        self.colors.is_empty() || self.colors.rows() == self.points.rows()
    }

    /// Axis-aligned bounds of the stored points, `None` for an empty cloud.
    pub fn bounds(&self) -> Option<BoundingBox<T>> {
        if self.points.is_empty() {
            return None;
        }
        BoundingBox::from_rows(self.points.rows_iter())
    }
}

fn write_row<E: Copy>(buffer: &mut DenseBuffer<E>, index: usize, values: &[E]) -> Result<()> {
    let cols = buffer.cols();
    if values.len() != cols {
        return Err(PointCloudError::InvalidDimensions {
            rows: 1,
            cols: i64::try_from(values.len()).unwrap_or(i64::MAX),
        });
    }
    buffer.row_mut(index)?.copy_from_slice(values);
    Ok(())
}

impl<T: Coordinate> FromIterator<Point3<T>> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = Point3<T>>>(iter: I) -> Self {
        let points: DenseBuffer<T> = iter.into_iter().map(|p| [p.x, p.y, p.z]).collect();
        Self::from_points_buffer(points)
    }
}

impl<T: Coordinate> FromIterator<Point2<T>> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = Point2<T>>>(iter: I) -> Self {
        let points: DenseBuffer<T> = iter.into_iter().map(|p| [p.x, p.y]).collect();
        Self::from_points_buffer(points)
    }
}

impl<T: Coordinate> PointCloud<T> {
    fn from_points_buffer(points: DenseBuffer<T>) -> Self {
        let (rows, cols) = points.dims();
        Self {
            attributes: Attribute::Points.into(),
            points,
            rows,
            cols,
            ..Self::default()
        }
    }
}
