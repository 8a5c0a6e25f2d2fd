use itertools::iproduct;
use log::debug;
use nalgebra::DVector;
use rayon::prelude::*;

use crate::attribute::Attribute;
use crate::bounding_box::BoundingBox;
use crate::error::{PointCloudError, Result};
use crate::point_cloud::{Coordinate, PointCloud};

/// Regular 2D lattice over `[x_left, x_right] x [y_left, y_right]` with spacing `quant`.
///
/// Lattice point `(i, j)` is `(x_left + i * quant, y_left + j * quant)` for
/// `i < ceil((x_right - x_left) / quant)` and `j < ceil((y_right - y_left) / quant)`.
/// Points are stored row-major with `x` as the outer index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSampler<T> {
    x_left: T,
    x_right: T,
    y_left: T,
    y_right: T,
    quant: T,
    indices: bool,
}

impl<T: Coordinate> GridSampler<T> {
    pub fn new(x_range: (T, T), y_range: (T, T), quant: T) -> Self {
        Self {
            x_left: x_range.0,
            x_right: x_range.1,
            y_left: y_range.0,
            y_right: y_range.1,
            quant,
            indices: false,
        }
    }

    /// Also triangulate the lattice when sampling.
    pub fn with_indices(mut self, indices: bool) -> Self {
        self.indices = indices;
        self
    }

    pub fn indices(&self) -> bool {
        self.indices
    }

    pub fn quant(&self) -> T {
        self.quant
    }

    /// Lattice extent `(nx, ny)`
    pub fn dims(&self) -> Result<(usize, usize)> {
        self.validate()?;
        let bounds = BoundingBox::new(
            DVector::from_vec(vec![self.x_left, self.y_left]),
            DVector::from_vec(vec![self.x_right, self.y_right]),
        );
        match bounds.ceil(self.quant).as_deref() {
            Some(&[nx, ny]) => Ok((nx, ny)),
            _ => Err(PointCloudError::InvalidDomain(format!(
                "lattice for spacing {:?} does not fit in memory",
                self.quant
            ))),
        }
    }

    /// Replaces the cloud's points with the lattice, and its triangles too when
    /// `indices` is set.
    pub fn sample(&self, cloud: &mut PointCloud<T>) -> Result<()> {
        let (nx, ny) = self.dims()?;
        let count = nx.checked_mul(ny).ok_or_else(|| {
            PointCloudError::InvalidDomain(format!("{}x{} lattice is too large", nx, ny))
        })?;
        cloud.set_points(count, 2)?;
        let (x_left, y_left, quant) = (self.x_left, self.y_left, self.quant);
        cloud
            .points_mut()
            .par_rows_mut()
            .enumerate()
            .try_for_each(|(k, row)| {
                let (i, j) = (k / ny, k % ny);
                match (T::from(i), T::from(j)) {
                    (Some(i), Some(j)) => {
                        row[0] = x_left + i * quant;
                        row[1] = y_left + j * quant;
                        Ok(())
                    }
                    _ => Err(PointCloudError::InvalidDomain(format!(
                        "lattice index ({}, {}) is not representable",
                        i, j
                    ))),
                }
            })?;
        debug!("sampled {}x{} grid ({} points)", nx, ny, count);

        if self.indices {
            self.triangulate(cloud)?;
        } else {
            cloud.clear_triangles();
        }
        Ok(())
    }

    /// Connects a cloud sampled by this sampler into two triangles per lattice cell,
    /// both counter-clockwise in the xy plane.
    pub fn triangulate(&self, cloud: &mut PointCloud<T>) -> Result<()> {
        let (nx, ny) = self.dims()?;
        let points = cloud.points();
        if Some(points.rows()) != nx.checked_mul(ny)
            || points.cols() != 2
            || points.rows() > u32::MAX as usize
        {
            return Err(PointCloudError::InvalidDimensions {
                rows: i64::try_from(points.rows()).unwrap_or(i64::MAX),
                cols: i64::try_from(points.cols()).unwrap_or(i64::MAX),
            });
        }

        let index = |i: usize, j: usize| (i * ny + j) as u32;
        let triangles: Vec<u32> = iproduct!(0..nx.saturating_sub(1), 0..ny.saturating_sub(1))
            .flat_map(|(i, j)| {
                let a = index(i, j);
                let b = index(i + 1, j);
                let c = index(i + 1, j + 1);
                let d = index(i, j + 1);
                [a, b, c, a, c, d]
            })
            .collect();

        cloud.set_triangles(triangles.len() / 3)?;
        cloud
            .triangles_mut()
            .as_mut_slice()
            .copy_from_slice(&triangles);
        cloud.add_attribute(Attribute::Mesh);
        debug!("triangulated grid into {} triangles", triangles.len() / 3);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let finite = [self.x_left, self.x_right, self.y_left, self.y_right, self.quant]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(PointCloudError::InvalidDomain(
                "domain and spacing must be finite".to_string(),
            ));
        }
        if self.quant <= T::zero() {
            return Err(PointCloudError::InvalidDomain(format!(
                "spacing must be positive, got {:?}",
                self.quant
            )));
        }
        if self.x_right < self.x_left {
            return Err(PointCloudError::InvalidDomain(format!(
                "x range [{:?}, {:?}] is reversed",
                self.x_left, self.x_right
            )));
        }
        if self.y_right < self.y_left {
            return Err(PointCloudError::InvalidDomain(format!(
                "y range [{:?}, {:?}] is reversed",
                self.y_left, self.y_right
            )));
        }
        Ok(())
    }
}
