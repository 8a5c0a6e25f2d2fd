//! Hand-off of point cloud buffers to a viewer.
//!
//! Nothing here draws. A [`RenderSession`] owns the bookkeeping a viewer needs
//! (its open windows) and builds [`DrawBatch`]es, borrowed views of a cloud's
//! buffers that a drawing backend consumes as-is.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;
use crate::error::{PointCloudError, Result};
use crate::point_cloud::{Coordinate, PointCloud};

/// Primitive a batch is drawn with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    Points,
    Triangles,
}

/// An open viewer window. Not clonable: it is given back to the session to close it.
#[derive(Debug, PartialEq, Eq)]
pub struct WindowHandle {
    id: usize,
}

impl WindowHandle {
    pub fn id(&self) -> usize {
        self.id
    }
}

/// Borrowed view of the buffers needed to draw a cloud
#[derive(Debug, Clone, Copy)]
pub struct DrawBatch<'a, T> {
    pub mode: DrawMode,
    /// coordinates per point
    pub dim: usize,
    pub points: &'a [T],
    pub colors: Option<&'a [u8]>,
    pub color_channels: usize,
    pub triangles: Option<&'a [u32]>,
}

impl<'a, T> DrawBatch<'a, T> {
    pub fn vertex_count(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.points.len() / self.dim
        }
    }

    pub fn primitive_count(&self) -> usize {
        match (self.mode, self.triangles) {
            (DrawMode::Triangles, Some(triangles)) => triangles.len() / 3,
            _ => self.vertex_count(),
        }
    }
}

/// Viewer state for one program, passed to whatever needs to open or draw.
#[derive(Debug, Default)]
pub struct RenderSession {
    next_id: usize,
    windows: Vec<usize>,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_window(&mut self) -> WindowHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.windows.push(id);
        debug!("opened window {} ({} open)", id, self.windows.len());
        WindowHandle { id }
    }

    pub fn close_window(&mut self, window: WindowHandle) {
        self.windows.retain(|id| *id != window.id);
        debug!("closed window {} ({} open)", window.id, self.windows.len());
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn is_open(&self, window: &WindowHandle) -> bool {
        self.windows.contains(&window.id)
    }

    /// Colors are attached only when there is one color row per point.
    pub fn draw_batch<'a, T: Coordinate>(
        &self,
        cloud: &'a PointCloud<T>,
        mode: DrawMode,
    ) -> Result<DrawBatch<'a, T>> {
        let attributes = cloud.attributes();
        if !attributes.provides(Attribute::Points) || !cloud.has_storage() {
            return Err(PointCloudError::MissingAttribute(Attribute::Points));
        }

        let triangles = match mode {
            DrawMode::Triangles => {
                if !attributes.provides(Attribute::Triangles) || cloud.triangles().is_empty() {
                    return Err(PointCloudError::MissingAttribute(Attribute::Triangles));
                }
                let triangles = cloud.triangles().as_slice();
                if let Some(max) = triangles.iter().max() {
                    if *max as usize >= cloud.len() {
                        return Err(PointCloudError::IndexOutOfRange {
                            row: *max as usize,
                            col: 0,
                            rows: cloud.len(),
                            cols: cloud.cols(),
                        });
                    }
                }
                Some(triangles)
            }
            DrawMode::Points => None,
        };

        let colors = if cloud.colors().is_empty() {
            None
        } else if cloud.is_color_aligned() {
            Some(cloud.colors().as_slice())
        } else {
            warn!(
                "ignoring {} color rows for {} points",
                cloud.colors().rows(),
                cloud.len()
            );
            None
        };

        Ok(DrawBatch {
            mode,
            dim: cloud.points().cols(),
            points: cloud.points_slice(),
            colors,
            color_channels: colors.map_or(0, |_| cloud.colors().cols()),
            triangles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::grid_sampler::GridSampler;

    #[test]
    fn window_bookkeeping() {
        let mut session = RenderSession::new();
        let a = session.open_window();
        let b = session.open_window();
        assert_ne!(a.id(), b.id());
        assert_eq!(session.window_count(), 2);
        session.close_window(a);
        assert_eq!(session.window_count(), 1);
        assert!(session.is_open(&b));

        // sessions are independent
        let other = RenderSession::new();
        assert_eq!(other.window_count(), 0);
    }

    #[test]
    fn point_batch() {
        let mut cloud = PointCloud::<f32>::new(2, 3).unwrap();
        cloud.set_colors(2, 3).unwrap();
        cloud.set_color(1, Color::new(9, 8, 7)).unwrap();

        let batch = RenderSession::new()
            .draw_batch(&cloud, DrawMode::Points)
            .unwrap();
        assert_eq!(batch.vertex_count(), 2);
        assert_eq!(batch.primitive_count(), 2);
        assert_eq!(batch.colors.unwrap()[3..], [9, 8, 7]);
        assert_eq!(batch.color_channels, 3);
        assert!(batch.triangles.is_none());
    }

    #[test]
    fn misaligned_colors_are_dropped() {
        let mut cloud = PointCloud::<f64>::new(2, 3).unwrap();
        cloud.set_colors(5, 3).unwrap();
        let batch = RenderSession::new()
            .draw_batch(&cloud, DrawMode::Points)
            .unwrap();
        assert!(batch.colors.is_none());
        assert_eq!(batch.color_channels, 0);
    }

    #[test]
    fn triangle_batch() {
        let mut cloud = PointCloud::<f64>::default();
        GridSampler::new((0., 2.), (0., 2.), 1.)
            .with_indices(true)
            .sample(&mut cloud)
            .unwrap();
        let batch = RenderSession::new()
            .draw_batch(&cloud, DrawMode::Triangles)
            .unwrap();
        assert_eq!(batch.primitive_count(), 2);
        assert_eq!(batch.dim, 2);
    }

    #[test]
    fn dangling_triangle_indices() {
        let mut cloud = PointCloud::<f64>::new(2, 2).unwrap();
        cloud.set_triangles(1).unwrap();
        cloud.set_triangle(0, [0, 1, 8]).unwrap();
        assert!(matches!(
            RenderSession::new().draw_batch(&cloud, DrawMode::Triangles),
            Err(PointCloudError::IndexOutOfRange { row: 8, rows: 2, .. })
        ));
    }

    #[test]
    fn missing_channels() {
        let session = RenderSession::new();
        let cloud = PointCloud::<f64>::new(3, 3).unwrap();
        assert!(matches!(
            session.draw_batch(&cloud, DrawMode::Triangles),
            Err(PointCloudError::MissingAttribute(Attribute::Triangles))
        ));

        let mut cleared = cloud.clone();
        cleared.clear();
        assert!(matches!(
            session.draw_batch(&cleared, DrawMode::Points),
            Err(PointCloudError::MissingAttribute(Attribute::Points))
        ));
    }
}
