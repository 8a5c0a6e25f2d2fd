use std::iter::FromIterator;

use log::trace;
use rayon::prelude::*;

use crate::error::{PointCloudError, Result};

/// Rectangular, row-major storage for a single attribute channel.
///
/// A buffer with zero rows or zero columns holds no storage.
/// The buffer exclusively owns its elements; cloning performs a deep copy.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseBuffer<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Default for DenseBuffer<T> {
    fn default() -> Self {
        Self {
            data: vec![],
            rows: 0,
            cols: 0,
        }
    }
}

impl<T: Clone + Default> DenseBuffer<T> {
    /// Allocates `rows * cols` default-initialized elements.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let len = checked_len::<T>(rows, cols)?;
        trace!("allocating {}x{} buffer", rows, cols);
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| PointCloudError::InvalidDimensions {
                rows: to_signed(rows),
                cols: to_signed(cols),
            })?;
        data.resize(len, T::default());
        Ok(Self { data, rows, cols })
    }

    /// Same as [`DenseBuffer::new`] for extents computed in signed arithmetic.
    pub fn from_signed(rows: i64, cols: i64) -> Result<Self> {
        match (usize::try_from(rows), usize::try_from(cols)) {
            (Ok(r), Ok(c)) => Self::new(r, c),
            _ => Err(PointCloudError::InvalidDimensions { rows, cols }),
        }
    }
}

impl<T> DenseBuffer<T> {
    /// Wraps existing row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        let len = checked_len::<T>(rows, cols)?;
        if data.len() != len {
            return Err(PointCloudError::InvalidDimensions {
                rows: to_signed(rows),
                cols: to_signed(cols),
            });
        }
        Ok(Self { data, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// number of stored elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Releases the storage and resets the dimensions to (0, 0).
    pub fn clear(&mut self) {
        self.data = vec![];
        self.rows = 0;
        self.cols = 0;
    }

    pub fn get(&self, row: usize, col: usize) -> Result<&T> {
        let i = self.offset(row, col)?;
        Ok(&self.data[i])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Result<&mut T> {
        let i = self.offset(row, col)?;
        Ok(&mut self.data[i])
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        *self.get_mut(row, col)? = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Result<&[T]> {
        let (start, end) = self.row_range(row)?;
        Ok(&self.data[start..end])
    }

    pub fn row_mut(&mut self, row: usize) -> Result<&mut [T]> {
        let (start, end) = self.row_range(row)?;
        Ok(&mut self.data[start..end])
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |r| &self.data[r * self.cols..(r + 1) * self.cols])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Raw pointer to the first element, for handing the storage to external consumers.
    /// It must not outlive this buffer or survive a reallocation.
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(PointCloudError::IndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    fn row_range(&self, row: usize) -> Result<(usize, usize)> {
        if row >= self.rows {
            return Err(PointCloudError::IndexOutOfRange {
                row,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let start = row * self.cols;
        Ok((start, start + self.cols))
    }
}

impl<T: Send> DenseBuffer<T> {
    /// Disjoint mutable rows for parallel writers.
    /// Yields nothing when the buffer holds no storage.
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = &mut [T]> + '_ {
        self.data.par_chunks_mut(self.cols.max(1))
    }
}

impl<T, const N: usize> FromIterator<[T; N]> for DenseBuffer<T> {
    fn from_iter<I: IntoIterator<Item = [T; N]>>(iter: I) -> Self {
        let data: Vec<T> = iter.into_iter().flatten().collect();
        let rows = if N == 0 { 0 } else { data.len() / N };
        Self {
            data,
            rows,
            cols: N,
        }
    }
}

fn to_signed(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn checked_len<T>(rows: usize, cols: usize) -> Result<usize> {
    let len = rows
        .checked_mul(cols)
        .filter(|len| {
            len.checked_mul(std::mem::size_of::<T>())
                .is_some_and(|bytes| bytes <= isize::MAX as usize)
        })
        .ok_or(PointCloudError::InvalidDimensions {
            rows: to_signed(rows),
            cols: to_signed(cols),
        })?;
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_exact_extent() {
        let buffer = DenseBuffer::<f64>::new(4, 3).unwrap();
        assert_eq!(buffer.dims(), (4, 3));
        assert_eq!(buffer.len(), 12);
        assert!(buffer.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn zero_extent_is_empty() {
        let buffer = DenseBuffer::<u8>::new(0, 3).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.rows_iter().count(), 0);

        let buffer = DenseBuffer::<u8>::new(5, 0).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn out_of_range_access_fails() {
        let mut buffer = DenseBuffer::<i32>::new(2, 2).unwrap();
        assert!(matches!(
            buffer.get(2, 0),
            Err(PointCloudError::IndexOutOfRange { row: 2, col: 0, .. })
        ));
        assert!(buffer.set(0, 2, 1).is_err());
        assert!(buffer.row(3).is_err());
    }

    #[test]
    fn overflowing_extent_fails() {
        assert!(matches!(
            DenseBuffer::<f64>::new(usize::MAX, 2),
            Err(PointCloudError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            DenseBuffer::<f64>::from_signed(-1, 3),
            Err(PointCloudError::InvalidDimensions { rows: -1, cols: 3 })
        ));
    }

    #[test]
    fn clear_twice() {
        let mut buffer = DenseBuffer::<f32>::new(3, 3).unwrap();
        buffer.clear();
        assert_eq!(buffer.dims(), (0, 0));
        assert!(buffer.is_empty());
        buffer.clear();
        assert_eq!(buffer.dims(), (0, 0));
    }

    #[test]
    fn reassignment_replaces_content() {
        let mut buffer = DenseBuffer::<i32>::new(2, 2).unwrap();
        buffer.set(1, 1, 7).unwrap();
        buffer = DenseBuffer::new(3, 1).unwrap();
        assert_eq!(buffer.dims(), (3, 1));
        assert_eq!(buffer.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn row_access() {
        let buffer = DenseBuffer::from_vec(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(buffer.row(1).unwrap(), &[4, 5, 6]);
        assert_eq!(*buffer.get(0, 2).unwrap(), 3);
        let rows: Vec<_> = buffer.rows_iter().collect();
        assert_eq!(rows, vec![&[1, 2, 3][..], &[4, 5, 6][..]]);
        assert!(DenseBuffer::from_vec(2, 2, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn collect_fixed_rows() {
        let buffer: DenseBuffer<u32> = vec![[0, 1, 2], [2, 1, 3]].into_iter().collect();
        assert_eq!(buffer.dims(), (2, 3));
        assert_eq!(buffer.row(1).unwrap(), &[2, 1, 3]);
    }

    #[test]
    fn parallel_rows_are_disjoint() {
        let mut buffer = DenseBuffer::<usize>::new(100, 2).unwrap();
        buffer
            .par_rows_mut()
            .enumerate()
            .for_each(|(i, row)| row.iter_mut().for_each(|v| *v = i));
        assert_eq!(buffer.row(42).unwrap(), &[42, 42]);
        assert_eq!(*buffer.get(99, 1).unwrap(), 99);
    }
}
