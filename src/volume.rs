//! Dense voxel grids.
//!
//! Data is stored flat in NIfTI order (x varies fastest):
//! `index = x + y*nx + z*nx*ny`.

use crate::error::{Dims, ZoneError};

#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T> {
    dims: Dims,
    data: Vec<T>,
}

impl<T: Copy + Default> Volume<T> {
    pub fn zeros(dims: Dims) -> Self {
        Self {
            dims,
            data: vec![T::default(); dims.0 * dims.1 * dims.2],
        }
    }

    pub fn from_vec(dims: Dims, data: Vec<T>) -> Result<Self, ZoneError> {
        let expected = dims.0 * dims.1 * dims.2;
        if data.len() != expected {
            return Err(ZoneError::ShapeMismatch {
                context: "volume buffer".to_string(),
                left: vec![dims.0, dims.1, dims.2],
                right: vec![data.len()],
            });
        }
        Ok(Self { dims, data })
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.dims.0 + z * self.dims.0 * self.dims.1
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> T {
        self.data[self.index(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        let idx = self.index(x, y, z);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn same_shape<U>(&self, other: &Volume<U>) -> bool {
        self.dims == other.dims
    }

    pub fn ensure_same_shape<U>(&self, other: &Volume<U>, context: &str) -> Result<(), ZoneError> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(ZoneError::dims_mismatch(context, self.dims, other.dims))
        }
    }

    pub fn map<U: Copy + Default>(&self, f: impl Fn(T) -> U) -> Volume<U> {
        Volume {
            dims: self.dims,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}
