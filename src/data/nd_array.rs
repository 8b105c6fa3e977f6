//! Owned row-major n-dimensional arrays.
//!
//! `NdArray<T>` is the storage used for every field the crate handles:
//! unique/unpacked fields (last axis = node axis), separated per-patch grids
//! (`(*field_shape, *patch_shape)`), and control-point grids
//! (`(nph, *patch_shape)`). The last axis varies fastest.

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshGlueError;

/// Dense row-major array with a runtime shape.
///
/// Deserialization goes through [`NdArray::from_vec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawArray<T>")]
pub struct NdArray<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

#[derive(Deserialize)]
struct RawArray<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> TryFrom<RawArray<T>> for NdArray<T> {
    type Error = MeshGlueError;

    fn try_from(raw: RawArray<T>) -> Result<Self, Self::Error> {
        Self::from_vec(raw.shape, raw.data)
    }
}

/// Row-major strides of `shape`.
pub fn strides(shape: &[usize]) -> Vec<usize> {
    let mut out = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        out[axis] = out[axis + 1] * shape[axis + 1];
    }
    out
}

/// Advance a row-major multi-index by one; returns `false` once it wraps.
fn increment(index: &mut [usize], shape: &[usize]) -> bool {
    for axis in (0..shape.len()).rev() {
        index[axis] += 1;
        if index[axis] < shape[axis] {
            return true;
        }
        index[axis] = 0;
    }
    false
}

impl<T> NdArray<T> {
    /// Wrap `data` with `shape`; the length must equal the shape product.
    pub fn from_vec(shape: Vec<usize>, data: Vec<T>) -> Result<Self, MeshGlueError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(MeshGlueError::LengthMismatch {
                what: "array data",
                expected,
                found: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Build an array by evaluating `f` at every multi-index, row-major.
    pub fn from_shape_fn<F>(shape: Vec<usize>, mut f: F) -> Self
    where
        F: FnMut(&[usize]) -> T,
    {
        let len: usize = shape.iter().product();
        let mut data = Vec::with_capacity(len);
        if len > 0 {
            let mut index = vec![0; shape.len()];
            loop {
                data.push(f(&index));
                if !increment(&mut index, &shape) {
                    break;
                }
            }
        }
        Self { shape, data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Flat offset of a multi-index, or `None` when out of bounds.
    pub fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut flat = 0;
        for (&i, &n) in index.iter().zip(&self.shape) {
            if i >= n {
                return None;
            }
            flat = flat * n + i;
        }
        Some(flat)
    }

    pub fn get(&self, index: &[usize]) -> Option<&T> {
        self.offset(index).map(|flat| &self.data[flat])
    }

    /// Reinterpret the data with a new shape of equal size.
    pub fn into_shape(self, shape: Vec<usize>) -> Result<Self, MeshGlueError> {
        Self::from_vec(shape, self.data)
    }

    fn check_axis(&self, axis: usize) -> Result<(), MeshGlueError> {
        if axis >= self.ndim() {
            return Err(MeshGlueError::InvalidAxis {
                axis,
                ndim: self.ndim(),
            });
        }
        Ok(())
    }
}

impl<T: Clone> NdArray<T> {
    pub fn filled(shape: Vec<usize>, value: T) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![value; len],
        }
    }

    /// Copy the elements of `self` into a new array of `shape`, reading the
    /// source offset computed by `source` for each destination multi-index.
    fn gather<F>(&self, shape: Vec<usize>, mut source: F) -> Self
    where
        F: FnMut(&[usize]) -> usize,
    {
        NdArray::from_shape_fn(shape, |index| self.data[source(index)].clone())
    }

    /// Select `index` along `axis`, dropping that axis.
    pub fn take(&self, axis: usize, index: usize) -> Result<Self, MeshGlueError> {
        self.check_axis(axis)?;
        if index >= self.shape[axis] {
            return Err(MeshGlueError::LengthMismatch {
                what: "take index",
                expected: self.shape[axis],
                found: index,
            });
        }
        let st = strides(&self.shape);
        let mut shape = self.shape.clone();
        shape.remove(axis);
        let base = index * st[axis];
        let kept: Vec<usize> = st
            .iter()
            .enumerate()
            .filter_map(|(a, &s)| (a != axis).then_some(s))
            .collect();
        Ok(self.gather(shape, |out| {
            base + out.iter().zip(&kept).map(|(i, s)| i * s).sum::<usize>()
        }))
    }

    /// Reorder axes: axis `i` of the result is axis `axes[i]` of `self`.
    pub fn permute_axes(&self, axes: &[usize]) -> Result<Self, MeshGlueError> {
        let ndim = self.ndim();
        let mut seen = vec![false; ndim];
        if axes.len() != ndim {
            return Err(MeshGlueError::LengthMismatch {
                what: "axis permutation",
                expected: ndim,
                found: axes.len(),
            });
        }
        for &a in axes {
            self.check_axis(a)?;
            if std::mem::replace(&mut seen[a], true) {
                return Err(MeshGlueError::InvalidAxis { axis: a, ndim });
            }
        }
        let st = strides(&self.shape);
        let moved: Vec<usize> = axes.iter().map(|&a| st[a]).collect();
        let shape = axes.iter().map(|&a| self.shape[a]).collect();
        Ok(self.gather(shape, |out| {
            out.iter().zip(&moved).map(|(i, s)| i * s).sum()
        }))
    }

    /// Reverse the element order along `axis`.
    pub fn flip(&self, axis: usize) -> Result<Self, MeshGlueError> {
        self.check_axis(axis)?;
        let st = strides(&self.shape);
        let n = self.shape[axis];
        Ok(self.gather(self.shape.clone(), |out| {
            out.iter()
                .enumerate()
                .map(|(a, &i)| if a == axis { (n - 1 - i) * st[a] } else { i * st[a] })
                .sum()
        }))
    }
}

impl NdArray<usize> {
    /// `0..n` as a one-dimensional array.
    pub fn arange(n: usize) -> Self {
        Self {
            shape: vec![n],
            data: (0..n).collect(),
        }
    }
}

impl<T> std::ops::Index<&[usize]> for NdArray<T> {
    type Output = T;

    fn index(&self, index: &[usize]) -> &T {
        self.get(index)
            .unwrap_or_else(|| panic!("index {index:?} out of bounds for shape {:?}", self.shape))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> NdArray<usize> {
        NdArray::arange(24).into_shape(vec![2, 3, 4]).unwrap()
    }

    #[test]
    fn take_drops_axis() {
        let t = grid().take(1, 2).unwrap();
        assert_eq!(t.shape(), &[2, 4]);
        assert_eq!(t.as_slice(), &[8, 9, 10, 11, 20, 21, 22, 23]);
    }

    #[test]
    fn permute_matches_manual_transpose() {
        let g = grid();
        let p = g.permute_axes(&[2, 0, 1]).unwrap();
        assert_eq!(p.shape(), &[4, 2, 3]);
        for k in 0..4 {
            for i in 0..2 {
                for j in 0..3 {
                    assert_eq!(p[&[k, i, j][..]], g[&[i, j, k][..]]);
                }
            }
        }
    }

    #[test]
    fn flip_reverses_one_axis() {
        let f = grid().flip(2).unwrap();
        assert_eq!(&f.as_slice()[..4], &[3, 2, 1, 0]);
        assert_eq!(f.flip(2).unwrap(), grid());
    }

    #[test]
    fn rejects_bad_shapes_and_axes() {
        assert!(NdArray::from_vec(vec![2, 2], vec![0; 3]).is_err());
        assert!(grid().permute_axes(&[0, 0, 1]).is_err());
        assert!(matches!(
            grid().flip(3),
            Err(MeshGlueError::InvalidAxis { axis: 3, ndim: 3 })
        ));
    }

    #[test]
    fn scalar_shape_holds_one_element() {
        let s = NdArray::from_shape_fn(vec![], |_| 7u8);
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(&[]), Some(&7));
    }
}
