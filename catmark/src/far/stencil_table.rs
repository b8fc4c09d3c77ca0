//! Table of subdivision stencils.
//!
//! Every child point of a refined level is a fixed linear blend of points of
//! the level below it. A stencil stores the indices of these control points
//! together with their blending weights. When the control points move, the
//! child points can be recomputed by applying the weights again, without
//! looking at the topology.
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use slice_of_array::prelude::*;

use super::rules::Weights;
use crate::{Error, Index, Result};

/// Gives read access to a single stencil in a [`StencilTable`].
#[derive(Debug, Clone, Copy)]
pub struct Stencil<'a> {
    indices: &'a [Index],
    weights: &'a [f32],
}

impl<'a> Stencil<'a> {
    /// Returns the indices of the control vertices.
    #[inline]
    pub fn indices(&self) -> &'a [Index] {
        self.indices
    }

    /// Returns the stencil interpolation weights.
    #[inline]
    pub fn weights(&self) -> &'a [f32] {
        self.weights
    }

    /// Blends `elements`-wide values from `src` into `dst`.
    #[inline]
    fn apply(&self, src: &[f32], elements: usize, dst: &mut [f32]) {
        dst.iter_mut().for_each(|value| *value = 0.0);
        for (index, weight) in self.indices.iter().zip(self.weights) {
            let start = usize::from(*index) * elements;
            for (value, control) in dst.iter_mut().zip(&src[start..start + elements]) {
                *value += weight * control;
            }
        }
    }
}

/// Container for stencil data.
///
/// Stencils are stored back to back; `offsets()[i]` is where stencil `i`
/// starts in `control_indices()` and `weights()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StencilTable {
    control_vertex_count: usize,
    sizes: Vec<u32>,
    offsets: Vec<Index>,
    control_indices: Vec<Index>,
    weights: Vec<f32>,
}

impl StencilTable {
    /// Creates an empty table over `control_vertex_count` control vertices.
    pub fn new(control_vertex_count: usize) -> Self {
        Self {
            control_vertex_count,
            ..Default::default()
        }
    }

    /// Appends a stencil.
    ///
    /// # Errors
    ///
    /// Fails if any weight refers to a control vertex outside the table.
    pub fn push(&mut self, stencil: &Weights) -> Result<()> {
        if let Some(&(index, _)) = stencil
            .as_slice()
            .iter()
            .find(|&&(index, _)| self.control_vertex_count <= index as usize)
        {
            return Err(Error::IndexOutOfBounds {
                index: index as _,
                max: self.control_vertex_count,
            });
        }

        self.offsets.push(Index::from(self.control_indices.len()));
        self.sizes.push(stencil.len() as _);
        for &(index, weight) in stencil.as_slice() {
            self.control_indices.push(Index(index));
            self.weights.push(weight);
        }

        Ok(())
    }

    /// Returns the number of stencils in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Returns the number of control vertices indexed in the table.
    #[inline]
    pub fn control_vertex_count(&self) -> usize {
        self.control_vertex_count
    }

    /// Returns a Stencil at index i in the table.
    #[inline]
    pub fn stencil(&self, i: Index) -> Option<Stencil<'_>> {
        let i = usize::from(i);
        if self.len() <= i {
            None
        } else {
            let start = usize::from(self.offsets[i]);
            let end = start + self.sizes[i] as usize;
            Some(Stencil {
                indices: &self.control_indices[start..end],
                weights: &self.weights[start..end],
            })
        }
    }

    /// Returns an iterator over all stencils.
    pub fn iter(&self) -> impl Iterator<Item = Stencil<'_>> + '_ {
        (0..self.len()).filter_map(|i| self.stencil(Index::from(i)))
    }

    /// Returns the number of control vertices of each stencil in the table.
    #[inline]
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Returns the offset to a given stencil.
    #[inline]
    pub fn offsets(&self) -> &[Index] {
        &self.offsets
    }

    /// Returns the indices of the control vertices.
    #[inline]
    pub fn control_indices(&self) -> &[Index] {
        &self.control_indices
    }

    /// Returns the stencil interpolation weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Applies the stencils to `src`, a flat buffer of `elements`-wide
    /// control values, and returns the refined values.
    ///
    /// # Errors
    ///
    /// Fails if `src` does not hold exactly one value per control vertex.
    pub fn update_values(&self, src: &[f32], elements: usize) -> Result<Vec<f32>> {
        let mut dst = vec![0.0; self.len() * elements];
        self.update_values_into(src, elements, &mut dst)?;
        Ok(dst)
    }

    /// Like [`update_values()`](Self::update_values) but writes into `dst`.
    pub fn update_values_into(&self, src: &[f32], elements: usize, dst: &mut [f32]) -> Result<()> {
        if src.len() != self.control_vertex_count * elements {
            return Err(Error::InvalidBufferSize {
                expected: self.control_vertex_count * elements,
                actual: src.len(),
            });
        }
        if dst.len() != self.len() * elements {
            return Err(Error::InvalidBufferSize {
                expected: self.len() * elements,
                actual: dst.len(),
            });
        }
        if elements == 0 {
            return Ok(());
        }

        #[cfg(feature = "rayon")]
        dst.par_chunks_mut(elements)
            .zip(self.offsets.par_iter().zip(self.sizes.par_iter()))
            .for_each(|(value, (&offset, &size))| {
                self.stencil_at(offset, size).apply(src, elements, value)
            });

        #[cfg(not(feature = "rayon"))]
        dst.chunks_mut(elements)
            .zip(self.offsets.iter().zip(&self.sizes))
            .for_each(|(value, (&offset, &size))| {
                self.stencil_at(offset, size).apply(src, elements, value)
            });

        Ok(())
    }

    /// Applies the stencils to a flat `x, y, z` point buffer.
    pub fn update_points(&self, src: &[f32]) -> Result<Vec<[f32; 3]>> {
        let flat = self.update_values(src, 3)?;
        Ok(flat.nest::<[_; 3]>().to_vec())
    }

    #[inline]
    fn stencil_at(&self, offset: Index, size: u32) -> Stencil<'_> {
        let start = usize::from(offset);
        let end = start + size as usize;
        Stencil {
            indices: &self.control_indices[start..end],
            weights: &self.weights[start..end],
        }
    }
}
