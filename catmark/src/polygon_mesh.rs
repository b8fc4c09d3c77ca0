//! Polygon meshes with per-corner texture coordinates.
//!
//! A [`PolygonMesh`] stores its geometry in flat buffers:
//! * `points` – `x, y, z` triples.
//! * `tex_coords` – `u, v` pairs.
//! * `faces` – one [`Corner`] list per face. A corner pairs a point index with
//!   a texture coordinate index so seams in the texture layout do not require
//!   duplicated points.
//!
//! Faces can be of any arity. Faces with fewer than three corners are kept in
//! the mesh but ignored by subdivision.
//!
//! ## Example
//! ```
//! # use catmark::PolygonMesh;
//! // A unit square made of a single quad, all corners share texcoord 0.
//! let quad = PolygonMesh::from_flat_faces(
//!     vec![0., 0., 0., 1., 0., 0., 1., 1., 0., 0., 1., 0.],
//!     vec![0., 0.],
//!     vec![vec![0, 0, 1, 0, 2, 0, 3, 0]],
//! )?;
//!
//! assert_eq!(quad.point_count(), 4);
//! assert_eq!(quad.face_corner_count(), 4);
//! # Ok::<(), catmark::Error>(())
//! ```
use bytemuck::{Pod, Zeroable};
use itertools::Itertools;
use slice_of_array::prelude::*;

use crate::{Error, Result};

/// A face corner: a point index paired with a texture coordinate index.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Corner {
    pub point: u32,
    pub tex_coord: u32,
}

impl Corner {
    #[inline]
    pub fn new(point: u32, tex_coord: u32) -> Self {
        Self { point, tex_coord }
    }
}

impl From<(u32, u32)> for Corner {
    #[inline]
    fn from((point, tex_coord): (u32, u32)) -> Self {
        Self { point, tex_coord }
    }
}

/// An arbitrary-arity polygon mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonMesh {
    /// Flat `x, y, z` point buffer.
    pub points: Vec<f32>,
    /// Flat `u, v` texture coordinate buffer.
    pub tex_coords: Vec<f32>,
    /// Per-face corner lists.
    pub faces: Vec<Vec<Corner>>,
    /// Smoothing group bit masks, one per face, or empty.
    pub face_smoothing_groups: Vec<u32>,
}

impl PolygonMesh {
    /// Creates a mesh and validates it.
    pub fn new(points: Vec<f32>, tex_coords: Vec<f32>, faces: Vec<Vec<Corner>>) -> Result<Self> {
        let mesh = Self {
            points,
            tex_coords,
            faces,
            face_smoothing_groups: Vec::new(),
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Creates a mesh from faces encoded as flat
    /// `[point, tex_coord, point, tex_coord, ...]` index lists.
    pub fn from_flat_faces(
        points: Vec<f32>,
        tex_coords: Vec<f32>,
        faces: Vec<Vec<u32>>,
    ) -> Result<Self> {
        let faces = faces
            .into_iter()
            .enumerate()
            .map(|(face, indices)| {
                if indices.len() % 2 != 0 {
                    return Err(Error::InvalidTopology(format!(
                        "Face {} has an odd number ({}) of flat indices.",
                        face,
                        indices.len()
                    )));
                }
                Ok(indices
                    .into_iter()
                    .tuples::<(_, _)>()
                    .map(Corner::from)
                    .collect_vec())
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(points, tex_coords, faces)
    }

    /// Sets per-face smoothing groups.
    pub fn with_face_smoothing_groups(mut self, groups: Vec<u32>) -> Result<Self> {
        self.face_smoothing_groups = groups;
        self.validate()?;
        Ok(self)
    }

    /// Returns the number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len() / 3
    }

    /// Returns the number of texture coordinates.
    #[inline]
    pub fn tex_coord_count(&self) -> usize {
        self.tex_coords.len() / 2
    }

    /// Returns the number of faces, degenerate ones included.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns the sum of all face arities.
    #[inline]
    pub fn face_corner_count(&self) -> usize {
        self.faces.iter().map(Vec::len).sum()
    }

    /// Returns the point at `index`.
    #[inline]
    pub fn point(&self, index: usize) -> Option<[f32; 3]> {
        self.points_nested().get(index).copied()
    }

    /// Returns the texture coordinate at `index`.
    #[inline]
    pub fn tex_coord(&self, index: usize) -> Option<[f32; 2]> {
        self.tex_coords_nested().get(index).copied()
    }

    /// Returns the point buffer as `[x, y, z]` triples.
    ///
    /// Trailing floats that do not form a full triple are ignored.
    #[inline]
    pub fn points_nested(&self) -> &[[f32; 3]] {
        self.points[..self.point_count() * 3].nest()
    }

    /// Returns the texture coordinate buffer as `[u, v]` pairs.
    #[inline]
    pub fn tex_coords_nested(&self) -> &[[f32; 2]] {
        self.tex_coords[..self.tex_coord_count() * 2].nest()
    }

    /// Returns a face as a flat `[point, tex_coord, ...]` index slice.
    ///
    /// This is the encoding triangulators and viewers consume.
    #[inline]
    pub fn flat_face(&self, face: usize) -> Option<&[u32]> {
        self.faces
            .get(face)
            .map(|corners| bytemuck::cast_slice(corners.as_slice()))
    }

    /// Returns `true` if `face` has fewer than three corners or does not
    /// exist.
    #[inline]
    pub fn is_face_degenerate(&self, face: usize) -> bool {
        self.faces.get(face).map_or(true, |corners| corners.len() < 3)
    }

    /// Checks buffer shapes and that every corner indexes into the point and
    /// texture coordinate buffers.
    pub fn validate(&self) -> Result<()> {
        if self.points.len() % 3 != 0 {
            return Err(Error::InvalidBufferSize {
                expected: self.point_count() * 3,
                actual: self.points.len(),
            });
        }
        if self.tex_coords.len() % 2 != 0 {
            return Err(Error::InvalidBufferSize {
                expected: self.tex_coord_count() * 2,
                actual: self.tex_coords.len(),
            });
        }
        if !self.face_smoothing_groups.is_empty()
            && self.face_smoothing_groups.len() != self.faces.len()
        {
            return Err(Error::InvalidBufferSize {
                expected: self.faces.len(),
                actual: self.face_smoothing_groups.len(),
            });
        }

        let point_count = self.point_count();
        let tex_coord_count = self.tex_coord_count();

        for corner in self.faces.iter().flatten() {
            if point_count <= corner.point as usize {
                return Err(Error::IndexOutOfBounds {
                    index: corner.point as _,
                    max: point_count,
                });
            }
            if tex_coord_count <= corner.tex_coord as usize {
                return Err(Error::IndexOutOfBounds {
                    index: corner.tex_coord as _,
                    max: tex_coord_count,
                });
            }
        }

        Ok(())
    }
}
