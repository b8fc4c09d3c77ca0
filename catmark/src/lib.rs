//! # Catmull-Clark Subdivision of Animated Polygon Meshes
//!
//! `catmark` refines arbitrary polygon meshes with the
//! [*Catmull-Clark*](https://en.wikipedia.org/wiki/Catmull%E2%80%93Clark_subdivision_surface)
//! scheme and keeps a subdivided copy of a mesh up to date while its points
//! move.
//!
//! Every face with `n` corners turns into `n` quads per level. After one level
//! a mesh consists of quads only.
//!
//! The crate has two layers:
//!
//! * [`far`] – the subdivision machinery. [`far::subdivide_once()`] refines a
//!   [`PolygonMesh`] directly. [`far::SymbolicMesh`] refines the topology
//!   only and records every new point as a stencil, a weighted sum of points
//!   of the level below.
//! * [`SubdivisionMesh`] – a cache of symbolic levels over an owned original
//!   mesh. Moving points of the original only re-evaluates stencils; faces
//!   and texture coordinates are rebuilt only when the topology, the texture
//!   coordinates or the refinement options change.
//!
//! ## Example
//!
//! ```
//! use catmark::{far, PolygonMesh, SubdivisionMesh};
//!
//! // A single quad; every corner uses texture coordinate 0.
//! let quad = PolygonMesh::from_flat_faces(
//!     vec![0., 0., 0., 2., 0., 0., 2., 2., 0., 0., 2., 0.],
//!     vec![0., 0.],
//!     vec![vec![0, 0, 1, 0, 2, 0, 3, 0]],
//! )?;
//!
//! let mut subdivision = SubdivisionMesh::new(quad.clone())?;
//! subdivision.set_subdivision_level(3);
//! let refined = subdivision.update()?;
//!
//! assert_eq!(refined.face_count(), 64);
//! assert_eq!(refined.faces, far::subdivide(&quad, 3)?.faces);
//! # Ok::<(), catmark::Error>(())
//! ```
//!
//! ## Boundaries
//!
//! By default boundaries are refined with the plain rules: a boundary edge
//! has one incident face and a boundary vertex a smaller valence. Corners of
//! an open mesh may move considerably this way. See
//! [`far::BoundaryMode`] for crease rules that keep boundaries in place.
//!
//! ## Cargo Features
#![doc = document_features::document_features!()]

mod error;
pub use error::{Error, Result};

pub mod far;

mod polygon_mesh;
pub use polygon_mesh::{Corner, PolygonMesh};

mod subdivision_mesh;
pub use subdivision_mesh::{MeshChange, PointsChange, SubdivisionMesh};

/// A vertex, edge, or face index in the topology.
///
/// # Examples
///
/// ```
/// use catmark::Index;
///
/// // Create an index from a u32
/// let idx = Index::from(42u32);
/// assert_eq!(idx.0, 42);
///
/// // Convert back to u32
/// let value: u32 = idx.into();
/// assert_eq!(value, 42);
///
/// // Create from usize
/// let idx = Index::from(100usize);
/// let as_usize: usize = idx.into();
/// assert_eq!(as_usize, 100);
/// ```
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
#[repr(transparent)]
pub struct Index(pub u32);

impl From<u32> for Index {
    fn from(value: u32) -> Self {
        Index(value)
    }
}

impl From<Index> for u32 {
    fn from(index: Index) -> Self {
        index.0
    }
}

impl From<usize> for Index {
    fn from(value: usize) -> Self {
        Index(value as u32)
    }
}

impl From<Index> for usize {
    fn from(index: Index) -> Self {
        index.0 as usize
    }
}
