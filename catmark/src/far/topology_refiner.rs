//! Symbolic topology refinement.
//!
//! A [`SymbolicMesh`] is one cached level of a subdivision hierarchy. Its
//! faces and texture coordinates are concrete. Its points are not stored as
//! formulas over the level below but as a
//! [`StencilTable`](super::StencilTable), so moving the original points only
//! requires re-evaluating the stencils of every level in turn with
//! [`resolve_positions()`](SymbolicMesh::resolve_positions).
//!
//! A level is built from the one below it with
//! [`refine()`](SymbolicMesh::refine), as specified by a
//! [`TopologyRefinerOptions`].
use itertools::Itertools;
use num_enum::TryFromPrimitive;
use slice_of_array::prelude::*;
use tracing::{debug, trace};
use ultraviolet::Vec3;

use super::refinement::{check_manifold, refine_faces, ParentComponent};
use super::rules::{self, Weights};
use super::stencil_table::StencilTable;
use super::topology_level::{to_vec3, TopologyLevel};
use crate::{Corner, Error, Index, PolygonMesh, Result};

/// How boundary edges and vertices are refined.
#[repr(u32)]
#[derive(TryFromPrimitive, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryMode {
    /// Boundary edges are split at their midpoint. A boundary vertex with
    /// exactly two boundary edges is smoothed along the boundary curve with
    /// the `(a + 6·p + b) / 8` rule. Other boundary vertices keep their
    /// position.
    CreaseEdges = 0,
    /// Like [`CreaseEdges`](BoundaryMode::CreaseEdges) but every boundary
    /// vertex keeps its position.
    CreaseAll = 1,
}

/// How texture coordinate values are refined.
///
/// Texture coordinate *indices* never change: every child corner reuses the
/// index of the parent corner it was created from.
#[repr(u32)]
#[derive(TryFromPrimitive, Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MapBorderMode {
    /// Texture coordinates are copied unchanged.
    #[default]
    NotSmooth = 0,
    /// Texture coordinates surrounded by faces in uv space are smoothed with
    /// the vertex rule. Texture coordinates on a uv border are kept.
    SmoothInternal = 1,
    /// Like [`SmoothInternal`](MapBorderMode::SmoothInternal), and uv border
    /// texture coordinates with two border edges are smoothed along the
    /// border.
    SmoothAll = 2,
}

/// Options applying to the refinement of one level.
///
/// # Examples
///
/// ```
/// use catmark::far::{BoundaryMode, MapBorderMode, TopologyRefinerOptions};
///
/// // Create options with defaults
/// let options = TopologyRefinerOptions::default();
/// assert_eq!(options.boundary_interpolation, None);
///
/// // Create custom options
/// let custom_options = TopologyRefinerOptions {
///     boundary_interpolation: Some(BoundaryMode::CreaseEdges),
///     map_border_mode: MapBorderMode::SmoothInternal,
///     ..Default::default()
/// };
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TopologyRefinerOptions {
    /// `None` refines boundaries with the plain Catmull-Clark rules, where a
    /// boundary edge simply has one incident face.
    pub boundary_interpolation: Option<BoundaryMode>,
    pub map_border_mode: MapBorderMode,
    /// Reject edges shared by more than two faces instead of refining them
    /// with their full valence.
    pub strict_manifold: bool,
}

impl Default for TopologyRefinerOptions {
    /// Create options with the following defaults:
    ///
    /// | Property                 | Value                                   |
    /// |--------------------------|-----------------------------------------|
    /// | `boundary_interpolation` | `None`                                  |
    /// | `map_border_mode`        | [`NotSmooth`](MapBorderMode::NotSmooth) |
    /// | `strict_manifold`        | `false`                                 |
    fn default() -> Self {
        Self {
            boundary_interpolation: None,
            map_border_mode: MapBorderMode::NotSmooth,
            strict_manifold: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PointSource {
    /// Points are the original mesh points.
    Original,
    /// Points are blended from the level below.
    Refined(StencilTable),
}

/// One level of a subdivision hierarchy with symbolic points.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicMesh {
    level: usize,
    point_count: usize,
    source: PointSource,
    points: Vec<f32>,
    tex_coords: Vec<f32>,
    faces: Vec<Vec<Corner>>,
    face_smoothing_groups: Vec<u32>,
}

impl SymbolicMesh {
    /// Wraps `mesh` as level zero.
    ///
    /// The points of the base level are the mesh's points.
    pub fn base(mesh: &PolygonMesh) -> Result<Self> {
        mesh.validate()?;

        Ok(Self {
            level: 0,
            point_count: mesh.point_count(),
            source: PointSource::Original,
            points: mesh.points.clone(),
            tex_coords: mesh.tex_coords.clone(),
            faces: mesh.faces.clone(),
            face_smoothing_groups: mesh.face_smoothing_groups.clone(),
        })
    }

    /// Builds the next level.
    ///
    /// Only the topology of `self` is read. The points of the returned level
    /// are zero until [`resolve_positions()`](Self::resolve_positions) is
    /// called with the points of `self`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NonManifoldEdge`] if `options.strict_manifold` is
    /// set and an edge has more than two faces, and with
    /// [`Error::DegenerateVertex`] if the vertex rule is applied to a vertex
    /// no face references.
    pub fn refine(&self, options: &TopologyRefinerOptions) -> Result<SymbolicMesh> {
        let level = TopologyLevel::from_faces(self.point_count, &self.faces)?;
        check_manifold(&level, options.strict_manifold)?;

        let face_weights = (0..level.face_count())
            .map(|face| {
                rules::face_point(
                    level
                        .face_vertices(Index::from(face))
                        .unwrap_or_default()
                        .iter()
                        .map(|vertex| Weights::point(vertex.0)),
                )
            })
            .collect_vec();

        let mut stencils = StencilTable::new(self.point_count);
        let child = refine_faces(&level, &self.faces, &self.face_smoothing_groups, |parent| {
            let weights = match parent {
                ParentComponent::Vertex(vertex) => vertex_weights(
                    &level,
                    &face_weights,
                    vertex,
                    options.boundary_interpolation,
                )?,
                ParentComponent::Edge(edge) => edge_weights(
                    &level,
                    &face_weights,
                    edge,
                    options.boundary_interpolation,
                )?,
                ParentComponent::Face(face) => face_weights[usize::from(face)].clone(),
            };
            stencils.push(&weights)
        })?;

        let tex_coords = refine_tex_coords(&self.tex_coords, &self.faces, options.map_border_mode)?;

        debug!(
            "Built level {}: {} faces, {} points, {} stencil weights",
            self.level + 1,
            child.faces.len(),
            child.point_count,
            stencils.weights().len()
        );

        Ok(SymbolicMesh {
            level: self.level + 1,
            point_count: child.point_count,
            source: PointSource::Refined(stencils),
            points: vec![0.0; 3 * child.point_count],
            tex_coords,
            faces: child.faces,
            face_smoothing_groups: child.face_smoothing_groups,
        })
    }

    /// Returns the points of this level computed from `parent_points`.
    ///
    /// For level zero `parent_points` are the original points themselves.
    pub fn resolve(&self, parent_points: &[f32]) -> Result<Vec<f32>> {
        match &self.source {
            PointSource::Original => {
                if parent_points.len() != 3 * self.point_count {
                    return Err(Error::InvalidBufferSize {
                        expected: 3 * self.point_count,
                        actual: parent_points.len(),
                    });
                }
                Ok(parent_points.to_vec())
            }
            PointSource::Refined(stencils) => stencils.update_values(parent_points, 3),
        }
    }

    /// Recomputes the points of this level from `parent_points`.
    ///
    /// No adjacency is touched. The caller resolves levels bottom up; each
    /// level reads the already resolved points of the level below.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidBufferSize`] if `parent_points` does not
    /// hold one `x, y, z` triple per control point.
    pub fn resolve_positions(&mut self, parent_points: &[f32]) -> Result<()> {
        self.points = self.resolve(parent_points)?;
        trace!("Resolved {} points on level {}", self.point_count, self.level);
        Ok(())
    }

    pub(crate) fn set_points(&mut self, points: Vec<f32>) {
        debug_assert_eq!(points.len(), 3 * self.point_count);
        self.points = points;
    }

    /// Returns the depth of this level; zero for the original mesh.
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Returns the number of points of the level below this one.
    pub fn control_point_count(&self) -> usize {
        match &self.source {
            PointSource::Original => self.point_count,
            PointSource::Refined(stencils) => stencils.control_vertex_count(),
        }
    }

    /// Returns the stencils blending the level below into this one; `None`
    /// for level zero.
    pub fn stencil_table(&self) -> Option<&StencilTable> {
        match &self.source {
            PointSource::Original => None,
            PointSource::Refined(stencils) => Some(stencils),
        }
    }

    /// Returns the last resolved points as a flat `x, y, z` buffer.
    #[inline]
    pub fn points(&self) -> &[f32] {
        &self.points
    }

    #[inline]
    pub fn tex_coords(&self) -> &[f32] {
        &self.tex_coords
    }

    #[inline]
    pub fn faces(&self) -> &[Vec<Corner>] {
        &self.faces
    }

    #[inline]
    pub fn face_smoothing_groups(&self) -> &[u32] {
        &self.face_smoothing_groups
    }

    /// Returns a mesh with the last resolved points of this level.
    pub fn to_polygon_mesh(&self) -> PolygonMesh {
        PolygonMesh {
            points: self.points.clone(),
            tex_coords: self.tex_coords.clone(),
            faces: self.faces.clone(),
            face_smoothing_groups: self.face_smoothing_groups.clone(),
        }
    }
}

fn vertex_weights(
    level: &TopologyLevel,
    face_weights: &[Weights],
    vertex: Index,
    boundary: Option<BoundaryMode>,
) -> Result<Weights> {
    let point = Weights::point(vertex.0);

    if let Some(mode) = boundary {
        if level.is_vertex_boundary(vertex) {
            return Ok(match (mode, level.vertex_boundary_edges(vertex).as_slice()) {
                (BoundaryMode::CreaseEdges, &[e0, e1]) => {
                    let a = other_vertex(level, e0, vertex)?;
                    let b = other_vertex(level, e1, vertex)?;
                    rules::crease_vertex_point(point, Weights::point(a.0), Weights::point(b.0))
                }
                _ => point,
            });
        }
    }

    let faces = level
        .vertex_faces(vertex)
        .unwrap_or_default()
        .iter()
        .map(|&face| face_weights[usize::from(face)].clone());
    let midpoints = level
        .vertex_edges(vertex)
        .unwrap_or_default()
        .iter()
        .map(|&edge| edge_midpoint(level, edge))
        .collect::<Result<Vec<_>>>()?;

    rules::vertex_point(vertex.0, point, faces, midpoints)
}

fn edge_weights(
    level: &TopologyLevel,
    face_weights: &[Weights],
    edge: Index,
    boundary: Option<BoundaryMode>,
) -> Result<Weights> {
    let midpoint = edge_midpoint(level, edge)?;

    if boundary.is_some() && level.is_edge_boundary(edge) {
        return Ok(midpoint);
    }

    Ok(rules::edge_point(
        midpoint,
        level
            .edge_faces(edge)
            .unwrap_or_default()
            .iter()
            .map(|&face| face_weights[usize::from(face)].clone()),
    ))
}

fn edge_midpoint(level: &TopologyLevel, edge: Index) -> Result<Weights> {
    let [v0, v1] = level.edge_vertices(edge).ok_or(Error::IndexOutOfBounds {
        index: edge.into(),
        max: level.edge_count(),
    })?;
    Ok(rules::crease_edge_point(
        Weights::point(v0.0),
        Weights::point(v1.0),
    ))
}

fn other_vertex(level: &TopologyLevel, edge: Index, vertex: Index) -> Result<Index> {
    level
        .edge_other_vertex(edge, vertex)
        .ok_or_else(|| {
            Error::InvalidTopology(format!(
                "Edge {} does not touch vertex {}.",
                edge.0, vertex.0
            ))
        })
}

/// Smooths texture coordinate values in uv space.
fn refine_tex_coords(
    tex_coords: &[f32],
    faces: &[Vec<Corner>],
    mode: MapBorderMode,
) -> Result<Vec<f32>> {
    if mode == MapBorderMode::NotSmooth {
        return Ok(tex_coords.to_vec());
    }

    let uvs = tex_coords.nest::<[_; 2]>();
    let level = TopologyLevel::face_varying(uvs, faces)?;

    let mut refined = Vec::with_capacity(tex_coords.len());
    for (t, &[u, v]) in uvs.iter().enumerate() {
        let t = Index::from(t);
        let uv = Vec3::new(u, v, 0.0);

        let smoothed = if level.vertex_faces(t).unwrap_or_default().is_empty() {
            uv
        } else if !level.is_vertex_boundary(t) && !has_non_manifold_edge(&level, t) {
            smooth_tex_coord(&level, t, uv)?
        } else if mode == MapBorderMode::SmoothAll {
            match level.vertex_boundary_edges(t).as_slice() {
                &[e0, e1] => rules::crease_vertex_point(
                    uv,
                    uv_of(uvs, other_vertex(&level, e0, t)?),
                    uv_of(uvs, other_vertex(&level, e1, t)?),
                ),
                _ => uv,
            }
        } else {
            uv
        };

        refined.extend_from_slice(&[smoothed.x, smoothed.y]);
    }

    Ok(refined)
}

fn has_non_manifold_edge(level: &TopologyLevel, vertex: Index) -> bool {
    level
        .vertex_incident_edges(vertex)
        .unwrap_or_default()
        .iter()
        .any(|&edge| level.is_edge_non_manifold(edge))
}

fn smooth_tex_coord(level: &TopologyLevel, t: Index, uv: Vec3) -> Result<Vec3> {
    let faces = level
        .vertex_faces(t)
        .unwrap_or_default()
        .iter()
        .filter_map(|&face| level.face_centroid(face));
    let midpoints = level
        .vertex_edges(t)
        .unwrap_or_default()
        .iter()
        .filter_map(|&edge| level.edge_midpoint(edge));

    rules::vertex_point(t.0, uv, faces, midpoints)
}

#[inline]
fn uv_of(uvs: &[[f32; 2]], t: Index) -> Vec3 {
    let [u, v] = uvs[usize::from(t)];
    to_vec3([u, v, 0.0])
}
