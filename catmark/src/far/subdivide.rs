//! Direct Catmull-Clark subdivision of a [`PolygonMesh`].
//!
//! [`subdivide_once()`] computes one level of refinement with concrete
//! coordinates. It is the reference the cached, symbolic path in
//! [`SymbolicMesh`](super::SymbolicMesh) reproduces.
use tracing::debug;
use ultraviolet::Vec3;

use super::refinement::{check_manifold, refine_faces, ParentComponent};
use super::rules;
use super::TopologyLevel;
use crate::{Error, Index, PolygonMesh, Result};

/// Subdivides `mesh` once.
///
/// The result has one quad per corner of every non-degenerate face and at
/// most `V + F + E` points. Faces with fewer than three corners are dropped.
/// The texture coordinate buffer is carried over unchanged and every child
/// corner reuses its parent corner's texture coordinate index.
///
/// # Errors
///
/// Fails if the mesh does not validate (see [`PolygonMesh::validate()`]).
///
/// # Examples
///
/// ```
/// # use catmark::{far, PolygonMesh};
/// let quad = PolygonMesh::from_flat_faces(
///     vec![0., 0., 0., 2., 0., 0., 2., 2., 0., 0., 2., 0.],
///     vec![0., 0.],
///     vec![vec![0, 0, 1, 0, 2, 0, 3, 0]],
/// )?;
///
/// let refined = far::subdivide_once(&quad)?;
///
/// assert_eq!(refined.face_count(), 4);
/// assert_eq!(refined.point_count(), 9);
/// # Ok::<(), catmark::Error>(())
/// ```
pub fn subdivide_once(mesh: &PolygonMesh) -> Result<PolygonMesh> {
    let level = TopologyLevel::collect(mesh)?;
    check_manifold(&level, false)?;

    let edge_points = (0..level.edge_count())
        .map(|edge| edge_point(&level, Index::from(edge)))
        .collect::<Result<Vec<_>>>()?;

    let points = mesh.points_nested();
    let mut child_points =
        Vec::with_capacity(3 * (level.vertex_count() + level.face_count() + level.edge_count()));

    let child = refine_faces(&level, &mesh.faces, &mesh.face_smoothing_groups, |parent| {
        let p = match parent {
            ParentComponent::Vertex(vertex) => vertex_point(&level, points, vertex)?,
            ParentComponent::Edge(edge) => edge_points[usize::from(edge)],
            ParentComponent::Face(face) => centroid(&level, face)?,
        };
        child_points.extend_from_slice(&[p.x, p.y, p.z]);
        Ok(())
    })?;

    debug_assert_eq!(child_points.len(), 3 * child.point_count);

    Ok(PolygonMesh {
        points: child_points,
        tex_coords: mesh.tex_coords.clone(),
        faces: child.faces,
        face_smoothing_groups: child.face_smoothing_groups,
    })
}

/// Subdivides `mesh` `levels` times.
///
/// Zero levels returns a copy of the (validated) input.
pub fn subdivide(mesh: &PolygonMesh, levels: usize) -> Result<PolygonMesh> {
    mesh.validate()?;

    let mut current = mesh.clone();
    for level in 1..=levels {
        current = subdivide_once(&current)?;
        debug!(
            "Level {}: {} faces, {} points",
            level,
            current.face_count(),
            current.point_count()
        );
    }

    Ok(current)
}

fn centroid(level: &TopologyLevel, face: Index) -> Result<Vec3> {
    level.face_centroid(face).ok_or(Error::IndexOutOfBounds {
        index: face.into(),
        max: level.face_count(),
    })
}

fn midpoint(level: &TopologyLevel, edge: Index) -> Result<Vec3> {
    level.edge_midpoint(edge).ok_or(Error::IndexOutOfBounds {
        index: edge.into(),
        max: level.edge_count(),
    })
}

fn edge_point(level: &TopologyLevel, edge: Index) -> Result<Vec3> {
    let faces = level
        .edge_faces(edge)
        .unwrap_or_default()
        .iter()
        .map(|&face| centroid(level, face))
        .collect::<Result<Vec<_>>>()?;

    Ok(rules::edge_point(midpoint(level, edge)?, faces))
}

fn vertex_point(level: &TopologyLevel, points: &[[f32; 3]], vertex: Index) -> Result<Vec3> {
    let p = points
        .get(usize::from(vertex))
        .copied()
        .ok_or(Error::IndexOutOfBounds {
            index: vertex.into(),
            max: points.len(),
        })?;

    let faces = level
        .vertex_faces(vertex)
        .unwrap_or_default()
        .iter()
        .map(|&face| centroid(level, face))
        .collect::<Result<Vec<_>>>()?;
    let midpoints = level
        .vertex_edges(vertex)
        .unwrap_or_default()
        .iter()
        .map(|&edge| midpoint(level, edge))
        .collect::<Result<Vec<_>>>()?;

    rules::vertex_point(
        vertex.0,
        Vec3::new(p[0], p[1], p[2]),
        faces,
        midpoints,
    )
}
