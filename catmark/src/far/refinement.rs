//! Child face emission shared by the concrete and the symbolic subdivider.
//!
//! Every corner of every non-degenerate parent face turns into one child quad
//!
//! ```text
//! [ vertex(corner i), edge(i + 1), face, edge(i) ]
//! ```
//!
//! where edge `i` is the face edge ending at corner `i`. All four child
//! corners reuse the parent corner's texture coordinate.
//!
//! Child points are allocated lazily, the first time a quad references them,
//! so a parent component no surviving face touches never produces a point.
use std::collections::HashMap;

use tracing::warn;

use super::TopologyLevel;
use crate::{Corner, Error, Index, Result};

/// The parent component a child point is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentComponent {
    Vertex(Index),
    Edge(Index),
    Face(Index),
}

/// Maps parent components to child point indices, allocating on first use.
#[derive(Debug, Default)]
pub(crate) struct ChildIndexMap {
    children: HashMap<ParentComponent, u32>,
}

impl ChildIndexMap {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            children: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the child index of `parent`, calling `materialize` exactly once
    /// per parent to append the child point.
    pub(crate) fn resolve(
        &mut self,
        parent: ParentComponent,
        materialize: &mut impl FnMut(ParentComponent) -> Result<()>,
    ) -> Result<u32> {
        if let Some(&child) = self.children.get(&parent) {
            return Ok(child);
        }

        let child = self.children.len() as u32;
        materialize(parent)?;
        self.children.insert(parent, child);

        Ok(child)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.children.len()
    }
}

/// Faces of a child level.
#[derive(Debug, Default)]
pub(crate) struct ChildFaces {
    pub(crate) faces: Vec<Vec<Corner>>,
    pub(crate) face_smoothing_groups: Vec<u32>,
    pub(crate) point_count: usize,
}

/// Emits the child quads of every parent face.
///
/// `materialize` is called once per distinct parent component, in the order
/// the child points are numbered.
pub(crate) fn refine_faces(
    level: &TopologyLevel,
    faces: &[Vec<Corner>],
    face_smoothing_groups: &[u32],
    mut materialize: impl FnMut(ParentComponent) -> Result<()>,
) -> Result<ChildFaces> {
    let corner_count = level.face_vertex_count();
    let mut children =
        ChildIndexMap::with_capacity(level.vertex_count() + level.face_count() + level.edge_count());
    let mut child = ChildFaces {
        faces: Vec::with_capacity(corner_count),
        face_smoothing_groups: Vec::with_capacity(if face_smoothing_groups.is_empty() {
            0
        } else {
            corner_count
        }),
        point_count: 0,
    };

    for (face, corners) in faces.iter().enumerate() {
        let face = Index::from(face);
        let edges = match level.face_edges(face) {
            Some(edges) if !edges.is_empty() => edges,
            _ => continue,
        };
        let degree = edges.len();

        if degree != corners.len() {
            return Err(Error::InvalidTopology(format!(
                "Face {} has {} corners but {} edges.",
                face.0,
                corners.len(),
                degree
            )));
        }

        for (i, corner) in corners.iter().enumerate() {
            let vertex = children.resolve(
                ParentComponent::Vertex(Index(corner.point)),
                &mut materialize,
            )?;
            let next_edge = children.resolve(
                ParentComponent::Edge(edges[(i + 1) % degree]),
                &mut materialize,
            )?;
            let center = children.resolve(ParentComponent::Face(face), &mut materialize)?;
            let edge = children.resolve(ParentComponent::Edge(edges[i]), &mut materialize)?;

            let t = corner.tex_coord;
            child.faces.push(vec![
                Corner::new(vertex, t),
                Corner::new(next_edge, t),
                Corner::new(center, t),
                Corner::new(edge, t),
            ]);

            if let Some(&group) = face_smoothing_groups.get(usize::from(face)) {
                child.face_smoothing_groups.push(group);
            }
        }
    }

    child.point_count = children.len();

    Ok(child)
}

/// Rejects non-manifold edges in strict mode, logs them otherwise.
pub(crate) fn check_manifold(level: &TopologyLevel, strict: bool) -> Result<()> {
    let mut non_manifold = level.non_manifold_edges().peekable();

    if let Some(&edge) = non_manifold.peek() {
        if strict {
            let faces = level.edge_faces(edge).map_or(0, <[Index]>::len);
            let [v0, v1] = level
                .edge_vertices(edge)
                .ok_or(Error::IndexOutOfBounds {
                    index: edge.into(),
                    max: level.edge_count(),
                })?;
            return Err(Error::NonManifoldEdge {
                edge: (v0.0, v1.0),
                faces,
            });
        }
        warn!(
            "{} non-manifold edges; refining with their full valence",
            non_manifold.count()
        );
    }

    Ok(())
}
