//! Adjacency of a single level of a subdivision hierarchy.
//!
//! A [`TopologyLevel`] is collected in one pass over the faces of a level. It
//! stores, for every face, edge and vertex, the incident components of the
//! other two kinds. When collected from a mesh with positions it also holds
//! face centroids and edge midpoints, the two geometric quantities every
//! Catmull-Clark rule is expressed in.
//!
//! Components are stored in arenas and referred to by [`Index`]. Edges are
//! numbered in the order they are first met while walking the faces, so
//! collecting the same faces twice always yields the same numbering.
use std::collections::HashMap;

use itertools::Itertools;
use ultraviolet::Vec3;

use crate::{Corner, Error, Index, PolygonMesh, Result};

/// Adjacency of one level of a subdivision hierarchy.
///
/// Edge `i` of a face runs from corner `i - 1` to corner `i` (cyclically), so
/// corner `i` sits between face edges `i` and `i + 1`.
#[derive(Debug, Clone, Default)]
pub struct TopologyLevel {
    vertex_count: usize,
    face_vertices: Vec<Vec<Index>>,
    face_edges: Vec<Vec<Index>>,
    edge_vertices: Vec<[Index; 2]>,
    edge_faces: Vec<Vec<Index>>,
    edge_lookup: HashMap<(u32, u32), Index>,
    vertex_faces: Vec<Vec<Index>>,
    vertex_edges: Vec<Vec<Index>>,
    vertex_incident_edges: Vec<Vec<Index>>,
    has_geometry: bool,
    // Empty unless collected with positions.
    face_centroids: Vec<Vec3>,
    edge_midpoints: Vec<Vec3>,
}

/// ### Collection
impl TopologyLevel {
    /// Collects the adjacency and geometry of `mesh`.
    pub fn collect(mesh: &PolygonMesh) -> Result<Self> {
        mesh.validate()?;
        Ok(Self::walk(
            mesh.point_count(),
            &mesh.faces,
            |corner| corner.point,
            Some(mesh.points_nested()),
        ))
    }

    /// Collects the adjacency of `faces` only, without any geometry.
    pub fn from_faces(vertex_count: usize, faces: &[Vec<Corner>]) -> Result<Self> {
        check_indices(faces, vertex_count, |corner| corner.point)?;
        Ok(Self::walk(vertex_count, faces, |corner| corner.point, None))
    }

    /// Collects the adjacency of the texture coordinate layout of `faces`.
    ///
    /// Vertices of the returned level are texture coordinates; edges connect
    /// texture coordinates that follow each other around a face. Positions are
    /// the `u, v` values lifted to `z = 0`.
    pub fn face_varying(tex_coords: &[[f32; 2]], faces: &[Vec<Corner>]) -> Result<Self> {
        check_indices(faces, tex_coords.len(), |corner| corner.tex_coord)?;

        let positions = tex_coords
            .iter()
            .map(|&[u, v]| [u, v, 0.0])
            .collect_vec();

        Ok(Self::walk(
            tex_coords.len(),
            faces,
            |corner| corner.tex_coord,
            Some(&positions),
        ))
    }

    fn walk(
        vertex_count: usize,
        faces: &[Vec<Corner>],
        select: impl Fn(&Corner) -> u32,
        positions: Option<&[[f32; 3]]>,
    ) -> Self {
        let mut level = Self {
            vertex_count,
            face_vertices: Vec::with_capacity(faces.len()),
            face_edges: Vec::with_capacity(faces.len()),
            vertex_faces: vec![Vec::new(); vertex_count],
            vertex_edges: vec![Vec::new(); vertex_count],
            vertex_incident_edges: vec![Vec::new(); vertex_count],
            has_geometry: positions.is_some(),
            ..Default::default()
        };

        for (face, corners) in faces.iter().enumerate() {
            let face = Index::from(face);
            let degree = corners.len();

            if degree < 3 {
                level.face_vertices.push(Vec::new());
                level.face_edges.push(Vec::new());
                if positions.is_some() {
                    level.face_centroids.push(Vec3::zero());
                }
                continue;
            }

            let mut edges = Vec::with_capacity(degree);
            let mut centroid = Vec3::zero();

            // Start at the last corner so edge `i` ends at corner `i`.
            for (from, to) in corners
                .iter()
                .cycle()
                .skip(degree - 1)
                .take(degree + 1)
                .map(&select)
                .tuple_windows()
            {
                let edge = level.find_or_add_edge(from, to, positions);
                level.edge_faces[usize::from(edge)].push(face);
                level.vertex_faces[to as usize].push(face);
                level.vertex_edges[to as usize].push(edge);

                if let Some(positions) = positions {
                    centroid += to_vec3(positions[to as usize]) / degree as f32;
                }

                edges.push(edge);
            }

            level
                .face_vertices
                .push(corners.iter().map(|corner| Index(select(corner))).collect());
            level.face_edges.push(edges);
            if positions.is_some() {
                level.face_centroids.push(centroid);
            }
        }

        level
    }

    fn find_or_add_edge(&mut self, from: u32, to: u32, positions: Option<&[[f32; 3]]>) -> Index {
        let key = (from.min(to), from.max(to));

        if let Some(&edge) = self.edge_lookup.get(&key) {
            return edge;
        }

        let edge = Index::from(self.edge_vertices.len());
        self.edge_lookup.insert(key, edge);
        self.edge_vertices.push([Index(key.0), Index(key.1)]);
        self.edge_faces.push(Vec::new());

        self.vertex_incident_edges[key.0 as usize].push(edge);
        if key.0 != key.1 {
            self.vertex_incident_edges[key.1 as usize].push(edge);
        }

        if let Some(positions) = positions {
            self.edge_midpoints.push(
                (to_vec3(positions[key.0 as usize]) + to_vec3(positions[key.1 as usize])) / 2.0,
            );
        }

        edge
    }
}

/// ### Methods to Inspect the Overall Inventory of Components
impl TopologyLevel {
    /// Returns the number of vertices in this level.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Returns the number of faces in this level, degenerate ones included.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.face_vertices.len()
    }

    /// Returns the number of edges in this level.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_vertices.len()
    }

    /// Returns the sum of the arities of all non-degenerate faces.
    pub fn face_vertex_count(&self) -> usize {
        self.face_vertices.iter().map(Vec::len).sum()
    }

    /// Returns `true` if face centroids and edge midpoints were collected.
    #[inline]
    pub fn has_geometry(&self) -> bool {
        self.has_geometry
    }

    /// Returns an iterator over the vertices of every face.
    ///
    /// Degenerate faces yield an empty slice.
    pub fn face_vertices_iter(&self) -> impl Iterator<Item = &[Index]> + '_ {
        self.face_vertices.iter().map(Vec::as_slice)
    }

    /// Returns an iterator over all edges shared by more than two faces.
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = Index> + '_ {
        (0..self.edge_count())
            .map(Index::from)
            .filter(|&edge| self.is_edge_non_manifold(edge))
    }
}

/// ### Methods to Inspect Topological Relationships for Individual Components
///
/// Vertex-face and vertex-edge relations are recorded on the vertex each
/// face edge ends at. On a consistently oriented manifold this lists every
/// incident face and edge exactly once.
impl TopologyLevel {
    /// Returns the vertices of a given face.
    #[inline]
    pub fn face_vertices(&self, face: Index) -> Option<&[Index]> {
        self.face_vertices.get(usize::from(face)).map(Vec::as_slice)
    }

    /// Returns the edges of a given face, aligned with its corners.
    #[inline]
    pub fn face_edges(&self, face: Index) -> Option<&[Index]> {
        self.face_edges.get(usize::from(face)).map(Vec::as_slice)
    }

    /// Returns the two vertices of a given edge, smaller index first.
    #[inline]
    pub fn edge_vertices(&self, edge: Index) -> Option<[Index; 2]> {
        self.edge_vertices.get(usize::from(edge)).copied()
    }

    /// Returns the faces incident to a given edge.
    #[inline]
    pub fn edge_faces(&self, edge: Index) -> Option<&[Index]> {
        self.edge_faces.get(usize::from(edge)).map(Vec::as_slice)
    }

    /// Returns the faces incident to a given vertex.
    #[inline]
    pub fn vertex_faces(&self, vertex: Index) -> Option<&[Index]> {
        self.vertex_faces.get(usize::from(vertex)).map(Vec::as_slice)
    }

    /// Returns the edges recorded on a given vertex while walking faces.
    #[inline]
    pub fn vertex_edges(&self, vertex: Index) -> Option<&[Index]> {
        self.vertex_edges.get(usize::from(vertex)).map(Vec::as_slice)
    }

    /// Returns every distinct edge touching a given vertex.
    #[inline]
    pub fn vertex_incident_edges(&self, vertex: Index) -> Option<&[Index]> {
        self.vertex_incident_edges
            .get(usize::from(vertex))
            .map(Vec::as_slice)
    }

    /// Identify the edge matching the given vertex pair.
    #[inline]
    pub fn find_edge(&self, vertex0: Index, vertex1: Index) -> Option<Index> {
        self.edge_lookup
            .get(&(vertex0.0.min(vertex1.0), vertex0.0.max(vertex1.0)))
            .copied()
    }

    /// Returns the vertex at the other end of `edge`.
    #[inline]
    pub fn edge_other_vertex(&self, edge: Index, vertex: Index) -> Option<Index> {
        let [v0, v1] = self.edge_vertices(edge)?;
        if v0 == vertex {
            Some(v1)
        } else if v1 == vertex {
            Some(v0)
        } else {
            None
        }
    }
}

/// ### Methods to Inspect Other Topological Properties of Individual Components
impl TopologyLevel {
    /// Returns `true` if the edge has exactly one incident face.
    #[inline]
    pub fn is_edge_boundary(&self, edge: Index) -> bool {
        self.edge_faces(edge).is_some_and(|faces| faces.len() == 1)
    }

    /// Returns `true` if the edge has more than two incident faces.
    #[inline]
    pub fn is_edge_non_manifold(&self, edge: Index) -> bool {
        self.edge_faces(edge).is_some_and(|faces| faces.len() > 2)
    }

    /// Returns the boundary edges touching a given vertex.
    pub fn vertex_boundary_edges(&self, vertex: Index) -> Vec<Index> {
        self.vertex_incident_edges(vertex)
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|&edge| self.is_edge_boundary(edge))
            .collect()
    }

    /// Returns `true` if any edge touching the vertex is a boundary edge.
    #[inline]
    pub fn is_vertex_boundary(&self, vertex: Index) -> bool {
        self.vertex_incident_edges(vertex)
            .unwrap_or_default()
            .iter()
            .any(|&edge| self.is_edge_boundary(edge))
    }

    /// Returns `true` if the face has fewer than three vertices.
    #[inline]
    pub fn is_face_degenerate(&self, face: Index) -> bool {
        self.face_vertices(face).map_or(true, <[Index]>::is_empty)
    }
}

/// ### Geometry
impl TopologyLevel {
    /// Returns the centroid of a given face.
    #[inline]
    pub fn face_centroid(&self, face: Index) -> Option<Vec3> {
        self.face_centroids.get(usize::from(face)).copied()
    }

    /// Returns the midpoint of a given edge.
    #[inline]
    pub fn edge_midpoint(&self, edge: Index) -> Option<Vec3> {
        self.edge_midpoints.get(usize::from(edge)).copied()
    }
}

#[inline]
pub(crate) fn to_vec3(p: [f32; 3]) -> Vec3 {
    Vec3::new(p[0], p[1], p[2])
}

fn check_indices(faces: &[Vec<Corner>], len: usize, select: impl Fn(&Corner) -> u32) -> Result<()> {
    match faces
        .iter()
        .flatten()
        .map(select)
        .find(|&index| len <= index as usize)
    {
        Some(index) => Err(Error::IndexOutOfBounds {
            index: index as _,
            max: len,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles sharing the edge (1, 2).
    fn two_triangles() -> PolygonMesh {
        PolygonMesh::from_flat_faces(
            vec![0., 0., 0., 1., 0., 0., 0., 1., 0., 1., 1., 0.],
            vec![0., 0.],
            vec![vec![0, 0, 1, 0, 2, 0], vec![1, 0, 3, 0, 2, 0]],
        )
        .unwrap()
    }

    #[test]
    fn counts() {
        let level = TopologyLevel::collect(&two_triangles()).unwrap();
        assert_eq!(level.vertex_count(), 4);
        assert_eq!(level.face_count(), 2);
        assert_eq!(level.edge_count(), 5);
        assert_eq!(level.face_vertex_count(), 6);
        assert!(level.has_geometry());
    }

    #[test]
    fn edge_order_follows_corners() {
        let level = TopologyLevel::collect(&two_triangles()).unwrap();
        // Edge 0 of face 0 ends at corner 0: (2 -> 0).
        let edges = level.face_edges(Index(0)).unwrap();
        assert_eq!(level.edge_vertices(edges[0]), Some([Index(0), Index(2)]));
        assert_eq!(level.edge_vertices(edges[1]), Some([Index(0), Index(1)]));
        assert_eq!(level.edge_vertices(edges[2]), Some([Index(1), Index(2)]));
    }

    #[test]
    fn shared_edge() {
        let level = TopologyLevel::collect(&two_triangles()).unwrap();
        let shared = level.find_edge(Index(2), Index(1)).unwrap();
        assert_eq!(level.edge_faces(shared), Some(&[Index(0), Index(1)][..]));
        assert!(!level.is_edge_boundary(shared));
        assert!(!level.is_edge_non_manifold(shared));

        let boundary = level.find_edge(Index(0), Index(1)).unwrap();
        assert!(level.is_edge_boundary(boundary));
        assert!(level.find_edge(Index(0), Index(3)).is_none());
    }

    #[test]
    fn vertex_relations() {
        let level = TopologyLevel::collect(&two_triangles()).unwrap();
        assert_eq!(level.vertex_faces(Index(1)), Some(&[Index(0), Index(1)][..]));
        assert_eq!(level.vertex_faces(Index(3)), Some(&[Index(1)][..]));
        // Vertex 1 ends edge (0, 1) in face 0 and edge (2, 1) in face 1.
        assert_eq!(level.vertex_edges(Index(1)).unwrap().len(), 2);
        assert_eq!(level.vertex_incident_edges(Index(1)).unwrap().len(), 3);
        assert_eq!(level.vertex_boundary_edges(Index(1)).len(), 2);
        assert!(level.is_vertex_boundary(Index(1)));
    }

    #[test]
    fn geometry() {
        let level = TopologyLevel::collect(&two_triangles()).unwrap();
        let centroid = level.face_centroid(Index(0)).unwrap();
        assert!((centroid - Vec3::new(1. / 3., 1. / 3., 0.)).mag() < 1e-6);

        let shared = level.find_edge(Index(1), Index(2)).unwrap();
        assert_eq!(level.edge_midpoint(shared), Some(Vec3::new(0.5, 0.5, 0.)));
    }

    #[test]
    fn degenerate_faces_are_skipped() {
        let mesh = PolygonMesh::from_flat_faces(
            vec![0.; 12],
            vec![0., 0.],
            vec![vec![0, 0, 3, 0], vec![0, 0, 1, 0, 2, 0]],
        )
        .unwrap();
        let level = TopologyLevel::collect(&mesh).unwrap();
        assert!(level.is_face_degenerate(Index(0)));
        assert_eq!(level.edge_count(), 3);
        assert!(level.vertex_faces(Index(3)).unwrap().is_empty());
        assert!(level.find_edge(Index(0), Index(3)).is_none());
    }

    #[test]
    fn non_manifold_edges_are_accepted() {
        // Three triangles fanning around the edge (0, 1).
        let mesh = PolygonMesh::from_flat_faces(
            vec![0.; 15],
            vec![0., 0.],
            vec![
                vec![0, 0, 1, 0, 2, 0],
                vec![1, 0, 0, 0, 3, 0],
                vec![0, 0, 1, 0, 4, 0],
            ],
        )
        .unwrap();
        let level = TopologyLevel::collect(&mesh).unwrap();
        let edge = level.find_edge(Index(0), Index(1)).unwrap();
        assert_eq!(level.edge_faces(edge).unwrap().len(), 3);
        assert_eq!(level.non_manifold_edges().collect::<Vec<_>>(), vec![edge]);
    }

    #[test]
    fn topology_only() {
        let mesh = two_triangles();
        let level = TopologyLevel::from_faces(mesh.point_count(), &mesh.faces).unwrap();
        assert!(!level.has_geometry());
        assert!(level.face_centroid(Index(0)).is_none());
        assert_eq!(level.edge_count(), 5);

        assert_eq!(
            TopologyLevel::from_faces(3, &mesh.faces).err(),
            Some(Error::IndexOutOfBounds { index: 3, max: 3 })
        );
    }

    #[test]
    fn face_varying_layout() {
        // A seam: the two triangles use disjoint texture coordinates.
        let faces = vec![
            vec![Corner::new(0, 0), Corner::new(1, 1), Corner::new(2, 2)],
            vec![Corner::new(1, 3), Corner::new(3, 4), Corner::new(2, 5)],
        ];
        let tex_coords = [[0., 0.], [1., 0.], [0., 1.], [0., 0.], [1., 0.], [0., 1.]];
        let level = TopologyLevel::face_varying(&tex_coords, &faces).unwrap();
        assert_eq!(level.vertex_count(), 6);
        assert_eq!(level.edge_count(), 6);
        assert!((0..6).all(|edge| level.is_edge_boundary(Index(edge))));
    }
}
