//! Incrementally updated subdivision of an animated mesh.
//!
//! A [`SubdivisionMesh`] owns an original [`PolygonMesh`] and keeps a stack
//! of [`SymbolicMesh`] levels built from it. Whoever mutates the original
//! reports what changed with a [`MeshChange`]; the next
//! [`update()`](SubdivisionMesh::update) then does the least work needed:
//!
//! * Resized points, new texture coordinates, new faces or new refinement
//!   options rebuild every level.
//! * Moved points re-evaluate the stencils of each level, bottom up. Faces
//!   and texture coordinates are left alone.
//! * A deeper target level builds only the missing levels.
use std::ops::Range;

use tracing::{debug, trace};

use crate::far::{BoundaryMode, MapBorderMode, SymbolicMesh, TopologyRefinerOptions};
use crate::{Error, PolygonMesh, Result};

/// A change to the points of the original mesh.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PointsChange {
    /// The number of points changed.
    pub resized: bool,
    /// The range of the flat `x, y, z` buffer whose values changed; `None`
    /// for the whole buffer.
    pub range: Option<Range<usize>>,
}

/// What changed on the original mesh of a [`SubdivisionMesh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshChange {
    Points(PointsChange),
    /// The texture coordinate buffer was resized or replaced.
    TexCoords,
    /// The faces were edited.
    Faces,
}

/// A mesh subdivided to a target level, kept in sync with its original.
///
/// # Examples
///
/// ```
/// # use catmark::{PolygonMesh, SubdivisionMesh};
/// let quad = PolygonMesh::from_flat_faces(
///     vec![0., 0., 0., 2., 0., 0., 2., 2., 0., 0., 2., 0.],
///     vec![0., 0.],
///     vec![vec![0, 0, 1, 0, 2, 0, 3, 0]],
/// )?;
///
/// let mut subdivision = SubdivisionMesh::new(quad)?;
/// subdivision.set_subdivision_level(2);
/// assert_eq!(subdivision.update()?.face_count(), 16);
///
/// // Moving a point only re-evaluates stencils.
/// subdivision.update_points(3, &[2.5, 0., 0.])?;
/// assert_eq!(subdivision.update()?.face_count(), 16);
/// # Ok::<(), catmark::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SubdivisionMesh {
    original: PolygonMesh,
    options: TopologyRefinerOptions,
    target_level: usize,
    levels: Vec<SymbolicMesh>,
    // Levels `0..resolved_levels` hold points matching the original.
    resolved_levels: usize,
    mesh: PolygonMesh,
    mesh_dirty: bool,
    point_values_dirty: bool,
    subdivision_level_dirty: bool,
}

/// ### Construction
impl SubdivisionMesh {
    /// Creates a subdivision of `original` at level zero with default
    /// [`TopologyRefinerOptions`].
    pub fn new(original: PolygonMesh) -> Result<Self> {
        Self::with_options(original, TopologyRefinerOptions::default())
    }

    /// Creates a subdivision of `original` at level zero.
    ///
    /// Nothing is built until the first [`update()`](Self::update).
    pub fn with_options(original: PolygonMesh, options: TopologyRefinerOptions) -> Result<Self> {
        original.validate()?;

        Ok(Self {
            original,
            options,
            target_level: 0,
            levels: Vec::new(),
            resolved_levels: 0,
            mesh: PolygonMesh::default(),
            mesh_dirty: true,
            point_values_dirty: true,
            subdivision_level_dirty: true,
        })
    }
}

/// ### Mutating the Original Mesh
impl SubdivisionMesh {
    /// Returns the original mesh.
    #[inline]
    pub fn original_mesh(&self) -> &PolygonMesh {
        &self.original
    }

    /// Returns the original mesh for direct mutation.
    ///
    /// Report every mutation with [`apply_change()`](Self::apply_change)
    /// before the next [`update()`](Self::update).
    #[inline]
    pub fn original_mesh_mut(&mut self) -> &mut PolygonMesh {
        &mut self.original
    }

    /// Records a change of the original mesh.
    pub fn apply_change(&mut self, change: MeshChange) {
        match change {
            MeshChange::Points(PointsChange { resized: true, .. })
            | MeshChange::TexCoords
            | MeshChange::Faces => {
                trace!("Topology of the original mesh changed: {:?}", change);
                self.mesh_dirty = true;
            }
            MeshChange::Points(PointsChange {
                resized: false,
                range,
            }) => {
                if range.map_or(true, |range| !range.is_empty()) {
                    self.point_values_dirty = true;
                }
            }
        }
    }

    /// Replaces the points of the original mesh.
    pub fn set_points(&mut self, points: Vec<f32>) {
        let resized = points.len() != self.original.points.len();
        self.original.points = points;
        self.apply_change(MeshChange::Points(PointsChange {
            resized,
            range: None,
        }));
    }

    /// Overwrites the flat `x, y, z` point buffer of the original mesh
    /// starting at `range_start`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::IndexOutOfBounds`] if `values` does not fit.
    pub fn update_points(&mut self, range_start: usize, values: &[f32]) -> Result<()> {
        let range = range_start..range_start + values.len();
        let max = self.original.points.len();
        self.original
            .points
            .get_mut(range.clone())
            .ok_or(Error::IndexOutOfBounds {
                index: range.end,
                max,
            })?
            .copy_from_slice(values);

        self.apply_change(MeshChange::Points(PointsChange {
            resized: false,
            range: Some(range),
        }));

        Ok(())
    }

    /// Replaces the texture coordinates of the original mesh.
    pub fn set_tex_coords(&mut self, tex_coords: Vec<f32>) {
        self.original.tex_coords = tex_coords;
        self.apply_change(MeshChange::TexCoords);
    }

    /// Replaces the original mesh.
    pub fn set_original_mesh(&mut self, original: PolygonMesh) {
        self.original = original;
        self.mesh_dirty = true;
    }
}

/// ### Refinement Settings
impl SubdivisionMesh {
    /// Returns the target subdivision level.
    #[inline]
    pub fn subdivision_level(&self) -> usize {
        self.target_level
    }

    pub fn set_subdivision_level(&mut self, level: usize) {
        if level != self.target_level {
            self.target_level = level;
            self.subdivision_level_dirty = true;
        }
    }

    #[inline]
    pub fn boundary_mode(&self) -> Option<BoundaryMode> {
        self.options.boundary_interpolation
    }

    pub fn set_boundary_mode(&mut self, mode: Option<BoundaryMode>) {
        self.set_options(TopologyRefinerOptions {
            boundary_interpolation: mode,
            ..self.options
        });
    }

    #[inline]
    pub fn map_border_mode(&self) -> MapBorderMode {
        self.options.map_border_mode
    }

    pub fn set_map_border_mode(&mut self, mode: MapBorderMode) {
        self.set_options(TopologyRefinerOptions {
            map_border_mode: mode,
            ..self.options
        });
    }

    #[inline]
    pub fn options(&self) -> &TopologyRefinerOptions {
        &self.options
    }

    /// Replaces the refinement options. Every level is rebuilt on the next
    /// [`update()`](Self::update) if they differ from the current ones.
    pub fn set_options(&mut self, options: TopologyRefinerOptions) {
        if options != self.options {
            self.options = options;
            self.mesh_dirty = true;
        }
    }
}

/// ### Updating
impl SubdivisionMesh {
    /// Returns `true` if the next [`update()`](Self::update) has work to do.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.mesh_dirty || self.point_values_dirty || self.subdivision_level_dirty
    }

    /// Returns the number of levels currently cached, level zero included.
    #[inline]
    pub fn cached_levels(&self) -> usize {
        self.levels.len()
    }

    /// Returns a cached level.
    #[inline]
    pub fn level(&self, level: usize) -> Option<&SymbolicMesh> {
        self.levels.get(level)
    }

    /// Returns the mesh committed by the last successful
    /// [`update()`](Self::update).
    #[inline]
    pub fn mesh(&self) -> &PolygonMesh {
        &self.mesh
    }

    /// Brings the subdivided mesh in sync with the original mesh and returns
    /// it.
    ///
    /// All work is staged first and committed only if every step succeeds.
    /// On error the previously committed mesh and the cached levels are left
    /// untouched and the pending changes are retried on the next call.
    pub fn update(&mut self) -> Result<&PolygonMesh> {
        if !self.is_dirty() {
            return Ok(&self.mesh);
        }

        let target = self.target_level;
        let rebuild = self.mesh_dirty || self.levels.is_empty();
        let mut subdivision_level_dirty = self.subdivision_level_dirty || rebuild;

        // Levels kept from the cache, then levels built by this update.
        let kept = if rebuild { 0 } else { self.levels.len() };
        let mut staged = Vec::new();
        if rebuild {
            debug!(
                "Rebuilding levels from {} faces, {} points",
                self.original.face_count(),
                self.original.point_count()
            );
            staged.push(SymbolicMesh::base(&self.original)?);
        }
        while kept + staged.len() <= target {
            let top = staged
                .last()
                .or_else(|| self.levels.last())
                .ok_or_else(|| Error::InvalidTopology("No base level to refine.".into()))?;
            let next = top.refine(&self.options)?;
            staged.push(next);
            subdivision_level_dirty = true;
        }

        let stack = self.levels[..kept].iter().chain(&staged).collect::<Vec<_>>();

        // Deeper levels kept from before may hold stale points.
        let start = if rebuild || self.point_values_dirty {
            0
        } else {
            self.resolved_levels
        };

        let mut resolved: Vec<Vec<f32>> = Vec::with_capacity((target + 1).saturating_sub(start));
        for i in start..=target {
            let points = {
                let parent: &[f32] = if i == 0 {
                    &self.original.points
                } else if start < i {
                    &resolved[i - start - 1]
                } else {
                    stack[i - 1].points()
                };
                stack[i].resolve(parent)?
            };
            trace!("Resolved level {}: {} points", i, points.len() / 3);
            resolved.push(points);
        }
        drop(stack);

        // Commit.
        if rebuild {
            self.levels.clear();
        }
        self.levels.extend(staged);
        let points_changed = !resolved.is_empty();
        for (i, points) in (start..).zip(resolved) {
            self.levels[i].set_points(points);
        }
        if points_changed {
            self.resolved_levels = target + 1;
        }

        let top = &self.levels[target];
        if points_changed || subdivision_level_dirty {
            self.mesh.points = top.points().to_vec();
        }
        if subdivision_level_dirty {
            self.mesh.tex_coords = top.tex_coords().to_vec();
            self.mesh.faces = top.faces().to_vec();
            self.mesh.face_smoothing_groups = top.face_smoothing_groups().to_vec();
        }

        self.mesh_dirty = false;
        self.point_values_dirty = false;
        self.subdivision_level_dirty = false;

        debug!(
            "Level {} up to date: {} faces, {} points, {} levels cached",
            target,
            self.mesh.face_count(),
            self.mesh.point_count(),
            self.levels.len()
        );

        Ok(&self.mesh)
    }
}
