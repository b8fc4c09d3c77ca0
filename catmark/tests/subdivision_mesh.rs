//! Tests for the incrementally updated subdivision cache.

use anyhow::Result;
use catmark::far::{self, BoundaryMode, MapBorderMode, SymbolicMesh, TopologyRefinerOptions};
use catmark::{Error, MeshChange, PointsChange, PolygonMesh, SubdivisionMesh};

use test_utils::*;

/// Moves every point of `mesh` by `offset` along `x` and squashes it along
/// `z`.
fn deform(mesh: &PolygonMesh, offset: f32) -> Vec<f32> {
    mesh.points
        .chunks(3)
        .flat_map(|p| [p[0] + offset, p[1], p[2] * 0.5])
        .collect()
}

#[test]
fn test_cache_equivalence() -> Result<()> {
    for mesh in [cube(), grid(2), fan()] {
        let mut subdivision = SubdivisionMesh::new(mesh.clone())?;

        for level in 0..=3 {
            subdivision.set_subdivision_level(level);
            let cached = subdivision.update()?.clone();
            assert_mesh_eq(&cached, &far::subdivide(&mesh, level)?);
            assert!(!subdivision.is_dirty());
        }
        assert_eq!(subdivision.cached_levels(), 4);
    }

    Ok(())
}

#[test]
fn test_update_without_changes_is_a_noop() -> Result<()> {
    let mut subdivision = SubdivisionMesh::new(cube())?;
    subdivision.set_subdivision_level(2);
    let first = subdivision.update()?.clone();
    let second = subdivision.update()?.clone();
    assert_eq!(first, second);
    assert_eq!(subdivision.mesh(), &first);

    Ok(())
}

#[test]
fn test_position_only_update() -> Result<()> {
    let mesh = cube();
    let mut subdivision = SubdivisionMesh::new(mesh.clone())?;
    subdivision.set_subdivision_level(2);
    let before = subdivision.update()?.clone();

    let moved = deform(&mesh, 1.0);
    subdivision.set_points(moved.clone());
    assert!(subdivision.is_dirty());
    let after = subdivision.update()?.clone();

    // Topology and texture coordinates are untouched, only points move.
    assert_eq!(after.faces, before.faces);
    assert_eq!(after.tex_coords, before.tex_coords);
    assert_ne!(after.points, before.points);
    assert_eq!(subdivision.cached_levels(), 3);

    let expected = far::subdivide(
        &PolygonMesh {
            points: moved,
            ..mesh
        },
        2,
    )?;
    assert_mesh_eq(&after, &expected);

    Ok(())
}

#[test]
fn test_partial_point_update() -> Result<()> {
    let mesh = grid(2);
    let mut subdivision = SubdivisionMesh::new(mesh.clone())?;
    subdivision.set_subdivision_level(1);
    subdivision.update()?;

    // Lift the center point.
    subdivision.update_points(4 * 3, &[1., 1., 1.])?;
    let lifted = subdivision.update()?.clone();

    let mut expected = mesh;
    expected.points[14] = 1.;
    assert_mesh_eq(&lifted, &far::subdivide(&expected, 1)?);
    assert!(lifted.points_nested().iter().any(|p| p[2] > 0.));

    Ok(())
}

#[test]
fn test_direct_mutation_with_change_report() -> Result<()> {
    let mesh = grid(2);
    let mut subdivision = SubdivisionMesh::new(mesh.clone())?;
    subdivision.set_subdivision_level(2);
    subdivision.update()?;

    subdivision.original_mesh_mut().points[2] = 0.25;
    subdivision.apply_change(MeshChange::Points(PointsChange {
        resized: false,
        range: Some(2..3),
    }));
    let updated = subdivision.update()?.clone();

    assert_mesh_eq(
        &updated,
        &far::subdivide(subdivision.original_mesh(), 2)?,
    );
    assert_eq!(subdivision.original_mesh().points[2], 0.25);

    Ok(())
}

#[test]
fn test_level_switching_keeps_deeper_levels_in_sync() -> Result<()> {
    let mesh = cube();
    let mut subdivision = SubdivisionMesh::new(mesh.clone())?;

    subdivision.set_subdivision_level(3);
    subdivision.update()?;

    // Lower the level, move the points, then go back up. The cached deeper
    // levels must not show the old positions.
    subdivision.set_subdivision_level(1);
    subdivision.update()?;
    let moved = deform(&mesh, -2.0);
    subdivision.set_points(moved.clone());
    let level1 = subdivision.update()?.clone();
    assert_eq!(subdivision.cached_levels(), 4);

    subdivision.set_subdivision_level(3);
    let level3 = subdivision.update()?.clone();

    let moved_mesh = PolygonMesh {
        points: moved,
        ..mesh
    };
    assert_mesh_eq(&level1, &far::subdivide(&moved_mesh, 1)?);
    assert_mesh_eq(&level3, &far::subdivide(&moved_mesh, 3)?);

    Ok(())
}

#[test]
fn test_resize_rebuilds_topology() -> Result<()> {
    let mut mesh = cube();
    let mut subdivision = SubdivisionMesh::new(mesh.clone())?;
    subdivision.set_subdivision_level(1);
    subdivision.update()?;

    // Append a point and a triangle using it.
    mesh.points.extend_from_slice(&[0., 0., 1.]);
    subdivision.set_points(mesh.points.clone());
    subdivision
        .original_mesh_mut()
        .faces
        .push(vec![(0, 0).into(), (1, 1).into(), (8, 2).into()]);
    subdivision.apply_change(MeshChange::Faces);

    let refined = subdivision.update()?.clone();
    assert_eq!(refined.face_count(), 24 + 3);
    assert_mesh_eq(&refined, &far::subdivide(subdivision.original_mesh(), 1)?);

    Ok(())
}

#[test]
fn test_tex_coord_change() -> Result<()> {
    let mesh = cube();
    let mut subdivision = SubdivisionMesh::new(mesh)?;
    subdivision.set_subdivision_level(2);
    subdivision.update()?;

    let tex_coords = vec![0., 0., 0.5, 0., 0.5, 0.5, 0., 0.5];
    subdivision.set_tex_coords(tex_coords.clone());
    assert_eq!(subdivision.update()?.tex_coords, tex_coords);

    Ok(())
}

#[test]
fn test_mode_change_rebuilds_levels() -> Result<()> {
    let mesh = grid(3);
    let mut subdivision = SubdivisionMesh::new(mesh.clone())?;
    subdivision.set_subdivision_level(2);
    let plain = subdivision.update()?.clone();

    subdivision.set_boundary_mode(Some(BoundaryMode::CreaseAll));
    subdivision.set_map_border_mode(MapBorderMode::SmoothAll);
    assert!(subdivision.is_dirty());
    let creased = subdivision.update()?.clone();

    assert_eq!(creased.faces, plain.faces);
    assert_ne!(creased.points, plain.points);
    assert_eq!(subdivision.boundary_mode(), Some(BoundaryMode::CreaseAll));
    assert_eq!(subdivision.map_border_mode(), MapBorderMode::SmoothAll);

    // Same result as refining level by level with the same options.
    let options = *subdivision.options();
    let mut expected = SymbolicMesh::base(&mesh)?;
    for _ in 0..2 {
        let mut next = expected.refine(&options)?;
        next.resolve_positions(expected.points())?;
        expected = next;
    }
    assert_mesh_eq(&creased, &expected.to_polygon_mesh());

    Ok(())
}

#[test]
fn test_failed_update_preserves_state() -> Result<()> {
    let mut subdivision = SubdivisionMesh::with_options(
        cube(),
        TopologyRefinerOptions {
            strict_manifold: true,
            ..Default::default()
        },
    )?;
    subdivision.set_subdivision_level(1);
    let committed = subdivision.update()?.clone();

    // A non-manifold original is rejected in strict mode.
    subdivision.set_original_mesh(fan());
    assert!(matches!(
        subdivision.update(),
        Err(Error::NonManifoldEdge { .. })
    ));
    assert_eq!(subdivision.mesh(), &committed);
    assert_eq!(subdivision.cached_levels(), 2);
    assert!(subdivision.is_dirty());

    // Shrinking the point buffer leaves faces pointing past its end.
    subdivision.set_original_mesh(cube());
    subdivision.set_points(CUBE_POINTS[..21].to_vec());
    assert!(matches!(
        subdivision.update(),
        Err(Error::IndexOutOfBounds { index: 7, max: 7 })
    ));
    assert_eq!(subdivision.mesh(), &committed);

    // Fixing the input lets the pending work go through.
    subdivision.set_points(CUBE_POINTS.to_vec());
    assert_mesh_eq(subdivision.update()?, &committed);
    assert!(!subdivision.is_dirty());

    Ok(())
}

#[test]
fn test_point_buffer_size_mismatch() -> Result<()> {
    let mut subdivision = SubdivisionMesh::new(cube())?;
    subdivision.update()?;

    // Growing the buffer but reporting an in-place change is caught while
    // resolving.
    subdivision.original_mesh_mut().points.extend_from_slice(&[0.; 3]);
    subdivision.apply_change(MeshChange::Points(PointsChange {
        resized: false,
        range: None,
    }));
    assert_eq!(
        subdivision.update().err(),
        Some(Error::InvalidBufferSize {
            expected: 24,
            actual: 27
        })
    );

    subdivision.apply_change(MeshChange::Points(PointsChange {
        resized: true,
        range: None,
    }));
    assert_eq!(subdivision.update()?.point_count(), 9);

    Ok(())
}
