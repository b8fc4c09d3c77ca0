use catmark::{far, PolygonMesh, SubdivisionMesh};

fn main() {
    // Geomtry for a cube control polyhedron.
    let vertices = vec![
        -0.5, -0.5, 0.5, 0.5, -0.5, 0.5, -0.5, 0.5, 0.5, 0.5, 0.5, 0.5, -0.5, 0.5, -0.5, 0.5, 0.5,
        -0.5, -0.5, -0.5, -0.5, 0.5, -0.5, -0.5,
    ];

    // One texture coordinate per face corner.
    let tex_coords = vec![0., 0., 1., 0., 1., 1., 0., 1.];

    let vert_indices = [
        0, 1, 3, 2, 2, 3, 5, 4, 4, 5, 7, 6, 6, 7, 1, 0, 1, 7, 5, 3, 6, 0, 2, 4,
    ];

    let faces = vert_indices
        .chunks(4)
        .map(|face| {
            face.iter()
                .zip(0..)
                .flat_map(|(&point, tex_coord)| [point, tex_coord])
                .collect()
        })
        .collect();

    let cube = PolygonMesh::from_flat_faces(vertices, tex_coords, faces)
        .expect("Could not create cube");

    // Keep a subdivision of the cube at 'max level' 2.
    let max_level = 2;

    let mut subdivision = SubdivisionMesh::with_options(
        cube,
        far::TopologyRefinerOptions {
            boundary_interpolation: Some(far::BoundaryMode::CreaseEdges),
            ..Default::default()
        },
    )
    .expect("Could not create SubdivisionMesh");
    subdivision.set_subdivision_level(max_level);

    // Twist the top of the cube over a couple of frames. Only the stencils
    // are re-evaluated after the first frame.
    let rest = subdivision.original_mesh().points.clone();
    let frames = 10;
    for frame in 0..=frames {
        let angle = frame as f32 / frames as f32 * std::f32::consts::FRAC_PI_2;
        let (sin, cos) = angle.sin_cos();

        let points = rest
            .chunks(3)
            .enumerate()
            .flat_map(|(i, p)| {
                // Vertices 2 to 5 form the top of the cube.
                if (2..=5).contains(&i) {
                    [p[0] * cos - p[2] * sin, p[1], p[0] * sin + p[2] * cos]
                } else {
                    [p[0], p[1], p[2]]
                }
            })
            .collect::<Vec<_>>();

        subdivision.set_points(points);
        let mesh = subdivision.update().expect("Could not update subdivision");
        eprintln!("frame {}: {} points", frame, mesh.point_count());
    }

    // Output an OBJ of the last frame.
    let mesh = subdivision.mesh();

    println!("o subdivision_cube");

    // Print vertex positions.
    for v in mesh.points_nested() {
        println!("v {} {} {}", v[0], v[1], v[2]);
    }

    for uv in mesh.tex_coords_nested() {
        println!("vt {} {}", uv[0], uv[1]);
    }

    for face in &mesh.faces {
        // All refined cat-clark faces should be quads.
        assert!(4 == face.len());
        print!("f");
        for corner in face {
            print!(" {}/{}", corner.point + 1, corner.tex_coord + 1);
        }
        println!();
    }
}
