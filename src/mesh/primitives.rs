//! Quad-based primitive builders.
//!
//! The editing operations work on arbitrary n-gon faces but the loop cut
//! traverses quads only, so the primitives here are built from quad faces
//! rather than triangle pairs.

use bevy::prelude::*;

use super::{Face, Mesh, Vertex};

/// Axis-aligned cube centered on the origin: 8 vertices, 6 quad faces with
/// outward winding.
pub fn quad_cube(size: f32) -> Mesh {
    let h = size * 0.5;
    let corners = [
        Vec3::new(-h, -h, -h),
        Vec3::new(h, -h, -h),
        Vec3::new(h, h, -h),
        Vec3::new(-h, h, -h),
        Vec3::new(-h, -h, h),
        Vec3::new(h, -h, h),
        Vec3::new(h, h, h),
        Vec3::new(-h, h, h),
    ];
    let quads: [[u32; 4]; 6] = [
        [4, 5, 6, 7], // front  (z+)
        [1, 0, 3, 2], // back   (z-)
        [5, 1, 2, 6], // right  (x+)
        [0, 4, 7, 3], // left   (x-)
        [7, 6, 2, 3], // top    (y+)
        [0, 1, 5, 4], // bottom (y-)
    ];

    let mut mesh = Mesh::new("Cube");
    for (i, corner) in corners.iter().enumerate() {
        mesh.vertices.push(Vertex::new(i as u32, *corner));
    }
    for (i, quad) in quads.iter().enumerate() {
        mesh.faces.push(Face::new(i as u32, quad.to_vec()));
    }

    mesh.rebuild_edges();
    mesh.recompute_normals();
    mesh
}

/// Single quad in the XY plane spanning (0,0) to (size,size), facing +Z.
pub fn quad_plane(size: f32) -> Mesh {
    let mut mesh = Mesh::new("Plane");
    let corners = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(size, 0.0, 0.0),
        Vec3::new(size, size, 0.0),
        Vec3::new(0.0, size, 0.0),
    ];
    for (i, corner) in corners.iter().enumerate() {
        let mut v = Vertex::new(i as u32, *corner);
        v.uv = Vec2::new(corner.x / size, corner.y / size);
        mesh.vertices.push(v);
    }
    mesh.faces.push(Face::new(0, vec![0, 1, 2, 3]));

    mesh.rebuild_edges();
    mesh.recompute_normals();
    mesh
}

/// Grid of `cols` x `rows` quads in the XY plane with square cells,
/// facing +Z.
pub fn quad_grid(cols: u32, rows: u32, cell: f32) -> Mesh {
    let mut mesh = Mesh::new("Grid");
    let stride = cols + 1;

    for j in 0..=rows {
        for i in 0..=cols {
            let id = j * stride + i;
            let mut v = Vertex::new(id, Vec3::new(i as f32 * cell, j as f32 * cell, 0.0));
            v.uv = Vec2::new(i as f32 / cols as f32, j as f32 / rows as f32);
            mesh.vertices.push(v);
        }
    }

    for j in 0..rows {
        for i in 0..cols {
            let v0 = j * stride + i;
            let face = Face::new(
                j * cols + i,
                vec![v0, v0 + 1, v0 + stride + 1, v0 + stride],
            );
            mesh.faces.push(face);
        }
    }

    mesh.rebuild_edges();
    mesh.recompute_normals();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_is_closed() {
        let mesh = quad_cube(2.0);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.faces.len(), 6);
        assert!(mesh.validate());
        assert!(mesh.edges.iter().all(|e| e.faces.len() == 2));
    }

    #[test]
    fn grid_counts() {
        let mesh = quad_grid(3, 2, 1.0);
        assert_eq!(mesh.vertices.len(), 12);
        assert_eq!(mesh.faces.len(), 6);
        // Interior edges shared, boundary edges not
        assert_eq!(mesh.edges.len(), 3 * 3 + 4 * 2);
        assert!(mesh.validate());
    }

    #[test]
    fn plane_faces_up() {
        let mesh = quad_plane(1.0);
        assert!((mesh.faces[0].normal - Vec3::Z).length() < 1e-6);
    }
}
