//! Read-only fillet (rounded edge) preview.
//!
//! For each selected edge with exactly two adjacent faces, builds a ribbon
//! of line segments approximating the rounded edge: an arc rail swept at
//! both edge endpoints plus one rung per arc sample. The mesh is never
//! mutated — hosts draw the segments as gizmo lines.

use bevy::prelude::*;
use std::collections::HashSet;

use crate::mesh::adjacency::AdjacencyIndex;
use crate::mesh::{Edge, EdgeId, Mesh};

const EPSILON: f32 = 1e-6;

/// A preview line segment in mesh-local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewSegment {
    pub start: Vec3,
    pub end: Vec3,
}

/// Build the fillet ribbon for every edge in `edges`.
///
/// Edges with fewer than two adjacent faces are skipped — a fillet needs a
/// dihedral. Radius at or below zero previews nothing; `divisions` floors
/// at 1.
pub fn fillet_preview(
    mesh: &Mesh,
    edges: &HashSet<EdgeId>,
    radius: f32,
    divisions: u32,
) -> Vec<PreviewSegment> {
    if radius <= 0.0 {
        return Vec::new();
    }
    let divisions = divisions.max(1);
    let adj = AdjacencyIndex::build(mesh);

    let mut ids: Vec<EdgeId> = edges.iter().copied().collect();
    ids.sort_unstable();

    let mut segments = Vec::new();
    for id in ids {
        if let Some(edge) = mesh.edge(id) {
            preview_edge(mesh, &adj, edge, radius, divisions, &mut segments);
        }
    }
    segments
}

/// Emit the ribbon for one edge, or nothing when the local geometry is
/// degenerate.
fn preview_edge(
    mesh: &Mesh,
    adj: &AdjacencyIndex,
    edge: &Edge,
    radius: f32,
    divisions: u32,
    out: &mut Vec<PreviewSegment>,
) {
    if edge.faces.len() != 2 {
        return;
    }
    let (Some(pa), Some(pb)) = (adj.position(mesh, edge.a), adj.position(mesh, edge.b)) else {
        return;
    };

    let edge_vec = pb - pa;
    let edge_dir = edge_vec.normalize_or_zero();
    if edge_dir == Vec3::ZERO {
        return;
    }
    let mid = (pa + pb) * 0.5;

    // In-plane perpendicular per face, oriented inward via the centroid
    let mut perps = [Vec3::ZERO; 2];
    for (slot, &face_id) in edge.faces.iter().take(2).enumerate() {
        let Some(face) = mesh.face(face_id) else {
            return;
        };
        let normal = adj.face_normal(mesh, face);
        let mut perp = normal.cross(edge_dir).normalize_or_zero();
        if perp == Vec3::ZERO {
            return;
        }
        let centroid = adj.face_centroid(mesh, face);
        if (centroid - mid).dot(perp) < 0.0 {
            perp = -perp;
        }
        perps[slot] = perp;
    }
    let [p1, p2] = perps;

    // Tangent points on either face and the arc sagitta between them
    let t1 = pa + p1 * radius;
    let t2 = pa + p2 * radius;
    let chord = t2 - t1;
    let planar = chord - edge_dir * chord.dot(edge_dir);
    let d = planar.length();
    let h = (radius * radius - (d * 0.5) * (d * 0.5)).max(0.0).sqrt();

    let rail: Vec<Vec3> = if d < EPSILON || h < EPSILON {
        // Flat dihedral: the preview degenerates to the straight chord
        chord_samples(t1, t2, divisions)
    } else {
        // Candidate centers sit on the chord's perpendicular bisector;
        // keep the one on the convex side of the two perpendiculars
        let mid_chord = (t1 + t2) * 0.5;
        let offset = edge_dir.cross(planar / d);
        let bis = (p1 + p2).normalize_or_zero();
        let c1 = mid_chord + offset * h;
        let c2 = mid_chord - offset * h;
        let center = if (c1 - pa).dot(bis) >= (c2 - pa).dot(bis) {
            c1
        } else {
            c2
        };

        let start = t1 - center;
        let end = t2 - center;
        let (sn, en) = (start.normalize_or_zero(), end.normalize_or_zero());
        if sn == Vec3::ZERO || en == Vec3::ZERO {
            return;
        }
        let angle = sn.dot(en).clamp(-1.0, 1.0).acos();
        let sign = if sn.cross(en).dot(edge_dir) < 0.0 { -1.0 } else { 1.0 };
        let sweep = angle * sign;

        (0..=divisions)
            .map(|k| {
                let step = Quat::from_axis_angle(edge_dir, sweep * k as f32 / divisions as f32);
                center + step * start
            })
            .collect()
    };

    // Rungs between the rails, then the rails themselves
    for sample in &rail {
        out.push(PreviewSegment {
            start: *sample,
            end: *sample + edge_vec,
        });
    }
    for pair in rail.windows(2) {
        out.push(PreviewSegment {
            start: pair[0],
            end: pair[1],
        });
        out.push(PreviewSegment {
            start: pair[0] + edge_vec,
            end: pair[1] + edge_vec,
        });
    }
}

/// Evenly spaced samples along the straight chord.
fn chord_samples(t1: Vec3, t2: Vec3, divisions: u32) -> Vec<Vec3> {
    (0..=divisions)
        .map(|k| t1.lerp(t2, k as f32 / divisions as f32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives::{quad_cube, quad_grid, quad_plane};
    use crate::mesh::{edge_key, Mesh, VertexId};

    fn edge_id_for(mesh: &Mesh, a: VertexId, b: VertexId) -> EdgeId {
        mesh.edges
            .iter()
            .find(|e| e.key() == edge_key(a, b))
            .map(|e| e.id)
            .expect("edge not found")
    }

    #[test]
    fn zero_radius_previews_nothing() {
        let mesh = quad_cube(1.0);
        let edges: HashSet<EdgeId> = [0].into_iter().collect();
        assert!(fillet_preview(&mesh, &edges, 0.0, 8).is_empty());
        assert!(fillet_preview(&mesh, &edges, -1.0, 8).is_empty());
    }

    #[test]
    fn boundary_edge_is_skipped() {
        let mesh = quad_plane(1.0);
        let edges: HashSet<EdgeId> = mesh.edges.iter().map(|e| e.id).collect();
        assert!(fillet_preview(&mesh, &edges, 0.2, 8).is_empty());
    }

    #[test]
    fn right_angle_arc_on_cube_edge() {
        let mesh = quad_cube(1.0);
        let radius = 0.25;
        let divisions = 4;
        let id = edge_id_for(&mesh, 5, 6);
        let edges: HashSet<EdgeId> = [id].into_iter().collect();

        let segments = fillet_preview(&mesh, &edges, radius, divisions);
        // divisions+1 rungs plus divisions segments along each rail
        assert_eq!(segments.len(), (divisions as usize + 1) + 2 * divisions as usize);

        // Edge (5,6) joins the front (+z) and right (+x) faces; the arc
        // center sits pulled into the corner from endpoint 5
        let pa = Vec3::new(0.5, -0.5, 0.5);
        let center = pa + radius * (Vec3::new(-1.0, 0.0, 0.0) + Vec3::new(0.0, 0.0, -1.0));
        let edge_vec = Vec3::new(0.0, 1.0, 0.0);

        let rungs = &segments[..divisions as usize + 1];
        for rung in rungs {
            assert!(
                ((rung.start - center).length() - radius).abs() < 1e-5,
                "sample off the arc: {:?}",
                rung.start
            );
            assert!((rung.end - rung.start - edge_vec).length() < 1e-5);
        }

        // The rail starts and ends on the tangent points
        let t1 = pa + Vec3::new(-radius, 0.0, 0.0);
        let t2 = pa + Vec3::new(0.0, 0.0, -radius);
        assert!((rungs[0].start - t1).length() < 1e-5);
        assert!((rungs[divisions as usize].start - t2).length() < 1e-5);
    }

    #[test]
    fn flat_dihedral_degenerates_to_chord() {
        // Two coplanar quads: h collapses to 0 and the "arc" is the chord
        let mesh = quad_grid(2, 1, 1.0);
        let radius = 0.3;
        let divisions = 4;
        let id = edge_id_for(&mesh, 1, 4);
        let edges: HashSet<EdgeId> = [id].into_iter().collect();

        let segments = fillet_preview(&mesh, &edges, radius, divisions);
        assert!(!segments.is_empty());

        let rungs = &segments[..divisions as usize + 1];
        let t1 = Vec3::new(1.0 - radius, 0.0, 0.0);
        let t2 = Vec3::new(1.0 + radius, 0.0, 0.0);
        assert!((rungs[0].start - t1).length() < 1e-5);
        assert!((rungs[divisions as usize].start - t2).length() < 1e-5);
        for rung in rungs {
            // Collinear with the chord: no bulge out of the plane
            assert!(rung.start.y.abs() < 1e-5);
            assert!(rung.start.z.abs() < 1e-5);
        }
    }
}
