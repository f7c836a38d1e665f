//! Edge-loop insertion across rings of quad faces.
//!
//! From a seed edge, the traversal crosses adjacent quads through the
//! structurally opposite edge of each 4-cycle, then every crossed face is
//! replaced by N+1 quads whose shared rails carry the new loop vertices.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::mesh::adjacency::AdjacencyIndex;
use crate::mesh::{edge_key, EdgeId, Face, FaceId, Mesh, Vertex, VertexId};

use super::LoopCutParams;

// Split parameters are clamped away from the rail ends so extreme slide
// values cannot produce zero-length segments.
const SPLIT_MIN: f32 = 0.001;
const SPLIT_MAX: f32 = 0.999;

/// One quad visited by the loop traversal.
///
/// `parallel_a` is the edge the quad was entered through, in face winding
/// order; `parallel_b` is the structurally opposite edge, reversed, so that
/// replacement quads `[a_k, a_k+1, b_k+1, b_k]` keep the parent winding.
/// Consecutive spans share a parallel edge and reuse its split vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceSpan {
    pub face: FaceId,
    pub parallel_a: [VertexId; 2],
    pub parallel_b: [VertexId; 2],
}

/// Collect the face spans crossed by the loop through `seed_edge`.
///
/// Walks both directions from the seed over quad faces only. A non-quad
/// face terminates that direction (documented policy), as does a boundary
/// edge (fewer than 2 adjacent faces) or loop closure.
pub fn compute_face_spans(mesh: &Mesh, seed_edge: EdgeId) -> Vec<FaceSpan> {
    let Some(edge) = mesh.edge(seed_edge) else {
        return Vec::new();
    };
    let seed_key = edge.key();

    let adj = AdjacencyIndex::build(mesh);
    let mut spans = Vec::new();
    let mut visited: HashSet<FaceId> = HashSet::new();

    let starts: Vec<FaceId> = adj.faces_sharing(seed_key.0, seed_key.1).to_vec();
    for start in starts {
        walk_direction(mesh, &adj, seed_key, start, &mut visited, &mut spans);
    }

    spans
}

/// Walk one direction of the loop, accumulating spans until the ring
/// closes, the mesh ends, or a non-quad face blocks the traversal.
fn walk_direction(
    mesh: &Mesh,
    adj: &AdjacencyIndex,
    start_key: (VertexId, VertexId),
    start_face: FaceId,
    visited: &mut HashSet<FaceId>,
    spans: &mut Vec<FaceSpan>,
) {
    let mut key = start_key;
    let mut face_id = start_face;

    loop {
        if !visited.insert(face_id) {
            break; // loop closed
        }
        let Some(face) = mesh.face(face_id) else {
            break;
        };
        if face.vertices.len() != 4 {
            break; // quads only
        }
        let Some(entry) = (0..4).find(|&i| {
            edge_key(face.vertices[i], face.vertices[(i + 1) % 4]) == key
        }) else {
            break;
        };
        let w = |k: usize| face.vertices[(entry + k) % 4];

        spans.push(FaceSpan {
            face: face_id,
            parallel_a: [w(0), w(1)],
            parallel_b: [w(3), w(2)],
        });

        // Step across the structurally opposite edge ("two positions away")
        let opposite = edge_key(w(2), w(3));
        let Some(&next) = adj
            .faces_sharing(opposite.0, opposite.1)
            .iter()
            .find(|&&f| f != face_id)
        else {
            break; // boundary edge
        };

        key = opposite;
        face_id = next;
    }
}

/// Insert `params.segments` parallel cuts along the loop through
/// `params.seed_edge`. Zero computed spans is a no-op.
pub fn loop_cut(mesh: &mut Mesh, params: &LoopCutParams) {
    let spans = compute_face_spans(mesh, params.seed_edge);
    loop_cut_with_spans(mesh, &spans, params.segments, params.slide);
}

/// Insert cuts along precomputed spans (hosts reuse the spans they already
/// computed for an interactive preview).
pub fn loop_cut_with_spans(mesh: &mut Mesh, spans: &[FaceSpan], segments: u32, slide: f32) {
    if spans.is_empty() {
        debug!("Loop cut: no spans to split");
        return;
    }

    let n = segments.max(1) as usize;
    let delta = slide - 0.5;
    let split_params: Vec<f32> = (1..=n)
        .map(|i| (i as f32 / (n as f32 + 1.0) + delta).clamp(SPLIT_MIN, SPLIT_MAX))
        .collect();

    let adj = AdjacencyIndex::build(mesh);

    // Split each distinct rail once, keyed canonically so the two spans
    // sharing a rail reuse the same vertices.
    let mut splits: HashMap<(VertexId, VertexId), (VertexId, Vec<VertexId>)> = HashMap::new();
    let mut created: Vec<Vertex> = Vec::new();
    let mut next_vertex = mesh.next_vertex_id();

    for span in spans {
        for rail in [span.parallel_a, span.parallel_b] {
            let key = edge_key(rail[0], rail[1]);
            if splits.contains_key(&key) {
                continue;
            }
            let Some((low, high)) = canonical_ends(mesh, &adj, rail[0], rail[1]) else {
                continue;
            };
            let (Some(vl), Some(vh)) = (adj.vertex(mesh, low), adj.vertex(mesh, high)) else {
                continue;
            };
            let ids: Vec<VertexId> = split_params
                .iter()
                .map(|&t| {
                    let id = next_vertex;
                    next_vertex += 1;
                    created.push(Vertex {
                        id,
                        position: vl.position.lerp(vh.position, t),
                        normal: vl.normal.lerp(vh.normal, t).normalize_or_zero(),
                        uv: vl.uv.lerp(vh.uv, t),
                        uv2: None,
                        selected: false,
                    });
                    id
                })
                .collect();
            splits.insert(key, (low, ids));
        }
    }

    // Replace each span with N+1 quads walking both rail sequences
    let mut next_face = mesh.next_face_id();
    let mut new_faces: Vec<Face> = Vec::new();
    let mut replaced: HashSet<FaceId> = HashSet::new();

    for span in spans {
        let Some(parent) = mesh.face(span.face) else {
            continue;
        };
        let (Some((a_low, a_ids)), Some((b_low, b_ids))) = (
            splits.get(&edge_key(span.parallel_a[0], span.parallel_a[1])),
            splits.get(&edge_key(span.parallel_b[0], span.parallel_b[1])),
        ) else {
            continue;
        };
        let a_seq = rail_sequence(span.parallel_a, *a_low, a_ids);
        let b_seq = rail_sequence(span.parallel_b, *b_low, b_ids);

        for k in 0..=n {
            let mut face = Face::new(
                next_face,
                vec![a_seq[k], a_seq[k + 1], b_seq[k + 1], b_seq[k]],
            );
            face.material = parent.material;
            face.selected = parent.selected;
            face.normal = parent.normal;
            new_faces.push(face);
            next_face += 1;
        }
        replaced.insert(span.face);
    }

    if replaced.is_empty() {
        return;
    }

    mesh.vertices.extend(created);
    mesh.faces.retain(|f| !replaced.contains(&f.id));
    mesh.faces.extend(new_faces);
    mesh.rebuild_edges();

    debug!(
        "Loop cut: replaced {} spans with {} quads ({} segments)",
        replaced.len(),
        replaced.len() * (n + 1),
        n
    );
}

/// Order a rail edge's endpoints for interpolation: the axis with the
/// greatest absolute coordinate delta decides, the endpoint with the
/// smaller coordinate on that axis is "low", and an exact tie falls back
/// to the smaller vertex id.
fn canonical_ends(
    mesh: &Mesh,
    adj: &AdjacencyIndex,
    a: VertexId,
    b: VertexId,
) -> Option<(VertexId, VertexId)> {
    let pa = adj.position(mesh, a)?;
    let pb = adj.position(mesh, b)?;
    let d = (pb - pa).abs();

    let axis = if d.x >= d.y && d.x >= d.z {
        0
    } else if d.y >= d.z {
        1
    } else {
        2
    };

    if pa[axis] < pb[axis] {
        Some((a, b))
    } else if pb[axis] < pa[axis] {
        Some((b, a))
    } else if a <= b {
        Some((a, b))
    } else {
        Some((b, a))
    }
}

/// Vertex sequence along one rail: endpoint, splits in rail direction,
/// endpoint. Splits are stored from the canonical low end, so they reverse
/// when the rail is walked from the high end.
fn rail_sequence(rail: [VertexId; 2], low: VertexId, ids: &[VertexId]) -> Vec<VertexId> {
    let mut seq = Vec::with_capacity(ids.len() + 2);
    seq.push(rail[0]);
    if rail[0] == low {
        seq.extend_from_slice(ids);
    } else {
        seq.extend(ids.iter().rev().copied());
    }
    seq.push(rail[1]);
    seq
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives::{quad_cube, quad_grid};
    use crate::mesh::{fan_normal, Mesh, Vertex};
    use std::collections::HashMap;

    fn edge_id_for(mesh: &Mesh, a: VertexId, b: VertexId) -> EdgeId {
        mesh.edges
            .iter()
            .find(|e| e.key() == edge_key(a, b))
            .map(|e| e.id)
            .expect("edge not found")
    }

    fn geometric_normal(mesh: &Mesh, face: &Face) -> Vec3 {
        let slots: HashMap<VertexId, usize> = mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id, i))
            .collect();
        fan_normal(&face.vertices, &slots, &mesh.vertices)
    }

    #[test]
    fn strip_spans_share_rail() {
        // 1x2 vertical strip: two quads stacked, sharing rail (2,3)
        let mesh = quad_grid(1, 2, 1.0);
        let seed = edge_id_for(&mesh, 0, 1);
        let spans = compute_face_spans(&mesh, seed);

        assert_eq!(spans.len(), 2);
        let rails: Vec<_> = spans
            .iter()
            .flat_map(|s| [edge_key(s.parallel_a[0], s.parallel_a[1]), edge_key(s.parallel_b[0], s.parallel_b[1])])
            .collect();
        assert!(rails.contains(&(2, 3)));
        // 3 distinct rails across 2 spans: the middle one is shared
        let distinct: std::collections::HashSet<_> = rails.iter().copied().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn midpoint_single_segment() {
        let mut mesh = quad_grid(1, 2, 1.0);
        let seed = edge_id_for(&mesh, 0, 1);
        loop_cut(
            &mut mesh,
            &LoopCutParams {
                seed_edge: seed,
                segments: 1,
                slide: 0.5,
            },
        );

        // 3 distinct rails x 1 segment = 3 new vertices, all at x = 0.5
        assert_eq!(mesh.vertices.len(), 9);
        for v in mesh.vertices.iter().skip(6) {
            assert!((v.position.x - 0.5).abs() < 1e-6, "vertex {:?}", v);
        }
        assert_eq!(mesh.faces.len(), 4);
        assert!(mesh.validate());
    }

    #[test]
    fn slide_shifts_the_cut() {
        let mut mesh = quad_grid(1, 1, 1.0);
        let seed = edge_id_for(&mesh, 0, 1);
        loop_cut(
            &mut mesh,
            &LoopCutParams {
                seed_edge: seed,
                segments: 1,
                slide: 0.25,
            },
        );

        for v in mesh.vertices.iter().skip(4) {
            assert!((v.position.x - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn replacement_faces_keep_winding() {
        let mut mesh = quad_grid(2, 2, 1.0);
        let seed = edge_id_for(&mesh, 0, 1);
        loop_cut(
            &mut mesh,
            &LoopCutParams {
                seed_edge: seed,
                segments: 2,
                slide: 0.5,
            },
        );

        // Grid faces point +Z; every replacement must as well
        for face in &mesh.faces {
            let n = geometric_normal(&mesh, face);
            assert!(n.z > 0.0, "face {} flipped: {:?}", face.id, n);
        }
    }

    #[test]
    fn unknown_seed_is_noop() {
        let mut mesh = quad_cube(1.0);
        let verts = mesh.vertices.len();
        let faces = mesh.faces.len();
        loop_cut(
            &mut mesh,
            &LoopCutParams {
                seed_edge: 999,
                segments: 3,
                slide: 0.5,
            },
        );
        assert_eq!(mesh.vertices.len(), verts);
        assert_eq!(mesh.faces.len(), faces);
    }

    #[test]
    fn triangle_terminates_traversal() {
        // A lone triangle offers no quad to enter
        let mut mesh = Mesh::new("Tri");
        mesh.vertices.push(Vertex::new(0, Vec3::ZERO));
        mesh.vertices.push(Vertex::new(1, Vec3::X));
        mesh.vertices.push(Vertex::new(2, Vec3::Y));
        mesh.faces.push(Face::new(0, vec![0, 1, 2]));
        mesh.rebuild_edges();

        let spans = compute_face_spans(&mesh, 0);
        assert!(spans.is_empty());
    }

    #[test]
    fn cube_ring_end_to_end() {
        // Horizontal ring around the unit cube: N=2 at slide 0.5 puts two
        // rings of 4 vertices at y = -1/6 and y = +1/6
        let mut mesh = quad_cube(1.0);
        let seed = edge_id_for(&mesh, 5, 6);

        let spans = compute_face_spans(&mesh, seed);
        assert_eq!(spans.len(), 4);

        let parent_normals: HashMap<FaceId, Vec3> =
            mesh.faces.iter().map(|f| (f.id, f.normal)).collect();

        loop_cut_with_spans(&mut mesh, &spans, 2, 0.5);

        // 4 distinct rails x 2 segments = 8 new vertices
        assert_eq!(mesh.vertices.len(), 16);
        // 4 spanned quads replaced by 3 each, 2 faces untouched
        assert_eq!(mesh.faces.len(), 14);
        assert!(mesh.validate());

        let lower: Vec<_> = mesh
            .vertices
            .iter()
            .skip(8)
            .filter(|v| (v.position.y + 1.0 / 6.0).abs() < 1e-5)
            .collect();
        let upper: Vec<_> = mesh
            .vertices
            .iter()
            .skip(8)
            .filter(|v| (v.position.y - 1.0 / 6.0).abs() < 1e-5)
            .collect();
        assert_eq!(lower.len(), 4);
        assert_eq!(upper.len(), 4);

        // Replacement winding matches the spanned parents
        for face in &mesh.faces {
            if parent_normals.contains_key(&face.id) {
                continue;
            }
            let n = geometric_normal(&mesh, face).normalize_or_zero();
            assert!(
                n.dot(face.normal) > 0.9,
                "face {} winding flipped",
                face.id
            );
        }
    }
}
