//! Knife cutting along a polyline.
//!
//! Each consecutive point pair forms a cutting segment that is intersected
//! against every mesh edge in the X/Y plane. Intersection vertices are
//! spliced into the loops of the faces sharing the hit edge. The cut does
//! NOT split faces into two polygons — it only inserts vertices into the
//! existing loops; full polygon splitting along the cut chain is an open
//! product decision.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::mesh::{Mesh, VertexId};

use super::KnifePoint;

// Parallelism guard for the 2D cross-product test.
const PARALLEL_EPSILON: f32 = 1e-10;

/// Cut the mesh along the polyline `points`. Fewer than 2 points is a
/// no-op. New vertices carry placeholder normals/UVs; the caller
/// recomputes normals afterward.
pub fn knife_cut(mesh: &mut Mesh, points: &[KnifePoint]) {
    if points.len() < 2 {
        debug!("Knife cut: need at least 2 points");
        return;
    }

    let mut inserted = 0usize;
    for pair in points.windows(2) {
        inserted += cut_segment(mesh, pair[0].position, pair[1].position);
    }

    if inserted == 0 {
        return;
    }

    mesh.rebuild_edges();
    debug!("Knife cut: inserted {} vertices", inserted);
}

/// Intersect one cutting segment against every mesh edge and splice the
/// hits, ordered along the segment. Returns the number of inserted
/// vertices.
fn cut_segment(mesh: &mut Mesh, from: Vec3, to: Vec3) -> usize {
    let positions: HashMap<VertexId, Vec3> = mesh
        .vertices
        .iter()
        .map(|v| (v.id, v.position))
        .collect();

    // (parameter along the cut, edge endpoints, parameter along the edge)
    let mut hits: Vec<(f32, VertexId, VertexId, f32)> = Vec::new();
    for edge in &mesh.edges {
        let (Some(&pa), Some(&pb)) = (positions.get(&edge.a), positions.get(&edge.b)) else {
            continue;
        };
        if let Some((t, u)) = intersect_2d(from.truncate(), to.truncate(), pa.truncate(), pb.truncate())
        {
            hits.push((t, edge.a, edge.b, u));
        }
    }

    hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut inserted = 0;
    for (_, a, b, u) in hits {
        let (Some(&pa), Some(&pb)) = (positions.get(&a), positions.get(&b)) else {
            continue;
        };
        // The new vertex sits on the mesh edge; normal/uv are placeholders
        // for the caller's normal recompute.
        let point = pa.lerp(pb, u);
        let id = mesh.add_vertex(point, Vec3::ZERO, Vec2::ZERO);
        splice_into_faces(mesh, a, b, id);
        inserted += 1;
    }

    inserted
}

/// Intersect two 2D segments. Returns `(t, u)` with `t` along `(p0, p1)`
/// and `u` along `(p2, p3)`, both in [0,1]; parallel or out-of-range
/// configurations contribute nothing.
fn intersect_2d(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Option<(f32, f32)> {
    let d1 = p1 - p0;
    let d2 = p3 - p2;

    let denom = d1.perp_dot(d2);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let offset = p2 - p0;
    let t = offset.perp_dot(d2) / denom;
    let u = offset.perp_dot(d1) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((t, u))
    } else {
        None
    }
}

/// Insert `vertex` into the loop of every face where `a` and `b` sit
/// adjacent (either direction), immediately after the matched pair.
fn splice_into_faces(mesh: &mut Mesh, a: VertexId, b: VertexId, vertex: VertexId) {
    for face in &mut mesh.faces {
        let n = face.vertices.len();
        let slot = (0..n).find(|&i| {
            let v0 = face.vertices[i];
            let v1 = face.vertices[(i + 1) % n];
            (v0 == a && v1 == b) || (v0 == b && v1 == a)
        });
        if let Some(i) = slot {
            face.vertices.insert(i + 1, vertex);
            // Per-corner UVs must stay parallel to the loop
            if let Some(uvs) = &mut face.corner_uvs {
                let seed = uvs.get(i).copied().unwrap_or_default();
                uvs.insert(i + 1, seed);
            }
        }
    }
}
