//! UV seam marking and reattachment keys.
//!
//! Seams live as flags on the derived edges. Because edges are rebuilt
//! from faces (and unwrapping duplicates vertices, invalidating ids), seam
//! survival across the unwrap is keyed on quantized endpoint positions
//! rather than vertex ids.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::mesh::{edge_key, Mesh, VertexId};

/// Unordered, quantized endpoint-position key for one seam edge.
pub type SeamPositionKey = ((i64, i64, i64), (i64, i64, i64));

const QUANTIZE: f32 = 1e5;

fn position_key(p: Vec3) -> (i64, i64, i64) {
    (
        (p.x * QUANTIZE).round() as i64,
        (p.y * QUANTIZE).round() as i64,
        (p.z * QUANTIZE).round() as i64,
    )
}

/// Position key for an edge between two points, endpoint order independent.
pub fn seam_key(a: Vec3, b: Vec3) -> SeamPositionKey {
    let (ka, kb) = (position_key(a), position_key(b));
    if ka <= kb { (ka, kb) } else { (kb, ka) }
}

/// Toggle the seam flag on the edge between `a` and `b`. Returns the new
/// state, or `None` when no such edge exists.
pub fn toggle_seam(mesh: &mut Mesh, a: VertexId, b: VertexId) -> Option<bool> {
    let key = edge_key(a, b);
    let edge = mesh.edges.iter_mut().find(|e| e.key() == key)?;
    edge.seam = !edge.seam;
    Some(edge.seam)
}

/// Position keys of every seam-flagged edge.
pub fn seam_position_keys(mesh: &Mesh) -> HashSet<SeamPositionKey> {
    let positions: HashMap<VertexId, Vec3> = mesh
        .vertices
        .iter()
        .map(|v| (v.id, v.position))
        .collect();

    mesh.edges
        .iter()
        .filter(|e| e.seam)
        .filter_map(|e| Some(seam_key(*positions.get(&e.a)?, *positions.get(&e.b)?)))
        .collect()
}

/// Re-flag seams on the current edge set by matching endpoint positions
/// against `keys`.
pub fn reattach_seams(mesh: &mut Mesh, keys: &HashSet<SeamPositionKey>) {
    if keys.is_empty() {
        return;
    }
    let positions: HashMap<VertexId, Vec3> = mesh
        .vertices
        .iter()
        .map(|v| (v.id, v.position))
        .collect();

    for edge in &mut mesh.edges {
        let (Some(&pa), Some(&pb)) = (positions.get(&edge.a), positions.get(&edge.b)) else {
            continue;
        };
        if keys.contains(&seam_key(pa, pb)) {
            edge.seam = true;
        }
    }
}
