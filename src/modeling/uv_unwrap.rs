//! Seam-based UV unwrapping.
//!
//! Decomposes the mesh into islands along seam edges, projects each island
//! onto a planar basis normalized to fill [0,1]^2, duplicates vertices
//! shared across islands so each island parameterizes independently, packs
//! the islands into the unit square, then reattaches seams by position and
//! recomputes normals. Aspect ratio is intentionally not preserved: every
//! island uses its full texture-space cell.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::mesh::adjacency::AdjacencyIndex;
use crate::mesh::{edge_key, fan_normal, FaceId, Mesh, VertexId};

use super::seams::{reattach_seams, seam_position_keys};

const DEGENERATE_EPSILON: f32 = 1e-10;
// Gap between packed islands in UV space.
const ISLAND_PADDING: f32 = 0.02;
// Runaway guard for the halve-and-repack fallback; unreachable for sane
// inputs since island extents halve geometrically.
const MAX_PACK_ATTEMPTS: u32 = 32;

/// Unwrap the mesh's UVs along its seam-flagged edges.
///
/// Safe on a mesh with zero seams: the whole mesh becomes one island.
pub fn unwrap_uvs(mesh: &mut Mesh) {
    if mesh.faces.is_empty() {
        return;
    }

    let seam_keys = seam_position_keys(mesh);
    let islands = find_islands(mesh);

    let face_slots: HashMap<FaceId, usize> = mesh
        .faces
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id, i))
        .collect();

    let island_members = split_islands(mesh, &islands, &face_slots);

    let vertex_slots: HashMap<VertexId, usize> = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(i, v)| (v.id, i))
        .collect();

    for (faces, members) in islands.iter().zip(&island_members) {
        project_island(mesh, faces, members, &face_slots, &vertex_slots);
    }

    pack_islands(mesh, &island_members, &vertex_slots);

    // Vertex UVs are authoritative after the unwrap
    for face in &mut mesh.faces {
        face.corner_uvs = None;
    }

    mesh.rebuild_edges();
    reattach_seams(mesh, &seam_keys);
    mesh.recompute_normals();

    debug!("UV unwrap: packed {} islands", islands.len());
}

/// Connected components of the face graph, crossing non-seam edges only.
fn find_islands(mesh: &Mesh) -> Vec<Vec<FaceId>> {
    let adj = AdjacencyIndex::build(mesh);
    let seams: HashSet<(VertexId, VertexId)> = mesh
        .edges
        .iter()
        .filter(|e| e.seam)
        .map(|e| e.key())
        .collect();
    let face_slots: HashMap<FaceId, usize> = mesh
        .faces
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id, i))
        .collect();

    let mut visited: HashSet<FaceId> = HashSet::new();
    let mut islands = Vec::new();

    for face in &mesh.faces {
        if visited.contains(&face.id) {
            continue;
        }
        let mut island = Vec::new();
        let mut queue = VecDeque::from([face.id]);
        visited.insert(face.id);

        while let Some(fid) = queue.pop_front() {
            island.push(fid);
            let Some(&slot) = face_slots.get(&fid) else {
                continue;
            };
            let loop_ids = &mesh.faces[slot].vertices;
            let n = loop_ids.len();
            for i in 0..n {
                let key = edge_key(loop_ids[i], loop_ids[(i + 1) % n]);
                if seams.contains(&key) {
                    continue;
                }
                for &neighbor in adj.faces_sharing(key.0, key.1) {
                    if visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        islands.push(island);
    }

    islands
}

/// Give every island its own vertices: the first island to reference a
/// vertex keeps the original, each later island gets a fresh-id clone and
/// its faces are rewritten to reference it. Returns each island's vertex
/// ids (disjoint sets afterward).
fn split_islands(
    mesh: &mut Mesh,
    islands: &[Vec<FaceId>],
    face_slots: &HashMap<FaceId, usize>,
) -> Vec<Vec<VertexId>> {
    let mut vertex_slots: HashMap<VertexId, usize> = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(i, v)| (v.id, i))
        .collect();

    let mut claimed: HashSet<VertexId> = HashSet::new();
    let mut next_id = mesh.next_vertex_id();
    let mut result = Vec::with_capacity(islands.len());

    for island in islands {
        let mut remap: HashMap<VertexId, VertexId> = HashMap::new();
        let mut members: Vec<VertexId> = Vec::new();

        for &fid in island {
            let Some(&slot) = face_slots.get(&fid) else {
                continue;
            };
            let loop_ids = mesh.faces[slot].vertices.clone();
            for vid in loop_ids {
                if remap.contains_key(&vid) {
                    continue;
                }
                if claimed.insert(vid) {
                    remap.insert(vid, vid);
                    members.push(vid);
                } else {
                    // Shared with an earlier island: clone for this one
                    let Some(&vslot) = vertex_slots.get(&vid) else {
                        continue;
                    };
                    let mut clone = mesh.vertices[vslot].clone();
                    clone.id = next_id;
                    next_id += 1;
                    vertex_slots.insert(clone.id, mesh.vertices.len());
                    remap.insert(vid, clone.id);
                    members.push(clone.id);
                    mesh.vertices.push(clone);
                }
            }
        }

        for &fid in island {
            let Some(&slot) = face_slots.get(&fid) else {
                continue;
            };
            for vid in &mut mesh.faces[slot].vertices {
                if let Some(&new) = remap.get(vid) {
                    *vid = new;
                }
            }
        }

        result.push(members);
    }

    result
}

/// Project one island onto its planar basis and normalize its UV bounding
/// box to exactly fill [0,1]^2.
fn project_island(
    mesh: &mut Mesh,
    faces: &[FaceId],
    members: &[VertexId],
    face_slots: &HashMap<FaceId, usize>,
    vertex_slots: &HashMap<VertexId, usize>,
) {
    // Area-weighted island normal: unnormalized fan cross products, so
    // larger faces contribute proportionally more
    let mut normal = Vec3::ZERO;
    for fid in faces {
        if let Some(&slot) = face_slots.get(fid) {
            normal += fan_normal(&mesh.faces[slot].vertices, vertex_slots, &mesh.vertices);
        }
    }
    let mut normal = normal.normalize_or_zero();
    if normal == Vec3::ZERO {
        // Closed or degenerate islands have no net direction; any plane works
        normal = Vec3::Z;
    }

    // Basis: world X projected off the normal, world Y as the fallback
    let mut u_axis = Vec3::X - normal * normal.dot(Vec3::X);
    if !u_axis.is_finite() || u_axis.length_squared() < DEGENERATE_EPSILON {
        u_axis = Vec3::Y - normal * normal.dot(Vec3::Y);
    }
    let u_axis = u_axis.normalize_or_zero();
    let v_axis = normal.cross(u_axis);

    let raw: Vec<(usize, Vec2)> = members
        .iter()
        .filter_map(|id| {
            vertex_slots.get(id).map(|&slot| {
                let p = mesh.vertices[slot].position;
                (slot, Vec2::new(p.dot(u_axis), p.dot(v_axis)))
            })
        })
        .collect();

    let mut min = Vec2::splat(f32::MAX);
    let mut max = Vec2::splat(f32::MIN);
    for &(_, uv) in &raw {
        min = min.min(uv);
        max = max.max(uv);
    }
    if raw.is_empty() {
        return;
    }

    let span = max - min;
    let sx = if span.x > DEGENERATE_EPSILON { 1.0 / span.x } else { 0.0 };
    let sy = if span.y > DEGENERATE_EPSILON { 1.0 / span.y } else { 0.0 };

    for (slot, uv) in raw {
        mesh.vertices[slot].uv = Vec2::new((uv.x - min.x) * sx, (uv.y - min.y) * sy);
    }
}

/// Shelf-pack the islands' UV bounds into the unit square: tallest first,
/// left to right, new shelf on horizontal overflow. Vertical overflow
/// halves every vertex UV mesh-wide and repacks from scratch.
fn pack_islands(
    mesh: &mut Mesh,
    islands: &[Vec<VertexId>],
    vertex_slots: &HashMap<VertexId, usize>,
) {
    if islands.is_empty() {
        return;
    }

    for attempt in 0..MAX_PACK_ATTEMPTS {
        let bounds: Vec<(Vec2, Vec2)> = islands
            .iter()
            .map(|members| {
                let mut min = Vec2::splat(f32::MAX);
                let mut max = Vec2::splat(f32::MIN);
                for id in members {
                    if let Some(&slot) = vertex_slots.get(id) {
                        let uv = mesh.vertices[slot].uv;
                        min = min.min(uv);
                        max = max.max(uv);
                    }
                }
                if min.x > max.x {
                    (Vec2::ZERO, Vec2::ZERO)
                } else {
                    (min, max)
                }
            })
            .collect();

        // Tallest first; sort_by is stable so ties keep island order
        let mut order: Vec<usize> = (0..bounds.len()).collect();
        order.sort_by(|&a, &b| {
            let ha = bounds[a].1.y - bounds[a].0.y;
            let hb = bounds[b].1.y - bounds[b].0.y;
            hb.partial_cmp(&ha).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut cursor_x = 0.0f32;
        let mut shelf_y = 0.0f32;
        let mut shelf_h = 0.0f32;
        let mut placements: Vec<(usize, Vec2)> = Vec::new();
        let mut overflow = false;

        for &i in &order {
            let (min, max) = bounds[i];
            let w = max.x - min.x;
            let h = max.y - min.y;

            if cursor_x > 0.0 && cursor_x + w > 1.0 {
                shelf_y += shelf_h + ISLAND_PADDING;
                cursor_x = 0.0;
                shelf_h = 0.0;
            }
            if shelf_y + h > 1.0 {
                overflow = true;
                break;
            }

            placements.push((i, Vec2::new(cursor_x - min.x, shelf_y - min.y)));
            cursor_x += w + ISLAND_PADDING;
            shelf_h = shelf_h.max(h);
        }

        if overflow {
            for v in &mut mesh.vertices {
                v.uv *= 0.5;
            }
            continue;
        }

        for (i, offset) in placements {
            for id in &islands[i] {
                if let Some(&slot) = vertex_slots.get(id) {
                    mesh.vertices[slot].uv += offset;
                }
            }
        }
        if attempt > 0 {
            debug!("UV pack: halved {} times to fit", attempt);
        }
        return;
    }

    warn!("UV pack: gave up after {} attempts", MAX_PACK_ATTEMPTS);
}
