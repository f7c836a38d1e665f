//! Core mesh data model for the editing kernel.
//!
//! A [`Mesh`] owns id-addressed vertices, faces, and a derived edge set.
//! Faces are the authoritative topology: edges are always rebuildable from
//! the face list via [`rebuild_edges_from_faces`], and every mutating
//! operation ends with that call so the edge set is never stale.

pub mod adjacency;
pub mod primitives;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Id of a vertex within its owning mesh.
pub type VertexId = u32;
/// Id of a derived edge within its owning mesh.
pub type EdgeId = u32;
/// Id of a face within its owning mesh.
pub type FaceId = u32;

/// Canonical undirected edge key: lower vertex id first.
pub fn edge_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// A mesh vertex with interpolatable attributes.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// Secondary UV channel (lightmaps etc.); not touched by the kernel.
    pub uv2: Option<Vec2>,
    pub selected: bool,
}

impl Vertex {
    pub fn new(id: VertexId, position: Vec3) -> Self {
        Self {
            id,
            position,
            normal: Vec3::ZERO,
            uv: Vec2::ZERO,
            uv2: None,
            selected: false,
        }
    }
}

/// A derived edge: an unordered pair of vertex ids plus the faces that
/// share it (0 = dangling, 1 = boundary, 2 = manifold interior; more than
/// 2 is non-manifold and outside what the editing operations support).
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub a: VertexId,
    pub b: VertexId,
    pub faces: Vec<FaceId>,
    pub selected: bool,
    /// Marks a UV discontinuity for the unwrapper.
    pub seam: bool,
}

impl Edge {
    /// Canonical key for this edge.
    pub fn key(&self) -> (VertexId, VertexId) {
        edge_key(self.a, self.b)
    }
}

/// A polygonal face: an ordered loop of at least 3 distinct vertex ids.
#[derive(Debug, Clone)]
pub struct Face {
    pub id: FaceId,
    pub vertices: Vec<VertexId>,
    pub normal: Vec3,
    pub material: Option<u32>,
    pub selected: bool,
    /// Per-corner UVs, parallel to `vertices` when present. Lets faces carry
    /// seams without vertex duplication outside the unwrap path.
    pub corner_uvs: Option<Vec<Vec2>>,
}

impl Face {
    pub fn new(id: FaceId, vertices: Vec<VertexId>) -> Self {
        Self {
            id,
            vertices,
            normal: Vec3::ZERO,
            material: None,
            selected: false,
            corner_uvs: None,
        }
    }
}

/// How the host shades this mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadingMode {
    Flat,
    #[default]
    Smooth,
}

/// An editable mesh. Mutating operations require `&mut Mesh` — the borrow
/// is the single-writer contract: one editing operation in flight at a time.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub id: u32,
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub faces: Vec<Face>,
    pub transform: Transform,
    pub visible: bool,
    pub locked: bool,
    pub shading: ShadingMode,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            vertices: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            transform: Transform::IDENTITY,
            visible: true,
            locked: false,
            shading: ShadingMode::default(),
        }
    }

    /// Find a vertex by id.
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.id == id)
    }

    /// Find an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Find a face by id.
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.iter().find(|f| f.id == id)
    }

    /// First unused vertex id.
    pub fn next_vertex_id(&self) -> VertexId {
        self.vertices.iter().map(|v| v.id).max().map_or(0, |m| m + 1)
    }

    /// First unused face id.
    pub fn next_face_id(&self) -> FaceId {
        self.faces.iter().map(|f| f.id).max().map_or(0, |m| m + 1)
    }

    /// Append a new vertex and return its id.
    pub fn add_vertex(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> VertexId {
        let id = self.next_vertex_id();
        self.vertices.push(Vertex {
            id,
            position,
            normal,
            uv,
            uv2: None,
            selected: false,
        });
        id
    }

    /// Ids of all currently selected edges.
    pub fn selected_edge_ids(&self) -> HashSet<EdgeId> {
        self.edges
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.id)
            .collect()
    }

    /// Re-derive the edge set from the face list.
    ///
    /// Called by every mutating operation as its final step.
    pub fn rebuild_edges(&mut self) {
        self.edges = rebuild_edges_from_faces(&self.faces);
    }

    /// Recompute face normals (triangle-fan cross sum) and area-weighted
    /// smooth vertex normals.
    pub fn recompute_normals(&mut self) {
        let slots: HashMap<VertexId, usize> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id, i))
            .collect();

        let mut face_normals = Vec::with_capacity(self.faces.len());
        for face in &self.faces {
            face_normals.push(fan_normal(&face.vertices, &slots, &self.vertices));
        }

        for v in &mut self.vertices {
            v.normal = Vec3::ZERO;
        }

        // Accumulate unnormalized fan normals so larger faces weigh more
        for (fi, normal) in face_normals.iter().enumerate() {
            self.faces[fi].normal = normal.normalize_or_zero();
            for vid in &self.faces[fi].vertices {
                if let Some(&slot) = slots.get(vid) {
                    self.vertices[slot].normal += *normal;
                }
            }
        }

        for v in &mut self.vertices {
            v.normal = v.normal.normalize_or_zero();
        }
    }

    /// Check the structural invariants: edges and faces reference existing
    /// vertices, face loops have at least 3 distinct ids.
    pub fn validate(&self) -> bool {
        let ids: HashSet<VertexId> = self.vertices.iter().map(|v| v.id).collect();

        for edge in &self.edges {
            if !ids.contains(&edge.a) || !ids.contains(&edge.b) {
                warn!("Mesh '{}': edge {} references a missing vertex", self.name, edge.id);
                return false;
            }
        }

        for face in &self.faces {
            if face.vertices.len() < 3 {
                warn!("Mesh '{}': face {} has fewer than 3 vertices", self.name, face.id);
                return false;
            }
            let distinct: HashSet<VertexId> = face.vertices.iter().copied().collect();
            if distinct.len() != face.vertices.len() {
                warn!("Mesh '{}': face {} repeats a vertex id", self.name, face.id);
                return false;
            }
            if !face.vertices.iter().all(|v| ids.contains(v)) {
                warn!("Mesh '{}': face {} references a missing vertex", self.name, face.id);
                return false;
            }
        }

        true
    }
}

/// Derive the canonical edge set from a face list.
///
/// Pure function of the faces: fresh sequential edge ids, flags cleared,
/// adjacent face lists populated in face order.
pub fn rebuild_edges_from_faces(faces: &[Face]) -> Vec<Edge> {
    let mut edges: Vec<Edge> = Vec::new();
    let mut index: HashMap<(VertexId, VertexId), usize> = HashMap::new();

    for face in faces {
        let n = face.vertices.len();
        for i in 0..n {
            let key = edge_key(face.vertices[i], face.vertices[(i + 1) % n]);
            let slot = *index.entry(key).or_insert_with(|| {
                edges.push(Edge {
                    id: edges.len() as EdgeId,
                    a: key.0,
                    b: key.1,
                    faces: Vec::new(),
                    selected: false,
                    seam: false,
                });
                edges.len() - 1
            });
            if !edges[slot].faces.contains(&face.id) {
                edges[slot].faces.push(face.id);
            }
        }
    }

    edges
}

/// Unnormalized triangle-fan normal of a vertex-id loop. The magnitude
/// encodes twice the polygon area.
pub(crate) fn fan_normal(
    loop_ids: &[VertexId],
    slots: &HashMap<VertexId, usize>,
    vertices: &[Vertex],
) -> Vec3 {
    if loop_ids.len() < 3 {
        return Vec3::ZERO;
    }
    let Some(&s0) = slots.get(&loop_ids[0]) else {
        return Vec3::ZERO;
    };
    let p0 = vertices[s0].position;

    let mut normal = Vec3::ZERO;
    for i in 1..loop_ids.len() - 1 {
        let (Some(&sa), Some(&sb)) = (slots.get(&loop_ids[i]), slots.get(&loop_ids[i + 1])) else {
            continue;
        };
        let pa = vertices[sa].position;
        let pb = vertices[sb].position;
        normal += (pa - p0).cross(pb - p0);
    }
    normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives::{quad_cube, quad_plane};

    #[test]
    fn cube_edge_derivation() {
        let mesh = quad_cube(1.0);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.faces.len(), 6);
        assert_eq!(mesh.edges.len(), 12);

        // A closed cube is manifold: every edge borders exactly 2 faces
        for edge in &mesh.edges {
            assert_eq!(edge.faces.len(), 2, "edge {} is not manifold", edge.id);
        }
    }

    #[test]
    fn plane_boundary_edges() {
        let mesh = quad_plane(1.0);
        assert_eq!(mesh.edges.len(), 4);
        for edge in &mesh.edges {
            assert_eq!(edge.faces.len(), 1);
        }
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut mesh = quad_cube(2.0);
        let before: Vec<_> = mesh.edges.iter().map(Edge::key).collect();
        mesh.rebuild_edges();
        let after: Vec<_> = mesh.edges.iter().map(Edge::key).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn cube_normals_point_outward() {
        let mut mesh = quad_cube(1.0);
        mesh.recompute_normals();
        for v in &mesh.vertices {
            // Centered cube: outward normals align with corner positions
            assert!(v.position.dot(v.normal) > 0.0, "vertex {} normal flipped", v.id);
        }
        for f in &mesh.faces {
            assert!((f.normal.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn validate_catches_bad_face() {
        let mut mesh = quad_plane(1.0);
        assert!(mesh.validate());
        mesh.faces[0].vertices = vec![0, 1, 99];
        assert!(!mesh.validate());
    }
}
