//! On-demand adjacency maps for one editing operation.
//!
//! Built fresh from the current mesh state and thrown away afterward;
//! callers rebuild whenever topology changes mid-operation. Everything is
//! index-based — entities carry no back-pointers, so there are no cycles
//! and no stale references to invalidate.

use bevy::prelude::*;
use std::collections::HashMap;

use super::{edge_key, fan_normal, Edge, Face, FaceId, Mesh, Vertex, VertexId};

/// Transient adjacency for a single operation against one mesh.
#[derive(Debug)]
pub struct AdjacencyIndex {
    /// Vertex id → slot in `mesh.vertices`.
    pub vertex_index: HashMap<VertexId, usize>,
    /// Canonical edge key → slot in `mesh.edges`.
    pub edge_index: HashMap<(VertexId, VertexId), usize>,
    /// Canonical edge key → ids of the faces sharing that edge, derived
    /// straight from the face list.
    pub edge_faces: HashMap<(VertexId, VertexId), Vec<FaceId>>,
}

impl AdjacencyIndex {
    /// Build all maps from the mesh's current state.
    pub fn build(mesh: &Mesh) -> Self {
        let vertex_index = mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (v.id, i))
            .collect();

        let edge_index = mesh
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key(), i))
            .collect();

        let mut edge_faces: HashMap<(VertexId, VertexId), Vec<FaceId>> = HashMap::new();
        for face in &mesh.faces {
            let n = face.vertices.len();
            for i in 0..n {
                let key = edge_key(face.vertices[i], face.vertices[(i + 1) % n]);
                edge_faces.entry(key).or_default().push(face.id);
            }
        }

        Self {
            vertex_index,
            edge_index,
            edge_faces,
        }
    }

    /// Look up a vertex by id.
    pub fn vertex<'m>(&self, mesh: &'m Mesh, id: VertexId) -> Option<&'m Vertex> {
        self.vertex_index.get(&id).map(|&slot| &mesh.vertices[slot])
    }

    /// Position of a vertex by id.
    pub fn position(&self, mesh: &Mesh, id: VertexId) -> Option<Vec3> {
        self.vertex(mesh, id).map(|v| v.position)
    }

    /// Look up an edge by its endpoint pair (either order).
    pub fn edge<'m>(&self, mesh: &'m Mesh, a: VertexId, b: VertexId) -> Option<&'m Edge> {
        self.edge_index
            .get(&edge_key(a, b))
            .map(|&slot| &mesh.edges[slot])
    }

    /// Faces sharing the edge between `a` and `b` (empty when no face uses it).
    pub fn faces_sharing(&self, a: VertexId, b: VertexId) -> &[FaceId] {
        self.edge_faces
            .get(&edge_key(a, b))
            .map_or(&[][..], |v| v.as_slice())
    }

    /// Ids of the faces sharing any edge with `face`, excluding the face itself.
    pub fn face_neighbors(&self, face: &Face) -> Vec<FaceId> {
        let n = face.vertices.len();
        let mut neighbors = Vec::new();
        for i in 0..n {
            for &other in self.faces_sharing(face.vertices[i], face.vertices[(i + 1) % n]) {
                if other != face.id && !neighbors.contains(&other) {
                    neighbors.push(other);
                }
            }
        }
        neighbors
    }

    /// Geometric normal of a face from its current vertex positions.
    pub fn face_normal(&self, mesh: &Mesh, face: &Face) -> Vec3 {
        fan_normal(&face.vertices, &self.vertex_index, &mesh.vertices).normalize_or_zero()
    }

    /// Vertex centroid of a face.
    pub fn face_centroid(&self, mesh: &Mesh, face: &Face) -> Vec3 {
        if face.vertices.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = face
            .vertices
            .iter()
            .filter_map(|&id| self.position(mesh, id))
            .sum();
        sum / face.vertices.len() as f32
    }
}
