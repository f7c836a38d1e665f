//! # Bevy Mesh Edit
//!
//! A boundary-representation mesh editing and UV unwrapping kernel for
//! Bevy-based level editors.
//!
//! The kernel operates on an id-based [`Mesh`] (vertices, derived edges,
//! n-gon faces) and provides four operations:
//!
//! - **Loop cut** — insert N parallel subdivisions across a ring of quads
//! - **Knife cut** — splice intersection vertices along a cut polyline
//! - **Fillet preview** — a read-only rounded-edge wireframe ribbon
//! - **UV unwrap** — seam-based island decomposition, projection and packing
//!
//! ## Quick Start
//!
//! ```
//! use bevy_mesh_edit::mesh::primitives::quad_cube;
//! use bevy_mesh_edit::modeling::{apply_tool, LoopCutParams, ToolParams};
//!
//! let mut mesh = quad_cube(1.0);
//! let params = ToolParams::LoopCut(LoopCutParams {
//!     seed_edge: 0,
//!     segments: 2,
//!     slide: 0.5,
//! });
//! apply_tool(&mut mesh, &params);
//! mesh.recompute_normals();
//! ```
//!
//! All mutating operations take `&mut Mesh`, run synchronously, and end by
//! rebuilding the derived edge set. The mutable borrow is the single-writer
//! contract: only one editing operation can be in flight per mesh.

pub mod mesh;
pub mod modeling;

// Re-export the data model
pub use mesh::{Edge, EdgeId, Face, FaceId, Mesh, ShadingMode, Vertex, VertexId};

// Re-export adjacency
pub use mesh::adjacency::AdjacencyIndex;

// Re-export tool parameters and dispatch
pub use modeling::{
    apply_tool, FilletParams, KnifeCutParams, KnifePoint, LoopCutParams, PreviewSegment,
    ToolOutput, ToolParams,
};
