//! Mesh editing operations: loop cut, knife cut, fillet preview, UV unwrap.
//!
//! Every operation is a synchronous, deterministic function over the mesh;
//! the three mutators end by rebuilding the derived edge set, the fillet
//! previewer only reads. Tool parameters are concrete per-operation structs
//! gathered in the [`ToolParams`] union so hosts can store, serialize, and
//! dispatch them without free-form parameter bags.

pub mod fillet;
pub mod knife;
pub mod loop_cut;
pub mod seams;
pub mod uv_unwrap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::mesh::{EdgeId, FaceId, Mesh};

pub use fillet::{fillet_preview, PreviewSegment};
pub use knife::knife_cut;
pub use loop_cut::{compute_face_spans, loop_cut, loop_cut_with_spans, FaceSpan};
pub use seams::{seam_position_keys, toggle_seam};
pub use uv_unwrap::unwrap_uvs;

/// Parameters for one loop-cut invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopCutParams {
    /// Edge the loop traversal starts from.
    pub seed_edge: EdgeId,
    /// Number of parallel cuts to insert (floors at 1).
    pub segments: u32,
    /// Slide factor in (0,1); 0.5 spaces the cuts evenly.
    pub slide: f32,
}

impl Default for LoopCutParams {
    fn default() -> Self {
        Self {
            seed_edge: 0,
            segments: 1,
            slide: 0.5,
        }
    }
}

/// One point of a knife polyline, tagged with the face under the cursor
/// when the point was placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnifePoint {
    pub position: Vec3,
    pub face: FaceId,
}

/// Parameters for one knife-cut invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnifeCutParams {
    /// Cut polyline; fewer than 2 points is a no-op.
    pub points: Vec<KnifePoint>,
}

/// Parameters for the fillet previewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilletParams {
    /// Fillet radius; zero or negative previews nothing.
    pub radius: f32,
    /// Arc subdivision count (floors at 1).
    pub divisions: u32,
}

impl Default for FilletParams {
    fn default() -> Self {
        Self {
            radius: 0.1,
            divisions: 8,
        }
    }
}

/// Tool parameter union: one concrete parameter struct per operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolParams {
    LoopCut(LoopCutParams),
    KnifeCut(KnifeCutParams),
    Fillet(FilletParams),
    /// Unwraps along the mesh's own seam flags; no extra parameters.
    UvUnwrap,
}

impl ToolParams {
    pub fn display_name(&self) -> &'static str {
        match self {
            ToolParams::LoopCut(_) => "Loop Cut",
            ToolParams::KnifeCut(_) => "Knife",
            ToolParams::Fillet(_) => "Fillet",
            ToolParams::UvUnwrap => "UV Unwrap",
        }
    }
}

/// Result of dispatching one tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// The mesh was edited in place; the caller should recompute normals.
    Mutated,
    /// Read-only preview geometry; the mesh is untouched.
    Preview(Vec<PreviewSegment>),
}

/// Run one editing operation against a mesh.
///
/// The exclusive borrow serializes edits: only one operation can be in
/// flight against a given mesh.
pub fn apply_tool(mesh: &mut Mesh, params: &ToolParams) -> ToolOutput {
    match params {
        ToolParams::LoopCut(p) => {
            loop_cut(mesh, p);
            ToolOutput::Mutated
        }
        ToolParams::KnifeCut(p) => {
            knife_cut(mesh, &p.points);
            ToolOutput::Mutated
        }
        ToolParams::Fillet(p) => {
            let selected = mesh.selected_edge_ids();
            ToolOutput::Preview(fillet_preview(mesh, &selected, p.radius, p.divisions))
        }
        ToolParams::UvUnwrap => {
            unwrap_uvs(mesh);
            ToolOutput::Mutated
        }
    }
}
