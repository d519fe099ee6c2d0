//! Remesh request data model.

use serde::{Deserialize, Serialize};

use crate::core::RemeshError;
use crate::util::serde::{CellId, Priority, TaskId};

/// Width of the unsigned integers stored in a segmentation volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoxelType {
    /// 8-bit segment ids.
    Uint8,
    /// 16-bit segment ids.
    Uint16,
    /// 32-bit segment ids.
    Uint32,
}

impl VoxelType {
    /// Bytes per voxel.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    /// Largest segment id representable at this width.
    #[must_use]
    pub const fn max_segment(self) -> u64 {
        match self {
            Self::Uint8 => u8::MAX as u64,
            Self::Uint16 => u16::MAX as u64,
            Self::Uint32 => u32::MAX as u64,
        }
    }

    /// Pack segment ids into a little-endian buffer of this width.
    ///
    /// Ids wider than the voxel type are truncated; [`RemeshRequest::validate`] rejects them
    /// before they get here.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode_segments(self, segments: &[u64]) -> Vec<u8> {
        let mut out = Vec::with_capacity(segments.len() * self.width());
        for &segment in segments {
            match self {
                Self::Uint8 => out.push(segment as u8),
                Self::Uint16 => out.extend_from_slice(&(segment as u16).to_le_bytes()),
                Self::Uint32 => out.extend_from_slice(&(segment as u32).to_le_bytes()),
            }
        }
        out
    }

    /// Lowercase label (`uint8`, `uint16`, `uint32`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
        }
    }
}

/// Extent of a volume in voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Fastest-varying axis.
    pub x: u32,
    /// Middle axis.
    pub y: u32,
    /// Slowest-varying axis.
    pub z: u32,
}

impl Dimensions {
    /// Build dimensions from three extents.
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// True when every extent is non-zero.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.x > 0 && self.y > 0 && self.z > 0
    }

    /// True when `self` is component-wise no larger than `outer`.
    #[must_use]
    pub const fn fits_within(&self, outer: &Self) -> bool {
        self.x <= outer.x && self.y <= outer.y && self.z <= outer.z
    }

    /// Number of voxels, or `None` when it does not fit in `usize`.
    #[must_use]
    pub fn voxel_count(&self) -> Option<usize> {
        (self.x as usize)
            .checked_mul(self.y as usize)?
            .checked_mul(self.z as usize)
    }

    /// Size in bytes of a volume of these dimensions, or `None` on overflow.
    #[must_use]
    pub fn byte_len(&self, voxel_type: VoxelType) -> Option<usize> {
        self.voxel_count()?.checked_mul(voxel_type.width())
    }

    /// Per-axis ratio `self / smaller`, used to map preview geometry back to full resolution.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn scale_from(&self, smaller: &Self) -> [f32; 3] {
        [
            self.x as f32 / smaller.x as f32,
            self.y as f32 / smaller.y as f32,
            self.z as f32 / smaller.z as f32,
        ]
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Immutable description of one remesh job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemeshRequest {
    /// Request identity; later submissions for the same id supersede earlier ones.
    pub task_id: TaskId,
    /// Grouping key for the output path.
    pub cell_id: CellId,
    /// Width of the segmentation voxels.
    pub voxel_type: VoxelType,
    /// Full-resolution volume extent.
    pub dimensions: Dimensions,
    /// Storage bucket holding the segmentation.
    pub source_bucket: String,
    /// Object prefix of the segmentation within the bucket.
    pub source_path: String,
    /// Segment ids to mesh, in submission order.
    pub segments: Vec<u64>,
    /// Scheduling tier.
    pub priority: Priority,
    /// Reduced extent for a fast preview, if this is a preview request.
    pub preview_dimensions: Option<Dimensions>,
}

impl RemeshRequest {
    /// True for preview requests.
    #[must_use]
    pub const fn is_preview(&self) -> bool {
        self.preview_dimensions.is_some()
    }

    /// Extent the mesh producer is run against.
    #[must_use]
    pub fn effective_dimensions(&self) -> Dimensions {
        self.preview_dimensions.unwrap_or(self.dimensions)
    }

    /// Number of levels of detail to generate: one for previews, `mip_count` otherwise.
    #[must_use]
    pub const fn lod_count(&self, mip_count: u8) -> u8 {
        if self.is_preview() {
            1
        } else {
            mip_count
        }
    }

    /// The low-priority, full-resolution request that follows a preview.
    #[must_use]
    pub fn full_resolution_follow_up(&self) -> Self {
        Self {
            priority: Priority::Low,
            preview_dimensions: None,
            ..self.clone()
        }
    }

    /// Check the data-model invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RemeshError::InvalidRequest`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), RemeshError> {
        if !self.dimensions.is_positive() {
            return Err(RemeshError::InvalidRequest(format!(
                "dimensions must be positive, got {}",
                self.dimensions
            )));
        }
        if self.dimensions.byte_len(self.voxel_type).is_none() {
            return Err(RemeshError::InvalidRequest(format!(
                "dimensions {} of {} are too large to address",
                self.dimensions,
                self.voxel_type.as_str()
            )));
        }
        if let Some(preview) = &self.preview_dimensions {
            if !preview.is_positive() {
                return Err(RemeshError::InvalidRequest(format!(
                    "preview dimensions must be positive, got {preview}"
                )));
            }
            if !preview.fits_within(&self.dimensions) {
                return Err(RemeshError::InvalidRequest(format!(
                    "preview dimensions {preview} exceed dimensions {}",
                    self.dimensions
                )));
            }
        }
        if self.source_bucket.is_empty() {
            return Err(RemeshError::InvalidRequest("source bucket is empty".into()));
        }
        if self.source_path.is_empty() {
            return Err(RemeshError::InvalidRequest("source path is empty".into()));
        }
        let max = self.voxel_type.max_segment();
        if let Some(segment) = self.segments.iter().find(|&&s| s > max) {
            return Err(RemeshError::InvalidRequest(format!(
                "segment {segment} does not fit in {}",
                self.voxel_type.as_str()
            )));
        }
        Ok(())
    }
}
