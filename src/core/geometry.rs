//! Buffer transforms for preview jobs: volume downscaling and mesh rescaling.

use crate::core::{Dimensions, RemeshError, VoxelType};

/// Bytes per vertex in a degenerate triangle strip: position and normal, three `f32` each.
pub const STRIP_VERTEX_BYTES: usize = 6 * 4;

/// Nearest-neighbour downscale of an x-fastest volume from `from` to `to`.
///
/// Work is proportional to the output volume.
///
/// # Errors
///
/// [`RemeshError::Fetch`] when `volume` does not hold `from` voxels of `voxel_type`, or
/// [`RemeshError::InvalidRequest`] when `to` is empty or larger than `from`.
pub fn downscale_volume(
    volume: &[u8],
    from: Dimensions,
    to: Dimensions,
    voxel_type: VoxelType,
) -> Result<Vec<u8>, RemeshError> {
    let width = voxel_type.width();
    let expected = from.byte_len(voxel_type).ok_or_else(|| {
        RemeshError::Fetch(format!("volume size of {from} {} overflows", voxel_type.as_str()))
    })?;
    if volume.len() != expected {
        return Err(RemeshError::Fetch(format!(
            "volume holds {} bytes, expected {expected} for {from} {}",
            volume.len(),
            voxel_type.as_str()
        )));
    }
    if !to.is_positive() || !to.fits_within(&from) {
        return Err(RemeshError::InvalidRequest(format!(
            "cannot downscale {from} to {to}"
        )));
    }
    if to == from {
        return Ok(volume.to_vec());
    }

    let sample = |out: u32, src: u32, dst: u32| (u64::from(out) * u64::from(src) / u64::from(dst)) as usize;
    let (sx, sy) = (from.x as usize, from.y as usize);

    // `to` fits within `from`, whose byte length was checked above.
    let mut out = Vec::with_capacity(to.byte_len(voxel_type).unwrap_or(0));
    for z in 0..to.z {
        let src_z = sample(z, from.z, to.z);
        for y in 0..to.y {
            let src_y = sample(y, from.y, to.y);
            let row = (src_z * sy + src_y) * sx;
            for x in 0..to.x {
                let src = (row + sample(x, from.x, to.x)) * width;
                out.extend_from_slice(&volume[src..src + width]);
            }
        }
    }
    Ok(out)
}

/// Scale every vertex position in a strip blob by `scale`, leaving normals untouched.
///
/// # Errors
///
/// [`RemeshError::Generation`] when the blob is not a whole number of vertices.
pub fn rescale_strip(blob: &[u8], scale: [f32; 3]) -> Result<Vec<u8>, RemeshError> {
    if blob.len() % STRIP_VERTEX_BYTES != 0 {
        return Err(RemeshError::Generation(format!(
            "mesh blob of {} bytes is not a whole number of vertices",
            blob.len()
        )));
    }

    let mut out = blob.to_vec();
    for vertex in out.chunks_exact_mut(STRIP_VERTEX_BYTES) {
        for (axis, factor) in scale.iter().enumerate() {
            let field = &mut vertex[axis * 4..axis * 4 + 4];
            let value = f32::from_le_bytes([field[0], field[1], field[2], field[3]]) * factor;
            field.copy_from_slice(&value.to_le_bytes());
        }
    }
    Ok(out)
}
