//! NIfTI-1 volume reading and mask writing.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use ndarray::{Array, IxDyn};
use nifti::volume::ndarray::IntoNdArray;
use nifti::{InMemNiftiObject, NiftiHeader, NiftiObject};

use crate::volume::Volume;

const HEADER_LEN: usize = 348;
const VOX_OFFSET: usize = 352;

/// Spatial metadata carried from a reference image onto derived masks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NiftiGeometry {
    pub voxel_size: (f64, f64, f64),
    /// Row-major 4x4 voxel-to-world transform.
    pub affine: [f64; 16],
}

impl Default for NiftiGeometry {
    fn default() -> Self {
        Self {
            voxel_size: (1.0, 1.0, 1.0),
            affine: [
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }
}

/// Voxel types that can be written to disk.
pub trait NiftiVoxel: Copy {
    const DATATYPE: i16;
    const BITPIX: i16;
    fn write_le(self, out: &mut Vec<u8>);
}

impl NiftiVoxel for u8 {
    const DATATYPE: i16 = 2;
    const BITPIX: i16 = 8;
    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self);
    }
}

impl NiftiVoxel for f32 {
    const DATATYPE: i16 = 16;
    const BITPIX: i16 = 32;
    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// Reads a `.nii` or `.nii.gz` file into an x-fastest `f32` volume.
/// 4-D inputs keep only the first volume.
pub fn load_volume(path: &Path) -> Result<(Volume<f32>, NiftiGeometry)> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode_volume(&bytes).with_context(|| format!("invalid NIfTI file {}", path.display()))
}

pub fn decode_volume(bytes: &[u8]) -> Result<(Volume<f32>, NiftiGeometry)> {
    let obj = if is_gzip(bytes) {
        InMemNiftiObject::from_reader(GzDecoder::new(Cursor::new(bytes)))?
    } else {
        InMemNiftiObject::from_reader(Cursor::new(bytes))?
    };

    let header = obj.header().clone();
    if header.dim[0] < 3 {
        bail!("expected at least a 3-D volume, got {}-D", header.dim[0]);
    }
    let geometry = geometry_from_header(&header);

    let array: Array<f32, IxDyn> = obj.into_volume().into_ndarray()?;
    let shape = array.shape().to_vec();
    if shape.len() < 3 {
        bail!("expected at least a 3-D array, got {}-D", shape.len());
    }
    let dims = (shape[0], shape[1], shape[2]);

    let mut data = Vec::with_capacity(dims.0 * dims.1 * dims.2);
    let mut index = vec![0usize; shape.len()];
    for z in 0..dims.2 {
        for y in 0..dims.1 {
            for x in 0..dims.0 {
                index[0] = x;
                index[1] = y;
                index[2] = z;
                data.push(array[IxDyn(&index)]);
            }
        }
    }

    let volume = Volume::from_vec(dims, data)?;
    Ok((volume, geometry))
}

fn geometry_from_header(header: &NiftiHeader) -> NiftiGeometry {
    let pix = header.pixdim;
    let voxel_size = (pix[1] as f64, pix[2] as f64, pix[3] as f64);
    let affine = if header.sform_code > 0 {
        let (sx, sy, sz) = (header.srow_x, header.srow_y, header.srow_z);
        [
            sx[0] as f64, sx[1] as f64, sx[2] as f64, sx[3] as f64, //
            sy[0] as f64, sy[1] as f64, sy[2] as f64, sy[3] as f64, //
            sz[0] as f64, sz[1] as f64, sz[2] as f64, sz[3] as f64, //
            0.0, 0.0, 0.0, 1.0,
        ]
    } else {
        [
            voxel_size.0, 0.0, 0.0, 0.0, //
            0.0, voxel_size.1, 0.0, 0.0, //
            0.0, 0.0, voxel_size.2, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]
    };
    NiftiGeometry { voxel_size, affine }
}

/// Serialises a volume as a single-file NIfTI-1 image.
pub fn encode_volume<T: NiftiVoxel + Default>(
    volume: &Volume<T>,
    geometry: &NiftiGeometry,
) -> Result<Vec<u8>> {
    let (nx, ny, nz) = volume.dims();
    for (axis, n) in [("x", nx), ("y", ny), ("z", nz)] {
        if n > i16::MAX as usize {
            bail!("{} dimension {} exceeds the NIfTI-1 limit", axis, n);
        }
    }

    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(&(HEADER_LEN as i32).to_le_bytes());

    let dim: [i16; 8] = [3, nx as i16, ny as i16, nz as i16, 1, 1, 1, 1];
    for (i, d) in dim.iter().enumerate() {
        let at = 40 + i * 2;
        header[at..at + 2].copy_from_slice(&d.to_le_bytes());
    }
    header[70..72].copy_from_slice(&T::DATATYPE.to_le_bytes());
    header[72..74].copy_from_slice(&T::BITPIX.to_le_bytes());

    let (vx, vy, vz) = geometry.voxel_size;
    let pixdim: [f32; 8] = [1.0, vx as f32, vy as f32, vz as f32, 1.0, 1.0, 1.0, 1.0];
    for (i, p) in pixdim.iter().enumerate() {
        let at = 76 + i * 4;
        header[at..at + 4].copy_from_slice(&p.to_le_bytes());
    }
    header[108..112].copy_from_slice(&(VOX_OFFSET as f32).to_le_bytes());
    header[112..116].copy_from_slice(&1.0f32.to_le_bytes());

    // qform unset, sform scanner-anatomical
    header[254..256].copy_from_slice(&1i16.to_le_bytes());
    for row in 0..3 {
        for col in 0..4 {
            let at = 280 + row * 16 + col * 4;
            let v = geometry.affine[row * 4 + col] as f32;
            header[at..at + 4].copy_from_slice(&v.to_le_bytes());
        }
    }
    header[344..348].copy_from_slice(b"n+1\0");

    let mut out = Vec::with_capacity(VOX_OFFSET + volume.len() * (T::BITPIX as usize / 8));
    out.extend_from_slice(&header);
    out.extend_from_slice(&[0u8; VOX_OFFSET - HEADER_LEN]);
    for &v in volume.as_slice() {
        v.write_le(&mut out);
    }
    Ok(out)
}

/// Writes a volume to `path`, gzip-compressed when the name ends in `.gz`.
pub fn save_volume<T: NiftiVoxel + Default>(
    path: &Path,
    volume: &Volume<T>,
    geometry: &NiftiGeometry,
) -> Result<()> {
    let raw = encode_volume(volume, geometry)?;
    let bytes = if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        encoder.finish()?
    } else {
        raw
    };
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
