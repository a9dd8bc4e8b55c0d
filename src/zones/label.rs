use crate::error::ZoneError;
use crate::volume::Volume;
use crate::zones::{BoundingBox, ZoneLimits};

/// Voxel-index extent of the non-zero region of `gland`.
pub fn bbox_range<T, U>(image: &Volume<T>, gland: &Volume<U>) -> Result<BoundingBox, ZoneError>
where
    T: Copy + Default,
    U: Copy + Default + PartialEq,
{
    image.ensure_same_shape(gland, "image vs gland mask")?;

    let (nx, ny, nz) = gland.dims();
    let background = U::default();
    let mut bbox: Option<BoundingBox> = None;
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                if gland.get(x, y, z) == background {
                    continue;
                }
                bbox = Some(match bbox {
                    None => BoundingBox::new(x, x, y, y, z, z),
                    Some(b) => BoundingBox::new(
                        b.x_min.min(x),
                        b.x_max.max(x),
                        b.y_min.min(y),
                        b.y_max.max(y),
                        b.z_min.min(z),
                        b.z_max.max(z),
                    ),
                });
            }
        }
    }
    bbox.ok_or_else(|| ZoneError::InvalidMask("gland mask contains no foreground voxels".into()))
}

/// Labels every gland voxel (value > 0) with the first zone, by ascending ID,
/// whose box contains it. Voxels outside the gland stay 0.
pub fn label_zones(gland: &Volume<f32>, limits: &ZoneLimits, bbox: &BoundingBox) -> Volume<u8> {
    let (nx, ny, nz) = gland.dims();
    let mut zones = Volume::<u8>::zeros(gland.dims());
    if nz == 0 {
        return zones;
    }
    let z_hi = bbox.z_max.min(nz - 1);
    for z in bbox.z_min..=z_hi {
        for y in 0..ny {
            for x in 0..nx {
                if gland.get(x, y, z) <= 0.0 {
                    continue;
                }
                if let Some(id) = limits.first_match(x as i64, y as i64, z as i64) {
                    zones.set(x, y, z, id);
                }
            }
        }
    }
    zones
}

/// Gland voxels that ended up without a zone.
pub fn count_unassigned(gland: &Volume<f32>, zones: &Volume<u8>) -> usize {
    gland
        .as_slice()
        .iter()
        .zip(zones.as_slice())
        .filter(|(g, z)| **g > 0.0 && **z == 0)
        .count()
}
