use kira_zonemap::error::ZoneError;
use kira_zonemap::volume::Volume;
use kira_zonemap::zones::{
    AxisRange, BoundingBox, Granularity, ZoneConfig, bbox_range, count_unassigned, label_zones,
    zone_limits,
};

fn scenario_config() -> ZoneConfig {
    ZoneConfig {
        apex: 0.5,
        anterior_cutoff: 0.5,
        left_right: 0.5,
        anterior: vec![1.0],
        posterior: vec![1.0],
    }
}

fn clinical_config() -> ZoneConfig {
    ZoneConfig {
        apex: 0.4,
        anterior_cutoff: 0.45,
        left_right: 0.2,
        anterior: vec![0.25, 0.25, 0.25, 0.25],
        posterior: vec![0.2, 0.2, 0.2, 0.2, 0.2],
    }
}

fn full_gland(dims: (usize, usize, usize)) -> Volume<f32> {
    let mut v = Volume::zeros(dims);
    for x in v.as_mut_slice() {
        *x = 1.0;
    }
    v
}

#[test]
fn scenario_cutoffs_split_at_five() {
    let bbox = BoundingBox::new(0, 10, 0, 10, 0, 10);
    let limits = zone_limits(Granularity::Barzell, &scenario_config(), &bbox);
    assert_eq!(limits.len(), 20);

    let right_band = limits.zone(12).unwrap();
    assert_eq!(right_band.x, AxisRange::new(0, 5));
    let left_band = limits.zone(11).unwrap();
    assert_eq!(left_band.x, AxisRange::new(5, 10));

    let apex = limits.zone(9).unwrap();
    assert_eq!(apex.z, AxisRange::new(0, 5));
    assert_eq!(apex.y, AxisRange::new(0, 5));
    let base = limits.zone(10).unwrap();
    assert_eq!(base.z, AxisRange::new(6, 10));
    let posterior = limits.zone(19).unwrap();
    assert_eq!(posterior.y, AxisRange::new(5, 10));
}

#[test]
fn scenario_single_voxel_is_labelled_deterministically() {
    let bbox = BoundingBox::new(0, 10, 0, 10, 0, 10);
    let limits = zone_limits(Granularity::Barzell, &scenario_config(), &bbox);

    let mut gland = Volume::<f32>::zeros((11, 11, 11));
    gland.set(2, 2, 2, 1.0);
    let zones = label_zones(&gland, &limits, &bbox);

    // The central band collapses to x = 5, so the voxel falls in the right lateral band.
    assert_eq!(zones.get(2, 2, 2), 12);
    assert_eq!(zones.as_slice().iter().filter(|&&z| z != 0).count(), 1);

    let again = label_zones(&gland, &limits, &bbox);
    assert_eq!(zones, again);
}

#[test]
fn every_gland_voxel_gets_a_zone_at_every_level() {
    let dims = (24, 18, 15);
    let gland = full_gland(dims);
    let image = Volume::<f32>::zeros(dims);
    let bbox = bbox_range(&image, &gland).unwrap();

    for cfg in [scenario_config(), clinical_config()] {
        for g in Granularity::ALL {
            let limits = zone_limits(g, &cfg, &bbox);
            let zones = label_zones(&gland, &limits, &bbox);
            assert_eq!(count_unassigned(&gland, &zones), 0, "level {}", g);
            let max = zones.as_slice().iter().copied().max().unwrap();
            assert!(max as usize <= g.zone_count());
            assert!(zones.as_slice().iter().all(|&z| z >= 1));
        }
    }
}

#[test]
fn coarse_levels_tile_the_x_axis_without_overlap() {
    let bbox = BoundingBox::new(3, 20, 2, 12, 1, 9);
    let cfg = clinical_config();
    for g in [Granularity::Octant, Granularity::Quadrant, Granularity::Hemi] {
        let limits = zone_limits(g, &cfg, &bbox);
        let right = limits.zone(1).unwrap().x;
        let left = limits.zone(2).unwrap().x;
        assert_eq!(right.lo, 3);
        assert_eq!(left.hi, 20);
        assert_eq!(right.hi + 1, left.lo, "level {}", g);
    }

    let octant = zone_limits(Granularity::Octant, &cfg, &bbox);
    let apex = octant.zone(1).unwrap().z;
    let base = octant.zone(5).unwrap().z;
    assert_eq!(apex.lo, 1);
    assert_eq!(base.hi, 9);
    assert_eq!(apex.hi + 1, base.lo);
}

#[test]
fn central_band_pairs_tile_between_lateral_cutoffs() {
    let bbox = BoundingBox::new(0, 40, 0, 20, 0, 20);
    let cfg = clinical_config();
    let limits = zone_limits(Granularity::Barzell, &cfg, &bbox);

    // Anterior pairs in lateral order: 9/10, 3/4, 1/2, 7/8.
    let order = [9u8, 3, 1, 7];
    let ranges: Vec<AxisRange> = order.iter().map(|&id| limits.zone(id).unwrap().x).collect();
    assert_eq!(ranges[0].lo, 8);
    assert_eq!(ranges.last().unwrap().hi, 32);
    for w in ranges.windows(2) {
        assert_eq!(w[0].hi, w[1].lo);
    }
    for (a, b) in [(9u8, 10u8), (3, 4), (1, 2), (7, 8)] {
        assert_eq!(limits.zone(a).unwrap().x, limits.zone(b).unwrap().x);
    }
}

#[test]
fn first_match_prefers_lowest_id() {
    let bbox = BoundingBox::new(0, 10, 0, 10, 0, 10);
    let limits = zone_limits(Granularity::Barzell, &scenario_config(), &bbox);
    // y = 5 lies on both the anterior and posterior boxes; anterior IDs come first.
    assert_eq!(limits.first_match(5, 5, 2), Some(1));
    assert_eq!(limits.first_match(50, 5, 2), None);
}

#[test]
fn hemi_counts_follow_midline() {
    let dims = (11, 4, 4);
    let gland = full_gland(dims);
    let bbox = BoundingBox::new(0, 10, 0, 3, 0, 3);
    let limits = zone_limits(Granularity::Hemi, &scenario_config(), &bbox);
    let zones = label_zones(&gland, &limits, &bbox);
    let right = zones.as_slice().iter().filter(|&&z| z == 1).count();
    let left = zones.as_slice().iter().filter(|&&z| z == 2).count();
    assert_eq!(right, 6 * 16);
    assert_eq!(left, 5 * 16);
}

#[test]
fn empty_gland_is_rejected() {
    let image = Volume::<f32>::zeros((4, 4, 4));
    let gland = Volume::<f32>::zeros((4, 4, 4));
    let err = bbox_range(&image, &gland).unwrap_err();
    assert!(matches!(err, ZoneError::InvalidMask(_)));
}

#[test]
fn image_and_gland_shapes_must_match() {
    let image = Volume::<f32>::zeros((4, 4, 4));
    let gland = full_gland((4, 4, 5));
    let err = bbox_range(&image, &gland).unwrap_err();
    assert!(matches!(err, ZoneError::ShapeMismatch { .. }));
}

#[test]
fn bbox_tracks_foreground_extent() {
    let mut gland = Volume::<f32>::zeros((10, 10, 10));
    gland.set(2, 3, 4, 1.0);
    gland.set(7, 5, 6, 1.0);
    let image = Volume::<f32>::zeros((10, 10, 10));
    let bbox = bbox_range(&image, &gland).unwrap();
    assert_eq!(bbox, BoundingBox::new(2, 7, 3, 5, 4, 6));
}

#[test]
fn voxels_outside_gland_stay_background() {
    let mut gland = Volume::<f32>::zeros((8, 8, 8));
    for z in 2..6 {
        for y in 2..6 {
            for x in 2..6 {
                gland.set(x, y, z, 1.0);
            }
        }
    }
    let image = Volume::<f32>::zeros((8, 8, 8));
    let bbox = bbox_range(&image, &gland).unwrap();
    let limits = zone_limits(Granularity::Barzell, &clinical_config(), &bbox);
    let zones = label_zones(&gland, &limits, &bbox);
    assert_eq!(zones.get(0, 0, 0), 0);
    assert_eq!(zones.get(7, 7, 7), 0);
    assert_eq!(count_unassigned(&gland, &zones), 0);
}
