use kira_zonemap::mapping::{MappingTables, compute_ratios};
use kira_zonemap::volume::Volume;
use kira_zonemap::zones::Granularity;

fn masks() -> (Volume<u8>, Volume<u8>) {
    // Ten voxels of 20-zone 11 along x: six fall in octant 2, four in octant 4.
    let mut fine = Volume::<u8>::zeros((10, 2, 1));
    let mut coarse = Volume::<u8>::zeros((10, 2, 1));
    for x in 0..10 {
        fine.set(x, 0, 0, 11);
        coarse.set(x, 0, 0, if x < 6 { 2 } else { 4 });
    }
    // Zone 5 splits evenly between octants 3 and 4.
    fine.set(0, 1, 0, 5);
    coarse.set(0, 1, 0, 3);
    fine.set(1, 1, 0, 5);
    coarse.set(1, 1, 0, 4);
    (coarse, fine)
}

#[test]
fn quarter_ratios_follow_voxel_overlap() {
    let tables = MappingTables::build(Granularity::Octant);
    let (coarse, fine) = masks();
    let ratios = compute_ratios(&tables, &coarse, &fine).unwrap();

    assert!((ratios.ratio(11, 2).unwrap() - 0.6).abs() < 1e-12);
    assert!((ratios.ratio(11, 4).unwrap() - 0.4).abs() < 1e-12);
    assert_eq!(ratios.ratio(11, 6), Some(0.0));
    assert_eq!(ratios.ratio(11, 8), Some(0.0));

    let total: f64 = ratios.weights(11).unwrap().iter().map(|(_, r)| r).sum();
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn half_ratios_are_recorded_too() {
    let tables = MappingTables::build(Granularity::Octant);
    let (coarse, fine) = masks();
    let ratios = compute_ratios(&tables, &coarse, &fine).unwrap();
    assert_eq!(ratios.ratio(5, 3), Some(0.5));
    assert_eq!(ratios.ratio(5, 4), Some(0.5));
}

#[test]
fn absent_fine_zone_gets_zero_ratio() {
    let tables = MappingTables::build(Granularity::Octant);
    let (coarse, fine) = masks();
    let ratios = compute_ratios(&tables, &coarse, &fine).unwrap();
    let weights = ratios.weights(12).unwrap();
    assert_eq!(weights.len(), 4);
    assert!(weights.iter().all(|(_, r)| *r == 0.0));
}

#[test]
fn direct_routes_have_no_ratio_entry() {
    let tables = MappingTables::build(Granularity::Octant);
    let (coarse, fine) = masks();
    let ratios = compute_ratios(&tables, &coarse, &fine).unwrap();
    assert!(ratios.weights(1).is_none());
    assert_eq!(ratios.iter().count(), 4);
}

#[test]
fn barzell_tables_need_no_ratios() {
    let tables = MappingTables::build(Granularity::Barzell);
    let (_, fine) = masks();
    let ratios = compute_ratios(&tables, &fine, &fine).unwrap();
    assert_eq!(ratios.iter().count(), 0);
}

#[test]
fn mask_shapes_must_match() {
    let tables = MappingTables::build(Granularity::Octant);
    let coarse = Volume::<u8>::zeros((4, 4, 4));
    let fine = Volume::<u8>::zeros((4, 4, 3));
    assert!(compute_ratios(&tables, &coarse, &fine).is_err());
}
