use super::*;

#[test]
fn four_by_four_onto_two_by_two_maps_quadrants() {
    let r = Resampler::new((4, 4), (2, 2)).unwrap();
    for y in 0..4 {
        for x in 0..4 {
            let (sx, sy) = r.map(x, y);
            assert_eq!((sx, sy), (x / 2, y / 2));
        }
    }
}

#[test]
fn downsampling_never_leaves_source_bounds() {
    let r = Resampler::new((7, 3), (100, 5)).unwrap();
    for y in 0..3 {
        for x in 0..7 {
            let (sx, sy) = r.map(x, y);
            assert!(sx < 100 && sy < 5);
        }
    }
    // Out-of-range destination coordinates still clamp into the source.
    assert_eq!(r.map(50, 50), (99, 4));
}

#[test]
fn identity_mapping() {
    let r = Resampler::new((5, 3), (5, 3)).unwrap();
    assert!(r.is_identity());
    assert_eq!(r.column_map(), vec![0, 1, 2, 3, 4]);
    assert_eq!(r.map(4, 2), (4, 2));
}

#[test]
fn large_sizes_do_not_overflow() {
    let r = Resampler::new((u32::MAX, 1), (u32::MAX, 1)).unwrap();
    assert_eq!(r.map_x(u32::MAX - 1), u32::MAX - 1);
}

#[test]
fn zero_sizes_are_dimension_errors() {
    assert!(matches!(
        Resampler::new((0, 4), (2, 2)),
        Err(RepackError::Dimension(_))
    ));
    assert!(matches!(
        Resampler::new((4, 4), (2, 0)),
        Err(RepackError::Dimension(_))
    ));
}
