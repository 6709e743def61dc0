use super::*;

#[test]
fn fnv_hash_is_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"texrepack");
    let mut b = Fnv1a64::new_default();
    b.write_u8(b't');
    b.write_bytes(b"exrepack");
    assert_eq!(a.finish(), b.finish());
    assert_ne!(a.finish(), Fnv1a64::OFFSET_BASIS);
}

#[test]
fn u8_unit_roundtrip_is_exact() {
    for v in 0..=255u8 {
        assert_eq!(unit_to_u8(u8_to_unit(v)), v);
    }
}

#[test]
fn unit_to_u8_clamps_out_of_range() {
    assert_eq!(unit_to_u8(-0.5), 0);
    assert_eq!(unit_to_u8(1.5), 255);
    assert_eq!(unit_to_u8(f32::NAN), 0);
}

#[test]
fn lerp_endpoints() {
    assert_eq!(lerp(0.25, 0.75, 0.0), 0.25);
    assert_eq!(lerp(0.25, 0.75, 1.0), 0.75);
    assert_eq!(lerp(0.0, 1.0, 0.5), 0.5);
}

#[test]
fn lerp_endpoints_are_exact_for_awkward_values() {
    let a = 0.1f32;
    let b = 0.7f32;
    assert_eq!(lerp(a, b, 0.0).to_bits(), a.to_bits());
    assert_eq!(lerp(a, b, 1.0).to_bits(), b.to_bits());
}
