use super::*;
use crate::compose::pack::{PackSource, pack_channels};
use crate::foundation::math::u8_to_unit;

fn noisy_rgba8(w: u32, h: u32) -> Vec<u8> {
    (0..w * h * 4)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
        .collect()
}

#[test]
fn defaults_enable_rgb_only() {
    let d = default_unpack_channels();
    assert_eq!(
        d.iter().map(|c| c.enabled).collect::<Vec<_>>(),
        vec![true, true, true, false]
    );
    assert_eq!(d[3].suffix, "_A");
    assert_eq!(d[1].suffix, "_G");
}

#[test]
fn enabled_channels_are_grayscale_and_opaque() {
    let src = PixelBuffer::from_rgba(1, 2, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]).unwrap();
    let out = unpack_channels(&src, [false, true, false, true]).unwrap();
    assert_eq!(out.len(), 2);
    assert!(out.get(Channel::R).is_none());

    let g = out.get(Channel::G).unwrap();
    assert_eq!(g.dimensions(), (1, 2));
    assert_eq!(g.pixel(0, 0), [0.2, 0.2, 0.2, 1.0]);
    assert_eq!(g.pixel(0, 1), [0.6, 0.6, 0.6, 1.0]);

    let a = out.get(Channel::A).unwrap();
    assert_eq!(a.pixel(0, 1), [0.8, 0.8, 0.8, 1.0]);

    let order: Vec<Channel> = out.iter().map(|(c, _)| c).collect();
    assert_eq!(order, vec![Channel::G, Channel::A]);
}

#[test]
fn nothing_enabled_produces_nothing() {
    let src = PixelBuffer::solid(2, 2, [1.0; 4]).unwrap();
    assert!(unpack_channels(&src, [false; 4]).unwrap().is_empty());
}

#[test]
fn unpack_then_pack_reconstructs_original() {
    let (w, h) = (7, 5);
    let bytes = noisy_rgba8(w, h);
    let src = PixelBuffer::from_rgba8(w, h, &bytes).unwrap();

    let parts = unpack_channels(&src, [true; 4]).unwrap().into_array();
    let sources = Channel::ALL.map(|c| PackSource::Image {
        pixels: parts[c.index()].clone().unwrap(),
        channel: Channel::R,
        invert: false,
    });
    let packed = pack_channels(&sources, w, h).unwrap();

    assert_eq!(packed, src);
    assert_eq!(packed.to_rgba8(), bytes);
    assert_eq!(packed.pixel(3, 2)[1], u8_to_unit(bytes[((2 * w + 3) * 4 + 1) as usize]));
}
