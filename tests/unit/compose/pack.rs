use super::*;

fn solid(w: u32, h: u32, rgba: [f32; 4]) -> PixelBuffer {
    PixelBuffer::solid(w, h, rgba).unwrap()
}

fn image(pixels: PixelBuffer, channel: Channel) -> PackSource {
    PackSource::Image {
        pixels,
        channel,
        invert: false,
    }
}

#[test]
fn constants_fill_every_pixel_at_any_size() {
    let sources = [
        PackSource::Constant(0.25),
        PackSource::Constant(0.5),
        PackSource::Constant(0.75),
        PackSource::Constant(1.0),
    ];
    for (w, h) in [(1, 1), (3, 7), (64, 2)] {
        let out = pack_channels(&sources, w, h).unwrap();
        assert_eq!(out.dimensions(), (w, h));
        assert!(out.pixels().all(|px| px == [0.25, 0.5, 0.75, 1.0]));
    }
}

#[test]
fn custom_slot_honors_invert() {
    let slot = ChannelSlot::constant(0.2).inverted();
    assert_eq!(slot.fallback_value(Channel::G), 1.0 - 0.2);
    assert_eq!(ChannelSlot::constant(0.2).fallback_value(Channel::A), 0.2);
}

#[test]
fn unbound_slots_default_to_zero_and_opaque_alpha() {
    let slot = ChannelSlot::default();
    assert_eq!(slot.fallback_value(Channel::R), 0.0);
    assert_eq!(slot.fallback_value(Channel::B), 0.0);
    assert_eq!(slot.fallback_value(Channel::A), 1.0);
}

#[test]
fn unbound_slot_reads_its_output_channel() {
    for output in Channel::ALL {
        let slot = ChannelSlot::unbound(output);
        assert_eq!(slot.channel, output);
        assert!(slot.bound_source().is_none());
        assert_eq!(slot.fallback_value(output), default_channel_value(output));
    }
}

#[test]
fn custom_overrides_bound_source() {
    let handle = ImageHandle::from_rgba8("x", 1, 1, vec![255, 255, 255, 255]);
    let mut slot = ChannelSlot::image(handle, Channel::R);
    assert!(slot.bound_source().is_some());
    slot.use_custom = true;
    slot.custom_value = 0.1;
    assert!(slot.bound_source().is_none());

    let cache = PixelCache::new();
    let (source, snap) = PackSource::resolve(&slot, Channel::R, &cache).unwrap();
    assert!(matches!(source, PackSource::Constant(v) if v == 0.1));
    assert!(snap.is_none());
    assert!(cache.is_empty());
}

#[test]
fn uniform_sources_reproduce_exact_channels() {
    let a = solid(2, 2, [0.1, 0.2, 0.3, 0.4]);
    let b = solid(2, 2, [0.5, 0.6, 0.7, 0.8]);
    let sources = [
        image(a.clone(), Channel::G),
        image(b.clone(), Channel::R),
        image(a, Channel::A),
        image(b, Channel::B),
    ];
    let out = pack_channels(&sources, 5, 3).unwrap();
    assert!(out.pixels().all(|px| px == [0.2, 0.5, 0.4, 0.7]));
}

#[test]
fn image_source_is_resampled_nearest_neighbor() {
    // 2x1 source: left pixel red=0.0, right pixel red=1.0.
    let src = PixelBuffer::from_rgba(2, 1, vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]).unwrap();
    let sources = [
        image(src, Channel::R),
        PackSource::Constant(0.0),
        PackSource::Constant(0.0),
        PackSource::Constant(1.0),
    ];
    let out = pack_channels(&sources, 4, 1).unwrap();
    let reds: Vec<f32> = out.pixels().map(|px| px[0]).collect();
    assert_eq!(reds, vec![0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn inverted_image_source() {
    let src = solid(1, 1, [0.25, 0.0, 0.0, 1.0]);
    let sources = [
        PackSource::Image {
            pixels: src,
            channel: Channel::R,
            invert: true,
        },
        PackSource::Constant(0.0),
        PackSource::Constant(0.0),
        PackSource::Constant(1.0),
    ];
    let out = pack_channels(&sources, 1, 1).unwrap();
    assert_eq!(out.pixel(0, 0)[0], 0.75);
}

#[test]
fn export_size_takes_max_of_each_axis() {
    let sources = [
        image(solid(8, 2, [0.0; 4]), Channel::R),
        PackSource::Constant(1.0),
        image(solid(3, 16, [0.0; 4]), Channel::R),
        PackSource::Constant(1.0),
    ];
    assert_eq!(export_size(&sources, FALLBACK_EXPORT_SIZE), (8, 16));

    let constants = [
        PackSource::Constant(0.0),
        PackSource::Constant(0.0),
        PackSource::Constant(0.0),
        PackSource::Constant(1.0),
    ];
    assert_eq!(export_size(&constants, FALLBACK_EXPORT_SIZE), (512, 512));
}

#[test]
fn resolve_or_default_degrades_failed_decode() {
    let cache = PixelCache::new();
    let bad = ImageHandle::from_encoded("bad", b"nope".to_vec());
    let slot = ChannelSlot::image(bad.clone(), Channel::G);

    assert!(PackSource::resolve(&slot, Channel::A, &cache).is_err());
    let source = PackSource::resolve_or_default(&slot, Channel::A, &cache);
    assert!(matches!(source, PackSource::Constant(v) if v == 1.0));
    let source = PackSource::resolve_or_default(&slot, Channel::R, &cache);
    assert!(matches!(source, PackSource::Constant(v) if v == 0.0));
}

#[test]
fn zero_destination_is_dimension_error() {
    let sources = [
        PackSource::Constant(0.0),
        PackSource::Constant(0.0),
        PackSource::Constant(0.0),
        PackSource::Constant(1.0),
    ];
    assert!(matches!(
        pack_channels(&sources, 0, 8),
        Err(RepackError::Dimension(_))
    ));
}
