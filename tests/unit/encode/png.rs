use super::*;
use crate::compose::unpack::{default_unpack_channels, unpack_channels};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "texrepack_png_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn base_name_strips_known_suffixes() {
    assert_eq!(suggest_base_name("Rock_Packed"), "Rock");
    assert_eq!(suggest_base_name("rock_albedo"), "rock");
    assert_eq!(suggest_base_name("rock_pack_packed"), "rock");
    assert_eq!(suggest_base_name("metal-_TEX"), "metal");
    assert_eq!(suggest_base_name("plain name  "), "plain name");
    assert_eq!(suggest_base_name("_tex"), "");
    assert_eq!(suggest_base_name("höhe_diffuse"), "höhe");
    // Suffix checks run once, in order.
    assert_eq!(suggest_base_name("a_packed_tex"), "a_packed");
}

#[test]
fn unpack_paths_follow_enabled_suffixes() {
    let mut channels = default_unpack_channels();
    channels[1].suffix = "_Rough".to_owned();
    let paths = unpack_output_paths(Path::new("out"), "Rock", &channels);
    assert_eq!(
        paths,
        vec![
            (Channel::R, PathBuf::from("out/Rock_R.png")),
            (Channel::G, PathBuf::from("out/Rock_Rough.png")),
            (Channel::B, PathBuf::from("out/Rock_B.png")),
        ]
    );
}

#[test]
fn png_roundtrip_and_overwrite_guard() {
    let dir = temp_dir("rgba");
    let path = dir.join("nested").join("packed.png");
    let px = PixelBuffer::from_rgba8(2, 1, &[255, 0, 128, 255, 0, 64, 0, 32]).unwrap();

    write_png_rgba(&path, &px, false).unwrap();
    let back = image::open(&path).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (2, 1));
    assert_eq!(back.into_raw(), vec![255, 0, 128, 255, 0, 64, 0, 32]);

    let err = write_png_rgba(&path, &px, false).unwrap_err();
    assert!(matches!(err, RepackError::Validation(_)));
    write_png_rgba(&path, &px, true).unwrap();

    let rgb_path = dir.join("gray.png");
    write_png_rgb(&rgb_path, &px, false).unwrap();
    let rgb = image::open(&rgb_path).unwrap();
    assert_eq!(rgb.color(), image::ColorType::Rgb8);
    assert_eq!(rgb.to_rgb8().into_raw(), vec![255, 0, 128, 0, 64, 0]);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unpacked_write_checks_every_target_first() {
    let dir = temp_dir("unpack");
    std::fs::create_dir_all(&dir).unwrap();
    let channels = default_unpack_channels();
    let src = PixelBuffer::solid(3, 3, [0.2, 0.4, 0.6, 1.0]).unwrap();
    let outputs = unpack_channels(&src, [true, true, true, false]).unwrap();

    // Pre-existing blue output blocks the whole batch.
    std::fs::write(dir.join("T_B.png"), b"old").unwrap();
    let err = write_unpacked(&dir, "T", &channels, &outputs, false).unwrap_err();
    assert!(matches!(err, RepackError::Validation(_)));
    assert!(!dir.join("T_R.png").exists());

    let written = write_unpacked(&dir, "T", &channels, &outputs, true).unwrap();
    assert_eq!(written.len(), 3);
    let g = image::open(dir.join("T_G.png")).unwrap().to_rgb8();
    assert_eq!(g.get_pixel(1, 1).0, [102, 102, 102]);

    std::fs::remove_dir_all(&dir).unwrap();
}
