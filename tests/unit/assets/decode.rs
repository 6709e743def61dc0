use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, rgba: Vec<u8>) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_png_keeps_straight_alpha() {
    let bytes = png_bytes(1, 1, vec![100, 50, 200, 128]);
    let buf = decode_image(&bytes).unwrap();
    assert_eq!(buf.dimensions(), (1, 1));
    assert_eq!(buf.to_rgba8(), vec![100, 50, 200, 128]);
}

#[test]
fn encoded_handle_takes_offscreen_path() {
    let handle = ImageHandle::from_encoded("enc", png_bytes(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]));
    let (buf, path) = decode_handle(&handle).unwrap();
    assert_eq!(path, DecodePath::Offscreen);
    assert_eq!(buf.to_rgba8(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn raw_handle_takes_direct_path_with_same_pixels() {
    let raw = vec![1, 2, 3, 4, 5, 6, 7, 8];
    let direct = ImageHandle::from_rgba8("raw", 2, 1, raw.clone());
    let encoded = ImageHandle::from_encoded("enc", png_bytes(2, 1, raw));
    let (a, pa) = decode_handle(&direct).unwrap();
    let (b, pb) = decode_handle(&encoded).unwrap();
    assert_eq!(pa, DecodePath::Direct);
    assert_eq!(pb, DecodePath::Offscreen);
    assert_eq!(a, b);
}

#[test]
fn grayscale_source_is_expanded_to_rgba() {
    let img = image::GrayImage::from_raw(1, 1, vec![77]).unwrap();
    let mut bytes = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    let buf = decode_image(&bytes).unwrap();
    assert_eq!(buf.to_rgba8(), vec![77, 77, 77, 255]);
}

#[test]
fn corrupt_data_is_a_decode_error() {
    let err = decode_image(b"not an image").unwrap_err();
    assert!(err.is_decode());

    let handle = ImageHandle::from_rgba8("short", 2, 2, vec![0; 7]);
    assert!(decode_handle(&handle).unwrap_err().is_decode());
}

#[test]
fn missing_file_is_a_decode_error() {
    let handle = ImageHandle::from_file("definitely/not/here.png").unwrap();
    assert!(decode_handle(&handle).unwrap_err().is_decode());
}
