use std::io::Cursor;

use super::*;

fn png_bytes(img: image::RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn png_decodes_to_premultiplied_raster() {
    let img = image::RgbaImage::from_raw(1, 1, vec![100, 50, 200, 128]).unwrap();
    let raster = decode_raster(&png_bytes(img)).unwrap();
    assert_eq!((raster.width, raster.height), (1, 1));
    assert_eq!(
        raster.data,
        vec![
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        ]
    );
}

#[test]
fn svg_is_sniffed_and_rasterized() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="4">
        <rect width="8" height="4" fill="#ff0000"/></svg>"##;
    assert!(looks_like_svg(svg));
    let raster = decode_raster(svg).unwrap();
    assert_eq!((raster.width, raster.height), (8, 4));
    assert_eq!(raster.pixel(4, 2), [255, 0, 0, 255]);
}

#[test]
fn garbage_is_a_resource_error() {
    assert!(matches!(decode_raster(b"not an image"), Err(TesseraError::Resource(_))));
    assert!(matches!(decode_raster(b"<svg"), Err(TesseraError::Resource(_))));
    assert!(matches!(decode_raster(&[]), Err(TesseraError::Resource(_))));
}
