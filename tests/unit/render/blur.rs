use super::*;

#[test]
fn kernel_sums_to_one_in_q16() {
    for (r, s) in [(1, 0.5f32), (6, 2.0), (12, 4.0)] {
        let k = gaussian_kernel_q16(r, s).unwrap();
        assert_eq!(k.len(), (2 * r + 1) as usize);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
    }
    assert_eq!(gaussian_kernel_q16(0, 1.0).unwrap(), vec![1 << 16]);
}

#[test]
fn zero_radius_is_identity() {
    let r = Raster::filled(3, 2, [1, 2, 3, 4]).unwrap();
    assert_eq!(blur_radius(&r, 0.0).unwrap(), r);
}

#[test]
fn constant_image_is_identity() {
    let r = Raster::filled(16, 9, [40, 80, 120, 200]).unwrap();
    assert_eq!(gaussian_blur(&r, 3.0).unwrap(), r);
}

#[test]
fn blur_spreads_a_single_pixel() {
    let mut r = Raster::new(9, 9).unwrap();
    let idx = (4 * 9 + 4) * 4;
    r.data[idx..idx + 4].copy_from_slice(&[255, 255, 255, 255]);
    let out = gaussian_blur(&r, 1.0).unwrap();
    assert!(out.pixel(4, 4)[3] < 255);
    assert!(out.pixel(5, 4)[3] > 0);
    assert!(out.pixel(4, 3)[3] > 0);
}

#[test]
fn negative_radius_is_rejected() {
    let r = Raster::new(2, 2).unwrap();
    assert!(blur_radius(&r, -1.0).is_err());
}
