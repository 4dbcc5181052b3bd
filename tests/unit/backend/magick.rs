use rstest::rstest;

use super::*;
use crate::ops::{
    Blur, Border, ColorAmount, Crop, Distort, DistortMethod, Frame, Level, Quantize, Resize, Roll,
};

#[rstest]
#[case(Operation::Flip, &["-flip"])]
#[case(Operation::Blur(Blur { sigma: 2.5 }), &["-blur", "0x2.5"])]
#[case(Operation::Roll(Roll { x: 4, y: -3 }), &["-roll", "+4-3"])]
#[case(
    Operation::Level(Level { black: 10.0, white: 90.0, gamma: 1.2 }),
    &["-level", "10%,90%,1.2"]
)]
#[case(
    Operation::Quantize(Quantize { colors: 16, dither: false }),
    &["+dither", "-colors", "16"]
)]
#[case(
    Operation::Border(Border { width: 4, color: Color::rgb(255, 0, 0) }),
    &["-bordercolor", "rgba(255,0,0,1)", "-border", "4"]
)]
#[case(
    Operation::Frame(Frame { width: 12, color: Color::BLACK, inner_bevel: 2, outer_bevel: 3 }),
    &["-mattecolor", "rgba(0,0,0,1)", "-frame", "12x12+3+2"]
)]
#[case(
    Operation::Colorize(ColorAmount { color: Color::rgb(0, 0, 255), amount: 30.0 }),
    &["-fill", "rgba(0,0,255,1)", "-colorize", "30%"]
)]
fn operations_translate_to_arguments(#[case] op: Operation, #[case] expected: &[&str]) {
    assert_eq!(magick_args(&op).unwrap(), expected);
}

#[rstest]
#[case(Fit::Fill, "-resize", "40x30!")]
#[case(Fit::Inside, "-resize", "40x30")]
#[case(Fit::Cover, "-resize", "40x30^")]
fn resize_geometry_follows_fit(#[case] fit: Fit, #[case] flag: &str, #[case] geometry: &str) {
    let args = magick_args(&Operation::Resize(Resize {
        width: Some(40),
        height: Some(30),
        fit,
        ..Resize::default()
    }))
    .unwrap();
    assert_eq!(&args[..2], &["-filter", "Lanczos"]);
    assert_eq!(args[2], flag);
    assert_eq!(args[3], geometry);
}

#[test]
fn distort_bestfit_uses_plus_form() {
    let args = magick_args(&Operation::Distort(Distort {
        method: DistortMethod::ScaleRotateTranslate,
        args: vec![1.0, 30.0],
        bestfit: true,
    }))
    .unwrap();
    assert_eq!(args, ["+distort", "SRT", "1 30"]);
}

#[test]
fn every_handled_tag_has_a_translation() {
    for &tag in OpTag::ALL {
        if !MagickBackend::handles(tag) {
            continue;
        }
        let op: Operation = serde_json::from_value(serde_json::json!({ "op": tag.as_str() }))
            .unwrap_or_else(|e| panic!("default {tag} should deserialize: {e}"));
        let op = match op {
            Operation::Resize(_) => Operation::Resize(Resize {
                width: Some(10),
                ..Resize::default()
            }),
            Operation::Distort(_) => Operation::Distort(Distort {
                args: vec![0.0],
                ..Distort::default()
            }),
            other => other,
        };
        assert!(!magick_args(&op).unwrap().is_empty(), "{tag}");
    }
}

#[test]
fn crop_is_left_to_the_raster_backend() {
    let err = magick_args(&Operation::Crop(Crop::default())).unwrap_err();
    assert_eq!(err.op_tag(), Some("crop"));
}

#[test]
fn missing_binary_is_unavailable() {
    let backend = MagickBackend::new(MagickOpts {
        binary: Some(PathBuf::from("/nonexistent/tessera-magick")),
        ..MagickOpts::default()
    });
    assert!(!backend.is_available());
    let err = backend.apply_batch(&[], &[Operation::Flip]).unwrap_err();
    assert!(err.is_backend_failure());
}

#[cfg(unix)]
mod process {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_binary(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-magick");
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then exit 0; fi\n{body}\n"
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn backend(exe: PathBuf, timeout_ms: u64, max_output_bytes: u64) -> MagickBackend {
        MagickBackend::new(MagickOpts {
            binary: Some(exe),
            timeout_ms,
            max_output_bytes,
        })
    }

    const COPY: &str = "in=\"$1\"\nfor last; do :; done\ncp \"$in\" \"${last#PNG32:}\"";

    #[test]
    fn output_bytes_come_back() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_binary(dir.path(), COPY);
        let b = backend(exe, 10_000, 1 << 20);
        assert!(b.is_available());
        let out = b.apply_batch(b"not-really-png", &[Operation::Flip]).unwrap();
        assert_eq!(out, b"not-really-png");
    }

    #[test]
    fn nonzero_exit_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_binary(dir.path(), "echo 'no decode delegate' >&2\nexit 3");
        let err = backend(exe, 10_000, 1 << 20)
            .apply_batch(b"x", &[Operation::Flip])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no decode delegate"), "{msg}");
    }

    #[test]
    fn slow_process_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_binary(dir.path(), "sleep 5");
        let err = backend(exe, 100, 1 << 20)
            .apply_batch(b"x", &[Operation::Flip])
            .unwrap_err();
        assert!(matches!(err, TesseraError::BackendTimeout { after_ms: 100, .. }));
    }

    #[test]
    fn oversized_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_binary(dir.path(), COPY);
        let err = backend(exe, 10_000, 4)
            .apply_batch(b"0123456789", &[Operation::Flip])
            .unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn abandoned_child_is_killed_and_reaped() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        abandon(&mut child);
        let status = child.try_wait().unwrap().expect("child reaped");
        assert!(!status.success());
    }
}
