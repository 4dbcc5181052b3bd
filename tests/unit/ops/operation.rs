use rstest::rstest;

use super::*;
use crate::geometry::Shape;
use crate::layout::placement::Position;

#[test]
fn tags_are_unique_and_kebab_case() {
    let mut seen = std::collections::HashSet::new();
    for tag in OpTag::ALL {
        let s = tag.as_str();
        assert!(seen.insert(s), "duplicate tag {s}");
        assert!(s.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
        let json = serde_json::to_string(tag).unwrap();
        assert_eq!(json, format!("\"{s}\""));
    }
    assert_eq!(OpTag::ALL.len(), 46);
}

#[test]
fn operations_round_trip_through_json_with_their_tag() {
    let ops = vec![
        Operation::Grayscale,
        Operation::Blur(Blur { sigma: 3.0 }),
        Operation::Resize(Resize {
            width: Some(100),
            ..Resize::default()
        }),
        Operation::RegionBlur(RegionBlur::new(vec![
            Position::new(0, 0),
            Position::new(10, 0),
            Position::new(10, 10),
        ])),
    ];
    for op in ops {
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], op.tag().as_str());
        let back: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }
}

#[test]
fn params_default_when_omitted() {
    let op: Operation = serde_json::from_str(r#"{"op":"gamma"}"#).unwrap();
    assert_eq!(op, Operation::Gamma(Gamma { value: 1.0 }));
    let op: Operation = serde_json::from_str(r#"{"op":"motion-blur","angle":45}"#).unwrap();
    let Operation::MotionBlur(m) = op else { panic!("wrong variant") };
    assert_eq!((m.sigma, m.angle), (8.0, 45.0));
}

#[rstest]
#[case(Operation::Gamma(Gamma { value: 0.0 }), "gamma")]
#[case(Operation::Posterize(Posterize { levels: 1 }), "posterize")]
#[case(Operation::Blur(Blur { sigma: f64::NAN }), "blur")]
#[case(Operation::Resize(Resize::default()), "resize")]
#[case(Operation::Level(Level { black: 60.0, white: 40.0, gamma: 1.0 }), "level")]
#[case(Operation::Border(Border { width: 0, ..Border::default() }), "border")]
#[case(Operation::RegionBlur(RegionBlur::default()), "region-blur")]
#[case(Operation::Overlay(Box::new(Layer::new(Shape::star(2, 10.0)))), "overlay")]
fn invalid_params_name_the_operation(#[case] op: Operation, #[case] tag: &str) {
    let err = op.validate().unwrap_err();
    assert_eq!(err.op_tag(), Some(tag));
}

#[test]
fn composite_ops_are_flagged() {
    assert!(Operation::Group(Group::default()).is_composite());
    assert!(!Operation::Negate.is_composite());
}
