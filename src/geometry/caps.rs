use kurbo::{BezPath, Circle, Point, Shape as _, Vec2};
use serde::{Deserialize, Serialize};

/// Glyph drawn at a line endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineCap {
    #[default]
    None,
    Arrow,
    ArrowFilled,
    Circle,
    CircleFilled,
    Square,
}

/// Cap outline plus whether it is filled (otherwise stroked at the line width).
#[derive(Debug, Clone, PartialEq)]
pub struct CapGlyph {
    pub path: BezPath,
    pub filled: bool,
}

pub(crate) fn cap_size(stroke_width: f64) -> f64 {
    (stroke_width * 3.0).max(4.0)
}

/// How far a cap can reach past its endpoint.
pub fn cap_extent(cap: LineCap, stroke_width: f64) -> f64 {
    match cap {
        LineCap::None => 0.0,
        _ => cap_size(stroke_width) + stroke_width / 2.0,
    }
}

/// Glyph at `tip`, oriented along `dir` (pointing away from the line body).
pub fn cap_glyph(cap: LineCap, tip: Point, dir: Vec2, stroke_width: f64) -> Option<CapGlyph> {
    let dir = if dir.hypot() > f64::EPSILON {
        dir.normalize()
    } else {
        Vec2::new(1.0, 0.0)
    };
    let normal = Vec2::new(-dir.y, dir.x);
    let size = cap_size(stroke_width);

    let arrow = |closed: bool| {
        let back = tip - dir * size;
        let mut p = BezPath::new();
        p.move_to(back + normal * (size * 0.5));
        p.line_to(tip);
        p.line_to(back - normal * (size * 0.5));
        if closed {
            p.close_path();
        }
        p
    };

    match cap {
        LineCap::None => None,
        LineCap::Arrow => Some(CapGlyph {
            path: arrow(false),
            filled: false,
        }),
        LineCap::ArrowFilled => Some(CapGlyph {
            path: arrow(true),
            filled: true,
        }),
        LineCap::Circle | LineCap::CircleFilled => Some(CapGlyph {
            path: Circle::new(tip, size / 2.0).to_path(0.1),
            filled: cap == LineCap::CircleFilled,
        }),
        LineCap::Square => {
            let h = size / 2.0;
            let mut p = BezPath::new();
            p.move_to(tip + dir * h + normal * h);
            p.line_to(tip + dir * h - normal * h);
            p.line_to(tip - dir * h - normal * h);
            p.line_to(tip - dir * h + normal * h);
            p.close_path();
            Some(CapGlyph {
                path: p,
                filled: true,
            })
        }
    }
}
