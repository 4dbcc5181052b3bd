use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};

use crate::foundation::color::Paint;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::geometry::angle::AngleValue;
use crate::geometry::caps::LineCap;
use crate::style::{Effect, ShapeStyle, Stroke};

/// Corner radii of a rectangle: one value for all corners or one per corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CornerRadius {
    Uniform(f64),
    PerCorner { tl: f64, tr: f64, br: f64, bl: f64 },
}

impl Default for CornerRadius {
    fn default() -> Self {
        Self::Uniform(0.0)
    }
}

impl CornerRadius {
    /// `[tl, tr, br, bl]`
    pub fn corners(&self) -> [f64; 4] {
        match *self {
            Self::Uniform(r) => [r; 4],
            Self::PerCorner { tl, tr, br, bl } => [tl, tr, br, bl],
        }
    }
}

/// Pie or donut slice of an ellipse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSpec {
    pub start: AngleValue,
    pub end: AngleValue,
    /// Inner radius as a fraction of the outer one; 0 closes the wedge through the center.
    #[serde(default)]
    pub inner_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum Segment {
    Move { x: f64, y: f64 },
    Line { x: f64, y: f64 },
    Quad { x1: f64, y1: f64, x: f64, y: f64 },
    Cubic {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSource {
    Svg(String),
    Segments(Vec<Segment>),
}

impl PathSource {
    pub fn to_bezpath(&self) -> TesseraResult<BezPath> {
        match self {
            PathSource::Svg(d) => BezPath::from_svg(d.trim())
                .map_err(|e| TesseraError::resolution(format!("invalid svg path data: {e}"))),
            PathSource::Segments(segs) => {
                let mut p = BezPath::new();
                let mut open = false;
                for s in segs {
                    match *s {
                        Segment::Move { x, y } => {
                            p.move_to((x, y));
                            open = true;
                            continue;
                        }
                        Segment::Close => {
                            if open {
                                p.close_path();
                            }
                            open = false;
                            continue;
                        }
                        _ if !open => {
                            return Err(TesseraError::resolution(
                                "path segment list must start with a move",
                            ));
                        }
                        Segment::Line { x, y } => p.line_to((x, y)),
                        Segment::Quad { x1, y1, x, y } => p.quad_to((x1, y1), (x, y)),
                        Segment::Cubic {
                            x1,
                            y1,
                            x2,
                            y2,
                            x,
                            y,
                        } => p.curve_to((x1, y1), (x2, y2), (x, y)),
                    }
                }
                Ok(p)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
    Exclude,
}

impl BooleanOp {
    /// Combine two coverage samples.
    pub fn combine(self, a: u8, b: u8) -> u8 {
        let (a16, b16) = (u16::from(a), u16::from(b));
        let mul = |x: u16, y: u16| (((u32::from(x) * u32::from(y)) + 127) / 255) as u16;
        match self {
            BooleanOp::Union => (a16 + b16 - mul(a16, b16)) as u8,
            BooleanOp::Subtract => mul(a16, 255 - b16) as u8,
            BooleanOp::Intersect => mul(a16, b16) as u8,
            BooleanOp::Exclude => (a16 + b16 - 2 * mul(a16, b16)) as u8,
        }
    }
}

/// Closed set of shape kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ShapeKind {
    Ellipse {
        width: f64,
        height: f64,
        #[serde(default)]
        arc: Option<ArcSpec>,
    },
    Rect {
        width: f64,
        height: f64,
        #[serde(default)]
        radius: CornerRadius,
    },
    Line {
        from: Point,
        to: Point,
        #[serde(default)]
        start_cap: LineCap,
        #[serde(default)]
        end_cap: LineCap,
    },
    Polygon {
        sides: u32,
        radius: f64,
        #[serde(default)]
        rotation: f64,
    },
    Star {
        points: u32,
        radius: f64,
        #[serde(default = "default_inner_ratio")]
        inner_ratio: f64,
        #[serde(default)]
        rotation: f64,
    },
    Vector {
        path: PathSource,
        #[serde(default = "default_closed")]
        closed: bool,
    },
    Boolean {
        op: BooleanOp,
        a: Box<Shape>,
        b: Box<Shape>,
        /// Offset of operand `b` relative to operand `a`.
        #[serde(default)]
        offset: (f64, f64),
    },
}

impl ShapeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ellipse { .. } => "ellipse",
            Self::Rect { .. } => "rect",
            Self::Line { .. } => "line",
            Self::Polygon { .. } => "polygon",
            Self::Star { .. } => "star",
            Self::Vector { .. } => "vector",
            Self::Boolean { .. } => "boolean",
        }
    }
}

pub const DEFAULT_STAR_INNER_RATIO: f64 = 0.382;

fn default_inner_ratio() -> f64 {
    DEFAULT_STAR_INNER_RATIO
}

fn default_closed() -> bool {
    true
}

/// Geometry plus style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    #[serde(default)]
    pub style: ShapeStyle,
}

impl Shape {
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            style: ShapeStyle::default(),
        }
    }

    pub fn ellipse(width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Ellipse {
            width,
            height,
            arc: None,
        })
    }

    pub fn arc(width: f64, height: f64, arc: ArcSpec) -> Self {
        Self::new(ShapeKind::Ellipse {
            width,
            height,
            arc: Some(arc),
        })
    }

    pub fn rect(width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Rect {
            width,
            height,
            radius: CornerRadius::default(),
        })
    }

    pub fn rounded_rect(width: f64, height: f64, radius: CornerRadius) -> Self {
        Self::new(ShapeKind::Rect {
            width,
            height,
            radius,
        })
    }

    pub fn line(from: impl Into<Point>, to: impl Into<Point>) -> Self {
        Self::new(ShapeKind::Line {
            from: from.into(),
            to: to.into(),
            start_cap: LineCap::None,
            end_cap: LineCap::None,
        })
    }

    pub fn polygon(sides: u32, radius: f64) -> Self {
        Self::new(ShapeKind::Polygon {
            sides,
            radius,
            rotation: 0.0,
        })
    }

    pub fn star(points: u32, radius: f64) -> Self {
        Self::new(ShapeKind::Star {
            points,
            radius,
            inner_ratio: DEFAULT_STAR_INNER_RATIO,
            rotation: 0.0,
        })
    }

    pub fn svg_path(d: impl Into<String>) -> Self {
        Self::new(ShapeKind::Vector {
            path: PathSource::Svg(d.into()),
            closed: true,
        })
    }

    pub fn segments(segments: Vec<Segment>, closed: bool) -> Self {
        Self::new(ShapeKind::Vector {
            path: PathSource::Segments(segments),
            closed,
        })
    }

    pub fn boolean(op: BooleanOp, a: Shape, b: Shape) -> Self {
        Self::new(ShapeKind::Boolean {
            op,
            a: Box::new(a),
            b: Box::new(b),
            offset: (0.0, 0.0),
        })
    }

    pub fn union(a: Shape, b: Shape) -> Self {
        Self::boolean(BooleanOp::Union, a, b)
    }

    pub fn subtract(a: Shape, b: Shape) -> Self {
        Self::boolean(BooleanOp::Subtract, a, b)
    }

    pub fn intersect(a: Shape, b: Shape) -> Self {
        Self::boolean(BooleanOp::Intersect, a, b)
    }

    pub fn exclude(a: Shape, b: Shape) -> Self {
        Self::boolean(BooleanOp::Exclude, a, b)
    }

    /// Offset of operand `b` for boolean shapes; no effect on other kinds.
    pub fn with_operand_offset(mut self, dx: f64, dy: f64) -> Self {
        if let ShapeKind::Boolean { offset, .. } = &mut self.kind {
            *offset = (dx, dy);
        }
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        match &mut self.kind {
            ShapeKind::Polygon { rotation, .. } | ShapeKind::Star { rotation, .. } => {
                *rotation = degrees;
            }
            _ => {}
        }
        self
    }

    pub fn with_inner_ratio(mut self, ratio: f64) -> Self {
        if let ShapeKind::Star { inner_ratio, .. } = &mut self.kind {
            *inner_ratio = ratio;
        }
        self
    }

    pub fn with_caps(mut self, start: LineCap, end: LineCap) -> Self {
        if let ShapeKind::Line {
            start_cap,
            end_cap,
            ..
        } = &mut self.kind
        {
            *start_cap = start;
            *end_cap = end;
        }
        self
    }

    pub fn fill(mut self, paint: impl Into<Paint>) -> Self {
        self.style.fill = Some(paint.into());
        self
    }

    pub fn stroke(mut self, stroke: Stroke) -> Self {
        self.style.stroke = Some(stroke);
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.style.effects.push(effect);
        self
    }

    /// Check numeric invariants; errors carry the tag of the recording operation.
    pub fn validate(&self, op: &'static str) -> TesseraResult<()> {
        validate_kind(&self.kind, op)?;
        self.style.validate(op)
    }
}

fn positive(v: f64, what: &str, op: &'static str) -> TesseraResult<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(TesseraError::validation(op, format!("{what} must be > 0 (got {v})")))
    }
}

fn validate_kind(kind: &ShapeKind, op: &'static str) -> TesseraResult<()> {
    match kind {
        ShapeKind::Ellipse { width, height, arc } => {
            positive(*width, "ellipse width", op)?;
            positive(*height, "ellipse height", op)?;
            if let Some(arc) = arc {
                if !(0.0..1.0).contains(&arc.inner_ratio) {
                    return Err(TesseraError::validation(
                        op,
                        "arc inner ratio must be within [0, 1)",
                    ));
                }
                arc.start.validate(op)?;
                arc.end.validate(op)?;
            }
            Ok(())
        }
        ShapeKind::Rect {
            width,
            height,
            radius,
        } => {
            positive(*width, "rect width", op)?;
            positive(*height, "rect height", op)?;
            if radius.corners().iter().any(|r| !r.is_finite() || *r < 0.0) {
                return Err(TesseraError::validation(op, "corner radii must be >= 0"));
            }
            Ok(())
        }
        ShapeKind::Line { from, to, .. } => {
            if !(from.is_finite() && to.is_finite()) {
                return Err(TesseraError::validation(op, "line endpoints must be finite"));
            }
            Ok(())
        }
        ShapeKind::Polygon {
            sides,
            radius,
            rotation,
        } => {
            if *sides < 3 {
                return Err(TesseraError::validation(op, "polygon needs at least 3 sides"));
            }
            positive(*radius, "polygon radius", op)?;
            finite(*rotation, "polygon rotation", op)
        }
        ShapeKind::Star {
            points,
            radius,
            inner_ratio,
            rotation,
        } => {
            if *points < 3 {
                return Err(TesseraError::validation(op, "star needs at least 3 points"));
            }
            positive(*radius, "star radius", op)?;
            if !(*inner_ratio > 0.0 && *inner_ratio < 1.0) {
                return Err(TesseraError::validation(
                    op,
                    "star inner ratio must be within (0, 1)",
                ));
            }
            finite(*rotation, "star rotation", op)
        }
        ShapeKind::Vector { path, .. } => {
            let empty = match path {
                PathSource::Svg(d) => d.trim().is_empty(),
                PathSource::Segments(s) => s.is_empty(),
            };
            if empty {
                return Err(TesseraError::validation(op, "vector path must not be empty"));
            }
            path.to_bezpath()
                .map(|_| ())
                .map_err(|e| TesseraError::validation(op, e.to_string()))
        }
        ShapeKind::Boolean { a, b, offset, .. } => {
            finite(offset.0, "boolean offset", op)?;
            finite(offset.1, "boolean offset", op)?;
            validate_kind(&a.kind, op)?;
            validate_kind(&b.kind, op)
        }
    }
}

fn finite(v: f64, what: &str, op: &'static str) -> TesseraResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(TesseraError::validation(op, format!("{what} must be finite")))
    }
}
