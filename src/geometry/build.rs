use std::f64::consts::{FRAC_PI_2, PI, TAU};

use kurbo::{
    Affine, Arc, BezPath, Ellipse, Point, Rect, RoundedRect, RoundedRectRadii, Shape as _,
    Vec2,
};

use crate::foundation::error::TesseraResult;
use crate::geometry::caps::{LineCap, cap_extent};
use crate::geometry::shape::{ArcSpec, BooleanOp, ShapeKind};

const TOLERANCE: f64 = 0.1;

/// Outline of a shape in its normalized frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Path(BezPath),
    /// Set operation applied on coverage at rasterization time.
    Boolean {
        op: BooleanOp,
        a: Box<Geometry>,
        b: Box<Geometry>,
        a_offset: Vec2,
        b_offset: Vec2,
    },
}

/// Line endpoints in the normalized frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineEnds {
    pub start: Point,
    pub end: Point,
    pub start_cap: LineCap,
    pub end_cap: LineCap,
}

impl LineEnds {
    pub fn cap_extent(&self, stroke_width: f64) -> f64 {
        cap_extent(self.start_cap, stroke_width).max(cap_extent(self.end_cap, stroke_width))
    }
}

/// Normalized geometry: tight bounds start at the origin and span `width x height`.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub outline: Outline,
    pub width: f64,
    pub height: f64,
    /// `false` disables fill (open vectors and lines).
    pub closed: bool,
    pub line: Option<LineEnds>,
}

impl Geometry {
    pub fn path(&self) -> Option<&BezPath> {
        match &self.outline {
            Outline::Path(p) => Some(p),
            Outline::Boolean { .. } => None,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Build normalized geometry for a shape kind.
pub fn build_geometry(kind: &ShapeKind) -> TesseraResult<Geometry> {
    match kind {
        ShapeKind::Rect {
            width,
            height,
            radius,
        } => {
            let limit = width.min(*height) / 2.0;
            let [tl, tr, br, bl] = radius.corners().map(|r| r.clamp(0.0, limit.max(0.0)));
            let rr = RoundedRect::from_rect(
                Rect::new(0.0, 0.0, *width, *height),
                RoundedRectRadii::new(tl, tr, br, bl),
            );
            Ok(closed_path(rr.to_path(TOLERANCE)))
        }
        ShapeKind::Ellipse { width, height, arc } => {
            let radii = Vec2::new(width / 2.0, height / 2.0);
            let center = Point::new(radii.x, radii.y);
            let path = match arc {
                None => Ellipse::new(center, radii, 0.0).to_path(TOLERANCE),
                Some(arc) => arc_slice(center, radii, arc)?,
            };
            Ok(closed_path(path))
        }
        ShapeKind::Line {
            from,
            to,
            start_cap,
            end_cap,
        } => {
            let mut p = BezPath::new();
            p.move_to(*from);
            p.line_to(*to);
            let (path, shift, width, height) = normalize(p);
            Ok(Geometry {
                outline: Outline::Path(path),
                width,
                height,
                closed: false,
                line: Some(LineEnds {
                    start: *from + shift,
                    end: *to + shift,
                    start_cap: *start_cap,
                    end_cap: *end_cap,
                }),
            })
        }
        ShapeKind::Polygon {
            sides,
            radius,
            rotation,
        } => {
            let n = *sides as usize;
            let half_step = if n % 2 == 0 { PI / n as f64 } else { 0.0 };
            let base = -FRAC_PI_2 + rotation.to_radians() + half_step;
            let pts = (0..n).map(|i| {
                let a = base + i as f64 * TAU / n as f64;
                Point::new(radius + radius * a.cos(), radius + radius * a.sin())
            });
            Ok(closed_path(polyline(pts)))
        }
        ShapeKind::Star {
            points,
            radius,
            inner_ratio,
            rotation,
        } => {
            let n = (*points as usize) * 2;
            let inner = radius * inner_ratio;
            let base = -FRAC_PI_2 + rotation.to_radians();
            let pts = (0..n).map(|i| {
                let a = base + i as f64 * TAU / n as f64;
                let r = if i % 2 == 0 { *radius } else { inner };
                Point::new(radius + r * a.cos(), radius + r * a.sin())
            });
            Ok(closed_path(polyline(pts)))
        }
        ShapeKind::Vector { path, closed } => {
            let (p, _, width, height) = normalize(path.to_bezpath()?);
            Ok(Geometry {
                outline: Outline::Path(p),
                width,
                height,
                closed: *closed,
                line: None,
            })
        }
        ShapeKind::Boolean { op, a, b, offset } => {
            let ga = build_geometry(&a.kind)?;
            let gb = build_geometry(&b.kind)?;
            let (dx, dy) = *offset;
            let min_x = 0.0f64.min(dx);
            let min_y = 0.0f64.min(dy);
            let max_x = ga.width.max(dx + gb.width);
            let max_y = ga.height.max(dy + gb.height);
            Ok(Geometry {
                outline: Outline::Boolean {
                    op: *op,
                    a_offset: Vec2::new(-min_x, -min_y),
                    b_offset: Vec2::new(dx - min_x, dy - min_y),
                    a: Box::new(ga),
                    b: Box::new(gb),
                },
                width: dimension(max_x - min_x),
                height: dimension(max_y - min_y),
                closed: true,
                line: None,
            })
        }
    }
}

fn closed_path(path: BezPath) -> Geometry {
    let (path, _, width, height) = normalize(path);
    Geometry {
        outline: Outline::Path(path),
        width,
        height,
        closed: true,
        line: None,
    }
}

fn dimension(v: f64) -> f64 {
    if v.is_finite() && v >= 1.0 { v } else { 1.0 }
}

/// Translate so the tight bounds start at the origin. Degenerate axes become 1px.
pub(crate) fn normalize(path: BezPath) -> (BezPath, Vec2, f64, f64) {
    if path.elements().is_empty() {
        return (path, Vec2::ZERO, 1.0, 1.0);
    }
    let bb = path.bounding_box();
    if !(bb.x0.is_finite() && bb.y0.is_finite() && bb.x1.is_finite() && bb.y1.is_finite()) {
        return (path, Vec2::ZERO, 1.0, 1.0);
    }
    let shift = Vec2::new(-bb.x0, -bb.y0);
    let moved = Affine::translate(shift) * path;
    (moved, shift, dimension(bb.width()), dimension(bb.height()))
}

fn polyline(points: impl Iterator<Item = Point>) -> BezPath {
    let mut p = BezPath::new();
    for (i, pt) in points.enumerate() {
        if i == 0 {
            p.move_to(pt);
        } else {
            p.line_to(pt);
        }
    }
    p.close_path();
    p
}

fn arc_slice(center: Point, radii: Vec2, arc: &ArcSpec) -> TesseraResult<BezPath> {
    let start = arc.start.to_radians()?;
    let end = arc.end.to_radians()?;
    let mut sweep = end - start;
    if sweep.abs() >= TAU || sweep == 0.0 {
        sweep = TAU;
    }
    let on_ellipse =
        |r: Vec2, a: f64| Point::new(center.x + r.x * a.cos(), center.y + r.y * a.sin());

    let outer = Arc::new(center, radii, start, sweep, 0.0);
    let mut p = BezPath::new();
    if arc.inner_ratio <= 0.0 {
        p.move_to(center);
        p.line_to(on_ellipse(radii, start));
        p.extend(outer.append_iter(TOLERANCE));
        p.close_path();
    } else {
        let inner_r = radii * arc.inner_ratio;
        p.move_to(on_ellipse(radii, start));
        p.extend(outer.append_iter(TOLERANCE));
        p.line_to(on_ellipse(inner_r, start + sweep));
        let inner = Arc::new(center, inner_r, start + sweep, -sweep, 0.0);
        p.extend(inner.append_iter(TOLERANCE));
        p.close_path();
    }
    Ok(p)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/build.rs"]
mod tests;
