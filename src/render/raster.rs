use kurbo::{Affine, BezPath, PathEl};

use crate::foundation::core::{Coverage, Raster};
use crate::foundation::error::{TesseraError, TesseraResult};

/// A `vello_cpu` render target sized in pixels.
pub(crate) struct Surface {
    pub(crate) ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
}

impl Surface {
    pub(crate) fn new(width: u32, height: u32) -> TesseraResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| TesseraError::render(format!("surface width {width} exceeds u16")))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| TesseraError::render(format!("surface height {height} exceeds u16")))?;
        if w == 0 || h == 0 {
            return Err(TesseraError::render("surface dimensions must be non-zero"));
        }
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(Self {
            ctx,
            width: w,
            height: h,
        })
    }

    /// Fill with a straight-alpha RGBA8 color.
    pub(crate) fn fill_path(&mut self, path: &BezPath, transform: Affine, rgba: [u8; 4]) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    pub(crate) fn finish(mut self) -> TesseraResult<Raster> {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);
        Raster::from_premul(
            u32::from(self.width),
            u32::from(self.height),
            pixmap.data_as_u8_slice().to_vec(),
        )
    }
}

/// Anti-aliased nonzero coverage of `path` under `transform`.
pub fn path_coverage(
    path: &BezPath,
    width: u32,
    height: u32,
    transform: Affine,
) -> TesseraResult<Coverage> {
    let mut surface = Surface::new(width, height)?;
    surface.fill_path(path, transform, [255, 255, 255, 255]);
    Ok(surface.finish()?.alpha())
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
