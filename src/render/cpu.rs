use std::{collections::HashMap, sync::Arc};

use kurbo::Shape;

use crate::{
    assets::store::PreparedImage,
    foundation::{
        core::{Affine, Point, Rect, Rgba8},
        error::{StoryError, StoryResult},
    },
    render::{
        frame::FrameRGBA,
        surface::{Surface, TextStyle},
    },
    text::{
        layout::{TextBrushRgba8, TextLayoutEngine},
        wrap::{FixedAdvance, TextMeasure},
    },
};

const IMAGE_CACHE_CAP: usize = 64;

struct ImagePaint {
    // Keeps the keyed allocation alive so its address cannot be reused.
    _source: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

struct FontFace {
    engine: TextLayoutEngine,
    data: vello_cpu::peniko::FontData,
}

/// CPU raster surface backed by `vello_cpu`, with Parley-shaped text.
///
/// Draw calls between [`CpuSurface::begin_frame`] and [`CpuSurface::finish_frame`] are recorded
/// into one render context and rasterized at the end of the frame into premultiplied RGBA8.
pub struct CpuSurface {
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    current: Affine,
    stack: Vec<Affine>,
    font: Option<FontFace>,
    fallback_measure: FixedAdvance,
    warned_no_font: bool,
    images: HashMap<usize, ImagePaint>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("has_font", &self.font.is_some())
            .field("cached_images", &self.images.len())
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    /// Surface of `width`x`height` pixels. Text is measured approximately and not drawn until a
    /// font is installed.
    pub fn new(width: u32, height: u32) -> StoryResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| StoryError::validation("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| StoryError::validation("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(StoryError::validation("surface size must be non-zero"));
        }
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            current: Affine::IDENTITY,
            stack: Vec::new(),
            font: None,
            fallback_measure: FixedAdvance::default(),
            warned_no_font: false,
            images: HashMap::new(),
        })
    }

    /// Replace the font used for measuring and drawing text.
    pub fn set_text_engine(&mut self, engine: TextLayoutEngine) {
        let bytes = engine.font_bytes().as_ref().clone();
        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        self.font = Some(FontFace { engine, data });
        self.warned_no_font = false;
    }

    /// Whether text is rendered with a real font.
    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Start recording a new frame.
    pub fn begin_frame(&mut self) {
        self.ctx.reset();
        self.current = Affine::IDENTITY;
        self.stack.clear();
    }

    /// Rasterize everything drawn since `begin_frame`.
    pub fn finish_frame(&mut self) -> FrameRGBA {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        FrameRGBA {
            width: u32::from(self.pixmap.width()),
            height: u32::from(self.pixmap.height()),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn image_paint(&mut self, image: &PreparedImage) -> StoryResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&image.rgba8_premul) as usize;
        if let Some(p) = self.images.get(&key) {
            return Ok(p.paint.clone());
        }
        if self.images.len() >= IMAGE_CACHE_CAP {
            self.images.clear();
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.images.insert(
            key,
            ImagePaint {
                _source: image.rgba8_premul.clone(),
                paint: paint.clone(),
            },
        );
        Ok(paint)
    }
}

impl TextMeasure for CpuSurface {
    fn measure(&mut self, text: &str, size_px: f32) -> f64 {
        match self.font.as_mut() {
            Some(face) => face.engine.measure(text, size_px),
            None => self.fallback_measure.measure(text, size_px),
        }
    }
}

impl Surface for CpuSurface {
    fn size(&self) -> (u32, u32) {
        (
            u32::from(self.pixmap.width()),
            u32::from(self.pixmap.height()),
        )
    }

    fn clear(&mut self, color: Rgba8) {
        let (w, h) = self.size();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h)));
    }

    fn save(&mut self) {
        self.stack.push(self.current);
    }

    fn restore(&mut self) {
        self.current = self.stack.pop().unwrap_or(Affine::IDENTITY);
    }

    fn transform(&mut self, affine: Affine) {
        self.current *= affine;
    }

    fn draw_image(&mut self, image: &PreparedImage, dst: Rect) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        let paint = match self.image_paint(image) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "skipping undrawable image");
                return;
            }
        };
        let (iw, ih) = (f64::from(image.width), f64::from(image.height));
        let tr = self.current
            * Affine::translate((dst.x0, dst.y0))
            * Affine::scale_non_uniform(dst.width() / iw, dst.height() / ih);
        self.ctx.set_transform(affine_to_cpu(tr));
        self.ctx.set_paint(paint);
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.ctx.set_transform(affine_to_cpu(self.current));
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            rect.x0, rect.y0, rect.x1, rect.y1,
        ));
    }

    fn fill_rounded_rect(&mut self, rect: Rect, radius: f64, color: Rgba8) -> bool {
        let rr = kurbo::RoundedRect::from_rect(rect, radius);
        let mut p = vello_cpu::kurbo::BezPath::new();
        for el in rr.path_elements(0.1) {
            p.push(el);
        }
        self.ctx.set_transform(affine_to_cpu(self.current));
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.fill_path(&p);
        true
    }

    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        let Some(face) = self.font.as_mut() else {
            if !self.warned_no_font {
                tracing::warn!("no font configured; subtitle text is not drawn");
                self.warned_no_font = true;
            }
            return;
        };
        let brush = TextBrushRgba8 {
            r: style.color.r,
            g: style.color.g,
            b: style.color.b,
            a: style.color.a,
        };
        let layout = match face.engine.layout_line(text, style.size_px, brush) {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(error = %e, "text layout failed");
                return;
            }
        };

        let tr = self.current * Affine::translate((origin.x, origin.y));
        self.ctx.set_transform(affine_to_cpu(tr));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&face.data)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }
}

fn to_cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> StoryResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StoryError::asset("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StoryError::asset("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(StoryError::asset("image byte length does not match its size"));
    }
    let mut may_have_opacities = false;
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
