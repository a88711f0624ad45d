//! CPU rasterizer for render pass lists.
//!
//! Frames follow `begin_frame → draw_frame → finish_frame → swap_buffers`, with
//! `receive_swap_buffers_ack` arriving later to hand the frame buffer back. Each quad is
//! painted with `vello_cpu` into a scratch pixmap covering its clipped device bounds, then
//! composited into the pass target with the quad's opacity and blend mode.

use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8};
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::foundation::geometry::{IntRect, IntSize, scale_rect_proportional};
use crate::foundation::transform::{
    is_scale_and_integer_translate, is_scale_translate, map_rect_bbox,
};
use crate::frame::{
    CompositorFrame, CompositorFrameAck, FrameMetadata, FramePayload, OutputSurface,
    SoftwareFrameData,
};
use crate::quad::{
    BlendMode, DebugBorderMaterial, Material, Quad, RenderPassMaterial, SharedQuadState,
    TextureMaterial, TileMaterial,
};
use crate::render::composite::{
    CompositeOp, clear_rect, composite_region, mask_apply_alpha_in_place, pixmap_bounds,
};
use crate::render::filters::apply_filters;
use crate::render::output_device::SoftwareOutputDevice;
use crate::render::settings::RendererSettings;
use crate::render::surface_pool::{SurfaceDesc, SurfacePool, SurfacePoolStats};
use crate::render_pass::{CopyOutputResult, RenderPass, RenderPassId, RenderPassList};
use crate::resources::{Bitmap, ResourceTable, WrapMode};

/// Counters for one `draw_frame` call.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct DrawStats {
    /// Passes rasterized.
    pub passes_drawn: u32,
    /// Quads that touched their target.
    pub quads_drawn: u32,
    /// Quads skipped: empty, clipped away, or missing a resource.
    pub quads_skipped: u32,
    /// Quads painted with the sentinel color.
    pub sentinel_quads: u32,
    /// Quads drawn with anti-aliased edges.
    pub antialiased_quads: u32,
    /// Quads composited with blending rather than overwritten.
    pub blended_quads: u32,
    /// Copy requests answered with pixels.
    pub copy_requests_fulfilled: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameState {
    Idle,
    Drawing { root_damage: IntRect },
    Finished,
}

/// Software compositor: rasterizes pass lists into a persistent root canvas.
pub struct SoftwareRenderer {
    settings: RendererSettings,
    device: SoftwareOutputDevice,
    pool: SurfacePool,
    pass_outputs: HashMap<RenderPassId, Arc<vello_cpu::Pixmap>>,
    state: FrameState,
    pending_frame: Option<SoftwareFrameData>,
}

impl SoftwareRenderer {
    /// Renderer with its own output device.
    pub fn new(settings: RendererSettings) -> Self {
        let device = SoftwareOutputDevice::new(
            settings.partial_swap,
            settings.max_frames_pending,
            settings.pool,
        );
        let pool = SurfacePool::new(settings.pool);
        Self {
            settings,
            device,
            pool,
            pass_outputs: HashMap::new(),
            state: FrameState::Idle,
            pending_frame: None,
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Scratch surface counters.
    pub fn pool_stats(&self) -> SurfacePoolStats {
        self.pool.stats()
    }

    /// Software frames swapped but not acked yet.
    pub fn pending_frames(&self) -> usize {
        self.device.pending_frames()
    }

    /// Start a frame for a `viewport`-sized root target.
    ///
    /// Returns the root region that will be redrawn: `root_damage` under partial swap,
    /// the whole viewport otherwise. Outputs of the previous frame's passes are released.
    pub fn begin_frame(&mut self, viewport: IntSize, root_damage: IntRect) -> TesseraResult<IntRect> {
        if self.state != FrameState::Idle {
            return Err(TesseraError::contract(format!(
                "begin_frame in state {:?}",
                self.state
            )));
        }
        self.recycle_pass_outputs();
        let root_damage = self.device.begin_paint(viewport, root_damage)?;
        self.state = FrameState::Drawing { root_damage };
        Ok(root_damage)
    }

    /// Rasterize every pass in list order; the last pass is the root and lands on the
    /// output canvas. Pending copy requests are answered after their pass is drawn.
    #[tracing::instrument(skip(self, passes, resources), fields(passes = passes.len()))]
    pub fn draw_frame(
        &mut self,
        passes: &mut RenderPassList,
        resources: &ResourceTable,
    ) -> TesseraResult<DrawStats> {
        let FrameState::Drawing { root_damage } = self.state else {
            return Err(TesseraError::contract(format!(
                "draw_frame in state {:?}",
                self.state
            )));
        };
        if cfg!(debug_assertions) {
            passes.validate()?;
        }

        let mut stats = DrawStats::default();
        let count = passes.len();
        for (i, pass) in passes.passes_mut().iter_mut().enumerate() {
            if i + 1 == count {
                self.draw_root_pass(pass, root_damage, resources, &mut stats)?;
            } else {
                self.draw_offscreen_pass(pass, resources, &mut stats)?;
            }
        }

        tracing::debug!(
            passes = stats.passes_drawn,
            quads = stats.quads_drawn,
            skipped = stats.quads_skipped,
            sentinels = stats.sentinel_quads,
            "frame drawn"
        );
        Ok(stats)
    }

    /// Package the root canvas as a software frame.
    pub fn finish_frame(&mut self) -> TesseraResult<SoftwareFrameData> {
        if !matches!(self.state, FrameState::Drawing { .. }) {
            return Err(TesseraError::contract(format!(
                "finish_frame in state {:?}",
                self.state
            )));
        }
        let frame = self.device.end_paint()?;
        self.pending_frame = Some(frame.clone());
        self.state = FrameState::Finished;
        Ok(frame)
    }

    /// Abandon the frame being drawn. The canvas keeps what was painted so far.
    pub fn discard_frame(&mut self) {
        if matches!(self.state, FrameState::Drawing { .. }) {
            self.device.discard_paint();
        }
        if let Some(frame) = self.pending_frame.take() {
            self.device.reclaim(frame.id);
        }
        self.state = FrameState::Idle;
    }

    /// Hand the finished frame to `surface`. Returns the frame id an ack must echo.
    #[tracing::instrument(skip(self, metadata, surface))]
    pub fn swap_buffers(
        &mut self,
        mut metadata: FrameMetadata,
        surface: &mut dyn OutputSurface,
    ) -> TesseraResult<u64> {
        if self.state != FrameState::Finished {
            return Err(TesseraError::contract(format!(
                "swap_buffers in state {:?}",
                self.state
            )));
        }
        let frame = self
            .pending_frame
            .take()
            .ok_or_else(|| TesseraError::contract("no finished frame to swap"))?;
        if metadata.viewport_size.is_empty() {
            metadata.viewport_size = frame.size;
        }
        let id = frame.id;
        self.state = FrameState::Idle;
        surface.swap_buffers(CompositorFrame {
            metadata,
            payload: FramePayload::Software(frame),
        })?;
        Ok(id)
    }

    /// The consumer released a frame; recycle its buffer.
    pub fn receive_swap_buffers_ack(&mut self, ack: &CompositorFrameAck) {
        if let Some(id) = ack.last_software_frame_id {
            self.device.reclaim(id);
        }
    }

    /// Output of a non-root pass drawn in the current frame.
    pub fn pass_output(&self, id: RenderPassId) -> Option<Bitmap> {
        self.pass_outputs
            .get(&id)
            .map(|p| Bitmap::from_pixmap(p.as_ref().clone()))
    }

    fn recycle_pass_outputs(&mut self) {
        for (_, output) in self.pass_outputs.drain() {
            if let Ok(pixmap) = Arc::try_unwrap(output) {
                self.pool.release(pixmap);
            }
        }
    }

    fn draw_root_pass(
        &mut self,
        pass: &mut RenderPass,
        root_damage: IntRect,
        resources: &ResourceTable,
        stats: &mut DrawStats,
    ) -> TesseraResult<()> {
        let canvas = self.device.canvas_mut()?;
        let draw_rect = root_damage
            .intersect(pass.output_rect())
            .intersect(pixmap_bounds(canvas));
        let mut painter = QuadPainter {
            settings: &self.settings,
            pool: &mut self.pool,
            pass_outputs: &self.pass_outputs,
            resources,
            stats: &mut *stats,
        };
        painter.paint_pass(canvas, (0, 0), draw_rect, pass)?;
        fulfill_copy_requests(canvas, (0, 0), pass, stats);
        Ok(())
    }

    fn draw_offscreen_pass(
        &mut self,
        pass: &mut RenderPass,
        resources: &ResourceTable,
        stats: &mut DrawStats,
    ) -> TesseraResult<()> {
        let output = pass.output_rect();
        if output.is_empty() {
            tracing::debug!(pass = %pass.id(), "empty output rect, pass not drawn");
            return Ok(());
        }
        let mut target = self.pool.borrow(SurfaceDesc::for_size(output.size())?);
        let origin = (output.x, output.y);
        let draw_rect = pixmap_bounds(&target);

        let mut painter = QuadPainter {
            settings: &self.settings,
            pool: &mut self.pool,
            pass_outputs: &self.pass_outputs,
            resources,
            stats: &mut *stats,
        };
        let painted = painter.paint_pass(&mut target, origin, draw_rect, pass);
        if let Err(e) = painted {
            self.pool.release(target);
            return Err(e);
        }
        fulfill_copy_requests(&target, origin, pass, stats);

        if let Some(previous) = self.pass_outputs.insert(pass.id(), Arc::new(target)) {
            tracing::warn!(pass = %pass.id(), "pass drawn twice in one frame");
            if let Ok(pixmap) = Arc::try_unwrap(previous) {
                self.pool.release(pixmap);
            }
        }
        Ok(())
    }
}

fn fulfill_copy_requests(
    target: &vello_cpu::Pixmap,
    origin: (i32, i32),
    pass: &mut RenderPass,
    stats: &mut DrawStats,
) {
    let requests = pass.take_copy_requests();
    if requests.is_empty() {
        return;
    }
    let output = pass.output_rect();
    let snapshot = Bitmap::from_pixmap(target.clone());
    for request in requests {
        let area = request.area().unwrap_or(output).intersect(output);
        let local = area.offset(-origin.0, -origin.1);
        match snapshot.crop(local) {
            Ok(bitmap) => {
                stats.copy_requests_fulfilled += 1;
                request.send_result(CopyOutputResult::Bitmap(bitmap));
            }
            Err(e) => {
                tracing::debug!(pass = %pass.id(), %area, error = %e, "copy request answered empty");
                request.send_result(CopyOutputResult::Empty);
            }
        }
    }
}

/// What a material left in the scratch context.
enum Painted {
    Skipped,
    Drawn,
    DrawnWithMask { mask: vello_cpu::Image, paint_transform: Affine },
}

struct QuadPainter<'a> {
    settings: &'a RendererSettings,
    pool: &'a mut SurfacePool,
    pass_outputs: &'a HashMap<RenderPassId, Arc<vello_cpu::Pixmap>>,
    resources: &'a ResourceTable,
    stats: &'a mut DrawStats,
}

impl QuadPainter<'_> {
    /// Clear `draw_rect` of `target` and paint every quad of `pass` clipped to it.
    ///
    /// `origin` is the target-space position of the pixmap's top-left pixel.
    fn paint_pass(
        &mut self,
        target: &mut vello_cpu::Pixmap,
        origin: (i32, i32),
        draw_rect: IntRect,
        pass: &RenderPass,
    ) -> TesseraResult<()> {
        let clear = if pass.has_transparent_background() {
            [0, 0, 0, 0]
        } else {
            self.settings.clear_rgba.premultiply().to_array()
        };
        clear_rect(target, draw_rect, clear);

        for quad in pass.quads() {
            let Some(state) = pass.shared_quad_state(quad.shared_state()) else {
                tracing::warn!(pass = %pass.id(), "quad without a shared state skipped");
                self.stats.quads_skipped += 1;
                continue;
            };
            self.draw_quad(target, origin, draw_rect, quad, state)?;
        }
        self.stats.passes_drawn += 1;
        Ok(())
    }

    fn draw_quad(
        &mut self,
        target: &mut vello_cpu::Pixmap,
        origin: (i32, i32),
        draw_rect: IntRect,
        quad: &Quad,
        state: &SharedQuadState,
    ) -> TesseraResult<()> {
        let visible = quad.visible_rect();
        if visible.is_empty() {
            self.stats.quads_skipped += 1;
            return Ok(());
        }

        let window = Affine::translate((-f64::from(origin.0), -f64::from(origin.1)));
        let device_transform = window * state.content_to_target_transform.flatten_to_2d();
        if !affine_is_invertible(device_transform) {
            tracing::trace!(kind = quad.material().kind().as_str(), "degenerate transform, quad skipped");
            self.stats.quads_skipped += 1;
            return Ok(());
        }

        let force_aa_off = matches!(quad.material(), Material::SolidColor(m) if m.force_anti_aliasing_off);
        let antialias = self.settings.allow_antialiasing
            && !force_aa_off
            && !is_scale_and_integer_translate(device_transform)
            && quad.all_edges_exterior(state);
        let snapped = !antialias && is_scale_translate(device_transform);
        let draw_transform = if snapped {
            snap_to_pixels(device_transform, visible.to_rect())
        } else {
            device_transform
        };

        let mut device_rect = map_rect_bbox(draw_transform, visible.to_rect());
        if let Material::DebugBorder(m) = quad.material() {
            let pad = f64::from(border_width(m)) / 2.0 + 1.0;
            device_rect = map_rect_bbox(draw_transform, quad.rect().to_rect()).inflate(pad, pad);
        }
        let mut bounds = IntRect::enclosing(device_rect).intersect(draw_rect);
        if let Some(clip) = state.clip_rect {
            bounds = bounds.intersect(clip.offset(-origin.0, -origin.1));
        }
        if bounds.is_empty() {
            tracing::trace!(kind = quad.material().kind().as_str(), "quad clipped away");
            self.stats.quads_skipped += 1;
            return Ok(());
        }

        let blended =
            quad.should_draw_with_blending(state) || state.blend_mode != BlendMode::Normal;
        let op = if !blended && snapped {
            CompositeOp::Source
        } else {
            CompositeOp::Blend {
                opacity: state.effective_opacity(),
                mode: state.blend_mode,
            }
        };

        let desc = SurfaceDesc::for_size(bounds.size())?;
        let mut scratch = self.pool.borrow(desc);
        let scratch_transform =
            Affine::translate((-f64::from(bounds.x), -f64::from(bounds.y))) * draw_transform;
        let drawn = match self.paint_material(&mut scratch, desc, scratch_transform, quad, antialias) {
            Ok(true) => composite_region(target, bounds, &scratch, (bounds.x, bounds.y), op)
                .map(|()| true),
            other => other,
        };
        self.pool.release(scratch);

        if drawn? {
            self.stats.quads_drawn += 1;
            self.stats.antialiased_quads += u32::from(antialias);
            self.stats.blended_quads += u32::from(matches!(op, CompositeOp::Blend { .. }));
        } else {
            self.stats.quads_skipped += 1;
        }
        Ok(())
    }

    /// Paint `quad`'s material into `scratch` through `transform` (content space to
    /// scratch pixels). Returns `false` when a resource was unavailable.
    fn paint_material(
        &mut self,
        scratch: &mut vello_cpu::Pixmap,
        desc: SurfaceDesc,
        transform: Affine,
        quad: &Quad,
        antialias: bool,
    ) -> TesseraResult<bool> {
        let mut ctx = vello_cpu::RenderContext::new(desc.width, desc.height);
        ctx.set_transform(affine_to_cpu(transform));
        let quality = if antialias {
            vello_cpu::peniko::ImageQuality::Medium
        } else {
            vello_cpu::peniko::ImageQuality::Low
        };
        let visible = quad.visible_rect().to_rect();

        let painted = match quad.material() {
            Material::Checkerboard(m) => {
                fill_color(&mut ctx, m.color, visible);
                Painted::Drawn
            }
            Material::SolidColor(m) => {
                fill_color(&mut ctx, m.color, visible);
                Painted::Drawn
            }
            Material::DebugBorder(m) => {
                stroke_border(&mut ctx, m, transform, quad.rect().to_rect());
                Painted::Drawn
            }
            Material::Texture(m) => self.paint_texture(&mut ctx, quad, m, quality),
            Material::Tile(m) => self.paint_tile(&mut ctx, quad, m),
            Material::RenderPassReference(m) => {
                self.paint_render_pass(&mut ctx, quad, m, quality)?
            }
            Material::Unsupported(m) => {
                tracing::trace!(reason = %m.reason, "unsupported material drawn as sentinel");
                self.stats.sentinel_quads += 1;
                fill_color(&mut ctx, self.settings.sentinel_color(), visible);
                Painted::Drawn
            }
        };

        match painted {
            Painted::Skipped => Ok(false),
            Painted::Drawn => {
                ctx.flush();
                ctx.render_to_pixmap(scratch);
                Ok(true)
            }
            Painted::DrawnWithMask {
                mask,
                paint_transform,
            } => {
                ctx.flush();
                ctx.render_to_pixmap(scratch);

                let mut coverage = self.pool.borrow(desc);
                let mut mask_ctx = vello_cpu::RenderContext::new(desc.width, desc.height);
                mask_ctx.set_transform(affine_to_cpu(transform));
                mask_ctx.set_paint_transform(affine_to_cpu(paint_transform));
                mask_ctx.set_paint(mask);
                mask_ctx.fill_rect(&rect_to_cpu(visible));
                mask_ctx.flush();
                mask_ctx.render_to_pixmap(&mut coverage);
                let applied = mask_apply_alpha_in_place(
                    scratch.data_as_u8_slice_mut(),
                    coverage.data_as_u8_slice(),
                );
                self.pool.release(coverage);
                applied?;
                Ok(true)
            }
        }
    }

    fn paint_texture(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        quad: &Quad,
        m: &TextureMaterial,
        quality: vello_cpu::peniko::ImageQuality,
    ) -> Painted {
        let Some(lock) = self.resources.acquire_read_lock(m.resource_id) else {
            tracing::trace!(resource = %m.resource_id, "texture not readable, quad skipped");
            return Painted::Skipped;
        };
        let Some(bitmap) = lock.bitmap() else {
            tracing::trace!(resource = %m.resource_id, "texture has no software pixels, quad skipped");
            return Painted::Skipped;
        };

        let (w, h) = (f64::from(bitmap.width()), f64::from(bitmap.height()));
        let mut uv = Rect::new(
            m.uv_top_left.x * w,
            m.uv_top_left.y * h,
            m.uv_bottom_right.x * w,
            m.uv_bottom_right.y * h,
        );
        if m.flipped {
            uv = Rect::new(uv.x0, uv.y1, uv.x1, uv.y0);
        }
        let visible = quad.visible_rect().to_rect();
        let visible_uv = scale_rect_proportional(quad.rect().to_rect(), visible, uv);
        let Some(paint_transform) = rect_to_rect(visible_uv, visible) else {
            tracing::trace!(resource = %m.resource_id, "empty texture coordinates, quad skipped");
            return Painted::Skipped;
        };

        if !bitmap.is_opaque() && !m.background_color.is_transparent() {
            fill_color(ctx, m.background_color, visible);
        }
        ctx.set_paint_transform(affine_to_cpu(paint_transform));
        ctx.set_paint(image_paint(bitmap, extend_for(lock.wrap_mode()), quality));
        ctx.fill_rect(&rect_to_cpu(visible));
        Painted::Drawn
    }

    fn paint_tile(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        quad: &Quad,
        m: &TileMaterial,
    ) -> Painted {
        let Some(lock) = self.resources.acquire_read_lock(m.resource_id) else {
            tracing::trace!(resource = %m.resource_id, "tile not readable, quad skipped");
            return Painted::Skipped;
        };
        let Some(bitmap) = lock.bitmap() else {
            tracing::trace!(resource = %m.resource_id, "tile has no software pixels, quad skipped");
            return Painted::Skipped;
        };
        if lock.wrap_mode() == WrapMode::Repeat {
            tracing::warn!(resource = %m.resource_id, "tile resource uses repeat wrap; drawing clamped");
        }

        let visible = quad.visible_rect().to_rect();
        let visible_tex = scale_rect_proportional(quad.rect().to_rect(), visible, m.tex_coord_rect);
        let Some(paint_transform) = rect_to_rect(visible_tex, visible) else {
            tracing::trace!(resource = %m.resource_id, "empty tile coordinates, quad skipped");
            return Painted::Skipped;
        };

        ctx.set_paint_transform(affine_to_cpu(paint_transform));
        ctx.set_paint(image_paint(
            bitmap,
            vello_cpu::peniko::Extend::Pad,
            vello_cpu::peniko::ImageQuality::Low,
        ));
        ctx.fill_rect(&rect_to_cpu(visible));
        Painted::Drawn
    }

    fn paint_render_pass(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        quad: &Quad,
        m: &RenderPassMaterial,
        quality: vello_cpu::peniko::ImageQuality,
    ) -> TesseraResult<Painted> {
        let Some(source) = self.pass_outputs.get(&m.render_pass_id) else {
            tracing::trace!(pass = %m.render_pass_id, "referenced pass not produced this frame");
            return Ok(Painted::Skipped);
        };

        let mask = match m.mask_resource_id {
            Some(id) => {
                let Some(lock) = self.resources.acquire_read_lock(id) else {
                    tracing::trace!(resource = %id, "mask not readable, quad skipped");
                    return Ok(Painted::Skipped);
                };
                let Some(bitmap) = lock.bitmap() else {
                    tracing::trace!(resource = %id, "mask has no software pixels, quad skipped");
                    return Ok(Painted::Skipped);
                };
                Some(bitmap.clone())
            }
            None => None,
        };

        let content = if m.filters.is_empty() {
            Arc::clone(source)
        } else {
            Arc::new(apply_filters(source, &m.filters, m.filters_scale)?)
        };

        let visible = quad.visible_rect().to_rect();
        let src = Rect::new(
            0.0,
            0.0,
            f64::from(content.width()),
            f64::from(content.height()),
        );
        let visible_src = scale_rect_proportional(quad.rect().to_rect(), visible, src);
        let Some(paint_transform) = rect_to_rect(visible_src, visible) else {
            return Ok(Painted::Skipped);
        };
        ctx.set_paint_transform(affine_to_cpu(paint_transform));
        ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(content),
            sampler: sampler(vello_cpu::peniko::Extend::Pad, quality),
        });
        ctx.fill_rect(&rect_to_cpu(visible));

        let Some(mask) = mask else {
            return Ok(Painted::Drawn);
        };
        let (w, h) = (f64::from(mask.width()), f64::from(mask.height()));
        let mask_rect = Rect::new(
            m.mask_uv_rect.x0 * w,
            m.mask_uv_rect.y0 * h,
            m.mask_uv_rect.x1 * w,
            m.mask_uv_rect.y1 * h,
        );
        let visible_mask = scale_rect_proportional(quad.rect().to_rect(), visible, mask_rect);
        let Some(mask_transform) = rect_to_rect(visible_mask, visible) else {
            return Ok(Painted::Skipped);
        };
        Ok(Painted::DrawnWithMask {
            mask: image_paint(&mask, vello_cpu::peniko::Extend::Pad, quality),
            paint_transform: mask_transform,
        })
    }
}

fn fill_color(ctx: &mut vello_cpu::RenderContext, color: Rgba8, rect: Rect) {
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(color.to_cpu_color());
    ctx.fill_rect(&rect_to_cpu(rect));
}

fn border_width(m: &DebugBorderMaterial) -> f32 {
    if m.width.is_finite() {
        m.width.max(1.0)
    } else {
        1.0
    }
}

/// Corners are mapped by hand and the closed outline is stroked in scratch pixels, so
/// the border keeps its pixel width under any transform.
fn stroke_border(
    ctx: &mut vello_cpu::RenderContext,
    m: &DebugBorderMaterial,
    transform: Affine,
    rect: Rect,
) {
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
    .map(|p| transform * p);

    let mut polygon = BezPath::new();
    polygon.move_to(corners[0]);
    for &p in &corners[1..] {
        polygon.line_to(p);
    }
    polygon.close_path();

    let outline = kurbo::stroke(
        polygon.iter(),
        &kurbo::Stroke::new(f64::from(border_width(m))),
        &kurbo::StrokeOpts::default(),
        0.1,
    );
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(m.color.to_cpu_color());
    ctx.fill_path(&bezpath_to_cpu(&outline));
}

fn affine_is_invertible(a: Affine) -> bool {
    a.as_coeffs().iter().all(|c| c.is_finite()) && a.determinant().abs() > 1e-12
}

/// Replace `a` by a scale+translate that maps `rect`'s corners to whole pixels.
fn snap_to_pixels(a: Affine, rect: Rect) -> Affine {
    let p0 = a * Point::new(rect.x0, rect.y0);
    let p1 = a * Point::new(rect.x1, rect.y1);
    let (q0, q1) = (p0.round(), p1.round());
    let sx = (q1.x - q0.x) / (rect.x1 - rect.x0);
    let sy = (q1.y - q0.y) / (rect.y1 - rect.y0);
    Affine::new([sx, 0.0, 0.0, sy, q0.x - sx * rect.x0, q0.y - sy * rect.y0])
}

/// Affine taking `src` onto `dst`, corner to corner. `src` may be inverted on either
/// axis to mirror the mapping.
fn rect_to_rect(src: Rect, dst: Rect) -> Option<Affine> {
    let (sw, sh) = (src.x1 - src.x0, src.y1 - src.y0);
    if sw == 0.0 || sh == 0.0 || !sw.is_finite() || !sh.is_finite() {
        return None;
    }
    let sx = (dst.x1 - dst.x0) / sw;
    let sy = (dst.y1 - dst.y0) / sh;
    Some(Affine::new([
        sx,
        0.0,
        0.0,
        sy,
        dst.x0 - sx * src.x0,
        dst.y0 - sy * src.y0,
    ]))
}

fn extend_for(wrap: WrapMode) -> vello_cpu::peniko::Extend {
    match wrap {
        WrapMode::Clamp => vello_cpu::peniko::Extend::Pad,
        WrapMode::Repeat => vello_cpu::peniko::Extend::Repeat,
    }
}

fn sampler(
    extend: vello_cpu::peniko::Extend,
    quality: vello_cpu::peniko::ImageQuality,
) -> vello_cpu::peniko::ImageSampler {
    vello_cpu::peniko::ImageSampler {
        x_extend: extend,
        y_extend: extend,
        quality,
        ..Default::default()
    }
}

fn image_paint(
    bitmap: &Bitmap,
    extend: vello_cpu::peniko::Extend,
    quality: vello_cpu::peniko::ImageQuality,
) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::clone(bitmap.pixmap())),
        sampler: sampler(extend, quality),
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/software.rs"]
mod tests;
