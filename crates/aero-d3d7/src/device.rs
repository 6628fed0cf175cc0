//! The public device object: client state entry points, backend cache bookkeeping and the
//! frame-buffer lock protocol. Draw calls are driven from `draw.rs`.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, error, trace, warn};

use crate::backend::{Backend, Capability, ClearBuffers, CompareFunc, Rect, TextureId};
use crate::config::{DeviceConfig, MAX_TEXTURE_STAGES};
use crate::d3d;
use crate::error::{D3dError, Result};
use crate::fixed_function::combiner::{argb_to_rgba, Combiner, StageCombine};
use crate::fixed_function::fvf::{Fvf, StrideView};
use crate::light::{Light, LightSet, Material, SlotChange};
use crate::state::fog::FogTable;
use crate::state::sync::{
    force_alpha_func, set_capability, stage0_aliases, sync_render_state, BackendCache,
};
use crate::state::table::StateBlock;
use crate::transform::{Matrix, MatrixChanged, TransformKind, TransformMode, TransformState};

/// The surface a device renders into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
    pub has_depth_buffer: bool,
}

/// A texture attached to a stage. `color_key` marks surfaces carrying a source color key, which
/// the device emulates with an alpha test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureBinding {
    pub id: TextureId,
    pub color_key: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_z: f32,
    pub max_z: f32,
}

/// Who owns the back buffer contents right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BufferState {
    Backend,
    /// Handed out to memory; draws are not expected until unlock.
    Locked(Rect),
    /// Memory holds newer pixels than the backend for this region.
    MemoryDirty(Rect),
}

/// Clear values the backend holds, as raw bits.
#[derive(Clone, Copy, Debug, Default)]
struct ClearCache {
    color: Option<u32>,
    depth: Option<u32>,
    stencil: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Warnings {
    pub(crate) color_key_override: bool,
    pub(crate) projected_texcoords: bool,
}

/// Everything a device owns. Only ever touched with the device lock held.
pub(crate) struct DeviceState<B: Backend> {
    pub(crate) backend: B,
    pub(crate) config: DeviceConfig,
    pub(crate) target: RenderTarget,
    pub(crate) tables: StateBlock,
    pub(crate) cache: BackendCache,
    pub(crate) combiner: Combiner,
    pub(crate) fog_table: FogTable,
    pub(crate) transforms: TransformState,
    pub(crate) lights: LightSet,
    pub(crate) material: Material,
    pub(crate) clip_planes: Vec<[f32; 4]>,
    pub(crate) textures: [Option<TextureBinding>; MAX_TEXTURE_STAGES],
    pub(crate) buffer: BufferState,
    pub(crate) warnings: Warnings,
    viewport: Option<Viewport>,
    light_state_material: u32,
    color_model: u32,
    clear_cache: ClearCache,
}

/// A legacy Direct3D device bound to one backend context.
pub struct Device<B: Backend> {
    inner: Mutex<DeviceState<B>>,
}

impl<B: Backend> Device<B> {
    pub fn new(backend: B, config: DeviceConfig, target: RenderTarget) -> Result<Self> {
        let config = config.validated()?;
        let tables = StateBlock::with_defaults(config.version);
        let fog_color = tables.render.value(d3d::D3DRENDERSTATE_FOGCOLOR);

        let mut clip_planes = Vec::new();
        clip_planes.try_reserve(config.caps.max_clip_planes)?;
        clip_planes.resize(config.caps.max_clip_planes, [0.0; 4]);

        let mut state = DeviceState {
            backend,
            config,
            target,
            tables,
            cache: BackendCache::default(),
            combiner: Combiner::new(config.caps, config.backend_stages()),
            fog_table: FogTable::new(fog_color),
            transforms: TransformState::new(),
            lights: LightSet::new(config.caps.max_active_lights),
            material: Material::default(),
            clip_planes,
            textures: [None; MAX_TEXTURE_STAGES],
            buffer: BufferState::Backend,
            warnings: Warnings::default(),
            viewport: None,
            light_state_material: 0,
            color_model: d3d::D3DCOLOR_RGB,
            clear_cache: ClearCache::default(),
        };
        state.initialize_backend();
        debug!(
            version = config.version,
            stages = config.max_texture_stages,
            units = config.backend_stages(),
            "device created"
        );
        Ok(Self {
            inner: Mutex::new(state),
        })
    }

    /// The backend, for inspection between calls.
    pub fn backend(&self) -> MappedMutexGuard<'_, B> {
        MutexGuard::map(self.inner.lock(), |state| &mut state.backend)
    }

    pub fn config(&self) -> DeviceConfig {
        self.inner.lock().config
    }

    pub fn set_render_target(&self, target: RenderTarget) {
        let mut state = self.inner.lock();
        state.target = target;
        // The pixel-space projection depends on the target size.
        if state.transforms.mode == TransformMode::Ortho {
            state.transforms.mode = TransformMode::None;
        }
    }

    pub fn set_render_state(&self, state_id: u32, value: u32) -> Result<()> {
        trace!(state_id, value, "set_render_state");
        self.inner.lock().write_render_state(state_id, value)
    }

    pub fn get_render_state(&self, state_id: u32) -> Result<u32> {
        self.inner.lock().tables.render.get(state_id)
    }

    pub fn set_texture_stage_state(&self, stage: u32, state_id: u32, value: u32) -> Result<()> {
        trace!(stage, state_id, value, "set_texture_stage_state");
        self.inner
            .lock()
            .write_stage_state(stage as usize, state_id, value)
    }

    pub fn get_texture_stage_state(&self, stage: u32, state_id: u32) -> Result<u32> {
        self.inner.lock().tables.stages.get(stage as usize, state_id)
    }

    /// Resolved combiner setup of `stage`, as last pushed to the backend.
    pub fn stage_combine(&self, stage: u32) -> Option<StageCombine> {
        self.inner.lock().combiner.stage(stage as usize).copied()
    }

    pub fn set_texture(&self, stage: u32, texture: Option<TextureBinding>) -> Result<()> {
        let mut state = self.inner.lock();
        let slot = state
            .textures
            .get_mut(stage as usize)
            .ok_or(D3dError::InvalidTextureStage(stage))?;
        *slot = texture;
        Ok(())
    }

    pub fn get_texture(&self, stage: u32) -> Result<Option<TextureBinding>> {
        let state = self.inner.lock();
        state
            .textures
            .get(stage as usize)
            .copied()
            .ok_or(D3dError::InvalidTextureStage(stage))
    }

    /// Draws `vertex_count` vertices from an interleaved buffer laid out by `fvf`.
    pub fn draw_primitive(
        &self,
        primitive: u32,
        fvf: u32,
        vertices: &[u8],
        vertex_count: usize,
    ) -> Result<()> {
        self.inner
            .lock()
            .draw_buffer(primitive, Fvf(fvf), vertices, vertex_count, None)
    }

    /// Draws `indices` into the first `vertex_count` vertices of an interleaved buffer.
    pub fn draw_indexed_primitive(
        &self,
        primitive: u32,
        fvf: u32,
        vertices: &[u8],
        vertex_count: usize,
        indices: &[u16],
    ) -> Result<()> {
        self.inner
            .lock()
            .draw_buffer(primitive, Fvf(fvf), vertices, vertex_count, Some(indices))
    }

    /// Draws from caller-built per-attribute streams.
    pub fn draw_primitive_strided(
        &self,
        primitive: u32,
        fvf: u32,
        streams: &StrideView<'_>,
        vertex_count: usize,
        indices: Option<&[u16]>,
    ) -> Result<()> {
        self.inner
            .lock()
            .draw_streams(primitive, Fvf(fvf), streams, vertex_count, indices)
    }

    /// `IDirect3DDevice2`-style draw taking a `D3DVT_*` vertex type.
    pub fn draw_primitive_legacy(
        &self,
        primitive: u32,
        vertex_type: u32,
        vertices: &[u8],
        vertex_count: usize,
    ) -> Result<()> {
        let fvf = Fvf::from_legacy_vertex_type(vertex_type)
            .ok_or(D3dError::InvalidVertexType(vertex_type))?;
        self.inner
            .lock()
            .draw_buffer(primitive, fvf, vertices, vertex_count, None)
    }

    pub fn set_transform(&self, transform_type: u32, matrix: &Matrix) -> Result<()> {
        let Some(kind) = TransformKind::from_d3d(transform_type) else {
            error!(transform_type, "unknown transform type, ignoring");
            return Ok(());
        };
        let mut state = self.inner.lock();
        *state.transforms.get_mut(kind) = *matrix;
        state.matrices_updated(kind.changed_bit());
        Ok(())
    }

    pub fn get_transform(&self, transform_type: u32) -> Result<Matrix> {
        let kind = TransformKind::from_d3d(transform_type)
            .ok_or(D3dError::InvalidTransform(transform_type))?;
        Ok(*self.inner.lock().transforms.get(kind))
    }

    /// `m = m × matrix` on the stored transform.
    pub fn multiply_transform(&self, transform_type: u32, matrix: &Matrix) -> Result<()> {
        let kind = TransformKind::from_d3d(transform_type)
            .ok_or(D3dError::InvalidTransform(transform_type))?;
        let mut state = self.inner.lock();
        let product = state.transforms.get(kind).multiply(matrix);
        *state.transforms.get_mut(kind) = product;
        state.matrices_updated(kind.changed_bit());
        Ok(())
    }

    pub fn set_light(&self, index: u32, light: &Light) -> Result<()> {
        let mut state = self.inner.lock();
        state.lights.set(index, *light)?;
        state.transforms.mode = TransformMode::None;
        Ok(())
    }

    pub fn get_light(&self, index: u32) -> Result<Light> {
        self.inner.lock().lights.get(index).copied()
    }

    pub fn light_enable(&self, index: u32, enable: bool) -> Result<()> {
        let mut state = self.inner.lock();
        let state = &mut *state;
        if state.lights.enable(&mut state.backend, index, enable)? == SlotChange::Changed {
            state.transforms.mode = TransformMode::None;
        }
        Ok(())
    }

    pub fn get_light_enable(&self, index: u32) -> Result<bool> {
        self.inner.lock().lights.is_enabled(index)
    }

    pub fn set_clip_plane(&self, index: u32, plane: [f32; 4]) -> Result<()> {
        let mut state = self.inner.lock();
        let max = state.clip_planes.len();
        let slot = state
            .clip_planes
            .get_mut(index as usize)
            .ok_or(D3dError::InvalidClipPlane { index, max })?;
        *slot = plane;
        state.transforms.mode = TransformMode::None;
        Ok(())
    }

    pub fn get_clip_plane(&self, index: u32) -> Result<[f32; 4]> {
        let state = self.inner.lock();
        state
            .clip_planes
            .get(index as usize)
            .copied()
            .ok_or(D3dError::InvalidClipPlane {
                index,
                max: state.clip_planes.len(),
            })
    }

    pub fn set_material(&self, material: &Material) {
        let mut state = self.inner.lock();
        state.material = *material;
        state.backend.material(material);
    }

    pub fn get_material(&self) -> Material {
        self.inner.lock().material
    }

    pub fn set_viewport(&self, viewport: &Viewport) {
        self.inner.lock().apply_viewport(*viewport, false);
    }

    /// The viewport last set, or one covering the whole target.
    pub fn get_viewport(&self) -> Viewport {
        let state = self.inner.lock();
        state.viewport.unwrap_or(Viewport {
            x: 0,
            y: 0,
            width: state.target.width,
            height: state.target.height,
            min_z: 0.0,
            max_z: 1.0,
        })
    }

    /// Clears `rects` (the whole target when empty) of the buffers named by `D3DCLEAR_*` flags.
    pub fn clear(&self, rects: &[Rect], flags: u32, color: u32, z: f32, stencil: u32) -> Result<()> {
        trace!(rects = rects.len(), flags, color, z, stencil, "clear");
        self.inner.lock().clear(rects, flags, color, z, stencil)
    }

    pub fn capture_state_block(&self) -> StateBlock {
        self.inner.lock().tables.snapshot()
    }

    /// Applies every entry `block` captured and realizes each one on the backend.
    pub fn apply_state_block(&self, block: &StateBlock) -> Result<()> {
        let mut state = self.inner.lock();
        let before = state.tables.render.clone();
        let applied = state.tables.apply(block);
        for &id in &applied.render {
            state.sync_render(id);
        }
        for (stage, id) in applied.stages {
            state.realize_stage_state(stage, id);
        }
        // A legacy sampler render state the block changed carries over onto stage 0, after the
        // block's own stage entries. Unchanged ones leave stage 0 as the block recorded it.
        for id in applied.render {
            if before.value(id) != state.tables.render.value(id) {
                state.sync_stage0_aliases(id)?;
            }
        }
        Ok(())
    }

    pub fn set_light_state(&self, state_id: u32, value: u32) -> Result<()> {
        trace!(state_id, value, "set_light_state");
        let mut state = self.inner.lock();
        match state_id {
            d3d::D3DLIGHTSTATE_MATERIAL => {
                state.light_state_material = value;
                Ok(())
            }
            d3d::D3DLIGHTSTATE_COLORMODEL => {
                if value != d3d::D3DCOLOR_RGB {
                    warn!(value, "only the RGB color model is supported");
                }
                state.color_model = value;
                Ok(())
            }
            _ => {
                let render_state = light_state_alias(state_id)?;
                state.write_render_state(render_state, value)
            }
        }
    }

    pub fn get_light_state(&self, state_id: u32) -> Result<u32> {
        let state = self.inner.lock();
        match state_id {
            d3d::D3DLIGHTSTATE_MATERIAL => Ok(state.light_state_material),
            d3d::D3DLIGHTSTATE_COLORMODEL => Ok(state.color_model),
            _ => state.tables.render.get(light_state_alias(state_id)?),
        }
    }

    /// Hands `rect` of the back buffer to memory. Pending rendering is finished first.
    pub fn lock_region(&self, rect: Rect) -> Result<()> {
        let mut state = self.inner.lock();
        let buffer = state.buffer;
        match buffer {
            BufferState::Locked(held) => {
                error!(
                    error = %D3dError::StateInconsistency("lock while the back buffer is locked"),
                    ?held,
                    "replacing previous lock"
                );
            }
            BufferState::MemoryDirty(dirty) => state.backend.flush_to_framebuffer(dirty),
            BufferState::Backend => {}
        }
        state.backend.finish();
        state.buffer = BufferState::Locked(rect);
        Ok(())
    }

    /// Returns the locked region; it is uploaded before the next draw or clear.
    pub fn unlock_region(&self) -> Result<()> {
        let mut state = self.inner.lock();
        let buffer = state.buffer;
        match buffer {
            BufferState::Locked(rect) => state.buffer = BufferState::MemoryDirty(rect),
            _ => error!(
                error = %D3dError::StateInconsistency("unlock without lock"),
                "ignoring unlock"
            ),
        }
        Ok(())
    }

    /// Forgets everything cached about the backend and pushes the whole state again.
    pub fn invalidate_backend_cache(&self) {
        let mut state = self.inner.lock();
        state.initialize_backend();
        if let Some(viewport) = state.viewport {
            state.apply_viewport(viewport, true);
        }
    }
}

fn light_state_alias(state_id: u32) -> Result<u32> {
    Ok(match state_id {
        d3d::D3DLIGHTSTATE_AMBIENT => d3d::D3DRENDERSTATE_AMBIENT,
        d3d::D3DLIGHTSTATE_FOGMODE => d3d::D3DRENDERSTATE_FOGVERTEXMODE,
        d3d::D3DLIGHTSTATE_FOGSTART => d3d::D3DRENDERSTATE_FOGSTART,
        d3d::D3DLIGHTSTATE_FOGEND => d3d::D3DRENDERSTATE_FOGEND,
        d3d::D3DLIGHTSTATE_FOGDENSITY => d3d::D3DRENDERSTATE_FOGDENSITY,
        _ => return Err(D3dError::InvalidLightState(state_id)),
    })
}

impl<B: Backend> DeviceState<B> {
    /// Puts the backend into the known initial state and replays the whole state table.
    fn initialize_backend(&mut self) {
        self.cache = BackendCache::default();
        self.clear_cache = ClearCache::default();
        self.transforms.invalidate();

        let backend = &mut self.backend;
        let cache = &mut self.cache;
        backend.clear_depth(0.0);
        self.clear_cache.depth = Some(0f32.to_bits());
        set_capability(backend, &mut cache.depth_test, Capability::DepthTest, true);
        backend.depth_mask(true);
        cache.depth_mask = Some(true);
        set_capability(backend, &mut cache.alpha_test, Capability::AlphaTest, false);
        set_capability(backend, &mut cache.stencil_test, Capability::StencilTest, false);
        set_capability(backend, &mut cache.cull_face, Capability::CullFace, false);
        set_capability(backend, &mut cache.lighting, Capability::Lighting, false);
        set_capability(backend, &mut cache.blend, Capability::Blend, false);
        set_capability(backend, &mut cache.fog, Capability::Fog, false);
        self.combiner.reset(backend);
        force_alpha_func(backend, cache, CompareFunc::Always, 0);

        let max_clip_planes = self.config.caps.max_clip_planes;
        for (id, slot) in self.tables.render.iter() {
            if slot.was_set {
                sync_render_state(&mut self.backend, &mut self.cache, &self.tables, max_clip_planes, id);
            }
        }
        for (stage, id, slot) in self.tables.stages.iter() {
            if slot.was_set && stage < self.combiner.unit_count() {
                self.combiner
                    .apply_stage_state(&mut self.backend, &self.tables, stage, id);
            }
        }

        self.lights.restore(&mut self.backend);
        self.backend.material(&self.material);
        self.matrices_updated(MatrixChanged::all());
        self.fog_table
            .rebuild_if_stale(self.tables.render.value(d3d::D3DRENDERSTATE_FOGCOLOR));
    }

    pub(crate) fn write_render_state(&mut self, state_id: u32, value: u32) -> Result<()> {
        let written = self.tables.render.set(state_id, value)?;
        for id in written.iter() {
            self.sync_render(id);
            self.sync_stage0_aliases(id)?;
        }
        Ok(())
    }

    fn sync_stage0_aliases(&mut self, id: u32) -> Result<()> {
        let value = self.tables.render.value(id);
        for (stage_state, stage_value) in stage0_aliases(id, value) {
            self.write_stage_state(0, stage_state, stage_value)?;
        }
        Ok(())
    }

    fn sync_render(&mut self, id: u32) {
        let outcome = sync_render_state(
            &mut self.backend,
            &mut self.cache,
            &self.tables,
            self.config.caps.max_clip_planes,
            id,
        );
        if outcome.reset_transform {
            self.transforms.mode = TransformMode::None;
        }
    }

    pub(crate) fn write_stage_state(&mut self, stage: usize, state_id: u32, value: u32) -> Result<()> {
        let written = self.tables.stages.set(stage, state_id, value)?;
        for id in written.iter() {
            self.realize_stage_state(stage, id);
        }
        Ok(())
    }

    fn realize_stage_state(&mut self, stage: usize, id: u32) {
        if stage >= self.config.max_texture_stages {
            debug!(stage, id, "texture stage past the configured count, state stored only");
            return;
        }
        self.combiner
            .apply_stage_state(&mut self.backend, &self.tables, stage, id);
        if id == d3d::D3DTSS_TEXTURETRANSFORMFLAGS {
            let flags = self.tables.stages.value(stage, id);
            if flags & d3d::D3DTTFF_PROJECTED != 0 && !self.warnings.projected_texcoords {
                warn!(stage, flags, "projected texture coordinates are not supported");
                self.warnings.projected_texcoords = true;
            }
            self.matrices_updated(MatrixChanged::texture(stage));
        }
    }

    pub(crate) fn matrices_updated(&mut self, changed: MatrixChanged) {
        let stages = &self.tables.stages;
        self.transforms.matrices_updated(
            &mut self.backend,
            changed,
            self.combiner.unit_count(),
            |stage| stages.value(stage, d3d::D3DTSS_TEXTURETRANSFORMFLAGS),
        );
    }

    fn apply_viewport(&mut self, viewport: Viewport, force: bool) {
        let previous = if force { None } else { self.viewport };
        let depth_changed = previous
            .map_or(true, |p| p.min_z != viewport.min_z || p.max_z != viewport.max_z);
        if depth_changed {
            self.backend.depth_range(viewport.min_z, viewport.max_z);
        }
        let rect = |v: &Viewport| (v.x, v.y, v.width, v.height);
        if previous.map_or(true, |p| rect(&p) != rect(&viewport)) {
            let clamp = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
            let bottom = i64::from(viewport.y) + i64::from(viewport.height);
            self.backend.viewport(
                clamp(i64::from(viewport.x)),
                clamp(i64::from(self.target.height) - bottom),
                clamp(i64::from(viewport.width)),
                clamp(i64::from(viewport.height)),
            );
        }
        self.viewport = Some(viewport);
    }

    /// Uploads memory-side pixels so the backend owns the buffer again.
    pub(crate) fn reclaim_buffer(&mut self, reason: &'static str) {
        match self.buffer {
            BufferState::Backend => return,
            BufferState::Locked(rect) => {
                error!(
                    error = %D3dError::StateInconsistency(reason),
                    ?rect,
                    "back buffer still locked, taking it back"
                );
                self.backend.flush_to_framebuffer(rect);
            }
            BufferState::MemoryDirty(rect) => self.backend.flush_to_framebuffer(rect),
        }
        self.buffer = BufferState::Backend;
    }

    fn clear(&mut self, rects: &[Rect], flags: u32, color: u32, z: f32, stencil: u32) -> Result<()> {
        if let Some(bad) = rects.iter().find(|r| r.x2 < r.x1 || r.y2 < r.y1) {
            return Err(D3dError::InvalidRect {
                x1: bad.x1,
                y1: bad.y1,
                x2: bad.x2,
                y2: bad.y2,
            });
        }
        let whole = [Rect::new(
            0,
            0,
            self.target.width as i32,
            self.target.height as i32,
        )];
        let rects = if rects.is_empty() { &whole[..] } else { rects };

        let mut buffers = ClearBuffers::empty();
        let mut forced_depth_mask = false;

        if flags & d3d::D3DCLEAR_TARGET != 0 {
            self.reclaim_buffer("clear while the back buffer is locked");
            buffers |= ClearBuffers::COLOR;
            if self.clear_cache.color != Some(color) {
                self.backend.clear_color(argb_to_rgba(color));
                self.clear_cache.color = Some(color);
            }
        }
        if flags & d3d::D3DCLEAR_ZBUFFER != 0 {
            buffers |= ClearBuffers::DEPTH;
            if self.cache.depth_mask != Some(true) {
                self.backend.depth_mask(true);
                forced_depth_mask = true;
            }
            if self.clear_cache.depth != Some(z.to_bits()) {
                self.backend.clear_depth(f64::from(z));
                self.clear_cache.depth = Some(z.to_bits());
            }
        }
        if flags & d3d::D3DCLEAR_STENCIL != 0 {
            buffers |= ClearBuffers::STENCIL;
            if self.clear_cache.stencil != Some(stencil) {
                self.backend.clear_stencil(stencil as i32);
                self.clear_cache.stencil = Some(stencil);
            }
        }
        if buffers.is_empty() {
            return Ok(());
        }

        self.backend.enable(Capability::ScissorTest);
        let height = self.target.height as i32;
        for rect in rects {
            self.backend
                .scissor(rect.x1, height - rect.y2, rect.width(), rect.height());
            self.backend.clear(buffers);
        }
        self.backend.disable(Capability::ScissorTest);

        if forced_depth_mask {
            let write = self.tables.render.enabled(d3d::D3DRENDERSTATE_ZWRITEENABLE);
            self.backend.depth_mask(write);
            self.cache.depth_mask = Some(write);
        }
        Ok(())
    }
}
