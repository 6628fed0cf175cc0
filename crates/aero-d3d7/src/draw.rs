//! Primitive submission: validates a draw, brings the backend up to date for it and emits the
//! vertices through immediate mode or vertex arrays.

use tracing::{error, trace, warn};

use crate::backend::{
    Backend, Capability, ColorMaterialParam, CompareFunc, FogMode, MatrixMode, Topology,
    VertexArrays,
};
use crate::d3d;
use crate::device::DeviceState;
use crate::error::{D3dError, Result};
use crate::fixed_function::combiner::argb_to_rgba;
use crate::fixed_function::fvf::{Fvf, FvfError, FvfLayout, PositionType, Stream, StrideView};
use crate::state::fog::FogTable;
use crate::state::sync::{emit_if_changed, force_alpha_func, set_capability, sync_alpha_func};
use crate::state::table::RenderStateTable;
use crate::state::topology::{translate_primitive_topology, D3DPrimitiveType};
use crate::transform::TransformMode;

/// Below this `|w|`, a pre-transformed vertex is sent as plain xyz.
const MIN_RHW: f32 = 1e-8;

fn rgb(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

fn rgba(color: u32) -> [u8; 4] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8, (color >> 24) as u8]
}

/// Per-vertex color emission for one draw.
struct ColorEmitter<'a> {
    render: &'a RenderStateTable,
    /// Set when pre-lit colors are fogged here instead of by the backend.
    fog: Option<&'a FogTable>,
}

impl ColorEmitter<'_> {
    fn diffuse_base<B: Backend>(&self, backend: &mut B, color: u32) {
        if self.render.enabled(d3d::D3DRENDERSTATE_ALPHATESTENABLE)
            || self.render.enabled(d3d::D3DRENDERSTATE_ALPHABLENDENABLE)
        {
            backend.color4ub(rgba(color));
        } else {
            backend.color3ub(rgb(color));
        }
    }

    fn tracks_vertex_color(&self, lit: bool) -> bool {
        !lit && self.render.enabled(d3d::D3DRENDERSTATE_LIGHTING)
            && self.render.enabled(d3d::D3DRENDERSTATE_COLORVERTEX)
    }

    /// Material parameters fed from color `source` (COLOR1 or COLOR2).
    fn material_targets(&self, source: u32) -> impl Iterator<Item = ColorMaterialParam> + '_ {
        let specular = self.render.enabled(d3d::D3DRENDERSTATE_SPECULARENABLE);
        [
            (d3d::D3DRENDERSTATE_DIFFUSEMATERIALSOURCE, ColorMaterialParam::Diffuse, true),
            (d3d::D3DRENDERSTATE_AMBIENTMATERIALSOURCE, ColorMaterialParam::Ambient, true),
            (d3d::D3DRENDERSTATE_SPECULARMATERIALSOURCE, ColorMaterialParam::Specular, specular),
            (d3d::D3DRENDERSTATE_EMISSIVEMATERIALSOURCE, ColorMaterialParam::Emission, true),
        ]
        .into_iter()
        .filter(move |(id, _, allowed)| *allowed && self.render.value(*id) == source)
        .map(|(_, param, _)| param)
    }

    fn diffuse<B: Backend>(&self, backend: &mut B, color: u32, lit: bool) {
        if self.tracks_vertex_color(lit) {
            for param in self.material_targets(d3d::D3DMCS_COLOR1) {
                backend.color_material(param);
                self.diffuse_base(backend, color);
            }
        } else {
            self.diffuse_base(backend, color);
        }
    }

    /// Specular only reaches the backend through color material.
    fn specular<B: Backend>(&self, backend: &mut B, color: u32, lit: bool) {
        if self.tracks_vertex_color(lit) {
            for param in self.material_targets(d3d::D3DMCS_COLOR2) {
                backend.color_material(param);
                backend.color4ub(rgba(color));
            }
        }
    }

    fn diffuse_and_specular<B: Backend>(
        &self,
        backend: &mut B,
        diffuse: u32,
        specular: u32,
        lit: bool,
    ) {
        if lit {
            let color = match self.fog {
                Some(fog) => fog.apply(diffuse, (specular >> 24) as u8),
                None => diffuse,
            };
            self.diffuse_base(backend, color);
        } else if self.render.enabled(d3d::D3DRENDERSTATE_LIGHTING) {
            self.diffuse(backend, diffuse, false);
            self.specular(backend, specular, false);
        } else {
            self.diffuse_base(backend, diffuse);
        }
    }
}

fn emit_position<B: Backend>(backend: &mut B, position: PositionType, stream: &Stream<'_>, vertex: usize) {
    match position {
        PositionType::Xyz => backend.vertex3(stream.floats::<3>(vertex)),
        PositionType::XyzRhw => {
            let [x, y, z, w] = stream.floats::<4>(vertex);
            if w.abs() < MIN_RHW {
                backend.vertex3([x, y, z]);
            } else {
                let inv = 1.0 / w;
                backend.vertex4([x * inv, y * inv, z * inv, inv]);
            }
        }
    }
}

/// A texture unit fed from one texcoord set of the vertex format.
#[derive(Clone, Copy)]
struct TexSource<'a> {
    unit: usize,
    stream: Stream<'a>,
    size: usize,
}

impl<B: Backend> DeviceState<B> {
    pub(crate) fn draw_buffer(
        &mut self,
        primitive: u32,
        fvf: Fvf,
        vertices: &[u8],
        vertex_count: usize,
        indices: Option<&[u16]>,
    ) -> Result<()> {
        let primitive =
            D3DPrimitiveType::from_d3d(primitive).ok_or(D3dError::InvalidPrimitiveType(primitive))?;
        let Some(layout) = decode_layout(fvf)? else {
            return Ok(());
        };
        let available = vertices.len() / layout.vertex_stride;
        if available < vertex_count {
            return Err(D3dError::VertexBufferTooSmall {
                required: vertex_count,
                available,
            });
        }
        let view = layout.stride_view(vertices, 0);
        self.draw(primitive, &layout, &view, vertex_count, indices)
    }

    pub(crate) fn draw_streams(
        &mut self,
        primitive: u32,
        fvf: Fvf,
        view: &StrideView<'_>,
        vertex_count: usize,
        indices: Option<&[u16]>,
    ) -> Result<()> {
        let primitive =
            D3DPrimitiveType::from_d3d(primitive).ok_or(D3dError::InvalidPrimitiveType(primitive))?;
        let Some(layout) = decode_layout(fvf)? else {
            return Ok(());
        };
        check_streams(&layout, view)?;
        let available = if view.position.is_some() {
            view.vertex_capacity()
        } else {
            0
        };
        if available < vertex_count {
            return Err(D3dError::VertexBufferTooSmall {
                required: vertex_count,
                available,
            });
        }
        self.draw(primitive, &layout, view, vertex_count, indices)
    }

    fn draw(
        &mut self,
        primitive: D3DPrimitiveType,
        layout: &FvfLayout,
        view: &StrideView<'_>,
        vertex_count: usize,
        indices: Option<&[u16]>,
    ) -> Result<()> {
        if let Some(&index) = indices.and_then(|i| i.iter().find(|&&i| usize::from(i) >= vertex_count)) {
            return Err(D3dError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        trace!(
            %primitive,
            fvf = layout.fvf.0,
            vertex_count,
            indexed = indices.is_some(),
            "draw"
        );

        self.reclaim_buffer("draw while the back buffer is locked");

        let suspend_depth = !self.target.has_depth_buffer && self.cache.depth_test == Some(true);
        if suspend_depth {
            set_capability(&mut self.backend, &mut self.cache.depth_test, Capability::DepthTest, false);
        }

        let transformed = layout.is_pretransformed();
        let lit = layout.is_prelit();
        let active = self.bind_textures();
        let software_fog = self.prepare_draw_state(transformed, lit);

        let topology = translate_primitive_topology(primitive);
        self.emit_vertices(
            topology,
            layout,
            view,
            vertex_count,
            indices,
            lit,
            active,
            software_fog,
        );

        set_capability(
            &mut self.backend,
            &mut self.cache.color_material,
            Capability::ColorMaterial,
            false,
        );
        if suspend_depth {
            set_capability(&mut self.backend, &mut self.cache.depth_test, Capability::DepthTest, true);
        }
        Ok(())
    }

    /// Binds the texture of every leading enabled stage and returns how many stages are active.
    fn bind_textures(&mut self) -> usize {
        let stages = self.config.max_texture_stages.min(self.combiner.unit_count());
        let tfactor = self.tables.render.value(d3d::D3DRENDERSTATE_TEXTUREFACTOR);
        let mut active = 0;
        for stage in 0..stages {
            let color_op = self.tables.stages.value(stage, d3d::D3DTSS_COLOROP);
            if color_op == d3d::D3DTOP_DISABLE {
                break;
            }
            let texture = self.textures[stage].map(|binding| binding.id);
            self.combiner.bind(&mut self.backend, stage, texture, true);
            if texture.is_none() {
                break;
            }
            self.combiner.sync_sampler(&mut self.backend, &self.tables, stage);
            self.combiner.refresh_constant(&mut self.backend, stage, tfactor);
            active += 1;
        }
        for unit in active..self.combiner.unit_count() {
            self.combiner.bind(&mut self.backend, unit, None, false);
        }

        let render = &self.tables.render;
        let color_keyed = self.textures[0].is_some_and(|binding| binding.color_key)
            && active > 0
            && (render.enabled(d3d::D3DRENDERSTATE_COLORKEYENABLE) || self.config.version == 1);
        if color_keyed {
            if render.enabled(d3d::D3DRENDERSTATE_ALPHATESTENABLE)
                && !self.warnings.color_key_override
            {
                warn!("color key emulation overrides the application alpha test");
                self.warnings.color_key_override = true;
            }
            set_capability(&mut self.backend, &mut self.cache.alpha_test, Capability::AlphaTest, true);
            force_alpha_func(&mut self.backend, &mut self.cache, CompareFunc::NotEqual, 0);
        } else {
            let enabled = render.enabled(d3d::D3DRENDERSTATE_ALPHATESTENABLE);
            set_capability(&mut self.backend, &mut self.cache.alpha_test, Capability::AlphaTest, enabled);
            sync_alpha_func(&mut self.backend, &mut self.cache, &self.tables);
        }
        active
    }

    /// Transforms, fog, lighting and color material for a draw. Returns whether pre-lit colors
    /// have to go through the fog table.
    fn prepare_draw_state(&mut self, transformed: bool, lit: bool) -> bool {
        if !transformed && self.transforms.mode != TransformMode::Normal {
            self.load_camera();
        } else if transformed && self.transforms.mode != TransformMode::Ortho {
            self.transforms
                .set_ortho(&mut self.backend, self.target.width, self.target.height);
        }

        let render = &self.tables.render;
        let backend = &mut self.backend;
        let cache = &mut self.cache;

        let fog_mode = match render.value(d3d::D3DRENDERSTATE_FOGTABLEMODE) {
            d3d::D3DFOG_LINEAR => Some(FogMode::Linear),
            d3d::D3DFOG_EXP => Some(FogMode::Exp),
            d3d::D3DFOG_EXP2 => Some(FogMode::Exp2),
            _ => None,
        };
        let fog_enabled = render.enabled(d3d::D3DRENDERSTATE_FOGENABLE);
        let backend_fog = match (fog_enabled, transformed) {
            (true, true) => false,
            (true, false) => match fog_mode {
                Some(mode) => {
                    let mut start = render.value_f32(d3d::D3DRENDERSTATE_FOGSTART);
                    let mut end = render.value_f32(d3d::D3DRENDERSTATE_FOGEND);
                    let density = render.value_f32(d3d::D3DRENDERSTATE_FOGDENSITY);
                    // Pixel fog on pre-lit vertices is specified in projected depth.
                    let projection = &self.transforms.projection;
                    if lit && !projection.is_identity() {
                        start = projection.unproject_z(start);
                        end = projection.unproject_z(end);
                    }
                    emit_if_changed(&mut cache.fog_mode, mode, |m| backend.fog_mode(m));
                    emit_if_changed(
                        &mut cache.fog_params,
                        (start.to_bits(), end.to_bits(), density.to_bits()),
                        |_| backend.fog_params(start, end, density),
                    );
                    true
                }
                None => false,
            },
            (false, _) => false,
        };
        set_capability(backend, &mut cache.fog, Capability::Fog, backend_fog);

        // Pre-lit vertices the backend does not fog carry their fog factor in specular alpha.
        let software_fog = fog_enabled && lit && !backend_fog;
        if software_fog {
            self.fog_table
                .rebuild_if_stale(render.value(d3d::D3DRENDERSTATE_FOGCOLOR));
        }

        let lighting = !lit && render.enabled(d3d::D3DRENDERSTATE_LIGHTING);
        set_capability(backend, &mut cache.lighting, Capability::Lighting, lighting);
        if lighting {
            emit_if_changed(
                &mut cache.ambient,
                render.value(d3d::D3DRENDERSTATE_AMBIENT),
                |ambient| backend.light_model_ambient(argb_to_rgba(ambient)),
            );
        }

        let color_material = lighting
            && render.enabled(d3d::D3DRENDERSTATE_COLORVERTEX)
            && [
                d3d::D3DRENDERSTATE_DIFFUSEMATERIALSOURCE,
                d3d::D3DRENDERSTATE_AMBIENTMATERIALSOURCE,
                d3d::D3DRENDERSTATE_EMISSIVEMATERIALSOURCE,
                d3d::D3DRENDERSTATE_SPECULARMATERIALSOURCE,
            ]
            .iter()
            .any(|&id| render.value(id) != d3d::D3DMCS_MATERIAL);
        set_capability(backend, &mut cache.color_material, Capability::ColorMaterial, color_material);
        software_fog
    }

    /// Loads view, clip planes, lights, world and projection for object-space vertices.
    fn load_camera(&mut self) {
        let render = &self.tables.render;
        let backend = &mut self.backend;
        let transforms = &mut self.transforms;

        backend.load_matrix(MatrixMode::ModelView, &transforms.view);
        // Clip planes and lights are specified in world space; the modelview holds the view.
        if render.enabled(d3d::D3DRENDERSTATE_CLIPPING) {
            let mask = render.value(d3d::D3DRENDERSTATE_CLIPPLANEENABLE);
            for (index, plane) in self.clip_planes.iter().enumerate() {
                if index < 32 && mask & (1 << index) != 0 {
                    backend.clip_plane(index, plane.map(f64::from));
                }
            }
        }
        if render.enabled(d3d::D3DRENDERSTATE_LIGHTING) {
            self.lights.upload(backend);
        }
        backend.multiply_matrix(MatrixMode::ModelView, &transforms.world);
        backend.load_matrix(MatrixMode::Projection, &transforms.projection);
        transforms.mode = TransformMode::Normal;
    }

    /// Texcoord sources for the first `active` stages.
    fn texcoord_sources<'a>(
        &self,
        layout: &FvfLayout,
        view: &StrideView<'a>,
        active: usize,
    ) -> Vec<TexSource<'a>> {
        let count = layout.texcoords.len();
        if count == 0 {
            return Vec::new();
        }
        (0..active)
            .filter_map(|unit| {
                let requested = (self.tables.stages.value(unit, d3d::D3DTSS_TEXCOORDINDEX) & 0xFFFF) as usize;
                let set = if requested >= count {
                    warn!(
                        stage = unit,
                        requested,
                        available = count,
                        "texture coordinate index out of range, clamping"
                    );
                    count - 1
                } else {
                    requested
                };
                let stream = view.texcoords[set]?;
                Some(TexSource {
                    unit,
                    stream,
                    size: layout.texcoords[set].components(),
                })
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_vertices(
        &mut self,
        topology: Topology,
        layout: &FvfLayout,
        view: &StrideView<'_>,
        vertex_count: usize,
        indices: Option<&[u16]>,
        lit: bool,
        active: usize,
        software_fog: bool,
    ) {
        let Some(position) = view.position else {
            return;
        };
        let count = indices.map_or(vertex_count, <[u16]>::len);
        let vertex_at = |n: usize| indices.map_or(n, |i| usize::from(i[n]));
        let tex_sources = self.texcoord_sources(layout, view, active);
        let colors = ColorEmitter {
            render: &self.tables.render,
            fog: software_fog.then_some(&self.fog_table),
        };
        let backend = &mut self.backend;

        let fast_vertex = layout.fvf == Fvf::VERTEX;
        let fast_tlvertex = layout.fvf == Fvf::TLVERTEX;
        if (fast_vertex || fast_tlvertex) && active <= 1 {
            let tex = tex_sources.first();
            backend.begin(topology);
            for n in 0..count {
                let v = vertex_at(n);
                if fast_vertex {
                    if let Some(normal) = view.normal {
                        backend.normal3(normal.floats::<3>(v));
                    }
                } else {
                    let diffuse = view.diffuse.map_or(0xFFFF_FFFF, |s| s.color(v));
                    let specular = view.specular.map_or(0, |s| s.color(v));
                    colors.diffuse_and_specular(backend, diffuse, specular, true);
                }
                if let Some(tex) = tex {
                    backend.tex_coord(0, &tex.stream.floats::<2>(v));
                }
                emit_position(backend, layout.position, &position, v);
            }
            backend.end();
            return;
        }

        if layout.position == PositionType::Xyz && !layout.has_diffuse && !layout.has_specular {
            let mut texcoords = [None; 8];
            for tex in &tex_sources {
                texcoords[tex.unit] = Some(Stream {
                    components: tex.size,
                    ..tex.stream
                });
            }
            let arrays = VertexArrays {
                position,
                normal: if layout.has_normal { view.normal } else { None },
                texcoords,
            };
            match indices {
                Some(indices) => backend.draw_elements(topology, &arrays, indices),
                None => backend.draw_arrays(topology, &arrays, 0, vertex_count),
            }
            return;
        }

        backend.begin(topology);
        for n in 0..count {
            let v = vertex_at(n);
            if let Some(normal) = view.normal.filter(|_| layout.has_normal) {
                backend.normal3(normal.floats::<3>(v));
            }
            let diffuse = view.diffuse.filter(|_| layout.has_diffuse);
            let specular = view.specular.filter(|_| layout.has_specular);
            match (diffuse, specular) {
                (Some(d), Some(s)) => colors.diffuse_and_specular(backend, d.color(v), s.color(v), lit),
                (None, Some(s)) => colors.specular(backend, s.color(v), lit),
                (Some(d), None) => colors.diffuse(backend, d.color(v), lit),
                (None, None) => {}
            }
            for tex in &tex_sources {
                let coords = tex.stream.floats::<4>(v);
                backend.tex_coord(tex.unit, &coords[..tex.size]);
            }
            emit_position(backend, layout.position, &position, v);
        }
        backend.end();
    }
}

/// Caller-built streams must hold at least as many components as the format reads.
fn check_streams(layout: &FvfLayout, view: &StrideView<'_>) -> Result<()> {
    let mut expected = vec![
        ("position", view.position, layout.position.components()),
        ("normal", view.normal.filter(|_| layout.has_normal), 3),
        ("diffuse", view.diffuse.filter(|_| layout.has_diffuse), 1),
        ("specular", view.specular.filter(|_| layout.has_specular), 1),
    ];
    for (set, size) in layout.texcoords.iter().enumerate() {
        expected.push(("texcoord", view.texcoords[set], size.components()));
    }
    for (attribute, stream, required) in expected {
        if let Some(stream) = stream.filter(|s| s.components < required) {
            return Err(D3dError::InvalidStream {
                attribute,
                components: stream.components,
                required,
            });
        }
    }
    Ok(())
}

/// Decodes `fvf`; weighted positions skip the draw rather than fail it.
fn decode_layout(fvf: Fvf) -> Result<Option<FvfLayout>> {
    match FvfLayout::new(fvf) {
        Ok(layout) => Ok(Some(layout)),
        Err(FvfError::UnsupportedPosition { fvf, weights }) => {
            error!(fvf, weights, "vertex blending weights are not supported, skipping draw");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_unpack_from_bgra_memory_order() {
        assert_eq!(rgb(0x8011_2233), [0x11, 0x22, 0x33]);
        assert_eq!(rgba(0x8011_2233), [0x11, 0x22, 0x33, 0x80]);
    }

    #[test]
    fn tiny_rhw_falls_back_to_xyz() {
        use crate::backend::recording::{BackendCall, RecordingBackend};

        let bytes: Vec<u8> = bytemuck::cast_slice(&[1.0f32, 2.0, 3.0, 0.0, 4.0, 6.0, 8.0, 2.0]).to_vec();
        let stream = Stream::new(&bytes, 0, 16, 4);
        let mut backend = RecordingBackend::new();
        emit_position(&mut backend, PositionType::XyzRhw, &stream, 0);
        emit_position(&mut backend, PositionType::XyzRhw, &stream, 1);
        assert_eq!(
            backend.take_calls(),
            vec![
                BackendCall::Vertex3([1.0, 2.0, 3.0]),
                BackendCall::Vertex4([2.0, 3.0, 4.0, 0.5]),
            ]
        );
    }
}
