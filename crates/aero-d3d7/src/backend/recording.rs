//! A [`Backend`] that records every call, for tests and debugging.

use super::*;

#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    Enable(Capability),
    Disable(Capability),
    DepthFunc(CompareFunc),
    DepthMask(bool),
    AlphaFunc(CompareFunc, f32),
    BlendFunc(BlendFactor, BlendFactor),
    StencilFunc(CompareFunc, i32, u32),
    StencilOp(StencilOp, StencilOp, StencilOp),
    StencilMask(u32),
    FrontFace(Winding),
    ShadeModel(ShadeModel),
    PolygonMode(PolygonMode),
    PolygonOffset(f32, f32),
    FogMode(FogMode),
    FogParams { start: f32, end: f32, density: f32 },
    FogColor([f32; 4]),
    LightModelAmbient([f32; 4]),
    ColorMaterial(ColorMaterialParam),
    Material(Material),
    Light(usize, BackendLight),
    ClipPlane(usize, [f64; 4]),
    LoadMatrix(MatrixMode, Matrix),
    LoadIdentity(MatrixMode),
    MultiplyMatrix(MatrixMode, Matrix),
    Translate(MatrixMode, [f32; 3]),
    BindTexture(usize, Option<TextureId>),
    TexEnvMode(usize, TexEnvMode),
    CombineFunc(usize, Channel, CombineFunc),
    CombineSource {
        unit: usize,
        channel: Channel,
        slot: usize,
        source: CombineSource,
        operand: CombineOperand,
    },
    CombineScale(usize, Channel, f32),
    TexEnvColor(usize, [f32; 4]),
    Sampler(usize, SamplerState),
    Begin(Topology),
    End,
    Normal([f32; 3]),
    Color3([u8; 3]),
    Color4([u8; 4]),
    TexCoord(usize, Vec<f32>),
    Vertex3([f32; 3]),
    Vertex4([f32; 4]),
    DrawArrays {
        topology: Topology,
        first: usize,
        count: usize,
        positions: Vec<[f32; 3]>,
        has_normals: bool,
        texcoord_units: Vec<usize>,
    },
    DrawElements {
        topology: Topology,
        indices: Vec<u16>,
        positions: Vec<[f32; 3]>,
        has_normals: bool,
        texcoord_units: Vec<usize>,
    },
    ClearColor([f32; 4]),
    ClearDepth(f64),
    ClearStencil(i32),
    Scissor(i32, i32, i32, i32),
    Clear(ClearBuffers),
    Viewport(i32, i32, i32, i32),
    DepthRange(f32, f32),
    FlushToFramebuffer(Rect),
    Finish,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| pred(call)).count()
    }

    /// Primitives submitted through any path (`begin` blocks and array draws).
    pub fn primitive_count(&self) -> usize {
        self.count(|call| {
            matches!(
                call,
                BackendCall::Begin(_)
                    | BackendCall::DrawArrays { .. }
                    | BackendCall::DrawElements { .. }
            )
        })
    }

    /// Every immediate-mode vertex, widened to four components (`w = 1` for `vertex3`).
    pub fn immediate_vertices(&self) -> Vec<[f32; 4]> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Vertex3([x, y, z]) => Some([*x, *y, *z, 1.0]),
                BackendCall::Vertex4(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn matrix_loads(&self, mode: MatrixMode) -> usize {
        self.count(|call| match call {
            BackendCall::LoadMatrix(m, _) | BackendCall::LoadIdentity(m) => *m == mode,
            _ => false,
        })
    }

    fn push(&mut self, call: BackendCall) {
        self.calls.push(call);
    }
}

fn array_positions(arrays: &VertexArrays<'_>, vertices: impl Iterator<Item = usize>) -> Vec<[f32; 3]> {
    vertices.map(|v| arrays.position.floats::<3>(v)).collect()
}

fn array_units(arrays: &VertexArrays<'_>) -> Vec<usize> {
    arrays
        .texcoords
        .iter()
        .enumerate()
        .filter_map(|(unit, stream)| stream.map(|_| unit))
        .collect()
}

impl Backend for RecordingBackend {
    fn enable(&mut self, cap: Capability) {
        self.push(BackendCall::Enable(cap));
    }

    fn disable(&mut self, cap: Capability) {
        self.push(BackendCall::Disable(cap));
    }

    fn depth_func(&mut self, func: CompareFunc) {
        self.push(BackendCall::DepthFunc(func));
    }

    fn depth_mask(&mut self, write: bool) {
        self.push(BackendCall::DepthMask(write));
    }

    fn alpha_func(&mut self, func: CompareFunc, reference: f32) {
        self.push(BackendCall::AlphaFunc(func, reference));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.push(BackendCall::BlendFunc(src, dst));
    }

    fn stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        self.push(BackendCall::StencilFunc(func, reference, mask));
    }

    fn stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, pass: StencilOp) {
        self.push(BackendCall::StencilOp(fail, zfail, pass));
    }

    fn stencil_mask(&mut self, mask: u32) {
        self.push(BackendCall::StencilMask(mask));
    }

    fn front_face(&mut self, winding: Winding) {
        self.push(BackendCall::FrontFace(winding));
    }

    fn shade_model(&mut self, model: ShadeModel) {
        self.push(BackendCall::ShadeModel(model));
    }

    fn polygon_mode(&mut self, mode: PolygonMode) {
        self.push(BackendCall::PolygonMode(mode));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.push(BackendCall::PolygonOffset(factor, units));
    }

    fn fog_mode(&mut self, mode: FogMode) {
        self.push(BackendCall::FogMode(mode));
    }

    fn fog_params(&mut self, start: f32, end: f32, density: f32) {
        self.push(BackendCall::FogParams {
            start,
            end,
            density,
        });
    }

    fn fog_color(&mut self, color: [f32; 4]) {
        self.push(BackendCall::FogColor(color));
    }

    fn light_model_ambient(&mut self, color: [f32; 4]) {
        self.push(BackendCall::LightModelAmbient(color));
    }

    fn color_material(&mut self, param: ColorMaterialParam) {
        self.push(BackendCall::ColorMaterial(param));
    }

    fn material(&mut self, material: &Material) {
        self.push(BackendCall::Material(*material));
    }

    fn light(&mut self, slot: usize, light: &BackendLight) {
        self.push(BackendCall::Light(slot, *light));
    }

    fn clip_plane(&mut self, index: usize, plane: [f64; 4]) {
        self.push(BackendCall::ClipPlane(index, plane));
    }

    fn load_matrix(&mut self, mode: MatrixMode, matrix: &Matrix) {
        self.push(BackendCall::LoadMatrix(mode, *matrix));
    }

    fn load_identity(&mut self, mode: MatrixMode) {
        self.push(BackendCall::LoadIdentity(mode));
    }

    fn multiply_matrix(&mut self, mode: MatrixMode, matrix: &Matrix) {
        self.push(BackendCall::MultiplyMatrix(mode, *matrix));
    }

    fn translate(&mut self, mode: MatrixMode, offset: [f32; 3]) {
        self.push(BackendCall::Translate(mode, offset));
    }

    fn bind_texture(&mut self, unit: usize, texture: Option<TextureId>) {
        self.push(BackendCall::BindTexture(unit, texture));
    }

    fn tex_env_mode(&mut self, unit: usize, mode: TexEnvMode) {
        self.push(BackendCall::TexEnvMode(unit, mode));
    }

    fn combine_func(&mut self, unit: usize, channel: Channel, func: CombineFunc) {
        self.push(BackendCall::CombineFunc(unit, channel, func));
    }

    fn combine_source(
        &mut self,
        unit: usize,
        channel: Channel,
        slot: usize,
        source: CombineSource,
        operand: CombineOperand,
    ) {
        self.push(BackendCall::CombineSource {
            unit,
            channel,
            slot,
            source,
            operand,
        });
    }

    fn combine_scale(&mut self, unit: usize, channel: Channel, scale: f32) {
        self.push(BackendCall::CombineScale(unit, channel, scale));
    }

    fn tex_env_color(&mut self, unit: usize, color: [f32; 4]) {
        self.push(BackendCall::TexEnvColor(unit, color));
    }

    fn sampler(&mut self, unit: usize, state: &SamplerState) {
        self.push(BackendCall::Sampler(unit, *state));
    }

    fn begin(&mut self, topology: Topology) {
        self.push(BackendCall::Begin(topology));
    }

    fn end(&mut self) {
        self.push(BackendCall::End);
    }

    fn normal3(&mut self, normal: [f32; 3]) {
        self.push(BackendCall::Normal(normal));
    }

    fn color3ub(&mut self, rgb: [u8; 3]) {
        self.push(BackendCall::Color3(rgb));
    }

    fn color4ub(&mut self, rgba: [u8; 4]) {
        self.push(BackendCall::Color4(rgba));
    }

    fn tex_coord(&mut self, unit: usize, coords: &[f32]) {
        self.push(BackendCall::TexCoord(unit, coords.to_vec()));
    }

    fn vertex3(&mut self, position: [f32; 3]) {
        self.push(BackendCall::Vertex3(position));
    }

    fn vertex4(&mut self, position: [f32; 4]) {
        self.push(BackendCall::Vertex4(position));
    }

    fn draw_arrays(&mut self, topology: Topology, arrays: &VertexArrays<'_>, first: usize, count: usize) {
        self.push(BackendCall::DrawArrays {
            topology,
            first,
            count,
            positions: array_positions(arrays, first..first + count),
            has_normals: arrays.normal.is_some(),
            texcoord_units: array_units(arrays),
        });
    }

    fn draw_elements(&mut self, topology: Topology, arrays: &VertexArrays<'_>, indices: &[u16]) {
        self.push(BackendCall::DrawElements {
            topology,
            indices: indices.to_vec(),
            positions: array_positions(arrays, indices.iter().map(|&i| usize::from(i))),
            has_normals: arrays.normal.is_some(),
            texcoord_units: array_units(arrays),
        });
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.push(BackendCall::ClearColor(color));
    }

    fn clear_depth(&mut self, depth: f64) {
        self.push(BackendCall::ClearDepth(depth));
    }

    fn clear_stencil(&mut self, stencil: i32) {
        self.push(BackendCall::ClearStencil(stencil));
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.push(BackendCall::Scissor(x, y, width, height));
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        self.push(BackendCall::Clear(buffers));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.push(BackendCall::Viewport(x, y, width, height));
    }

    fn depth_range(&mut self, near: f32, far: f32) {
        self.push(BackendCall::DepthRange(near, far));
    }

    fn flush_to_framebuffer(&mut self, rect: Rect) {
        self.push(BackendCall::FlushToFramebuffer(rect));
    }

    fn finish(&mut self) {
        self.push(BackendCall::Finish);
    }
}
