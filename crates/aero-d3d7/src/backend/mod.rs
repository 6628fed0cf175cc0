//! The immediate-mode rasterizer the device drives.
//!
//! The model is a classic fixed-function GL state machine: global enables, a matrix stack per mode,
//! per-unit texture environment and a `begin`/`end` vertex submission path alongside client arrays.
//! Every method is required; the device only ever calls what it needs for the current state change.

pub mod recording;

use bitflags::bitflags;

use crate::fixed_function::fvf::Stream;
use crate::light::Material;
use crate::transform::Matrix;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    AlphaTest,
    StencilTest,
    CullFace,
    Blend,
    Dither,
    Fog,
    Lighting,
    ColorMaterial,
    ScissorTest,
    PolygonOffsetFill,
    Light(usize),
    ClipPlane(usize),
    Texture2d(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    InvSrcColor,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    DestColor,
    InvDestColor,
    SrcAlphaSat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrSat,
    DecrSat,
    Invert,
    Incr,
    Decr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Winding {
    Cw,
    Ccw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShadeModel {
    Flat,
    Smooth,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Point,
    Line,
    Fill,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FogMode {
    Linear,
    Exp,
    Exp2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorMaterialParam {
    Diffuse,
    Ambient,
    Specular,
    Emission,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatrixMode {
    ModelView,
    Projection,
    Texture(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TexEnvMode {
    Modulate,
    Combine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Rgb,
    Alpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombineFunc {
    Replace,
    Modulate,
    Add,
    AddSigned,
    Interpolate,
    Subtract,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombineSource {
    Previous,
    PrimaryColor,
    Texture,
    Constant,
    Secondary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombineOperand {
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
    ClampToBorder,
    MirroredRepeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MagFilter {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

/// Complete sampler state for one texture unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerState {
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub mag_filter: MagFilter,
    pub min_filter: MinFilter,
    pub border_color: [f32; 4],
    pub lod_bias: f32,
    pub max_level: u32,
    pub max_anisotropy: u32,
}

/// Backend handle of an uploaded texture. Allocation lives in the surface layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Light parameters in backend terms (positions already in eye space via the loaded modelview).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackendLight {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// `w == 0` for directional lights.
    pub position: [f32; 4],
    pub spot_direction: [f32; 3],
    pub spot_exponent: f32,
    /// Degrees; 180 disables the cone.
    pub spot_cutoff: f32,
    pub attenuation: [f32; 3],
}

/// Inclusive-exclusive rectangle in target pixels, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ClearBuffers: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Client arrays for the bulk path. `texcoords[unit]` feeds texture unit `unit`.
#[derive(Clone, Copy, Debug)]
pub struct VertexArrays<'a> {
    pub position: Stream<'a>,
    pub normal: Option<Stream<'a>>,
    pub texcoords: [Option<Stream<'a>>; 8],
}

pub trait Backend {
    fn enable(&mut self, cap: Capability);
    fn disable(&mut self, cap: Capability);

    fn depth_func(&mut self, func: CompareFunc);
    fn depth_mask(&mut self, write: bool);
    fn alpha_func(&mut self, func: CompareFunc, reference: f32);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32);
    fn stencil_op(&mut self, fail: StencilOp, zfail: StencilOp, pass: StencilOp);
    fn stencil_mask(&mut self, mask: u32);
    fn front_face(&mut self, winding: Winding);
    fn shade_model(&mut self, model: ShadeModel);
    fn polygon_mode(&mut self, mode: PolygonMode);
    fn polygon_offset(&mut self, factor: f32, units: f32);

    fn fog_mode(&mut self, mode: FogMode);
    fn fog_params(&mut self, start: f32, end: f32, density: f32);
    fn fog_color(&mut self, color: [f32; 4]);

    fn light_model_ambient(&mut self, color: [f32; 4]);
    fn color_material(&mut self, param: ColorMaterialParam);
    fn material(&mut self, material: &Material);
    fn light(&mut self, slot: usize, light: &BackendLight);
    fn clip_plane(&mut self, index: usize, plane: [f64; 4]);

    fn load_matrix(&mut self, mode: MatrixMode, matrix: &Matrix);
    fn load_identity(&mut self, mode: MatrixMode);
    fn multiply_matrix(&mut self, mode: MatrixMode, matrix: &Matrix);
    fn translate(&mut self, mode: MatrixMode, offset: [f32; 3]);

    fn bind_texture(&mut self, unit: usize, texture: Option<TextureId>);
    fn tex_env_mode(&mut self, unit: usize, mode: TexEnvMode);
    fn combine_func(&mut self, unit: usize, channel: Channel, func: CombineFunc);
    fn combine_source(
        &mut self,
        unit: usize,
        channel: Channel,
        slot: usize,
        source: CombineSource,
        operand: CombineOperand,
    );
    fn combine_scale(&mut self, unit: usize, channel: Channel, scale: f32);
    fn tex_env_color(&mut self, unit: usize, color: [f32; 4]);
    fn sampler(&mut self, unit: usize, state: &SamplerState);

    fn begin(&mut self, topology: Topology);
    fn end(&mut self);
    fn normal3(&mut self, normal: [f32; 3]);
    fn color3ub(&mut self, rgb: [u8; 3]);
    fn color4ub(&mut self, rgba: [u8; 4]);
    fn tex_coord(&mut self, unit: usize, coords: &[f32]);
    fn vertex3(&mut self, position: [f32; 3]);
    fn vertex4(&mut self, position: [f32; 4]);

    fn draw_arrays(&mut self, topology: Topology, arrays: &VertexArrays<'_>, first: usize, count: usize);
    fn draw_elements(&mut self, topology: Topology, arrays: &VertexArrays<'_>, indices: &[u16]);

    fn clear_color(&mut self, color: [f32; 4]);
    fn clear_depth(&mut self, depth: f64);
    fn clear_stencil(&mut self, stencil: i32);
    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear(&mut self, buffers: ClearBuffers);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn depth_range(&mut self, near: f32, far: f32);

    /// Uploads a memory-written region of the back buffer into the framebuffer.
    fn flush_to_framebuffer(&mut self, rect: Rect);
    /// Blocks until every queued command has reached the framebuffer.
    fn finish(&mut self);
}
