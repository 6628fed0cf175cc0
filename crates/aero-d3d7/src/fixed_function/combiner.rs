//! Maps texture-stage combine states onto the backend's per-unit combine environment.
//!
//! One texture stage drives one backend texture unit. Color and alpha channels are configured
//! independently; every backend write is cached per unit so redundant stage-state writes are free.

use tracing::{debug, warn};

use crate::backend::{
    Backend, Capability, Channel, CombineFunc, CombineOperand, CombineSource, MagFilter, MinFilter,
    SamplerState, TexEnvMode, TextureId, WrapMode,
};
use crate::config::{BackendCaps, MAX_TEXTURE_STAGES};
use crate::d3d;
use crate::fixed_function::tss::{TextureArg, TextureArgument, TextureOp};
use crate::state::table::StateBlock;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombineArg {
    pub source: CombineSource,
    pub operand: CombineOperand,
}

/// What the backend was told for one channel of one stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelCombine {
    /// `None` while the channel is disabled or its op is unsupported.
    pub func: Option<CombineFunc>,
    pub scale: f32,
    /// Backend argument slots 0..3; slot 2 is only used by interpolation.
    pub args: [Option<CombineArg>; 3],
    /// Whether slots 0 and 1 currently hold ARG2 and ARG1 (SELECTARG2 routing).
    pub swapped: bool,
}

impl Default for ChannelCombine {
    fn default() -> Self {
        Self {
            func: None,
            scale: 1.0,
            args: [None; 3],
            swapped: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageCombine {
    pub color: ChannelCombine,
    pub alpha: ChannelCombine,
}

impl StageCombine {
    fn channel_mut(&mut self, channel: Channel) -> &mut ChannelCombine {
        match channel {
            Channel::Rgb => &mut self.color,
            Channel::Alpha => &mut self.alpha,
        }
    }
}

/// Backend-side state of one texture unit as last emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct UnitState {
    env_combine: bool,
    texture_enabled: bool,
    texture: Option<TextureId>,
    sampler: Option<SamplerState>,
    constant: Option<[f32; 4]>,
}

#[derive(Debug)]
pub struct Combiner {
    caps: BackendCaps,
    units: Vec<UnitState>,
    stages: [StageCombine; MAX_TEXTURE_STAGES],
    mirror_warned: bool,
    specular_warned: bool,
    unsupported_op_warned: bool,
}

fn op_state(channel: Channel) -> u32 {
    match channel {
        Channel::Rgb => d3d::D3DTSS_COLOROP,
        Channel::Alpha => d3d::D3DTSS_ALPHAOP,
    }
}

fn arg_state(channel: Channel, which: usize) -> u32 {
    match (channel, which) {
        (Channel::Rgb, 0) => d3d::D3DTSS_COLORARG1,
        (Channel::Rgb, _) => d3d::D3DTSS_COLORARG2,
        (Channel::Alpha, 0) => d3d::D3DTSS_ALPHAARG1,
        (Channel::Alpha, _) => d3d::D3DTSS_ALPHAARG2,
    }
}

/// Unpacks a packed ARGB color into RGBA floats.
pub fn argb_to_rgba(color: u32) -> [f32; 4] {
    let byte = |shift: u32| ((color >> shift) & 0xFF) as f32 / 255.0;
    [byte(16), byte(8), byte(0), byte(24)]
}

impl Combiner {
    pub fn new(caps: BackendCaps, backend_stages: usize) -> Self {
        Self {
            caps,
            units: vec![UnitState::default(); backend_stages],
            stages: [StageCombine::default(); MAX_TEXTURE_STAGES],
            mirror_warned: false,
            specular_warned: false,
            unsupported_op_warned: false,
        }
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn stage(&self, stage: usize) -> Option<&StageCombine> {
        self.stages.get(stage)
    }

    pub fn bound_texture(&self, unit: usize) -> Option<TextureId> {
        self.units.get(unit).and_then(|u| u.texture)
    }

    /// Puts every unit into a known state: no texture, 2D texturing off, plain modulate env.
    pub fn reset<B: Backend>(&mut self, backend: &mut B) {
        for unit in 0..self.units.len() {
            backend.bind_texture(unit, None);
            backend.disable(Capability::Texture2d(unit));
            backend.tex_env_mode(unit, TexEnvMode::Modulate);
            self.units[unit] = UnitState::default();
        }
        self.stages = [StageCombine::default(); MAX_TEXTURE_STAGES];
    }

    /// Realizes one texture-stage state write.
    pub fn apply_stage_state<B: Backend>(
        &mut self,
        backend: &mut B,
        tables: &StateBlock,
        stage: usize,
        id: u32,
    ) {
        if stage >= self.units.len() {
            debug!(stage, id, "texture stage has no backend unit, state stored only");
            return;
        }
        let value = tables.stages.value(stage, id);

        match id {
            d3d::D3DTSS_COLOROP => self.apply_op(backend, tables, stage, Channel::Rgb),
            d3d::D3DTSS_ALPHAOP => self.apply_op(backend, tables, stage, Channel::Alpha),
            d3d::D3DTSS_COLORARG1 => self.resolve_arg(backend, tables, stage, Channel::Rgb, 0),
            d3d::D3DTSS_COLORARG2 => self.resolve_arg(backend, tables, stage, Channel::Rgb, 1),
            d3d::D3DTSS_ALPHAARG1 => self.resolve_arg(backend, tables, stage, Channel::Alpha, 0),
            d3d::D3DTSS_ALPHAARG2 => self.resolve_arg(backend, tables, stage, Channel::Alpha, 1),
            d3d::D3DTSS_TEXCOORDINDEX => {
                if value & d3d::D3DTSS_TCI_MASK != d3d::D3DTSS_TCI_PASSTHRU {
                    warn!(stage, value, "texture coordinate generation is not supported");
                }
            }
            d3d::D3DTSS_MIPMAPLODBIAS => {
                if value != 0 && !self.caps.lod_bias {
                    warn!(stage, value, "backend has no LOD bias support");
                }
            }
            d3d::D3DTSS_ADDRESS
            | d3d::D3DTSS_ADDRESSU
            | d3d::D3DTSS_ADDRESSV
            | d3d::D3DTSS_BORDERCOLOR
            | d3d::D3DTSS_MAGFILTER
            | d3d::D3DTSS_MINFILTER
            | d3d::D3DTSS_MIPFILTER
            | d3d::D3DTSS_MAXMIPLEVEL
            | d3d::D3DTSS_MAXANISOTROPY
            | d3d::D3DTSS_TEXTURETRANSFORMFLAGS => {
                // Sampler state goes out at draw time; texture matrices belong to the transform
                // state.
            }
            _ => debug!(stage, id, value, "unhandled texture stage state"),
        }
    }

    fn apply_op<B: Backend>(
        &mut self,
        backend: &mut B,
        tables: &StateBlock,
        stage: usize,
        channel: Channel,
    ) {
        let unit = stage;
        let value = tables.stages.value(stage, op_state(channel));
        let color_op = tables.stages.value(stage, d3d::D3DTSS_COLOROP);

        if value == d3d::D3DTOP_DISABLE {
            if channel == Channel::Rgb && self.units[unit].texture_enabled {
                backend.disable(Capability::Texture2d(unit));
                self.units[unit].texture_enabled = false;
            }
            self.stages[stage].channel_mut(channel).func = None;
            return;
        }

        if color_op != d3d::D3DTOP_DISABLE {
            let state = &mut self.units[unit];
            if state.texture.is_some() && !state.texture_enabled {
                backend.enable(Capability::Texture2d(unit));
                state.texture_enabled = true;
            }
            if !state.env_combine {
                backend.tex_env_mode(unit, TexEnvMode::Combine);
                state.env_combine = true;
            }
        }

        let resolved = match TextureOp::from_d3d(value) {
            Some(TextureOp::SelectArg1 | TextureOp::SelectArg2) => Some((CombineFunc::Replace, 1.0)),
            Some(TextureOp::Modulate) => Some((CombineFunc::Modulate, 1.0)),
            Some(TextureOp::Modulate2x) => Some((CombineFunc::Modulate, 2.0)),
            Some(TextureOp::Modulate4x) => Some((CombineFunc::Modulate, 4.0)),
            Some(TextureOp::Add) => Some((CombineFunc::Add, 1.0)),
            Some(TextureOp::AddSigned) => Some((CombineFunc::AddSigned, 1.0)),
            Some(TextureOp::AddSigned2x) => Some((CombineFunc::AddSigned, 2.0)),
            Some(TextureOp::Subtract) if self.caps.combine_subtract => {
                Some((CombineFunc::Subtract, 1.0))
            }
            Some(
                op @ (TextureOp::BlendDiffuseAlpha
                | TextureOp::BlendTextureAlpha
                | TextureOp::BlendFactorAlpha
                | TextureOp::BlendCurrentAlpha),
            ) => {
                let source = match op {
                    TextureOp::BlendDiffuseAlpha => CombineSource::PrimaryColor,
                    TextureOp::BlendTextureAlpha => CombineSource::Texture,
                    TextureOp::BlendFactorAlpha => {
                        let tfactor = tables.render.value(d3d::D3DRENDERSTATE_TEXTUREFACTOR);
                        self.load_constant(backend, unit, tfactor);
                        CombineSource::Constant
                    }
                    _ => CombineSource::Previous,
                };
                let operand = CombineOperand::SrcAlpha;
                backend.combine_source(unit, channel, 2, source, operand);
                self.stages[stage].channel_mut(channel).args[2] = Some(CombineArg { source, operand });
                Some((CombineFunc::Interpolate, 1.0))
            }
            Some(op) => {
                if self.unsupported_op_warned {
                    debug!(stage, ?op, ?channel, "unsupported texture op");
                } else {
                    warn!(stage, ?op, ?channel, "unsupported texture op");
                    self.unsupported_op_warned = true;
                }
                None
            }
            None => {
                debug!(stage, value, ?channel, "unknown texture op");
                None
            }
        };

        let combine = self.stages[stage].channel_mut(channel);
        match resolved {
            Some((func, scale)) => {
                backend.combine_func(unit, channel, func);
                backend.combine_scale(unit, channel, scale);
                combine.func = Some(func);
                combine.scale = scale;
            }
            None => combine.func = None,
        }

        // SELECTARG2 routes ARG2 through backend slot 0. DISABLE leaves the slots as they were, so
        // the comparison is against the routing the slots actually hold.
        let swap = value == d3d::D3DTOP_SELECTARG2;
        if self.stages[stage].channel_mut(channel).swapped != swap {
            self.resolve_arg(backend, tables, stage, channel, 0);
            self.resolve_arg(backend, tables, stage, channel, 1);
            self.stages[stage].channel_mut(channel).swapped = swap;
        }
    }

    /// Maps argument `which` (0 for ARG1, 1 for ARG2) of a channel onto its backend slot.
    pub fn resolve_arg<B: Backend>(
        &mut self,
        backend: &mut B,
        tables: &StateBlock,
        stage: usize,
        channel: Channel,
        which: usize,
    ) {
        if stage >= self.units.len() {
            return;
        }
        let unit = stage;
        let op = tables.stages.value(stage, op_state(channel));
        // A disabled channel keeps whatever routing its slots were last given.
        let swapped = match op {
            d3d::D3DTOP_SELECTARG2 => true,
            d3d::D3DTOP_DISABLE => self.stages[stage].channel_mut(channel).swapped,
            _ => false,
        };
        let slot = if swapped { 1 - which } else { which };
        let raw = tables.stages.value(stage, arg_state(channel, which));

        let (arg, complement, alpha_replicate) = match TextureArgument::from_d3d(raw) {
            Some(arg) => (Some(arg.arg), arg.complement(), arg.alpha_replicate()),
            None => {
                debug!(stage, raw, ?channel, "unknown texture argument");
                (
                    None,
                    raw & d3d::D3DTA_COMPLEMENT != 0,
                    raw & d3d::D3DTA_ALPHAREPLICATE != 0,
                )
            }
        };

        let source = match arg {
            Some(TextureArg::Current) if stage == 0 => CombineSource::PrimaryColor,
            Some(TextureArg::Current) => CombineSource::Previous,
            Some(TextureArg::Diffuse) => CombineSource::PrimaryColor,
            Some(TextureArg::Texture) | None => CombineSource::Texture,
            Some(TextureArg::TFactor) => {
                let tfactor = tables.render.value(d3d::D3DRENDERSTATE_TEXTUREFACTOR);
                self.load_constant(backend, unit, tfactor);
                CombineSource::Constant
            }
            Some(TextureArg::Specular) if self.caps.secondary_color => CombineSource::Secondary,
            Some(TextureArg::Specular) => {
                if !self.specular_warned {
                    warn!(stage, "specular combine argument unsupported, using texture");
                    self.specular_warned = true;
                }
                CombineSource::Texture
            }
        };

        let operand = match (channel, alpha_replicate, complement) {
            (Channel::Rgb, false, false) => CombineOperand::SrcColor,
            (Channel::Rgb, false, true) => CombineOperand::OneMinusSrcColor,
            (Channel::Rgb, true, false) | (Channel::Alpha, _, false) => CombineOperand::SrcAlpha,
            (Channel::Rgb, true, true) | (Channel::Alpha, _, true) => {
                CombineOperand::OneMinusSrcAlpha
            }
        };

        backend.combine_source(unit, channel, slot, source, operand);
        self.stages[stage].channel_mut(channel).args[slot] = Some(CombineArg { source, operand });
    }

    fn load_constant<B: Backend>(&mut self, backend: &mut B, unit: usize, tfactor: u32) {
        let color = argb_to_rgba(tfactor);
        if self.units[unit].constant != Some(color) {
            backend.tex_env_color(unit, color);
            self.units[unit].constant = Some(color);
        }
    }

    /// Keeps the constant color of units reading TFACTOR in step with TEXTUREFACTOR.
    pub fn refresh_constant<B: Backend>(&mut self, backend: &mut B, unit: usize, tfactor: u32) {
        if unit < self.units.len() && self.units[unit].constant.is_some() {
            self.load_constant(backend, unit, tfactor);
        }
    }

    /// Binds `texture` to `unit` if it is not bound already. Returns whether the binding changed.
    pub fn bind<B: Backend>(
        &mut self,
        backend: &mut B,
        unit: usize,
        texture: Option<TextureId>,
        color_op_enabled: bool,
    ) -> bool {
        let Some(state) = self.units.get_mut(unit) else {
            return false;
        };
        if state.texture == texture {
            return false;
        }
        backend.bind_texture(unit, texture);
        state.texture = texture;
        state.sampler = None;
        match texture {
            None if state.texture_enabled => {
                backend.disable(Capability::Texture2d(unit));
                state.texture_enabled = false;
            }
            Some(_) if color_op_enabled && !state.texture_enabled => {
                backend.enable(Capability::Texture2d(unit));
                state.texture_enabled = true;
            }
            _ => {}
        }
        true
    }

    /// Pushes the stage's sampler state to its unit if it differs from what the unit holds.
    pub fn sync_sampler<B: Backend>(&mut self, backend: &mut B, tables: &StateBlock, stage: usize) {
        if stage >= self.units.len() {
            return;
        }
        let sampler = self.sampler_state(tables, stage);
        if self.units[stage].sampler != Some(sampler) {
            backend.sampler(stage, &sampler);
            self.units[stage].sampler = Some(sampler);
        }
    }

    fn wrap_mode(&mut self, stage: usize, value: u32) -> WrapMode {
        match value {
            d3d::D3DTADDRESS_WRAP => WrapMode::Repeat,
            d3d::D3DTADDRESS_CLAMP => WrapMode::ClampToEdge,
            d3d::D3DTADDRESS_BORDER => WrapMode::ClampToBorder,
            d3d::D3DTADDRESS_MIRROR if self.caps.mirrored_repeat => WrapMode::MirroredRepeat,
            d3d::D3DTADDRESS_MIRROR => {
                if !self.mirror_warned {
                    warn!(stage, "mirrored repeat unsupported by backend, using repeat");
                    self.mirror_warned = true;
                }
                WrapMode::Repeat
            }
            _ => {
                debug!(stage, value, "unknown texture address mode");
                WrapMode::Repeat
            }
        }
    }

    fn sampler_state(&mut self, tables: &StateBlock, stage: usize) -> SamplerState {
        let get = |id| tables.stages.value(stage, id);

        let wrap_s = self.wrap_mode(stage, get(d3d::D3DTSS_ADDRESSU));
        let wrap_t = self.wrap_mode(stage, get(d3d::D3DTSS_ADDRESSV));

        let mag_filter = match get(d3d::D3DTSS_MAGFILTER) {
            d3d::D3DTFG_POINT => MagFilter::Nearest,
            d3d::D3DTFG_LINEAR => MagFilter::Linear,
            value => {
                debug!(stage, value, "mag filter approximated as linear");
                MagFilter::Linear
            }
        };

        let min_linear = match get(d3d::D3DTSS_MINFILTER) {
            d3d::D3DTFN_POINT => false,
            d3d::D3DTFN_LINEAR => true,
            value => {
                debug!(stage, value, "min filter approximated as linear");
                true
            }
        };
        let min_filter = match (min_linear, get(d3d::D3DTSS_MIPFILTER)) {
            (false, d3d::D3DTFP_POINT) => MinFilter::NearestMipmapNearest,
            (true, d3d::D3DTFP_POINT) => MinFilter::LinearMipmapNearest,
            (false, d3d::D3DTFP_LINEAR) => MinFilter::NearestMipmapLinear,
            (true, d3d::D3DTFP_LINEAR) => MinFilter::LinearMipmapLinear,
            (false, _) => MinFilter::Nearest,
            (true, _) => MinFilter::Linear,
        };

        let lod_bias = if self.caps.lod_bias {
            f32::from_bits(get(d3d::D3DTSS_MIPMAPLODBIAS))
        } else {
            0.0
        };

        SamplerState {
            wrap_s,
            wrap_t,
            mag_filter,
            min_filter,
            border_color: argb_to_rgba(get(d3d::D3DTSS_BORDERCOLOR)),
            lod_bias,
            max_level: get(d3d::D3DTSS_MAXMIPLEVEL),
            max_anisotropy: get(d3d::D3DTSS_MAXANISOTROPY).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{BackendCall, RecordingBackend};

    fn setup() -> (Combiner, StateBlock, RecordingBackend) {
        (
            Combiner::new(BackendCaps::default(), 2),
            StateBlock::with_defaults(7),
            RecordingBackend::new(),
        )
    }

    fn set(
        combiner: &mut Combiner,
        tables: &mut StateBlock,
        backend: &mut RecordingBackend,
        stage: usize,
        id: u32,
        value: u32,
    ) {
        tables.stages.set(stage, id, value).unwrap();
        combiner.apply_stage_state(backend, tables, stage, id);
    }

    #[test]
    fn modulate_2x_sets_scale() {
        let (mut combiner, mut tables, mut backend) = setup();
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_MODULATE2X);
        let color = combiner.stage(0).unwrap().color;
        assert_eq!(color.func, Some(CombineFunc::Modulate));
        assert_eq!(color.scale, 2.0);
        assert!(backend
            .calls()
            .contains(&BackendCall::TexEnvMode(0, TexEnvMode::Combine)));
    }

    #[test]
    fn blend_factor_alpha_loads_constant() {
        let (mut combiner, mut tables, mut backend) = setup();
        tables
            .render
            .set(d3d::D3DRENDERSTATE_TEXTUREFACTOR, 0xFF00_00FF)
            .unwrap();
        set(
            &mut combiner,
            &mut tables,
            &mut backend,
            1,
            d3d::D3DTSS_COLOROP,
            d3d::D3DTOP_BLENDFACTORALPHA,
        );
        let color = combiner.stage(1).unwrap().color;
        assert_eq!(color.func, Some(CombineFunc::Interpolate));
        assert_eq!(
            color.args[2],
            Some(CombineArg {
                source: CombineSource::Constant,
                operand: CombineOperand::SrcAlpha
            })
        );
        assert!(backend
            .calls()
            .contains(&BackendCall::TexEnvColor(1, [0.0, 0.0, 1.0, 1.0])));
    }

    #[test]
    fn select_arg2_routing_survives_disable() {
        let (mut combiner, mut tables, mut backend) = setup();
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLORARG1, d3d::D3DTA_TEXTURE);
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLORARG2, d3d::D3DTA_DIFFUSE);
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_SELECTARG2);
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_DISABLE);
        assert!(combiner.stage(0).unwrap().color.swapped);

        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_SELECTARG1);
        let color = combiner.stage(0).unwrap().color;
        assert!(!color.swapped);
        assert_eq!(color.args[0].unwrap().source, CombineSource::Texture);
        assert_eq!(color.args[1].unwrap().source, CombineSource::PrimaryColor);
    }

    #[test]
    fn argument_written_while_disabled_keeps_swapped_routing() {
        let (mut combiner, mut tables, mut backend) = setup();
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLORARG1, d3d::D3DTA_TEXTURE);
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_SELECTARG2);
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_DISABLE);
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLORARG2, d3d::D3DTA_TFACTOR);

        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_SELECTARG2);
        let color = combiner.stage(0).unwrap().color;
        assert_eq!(color.args[0].unwrap().source, CombineSource::Constant);
        assert_eq!(color.args[1].unwrap().source, CombineSource::Texture);
    }

    #[test]
    fn unsupported_op_clears_the_function_every_time() {
        let mut caps = BackendCaps::default();
        caps.combine_subtract = false;
        let mut combiner = Combiner::new(caps, 1);
        let mut tables = StateBlock::with_defaults(7);
        let mut backend = RecordingBackend::new();
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_SUBTRACT);
        assert!(combiner.unsupported_op_warned);
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_ALPHAOP, d3d::D3DTOP_SUBTRACT);
        assert_eq!(combiner.stage(0).unwrap().alpha.func, None);
        assert!(combiner.unsupported_op_warned);
    }

    #[test]
    fn current_on_stage_zero_reads_diffuse() {
        let (mut combiner, mut tables, mut backend) = setup();
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLORARG2, d3d::D3DTA_CURRENT);
        set(&mut combiner, &mut tables, &mut backend, 1, d3d::D3DTSS_COLORARG2, d3d::D3DTA_CURRENT);
        assert_eq!(
            combiner.stage(0).unwrap().color.args[1].unwrap().source,
            CombineSource::PrimaryColor
        );
        assert_eq!(
            combiner.stage(1).unwrap().color.args[1].unwrap().source,
            CombineSource::Previous
        );
    }

    #[test]
    fn complemented_alpha_replicate_operand() {
        let (mut combiner, mut tables, mut backend) = setup();
        set(
            &mut combiner,
            &mut tables,
            &mut backend,
            0,
            d3d::D3DTSS_COLORARG1,
            d3d::D3DTA_TEXTURE | d3d::D3DTA_COMPLEMENT | d3d::D3DTA_ALPHAREPLICATE,
        );
        set(
            &mut combiner,
            &mut tables,
            &mut backend,
            0,
            d3d::D3DTSS_ALPHAARG1,
            d3d::D3DTA_TEXTURE | d3d::D3DTA_COMPLEMENT,
        );
        let stage = combiner.stage(0).unwrap();
        assert_eq!(
            stage.color.args[0].unwrap().operand,
            CombineOperand::OneMinusSrcAlpha
        );
        assert_eq!(
            stage.alpha.args[0].unwrap().operand,
            CombineOperand::OneMinusSrcAlpha
        );
    }

    #[test]
    fn subtract_without_backend_support_is_unhandled() {
        let mut caps = BackendCaps::default();
        caps.combine_subtract = false;
        let mut combiner = Combiner::new(caps, 2);
        let mut tables = StateBlock::with_defaults(7);
        let mut backend = RecordingBackend::new();
        set(&mut combiner, &mut tables, &mut backend, 0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_SUBTRACT);
        assert_eq!(combiner.stage(0).unwrap().color.func, None);
        assert_eq!(
            backend.count(|c| matches!(c, BackendCall::CombineFunc(..))),
            0
        );
    }

    #[test]
    fn stages_past_backend_units_are_inert() {
        let (mut combiner, mut tables, mut backend) = setup();
        set(&mut combiner, &mut tables, &mut backend, 5, d3d::D3DTSS_COLOROP, d3d::D3DTOP_MODULATE);
        assert!(backend.calls().is_empty());
        assert_eq!(tables.stages.value(5, d3d::D3DTSS_COLOROP), d3d::D3DTOP_MODULATE);
    }

    #[test]
    fn sampler_cache_is_dropped_on_rebind() {
        let (mut combiner, tables, mut backend) = setup();
        combiner.bind(&mut backend, 0, Some(TextureId(1)), true);
        combiner.sync_sampler(&mut backend, &tables, 0);
        combiner.sync_sampler(&mut backend, &tables, 0);
        assert_eq!(backend.count(|c| matches!(c, BackendCall::Sampler(..))), 1);

        combiner.bind(&mut backend, 0, Some(TextureId(2)), true);
        combiner.sync_sampler(&mut backend, &tables, 0);
        assert_eq!(backend.count(|c| matches!(c, BackendCall::Sampler(..))), 2);
    }

    #[test]
    fn mirror_falls_back_to_repeat() {
        let mut caps = BackendCaps::default();
        caps.mirrored_repeat = false;
        let mut combiner = Combiner::new(caps, 1);
        let mut tables = StateBlock::with_defaults(7);
        let mut backend = RecordingBackend::new();
        tables
            .stages
            .set(0, d3d::D3DTSS_ADDRESS, d3d::D3DTADDRESS_MIRROR)
            .unwrap();
        combiner.sync_sampler(&mut backend, &tables, 0);
        let BackendCall::Sampler(0, sampler) = backend.calls()[0] else {
            panic!("expected a sampler call, got {:?}", backend.calls());
        };
        assert_eq!(sampler.wrap_s, WrapMode::Repeat);
        assert_eq!(sampler.wrap_t, WrapMode::Repeat);
    }
}
