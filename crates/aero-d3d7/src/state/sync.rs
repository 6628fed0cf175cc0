//! Render-state synchronization: turns one stored render-state write into the smallest set of
//! backend calls, using cached copies of what the backend already holds.

use tracing::{debug, warn};

use crate::backend::{
    Backend, BlendFactor, Capability, CompareFunc, FogMode, PolygonMode, ShadeModel, StencilOp,
    Winding,
};
use crate::d3d;
use crate::fixed_function::combiner::argb_to_rgba;
use crate::state::table::StateBlock;

/// What the backend currently holds, as far as the device knows. `None` means unknown, so the
/// next write always goes out.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackendCache {
    pub depth_test: Option<bool>,
    pub depth_mask: Option<bool>,
    pub alpha_test: Option<bool>,
    pub stencil_test: Option<bool>,
    pub cull_face: Option<bool>,
    pub blend: Option<bool>,
    pub dither: Option<bool>,
    pub fog: Option<bool>,
    pub lighting: Option<bool>,
    pub color_material: Option<bool>,
    pub polygon_offset_fill: Option<bool>,

    pub depth_func: Option<CompareFunc>,
    /// Reference kept as raw bits so the tuple stays `Eq`.
    pub alpha_func: Option<(CompareFunc, u32)>,
    pub blend_func: Option<(BlendFactor, BlendFactor)>,
    pub stencil_func: Option<(CompareFunc, i32, u32)>,
    pub stencil_op: Option<(StencilOp, StencilOp, StencilOp)>,
    pub stencil_mask: Option<u32>,
    pub front_face: Option<Winding>,
    pub shade_model: Option<ShadeModel>,
    pub polygon_mode: Option<PolygonMode>,
    pub polygon_offset: Option<u32>,
    pub fog_color: Option<u32>,
    pub fog_mode: Option<FogMode>,
    pub fog_params: Option<(u32, u32, u32)>,
    pub ambient: Option<u32>,
    pub clip_mask: Option<u32>,

    pub wrap_warned: bool,
}

/// Side effects of a sync the caller has to act on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Clip planes changed: the next object-space draw must reload its transforms.
    pub reset_transform: bool,
}

pub fn d3d_compare_func(value: u32) -> Option<CompareFunc> {
    Some(match value {
        d3d::D3DCMP_NEVER => CompareFunc::Never,
        d3d::D3DCMP_LESS => CompareFunc::Less,
        d3d::D3DCMP_EQUAL => CompareFunc::Equal,
        d3d::D3DCMP_LESSEQUAL => CompareFunc::LessEqual,
        d3d::D3DCMP_GREATER => CompareFunc::Greater,
        d3d::D3DCMP_NOTEQUAL => CompareFunc::NotEqual,
        d3d::D3DCMP_GREATEREQUAL => CompareFunc::GreaterEqual,
        d3d::D3DCMP_ALWAYS => CompareFunc::Always,
        _ => return None,
    })
}

pub fn d3d_stencil_op(value: u32) -> Option<StencilOp> {
    Some(match value {
        d3d::D3DSTENCILOP_KEEP => StencilOp::Keep,
        d3d::D3DSTENCILOP_ZERO => StencilOp::Zero,
        d3d::D3DSTENCILOP_REPLACE => StencilOp::Replace,
        d3d::D3DSTENCILOP_INCRSAT => StencilOp::IncrSat,
        d3d::D3DSTENCILOP_DECRSAT => StencilOp::DecrSat,
        d3d::D3DSTENCILOP_INVERT => StencilOp::Invert,
        d3d::D3DSTENCILOP_INCR => StencilOp::Incr,
        d3d::D3DSTENCILOP_DECR => StencilOp::Decr,
        _ => return None,
    })
}

pub fn d3d_blend_factor(value: u32) -> Option<BlendFactor> {
    Some(match value {
        d3d::D3DBLEND_ZERO => BlendFactor::Zero,
        d3d::D3DBLEND_ONE => BlendFactor::One,
        d3d::D3DBLEND_SRCCOLOR => BlendFactor::SrcColor,
        d3d::D3DBLEND_INVSRCCOLOR => BlendFactor::InvSrcColor,
        d3d::D3DBLEND_SRCALPHA => BlendFactor::SrcAlpha,
        d3d::D3DBLEND_INVSRCALPHA => BlendFactor::InvSrcAlpha,
        d3d::D3DBLEND_DESTALPHA => BlendFactor::DestAlpha,
        d3d::D3DBLEND_INVDESTALPHA => BlendFactor::InvDestAlpha,
        d3d::D3DBLEND_DESTCOLOR => BlendFactor::DestColor,
        d3d::D3DBLEND_INVDESTCOLOR => BlendFactor::InvDestColor,
        d3d::D3DBLEND_SRCALPHASAT => BlendFactor::SrcAlphaSat,
        _ => return None,
    })
}

/// Emits an enable/disable only when it differs from the cached backend value.
pub fn set_capability<B: Backend>(
    backend: &mut B,
    cached: &mut Option<bool>,
    cap: Capability,
    enable: bool,
) {
    if *cached == Some(enable) {
        return;
    }
    if enable {
        backend.enable(cap);
    } else {
        backend.disable(cap);
    }
    *cached = Some(enable);
}

/// Runs `emit` only when `value` differs from the cached one.
pub(crate) fn emit_if_changed<T: PartialEq + Copy>(cached: &mut Option<T>, value: T, emit: impl FnOnce(T)) {
    if *cached != Some(value) {
        emit(value);
        *cached = Some(value);
    }
}

/// Resolves ALPHAFUNC/ALPHAREF from the table and emits them if changed.
pub fn sync_alpha_func<B: Backend>(backend: &mut B, cache: &mut BackendCache, tables: &StateBlock) {
    let value = tables.render.value(d3d::D3DRENDERSTATE_ALPHAFUNC);
    let Some(func) = d3d_compare_func(value) else {
        debug!(
            state_id = d3d::D3DRENDERSTATE_ALPHAFUNC,
            value, "unknown compare func"
        );
        return;
    };
    let reference = tables.render.value(d3d::D3DRENDERSTATE_ALPHAREF) & 0xFF;
    force_alpha_func(backend, cache, func, reference);
}

/// Emits an alpha func with an 8-bit reference, deduplicated against the cache.
pub fn force_alpha_func<B: Backend>(
    backend: &mut B,
    cache: &mut BackendCache,
    func: CompareFunc,
    reference: u32,
) {
    emit_if_changed(&mut cache.alpha_func, (func, reference), |(func, reference)| {
        backend.alpha_func(func, reference as f32 / 255.0)
    });
}

/// Realizes render state `id` after it was stored in `tables`.
pub fn sync_render_state<B: Backend>(
    backend: &mut B,
    cache: &mut BackendCache,
    tables: &StateBlock,
    max_clip_planes: usize,
    id: u32,
) -> SyncOutcome {
    let render = &tables.render;
    let value = render.value(id);
    let mut outcome = SyncOutcome::default();

    match id {
        d3d::D3DRENDERSTATE_ZENABLE => {
            if value == d3d::D3DZB_USEW {
                debug!(state_id = id, value, "w-buffering approximated with z");
            }
            set_capability(
                backend,
                &mut cache.depth_test,
                Capability::DepthTest,
                value != d3d::D3DZB_FALSE,
            );
        }
        d3d::D3DRENDERSTATE_ZWRITEENABLE => {
            emit_if_changed(&mut cache.depth_mask, value != 0, |write| backend.depth_mask(write));
        }
        d3d::D3DRENDERSTATE_ALPHATESTENABLE => {
            set_capability(backend, &mut cache.alpha_test, Capability::AlphaTest, value != 0);
        }
        d3d::D3DRENDERSTATE_STENCILENABLE => {
            set_capability(backend, &mut cache.stencil_test, Capability::StencilTest, value != 0);
        }
        d3d::D3DRENDERSTATE_ALPHABLENDENABLE => {
            set_capability(backend, &mut cache.blend, Capability::Blend, value != 0);
        }
        d3d::D3DRENDERSTATE_DITHERENABLE => {
            set_capability(backend, &mut cache.dither, Capability::Dither, value != 0);
        }
        d3d::D3DRENDERSTATE_CULLMODE => match value {
            d3d::D3DCULL_NONE => {
                set_capability(backend, &mut cache.cull_face, Capability::CullFace, false);
            }
            // Culling clockwise faces means counter-clockwise ones are in front.
            d3d::D3DCULL_CW | d3d::D3DCULL_CCW => {
                set_capability(backend, &mut cache.cull_face, Capability::CullFace, true);
                let winding = if value == d3d::D3DCULL_CW {
                    Winding::Ccw
                } else {
                    Winding::Cw
                };
                emit_if_changed(&mut cache.front_face, winding, |w| backend.front_face(w));
            }
            _ => debug!(state_id = id, value, "unknown cull mode"),
        },
        d3d::D3DRENDERSTATE_ZFUNC => match d3d_compare_func(value) {
            Some(func) => emit_if_changed(&mut cache.depth_func, func, |f| backend.depth_func(f)),
            None => debug!(state_id = id, value, "unknown compare func"),
        },
        d3d::D3DRENDERSTATE_ALPHAFUNC | d3d::D3DRENDERSTATE_ALPHAREF => {
            sync_alpha_func(backend, cache, tables);
        }
        d3d::D3DRENDERSTATE_SRCBLEND | d3d::D3DRENDERSTATE_DESTBLEND => {
            let src = render.value(d3d::D3DRENDERSTATE_SRCBLEND);
            let dst = render.value(d3d::D3DRENDERSTATE_DESTBLEND);
            match (d3d_blend_factor(src), d3d_blend_factor(dst)) {
                (Some(src), Some(dst)) => {
                    emit_if_changed(&mut cache.blend_func, (src, dst), |(s, d)| {
                        backend.blend_func(s, d)
                    });
                }
                _ => debug!(state_id = id, src, dst, "unknown blend factor"),
            }
        }
        d3d::D3DRENDERSTATE_STENCILFAIL
        | d3d::D3DRENDERSTATE_STENCILZFAIL
        | d3d::D3DRENDERSTATE_STENCILPASS => {
            let ops = (
                d3d_stencil_op(render.value(d3d::D3DRENDERSTATE_STENCILFAIL)),
                d3d_stencil_op(render.value(d3d::D3DRENDERSTATE_STENCILZFAIL)),
                d3d_stencil_op(render.value(d3d::D3DRENDERSTATE_STENCILPASS)),
            );
            match ops {
                (Some(fail), Some(zfail), Some(pass)) => {
                    emit_if_changed(&mut cache.stencil_op, (fail, zfail, pass), |(f, z, p)| {
                        backend.stencil_op(f, z, p)
                    });
                }
                _ => debug!(state_id = id, value, "unknown stencil op"),
            }
        }
        d3d::D3DRENDERSTATE_STENCILFUNC
        | d3d::D3DRENDERSTATE_STENCILREF
        | d3d::D3DRENDERSTATE_STENCILMASK => {
            let func = render.value(d3d::D3DRENDERSTATE_STENCILFUNC);
            match d3d_compare_func(func) {
                Some(func) => {
                    let reference = render.value(d3d::D3DRENDERSTATE_STENCILREF) as i32;
                    let mask = render.value(d3d::D3DRENDERSTATE_STENCILMASK);
                    emit_if_changed(&mut cache.stencil_func, (func, reference, mask), |(f, r, m)| {
                        backend.stencil_func(f, r, m)
                    });
                }
                None => debug!(state_id = id, value = func, "unknown compare func"),
            }
        }
        d3d::D3DRENDERSTATE_STENCILWRITEMASK => {
            emit_if_changed(&mut cache.stencil_mask, value, |m| backend.stencil_mask(m));
        }
        d3d::D3DRENDERSTATE_FOGCOLOR => {
            // The software fog table notices the new color on its own at the next draw.
            emit_if_changed(&mut cache.fog_color, value, |c| backend.fog_color(argb_to_rgba(c)));
        }
        d3d::D3DRENDERSTATE_CLIPPING | d3d::D3DRENDERSTATE_CLIPPLANEENABLE => {
            let mask = if render.enabled(d3d::D3DRENDERSTATE_CLIPPING) {
                render.value(d3d::D3DRENDERSTATE_CLIPPLANEENABLE)
            } else {
                0
            };
            let previous = cache.clip_mask;
            for plane in 0..max_clip_planes.min(32) {
                let want = mask & (1 << plane) != 0;
                let had = previous.map(|m| m & (1 << plane) != 0);
                if had == Some(want) {
                    continue;
                }
                if want {
                    backend.enable(Capability::ClipPlane(plane));
                } else {
                    backend.disable(Capability::ClipPlane(plane));
                }
            }
            if mask.checked_shr(max_clip_planes as u32).unwrap_or(0) != 0 {
                warn!(mask, max_clip_planes, "clip plane enable mask exceeds backend planes");
            }
            cache.clip_mask = Some(mask);
            outcome.reset_transform = true;
        }
        d3d::D3DRENDERSTATE_SHADEMODE => {
            let model = match value {
                d3d::D3DSHADE_FLAT => Some(ShadeModel::Flat),
                d3d::D3DSHADE_GOURAUD => Some(ShadeModel::Smooth),
                d3d::D3DSHADE_PHONG => {
                    debug!(state_id = id, value, "phong shading approximated as gouraud");
                    Some(ShadeModel::Smooth)
                }
                _ => None,
            };
            match model {
                Some(model) => emit_if_changed(&mut cache.shade_model, model, |m| backend.shade_model(m)),
                None => debug!(state_id = id, value, "unknown shade mode"),
            }
        }
        d3d::D3DRENDERSTATE_FILLMODE => {
            let mode = match value {
                d3d::D3DFILL_POINT => Some(PolygonMode::Point),
                d3d::D3DFILL_WIREFRAME => Some(PolygonMode::Line),
                d3d::D3DFILL_SOLID => Some(PolygonMode::Fill),
                _ => None,
            };
            match mode {
                Some(mode) => emit_if_changed(&mut cache.polygon_mode, mode, |m| backend.polygon_mode(m)),
                None => debug!(state_id = id, value, "unknown fill mode"),
            }
        }
        d3d::D3DRENDERSTATE_ZBIAS => {
            set_capability(
                backend,
                &mut cache.polygon_offset_fill,
                Capability::PolygonOffsetFill,
                value != 0,
            );
            if value != 0 {
                emit_if_changed(&mut cache.polygon_offset, value, |bias| {
                    backend.polygon_offset(0.0, -(bias as f32))
                });
            }
        }
        d3d::D3DRENDERSTATE_WRAP0..=d3d::D3DRENDERSTATE_WRAP7 => {
            if value != 0 && !cache.wrap_warned {
                warn!(state_id = id, value, "texture coordinate wrapping is not supported");
                cache.wrap_warned = true;
            }
        }
        // Read at draw time, or only stored.
        d3d::D3DRENDERSTATE_TEXTUREFACTOR
        | d3d::D3DRENDERSTATE_AMBIENT
        | d3d::D3DRENDERSTATE_COLORKEYENABLE
        | d3d::D3DRENDERSTATE_FOGENABLE
        | d3d::D3DRENDERSTATE_FOGSTART
        | d3d::D3DRENDERSTATE_FOGEND
        | d3d::D3DRENDERSTATE_FOGTABLEMODE
        | d3d::D3DRENDERSTATE_FOGVERTEXMODE
        | d3d::D3DRENDERSTATE_FOGDENSITY
        | d3d::D3DRENDERSTATE_STIPPLEPATTERN00..=d3d::D3DRENDERSTATE_STIPPLEPATTERN31
        | d3d::D3DRENDERSTATE_LIGHTING
        | d3d::D3DRENDERSTATE_COLORVERTEX
        | d3d::D3DRENDERSTATE_DIFFUSEMATERIALSOURCE
        | d3d::D3DRENDERSTATE_SPECULARMATERIALSOURCE
        | d3d::D3DRENDERSTATE_AMBIENTMATERIALSOURCE
        | d3d::D3DRENDERSTATE_EMISSIVEMATERIALSOURCE
        | d3d::D3DRENDERSTATE_SPECULARENABLE
        | d3d::D3DRENDERSTATE_TEXTUREPERSPECTIVE
        | d3d::D3DRENDERSTATE_LASTPIXEL
        | d3d::D3DRENDERSTATE_ANTIALIAS
        | d3d::D3DRENDERSTATE_SUBPIXEL
        | d3d::D3DRENDERSTATE_SUBPIXELX
        | d3d::D3DRENDERSTATE_ROP2
        | d3d::D3DRENDERSTATE_PLANEMASK
        | d3d::D3DRENDERSTATE_TEXTUREMAPBLEND
        | d3d::D3DRENDERSTATE_LOCALVIEWER
        | d3d::D3DRENDERSTATE_WRAPU
        | d3d::D3DRENDERSTATE_WRAPV
        | d3d::D3DRENDERSTATE_TEXTUREADDRESS => {}
        d3d::D3DRENDERSTATE_TEXTUREHANDLE
        | d3d::D3DRENDERSTATE_LINEPATTERN
        | d3d::D3DRENDERSTATE_MONOENABLE
        | d3d::D3DRENDERSTATE_ZVISIBLE
        | d3d::D3DRENDERSTATE_STIPPLEDALPHA
        | d3d::D3DRENDERSTATE_EDGEANTIALIAS
        | d3d::D3DRENDERSTATE_RANGEFOGENABLE
        | d3d::D3DRENDERSTATE_EXTENTS
        | d3d::D3DRENDERSTATE_NORMALIZENORMALS
        | d3d::D3DRENDERSTATE_VERTEXBLEND => {
            if value != 0 {
                debug!(state_id = id, value, "render state has no backend effect");
            }
        }
        // Aliases of stage 0 sampler state, realized through the texture-stage path.
        d3d::D3DRENDERSTATE_TEXTUREMAG
        | d3d::D3DRENDERSTATE_TEXTUREMIN
        | d3d::D3DRENDERSTATE_TEXTUREADDRESSU
        | d3d::D3DRENDERSTATE_TEXTUREADDRESSV
        | d3d::D3DRENDERSTATE_BORDERCOLOR
        | d3d::D3DRENDERSTATE_MIPMAPLODBIAS => {}
        _ => debug!(state_id = id, value, "unhandled render state"),
    }

    outcome
}

/// Stage 0 texture-stage writes implied by a legacy sampler render state.
pub fn stage0_aliases(id: u32, value: u32) -> Vec<(u32, u32)> {
    match id {
        d3d::D3DRENDERSTATE_TEXTUREMAG => {
            let mag = match value {
                d3d::D3DFILTER_NEAREST | d3d::D3DFILTER_MIPNEAREST | d3d::D3DFILTER_MIPLINEAR => {
                    d3d::D3DTFG_POINT
                }
                d3d::D3DFILTER_LINEAR
                | d3d::D3DFILTER_LINEARMIPNEAREST
                | d3d::D3DFILTER_LINEARMIPLINEAR => d3d::D3DTFG_LINEAR,
                _ => {
                    debug!(state_id = id, value, "unknown texture filter");
                    return Vec::new();
                }
            };
            vec![(d3d::D3DTSS_MAGFILTER, mag)]
        }
        d3d::D3DRENDERSTATE_TEXTUREMIN => {
            let (min, mip) = match value {
                d3d::D3DFILTER_NEAREST => (d3d::D3DTFN_POINT, d3d::D3DTFP_NONE),
                d3d::D3DFILTER_LINEAR => (d3d::D3DTFN_LINEAR, d3d::D3DTFP_NONE),
                d3d::D3DFILTER_MIPNEAREST => (d3d::D3DTFN_POINT, d3d::D3DTFP_POINT),
                d3d::D3DFILTER_MIPLINEAR => (d3d::D3DTFN_POINT, d3d::D3DTFP_LINEAR),
                d3d::D3DFILTER_LINEARMIPNEAREST => (d3d::D3DTFN_LINEAR, d3d::D3DTFP_POINT),
                d3d::D3DFILTER_LINEARMIPLINEAR => (d3d::D3DTFN_LINEAR, d3d::D3DTFP_LINEAR),
                _ => {
                    debug!(state_id = id, value, "unknown texture filter");
                    return Vec::new();
                }
            };
            vec![(d3d::D3DTSS_MINFILTER, min), (d3d::D3DTSS_MIPFILTER, mip)]
        }
        d3d::D3DRENDERSTATE_TEXTUREADDRESSU => vec![(d3d::D3DTSS_ADDRESSU, value)],
        d3d::D3DRENDERSTATE_TEXTUREADDRESSV => vec![(d3d::D3DTSS_ADDRESSV, value)],
        d3d::D3DRENDERSTATE_BORDERCOLOR => vec![(d3d::D3DTSS_BORDERCOLOR, value)],
        d3d::D3DRENDERSTATE_MIPMAPLODBIAS => vec![(d3d::D3DTSS_MIPMAPLODBIAS, value)],
        _ => Vec::new(),
    }
}
