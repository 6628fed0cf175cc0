//! Typed view of the texture-stage combine states (`D3DTSS_COLOROP`, `D3DTSS_COLORARG1`, ...).

use bitflags::bitflags;

use crate::d3d;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureOp {
    Disable,
    SelectArg1,
    SelectArg2,
    Modulate,
    Modulate2x,
    Modulate4x,
    Add,
    AddSigned,
    AddSigned2x,
    Subtract,
    AddSmooth,
    BlendDiffuseAlpha,
    BlendTextureAlpha,
    BlendFactorAlpha,
    BlendTextureAlphaPm,
    BlendCurrentAlpha,
    PreModulate,
    ModulateAlphaAddColor,
    ModulateColorAddAlpha,
    ModulateInvAlphaAddColor,
    ModulateInvColorAddAlpha,
    BumpEnvMap,
    BumpEnvMapLuminance,
    DotProduct3,
}

impl TextureOp {
    pub fn from_d3d(value: u32) -> Option<Self> {
        Some(match value {
            d3d::D3DTOP_DISABLE => TextureOp::Disable,
            d3d::D3DTOP_SELECTARG1 => TextureOp::SelectArg1,
            d3d::D3DTOP_SELECTARG2 => TextureOp::SelectArg2,
            d3d::D3DTOP_MODULATE => TextureOp::Modulate,
            d3d::D3DTOP_MODULATE2X => TextureOp::Modulate2x,
            d3d::D3DTOP_MODULATE4X => TextureOp::Modulate4x,
            d3d::D3DTOP_ADD => TextureOp::Add,
            d3d::D3DTOP_ADDSIGNED => TextureOp::AddSigned,
            d3d::D3DTOP_ADDSIGNED2X => TextureOp::AddSigned2x,
            d3d::D3DTOP_SUBTRACT => TextureOp::Subtract,
            d3d::D3DTOP_ADDSMOOTH => TextureOp::AddSmooth,
            d3d::D3DTOP_BLENDDIFFUSEALPHA => TextureOp::BlendDiffuseAlpha,
            d3d::D3DTOP_BLENDTEXTUREALPHA => TextureOp::BlendTextureAlpha,
            d3d::D3DTOP_BLENDFACTORALPHA => TextureOp::BlendFactorAlpha,
            d3d::D3DTOP_BLENDTEXTUREALPHAPM => TextureOp::BlendTextureAlphaPm,
            d3d::D3DTOP_BLENDCURRENTALPHA => TextureOp::BlendCurrentAlpha,
            d3d::D3DTOP_PREMODULATE => TextureOp::PreModulate,
            d3d::D3DTOP_MODULATEALPHA_ADDCOLOR => TextureOp::ModulateAlphaAddColor,
            d3d::D3DTOP_MODULATECOLOR_ADDALPHA => TextureOp::ModulateColorAddAlpha,
            d3d::D3DTOP_MODULATEINVALPHA_ADDCOLOR => TextureOp::ModulateInvAlphaAddColor,
            d3d::D3DTOP_MODULATEINVCOLOR_ADDALPHA => TextureOp::ModulateInvColorAddAlpha,
            d3d::D3DTOP_BUMPENVMAP => TextureOp::BumpEnvMap,
            d3d::D3DTOP_BUMPENVMAPLUMINANCE => TextureOp::BumpEnvMapLuminance,
            d3d::D3DTOP_DOTPRODUCT3 => TextureOp::DotProduct3,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureArg {
    Diffuse,
    Current,
    Texture,
    TFactor,
    Specular,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TextureArgFlags: u8 {
        const COMPLEMENT = 0x10;
        const ALPHA_REPLICATE = 0x20;
    }
}

/// A combine argument: a source selector plus its modifier flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureArgument {
    pub arg: TextureArg,
    pub flags: TextureArgFlags,
}

impl TextureArgument {
    /// Decodes a raw `D3DTA_*` value. `None` for an unknown selector; unknown flag bits are
    /// dropped.
    pub fn from_d3d(value: u32) -> Option<Self> {
        let arg = match value & d3d::D3DTA_SELECTMASK {
            d3d::D3DTA_DIFFUSE => TextureArg::Diffuse,
            d3d::D3DTA_CURRENT => TextureArg::Current,
            d3d::D3DTA_TEXTURE => TextureArg::Texture,
            d3d::D3DTA_TFACTOR => TextureArg::TFactor,
            d3d::D3DTA_SPECULAR => TextureArg::Specular,
            _ => return None,
        };
        let flags = TextureArgFlags::from_bits_truncate((value & 0xF0) as u8);
        Some(Self { arg, flags })
    }

    pub fn complement(&self) -> bool {
        self.flags.contains(TextureArgFlags::COMPLEMENT)
    }

    pub fn alpha_replicate(&self) -> bool {
        self.flags.contains(TextureArgFlags::ALPHA_REPLICATE)
    }
}
