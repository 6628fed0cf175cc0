//! Dense storage for render states and texture-stage states, with the write-time aliases the legacy
//! API defines and snapshot/apply for state blocks.

use crate::config::MAX_TEXTURE_STAGES;
use crate::d3d;
use crate::error::{D3dError, Result};

pub const MAX_RENDER_STATES: usize = 152;
pub const MAX_TEXTURE_STAGE_STATES: usize = 24;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateSlot {
    pub value: u32,
    /// Set by the client (or a documented default), as opposed to never touched.
    pub was_set: bool,
}

/// Ids written by one `set` call: the id itself plus any aliases it fans out to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WrittenStates {
    ids: [u32; 3],
    len: usize,
}

impl WrittenStates {
    fn push(&mut self, id: u32) {
        self.ids[self.len] = id;
        self.len += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.ids[..self.len].iter().copied()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.iter().any(|written| written == id)
    }
}

/// Entries a fresh device reports as set, zero-valued ones included so that a state block captured
/// at creation restores them.
const RENDER_STATE_DEFAULTS: &[(u32, u32)] = &[
    (d3d::D3DRENDERSTATE_TEXTUREHANDLE, 0),
    (d3d::D3DRENDERSTATE_ANTIALIAS, 0),
    (d3d::D3DRENDERSTATE_TEXTUREPERSPECTIVE, 1),
    (d3d::D3DRENDERSTATE_ZENABLE, d3d::D3DZB_TRUE),
    (d3d::D3DRENDERSTATE_FILLMODE, d3d::D3DFILL_SOLID),
    (d3d::D3DRENDERSTATE_SHADEMODE, d3d::D3DSHADE_GOURAUD),
    (d3d::D3DRENDERSTATE_LINEPATTERN, 0),
    (d3d::D3DRENDERSTATE_MONOENABLE, 0),
    (d3d::D3DRENDERSTATE_ROP2, d3d::R2_COPYPEN),
    (d3d::D3DRENDERSTATE_PLANEMASK, 0xFFFF_FFFF),
    (d3d::D3DRENDERSTATE_ZWRITEENABLE, 1),
    (d3d::D3DRENDERSTATE_ALPHATESTENABLE, 0),
    (d3d::D3DRENDERSTATE_LASTPIXEL, 1),
    (d3d::D3DRENDERSTATE_TEXTUREMAG, d3d::D3DFILTER_NEAREST),
    (d3d::D3DRENDERSTATE_TEXTUREMIN, d3d::D3DFILTER_NEAREST),
    (d3d::D3DRENDERSTATE_SRCBLEND, d3d::D3DBLEND_ONE),
    (d3d::D3DRENDERSTATE_DESTBLEND, d3d::D3DBLEND_ZERO),
    (d3d::D3DRENDERSTATE_TEXTUREMAPBLEND, 4),
    (d3d::D3DRENDERSTATE_CULLMODE, d3d::D3DCULL_CCW),
    (d3d::D3DRENDERSTATE_ZFUNC, d3d::D3DCMP_LESSEQUAL),
    (d3d::D3DRENDERSTATE_ALPHAREF, 0),
    (d3d::D3DRENDERSTATE_ALPHAFUNC, d3d::D3DCMP_ALWAYS),
    (d3d::D3DRENDERSTATE_DITHERENABLE, 0),
    (d3d::D3DRENDERSTATE_ALPHABLENDENABLE, 0),
    (d3d::D3DRENDERSTATE_FOGENABLE, 0),
    (d3d::D3DRENDERSTATE_SPECULARENABLE, 0),
    (d3d::D3DRENDERSTATE_ZVISIBLE, 0),
    (d3d::D3DRENDERSTATE_SUBPIXEL, 0),
    (d3d::D3DRENDERSTATE_SUBPIXELX, 0),
    (d3d::D3DRENDERSTATE_STIPPLEDALPHA, 0),
    (d3d::D3DRENDERSTATE_FOGCOLOR, 0),
    (d3d::D3DRENDERSTATE_FOGTABLEMODE, d3d::D3DFOG_NONE),
    // 1.0f
    (d3d::D3DRENDERSTATE_FOGDENSITY, 0x3F80_0000),
    (d3d::D3DRENDERSTATE_EDGEANTIALIAS, 0),
    (d3d::D3DRENDERSTATE_COLORKEYENABLE, 0),
    (d3d::D3DRENDERSTATE_TEXTUREADDRESSU, d3d::D3DTADDRESS_WRAP),
    (d3d::D3DRENDERSTATE_TEXTUREADDRESSV, d3d::D3DTADDRESS_WRAP),
    (d3d::D3DRENDERSTATE_MIPMAPLODBIAS, 0),
    (d3d::D3DRENDERSTATE_ZBIAS, 0),
    (d3d::D3DRENDERSTATE_RANGEFOGENABLE, 0),
    (d3d::D3DRENDERSTATE_STENCILENABLE, 0),
    (d3d::D3DRENDERSTATE_STENCILFAIL, d3d::D3DSTENCILOP_KEEP),
    (d3d::D3DRENDERSTATE_STENCILZFAIL, d3d::D3DSTENCILOP_KEEP),
    (d3d::D3DRENDERSTATE_STENCILPASS, d3d::D3DSTENCILOP_KEEP),
    (d3d::D3DRENDERSTATE_STENCILFUNC, d3d::D3DCMP_ALWAYS),
    (d3d::D3DRENDERSTATE_STENCILREF, 0),
    (d3d::D3DRENDERSTATE_STENCILMASK, 0xFFFF_FFFF),
    (d3d::D3DRENDERSTATE_STENCILWRITEMASK, 0xFFFF_FFFF),
    (d3d::D3DRENDERSTATE_CLIPPING, 0),
    (d3d::D3DRENDERSTATE_LIGHTING, 1),
    (d3d::D3DRENDERSTATE_EXTENTS, 0),
    (d3d::D3DRENDERSTATE_AMBIENT, 0),
    (d3d::D3DRENDERSTATE_FOGVERTEXMODE, d3d::D3DFOG_NONE),
    (d3d::D3DRENDERSTATE_COLORVERTEX, 1),
    (d3d::D3DRENDERSTATE_LOCALVIEWER, 1),
    (d3d::D3DRENDERSTATE_NORMALIZENORMALS, 0),
    (d3d::D3DRENDERSTATE_DIFFUSEMATERIALSOURCE, d3d::D3DMCS_COLOR1),
    (d3d::D3DRENDERSTATE_SPECULARMATERIALSOURCE, d3d::D3DMCS_COLOR2),
    (d3d::D3DRENDERSTATE_AMBIENTMATERIALSOURCE, d3d::D3DMCS_COLOR2),
    (d3d::D3DRENDERSTATE_EMISSIVEMATERIALSOURCE, d3d::D3DMCS_MATERIAL),
    (d3d::D3DRENDERSTATE_VERTEXBLEND, 0),
    (d3d::D3DRENDERSTATE_CLIPPLANEENABLE, 0),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderStateTable {
    slots: [StateSlot; MAX_RENDER_STATES],
}

impl RenderStateTable {
    pub fn with_defaults(version: u8) -> Self {
        let mut table = Self {
            slots: [StateSlot::default(); MAX_RENDER_STATES],
        };
        for &(id, value) in RENDER_STATE_DEFAULTS {
            table.store(id, value);
        }
        for wrap in d3d::D3DRENDERSTATE_WRAP0..=d3d::D3DRENDERSTATE_WRAP7 {
            table.store(wrap, 0);
        }
        if version <= 2 {
            table.store(d3d::D3DRENDERSTATE_SPECULARENABLE, 1);
        }
        table
    }

    fn index(id: u32) -> Result<usize> {
        match id {
            1..=152 => Ok(id as usize - 1),
            _ => Err(D3dError::InvalidRenderState(id)),
        }
    }

    fn store(&mut self, id: u32, value: u32) {
        if let Ok(idx) = Self::index(id) {
            self.slots[idx] = StateSlot {
                value,
                was_set: true,
            };
        }
    }

    pub fn get(&self, id: u32) -> Result<u32> {
        Ok(self.slots[Self::index(id)?].value)
    }

    pub fn slot(&self, id: u32) -> Result<StateSlot> {
        Ok(self.slots[Self::index(id)?])
    }

    /// Current value of a known id; zero for ids outside the table.
    pub fn value(&self, id: u32) -> u32 {
        self.get(id).unwrap_or(0)
    }

    pub fn enabled(&self, id: u32) -> bool {
        self.value(id) != 0
    }

    pub fn value_f32(&self, id: u32) -> f32 {
        f32::from_bits(self.value(id))
    }

    /// Stores a client value, applying the write-time aliases. Returns every id written.
    pub fn set(&mut self, id: u32, value: u32) -> Result<WrittenStates> {
        Self::index(id)?;
        let mut written = WrittenStates::default();

        match (id, value) {
            (d3d::D3DRENDERSTATE_TEXTUREADDRESS, _) => {
                self.store(id, value);
                self.store(d3d::D3DRENDERSTATE_TEXTUREADDRESSU, value);
                self.store(d3d::D3DRENDERSTATE_TEXTUREADDRESSV, value);
                written.push(id);
                written.push(d3d::D3DRENDERSTATE_TEXTUREADDRESSU);
                written.push(d3d::D3DRENDERSTATE_TEXTUREADDRESSV);
            }
            (d3d::D3DRENDERSTATE_WRAPU | d3d::D3DRENDERSTATE_WRAPV, _) => {
                let bit = if id == d3d::D3DRENDERSTATE_WRAPU {
                    d3d::D3DWRAP_U
                } else {
                    d3d::D3DWRAP_V
                };
                let wrap0 = self.value(d3d::D3DRENDERSTATE_WRAP0);
                let wrap0 = if value != 0 { wrap0 | bit } else { wrap0 & !bit };
                self.store(id, value);
                self.store(d3d::D3DRENDERSTATE_WRAP0, wrap0);
                written.push(id);
                written.push(d3d::D3DRENDERSTATE_WRAP0);
            }
            (d3d::D3DRENDERSTATE_SRCBLEND, d3d::D3DBLEND_BOTHSRCALPHA) => {
                self.store(id, d3d::D3DBLEND_SRCALPHA);
                self.store(d3d::D3DRENDERSTATE_DESTBLEND, d3d::D3DBLEND_INVSRCALPHA);
                written.push(id);
                written.push(d3d::D3DRENDERSTATE_DESTBLEND);
            }
            (d3d::D3DRENDERSTATE_SRCBLEND, d3d::D3DBLEND_BOTHINVSRCALPHA) => {
                self.store(id, d3d::D3DBLEND_INVSRCALPHA);
                self.store(d3d::D3DRENDERSTATE_DESTBLEND, d3d::D3DBLEND_SRCALPHA);
                written.push(id);
                written.push(d3d::D3DRENDERSTATE_DESTBLEND);
            }
            _ => {
                self.store(id, value);
                written.push(id);
            }
        }
        Ok(written)
    }

    /// `(id, slot)` for every entry, ids 1-based.
    pub fn iter(&self) -> impl Iterator<Item = (u32, StateSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| (idx as u32 + 1, *slot))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureStageStateTable {
    stages: [[StateSlot; MAX_TEXTURE_STAGE_STATES]; MAX_TEXTURE_STAGES],
}

impl TextureStageStateTable {
    pub fn with_defaults() -> Self {
        let mut table = Self {
            stages: [[StateSlot::default(); MAX_TEXTURE_STAGE_STATES]; MAX_TEXTURE_STAGES],
        };
        for stage in 0..MAX_TEXTURE_STAGES {
            let defaults = [
                (d3d::D3DTSS_COLOROP, d3d::D3DTOP_DISABLE),
                (d3d::D3DTSS_ALPHAOP, d3d::D3DTOP_DISABLE),
                (d3d::D3DTSS_COLORARG1, d3d::D3DTA_TEXTURE),
                (d3d::D3DTSS_ALPHAARG1, d3d::D3DTA_TEXTURE),
                (d3d::D3DTSS_COLORARG2, d3d::D3DTA_CURRENT),
                (d3d::D3DTSS_ALPHAARG2, d3d::D3DTA_CURRENT),
                (d3d::D3DTSS_TEXCOORDINDEX, stage as u32),
                (d3d::D3DTSS_ADDRESS, d3d::D3DTADDRESS_WRAP),
                (d3d::D3DTSS_ADDRESSU, d3d::D3DTADDRESS_WRAP),
                (d3d::D3DTSS_ADDRESSV, d3d::D3DTADDRESS_WRAP),
                (d3d::D3DTSS_BORDERCOLOR, 0),
                (d3d::D3DTSS_MAGFILTER, d3d::D3DTFG_POINT),
                (d3d::D3DTSS_MINFILTER, d3d::D3DTFN_POINT),
                (d3d::D3DTSS_MIPFILTER, d3d::D3DTFP_NONE),
                (d3d::D3DTSS_MIPMAPLODBIAS, 0),
                (d3d::D3DTSS_MAXMIPLEVEL, 0),
                (d3d::D3DTSS_MAXANISOTROPY, 1),
            ];
            for (id, value) in defaults {
                table.store(stage, id, value);
            }
        }
        table.store(0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_MODULATE);
        table.store(0, d3d::D3DTSS_ALPHAOP, d3d::D3DTOP_SELECTARG1);
        table.store(0, d3d::D3DTSS_COLORARG2, d3d::D3DTA_DIFFUSE);
        table.store(0, d3d::D3DTSS_ALPHAARG2, d3d::D3DTA_DIFFUSE);
        table
    }

    fn index(stage: usize, id: u32) -> Result<(usize, usize)> {
        if stage >= MAX_TEXTURE_STAGES {
            return Err(D3dError::InvalidTextureStage(stage as u32));
        }
        match id {
            1..=24 => Ok((stage, id as usize - 1)),
            _ => Err(D3dError::InvalidTextureStageState(id)),
        }
    }

    fn store(&mut self, stage: usize, id: u32, value: u32) {
        if let Ok((stage, idx)) = Self::index(stage, id) {
            self.stages[stage][idx] = StateSlot {
                value,
                was_set: true,
            };
        }
    }

    pub fn get(&self, stage: usize, id: u32) -> Result<u32> {
        let (stage, idx) = Self::index(stage, id)?;
        Ok(self.stages[stage][idx].value)
    }

    pub fn slot(&self, stage: usize, id: u32) -> Result<StateSlot> {
        let (stage, idx) = Self::index(stage, id)?;
        Ok(self.stages[stage][idx])
    }

    pub fn value(&self, stage: usize, id: u32) -> u32 {
        self.get(stage, id).unwrap_or(0)
    }

    pub fn set(&mut self, stage: usize, id: u32, value: u32) -> Result<WrittenStates> {
        Self::index(stage, id)?;
        let mut written = WrittenStates::default();
        self.store(stage, id, value);
        written.push(id);
        if id == d3d::D3DTSS_ADDRESS {
            self.store(stage, d3d::D3DTSS_ADDRESSU, value);
            self.store(stage, d3d::D3DTSS_ADDRESSV, value);
            written.push(d3d::D3DTSS_ADDRESSU);
            written.push(d3d::D3DTSS_ADDRESSV);
        }
        Ok(written)
    }

    /// `(stage, id, slot)` for every entry, ids 1-based.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32, StateSlot)> + '_ {
        self.stages.iter().enumerate().flat_map(|(stage, slots)| {
            slots
                .iter()
                .enumerate()
                .map(move |(idx, slot)| (stage, idx as u32 + 1, *slot))
        })
    }
}

/// A deep copy of both state tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateBlock {
    pub render: RenderStateTable,
    pub stages: TextureStageStateTable,
}

/// Entries an [`StateBlock::apply`] wrote, in table order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppliedStates {
    pub render: Vec<u32>,
    pub stages: Vec<(usize, u32)>,
}

impl StateBlock {
    pub fn with_defaults(version: u8) -> Self {
        Self {
            render: RenderStateTable::with_defaults(version),
            stages: TextureStageStateTable::with_defaults(),
        }
    }

    pub fn snapshot(&self) -> StateBlock {
        self.clone()
    }

    /// Copies every `was_set` entry of `block` into `self`. Entries the block never saw keep their
    /// current values, so applying the same block twice is a no-op the second time.
    pub fn apply(&mut self, block: &StateBlock) -> AppliedStates {
        let mut applied = AppliedStates::default();
        for (id, slot) in block.render.iter().filter(|(_, slot)| slot.was_set) {
            self.render.store(id, slot.value);
            applied.render.push(id);
        }
        for (stage, id, slot) in block.stages.iter().filter(|(_, _, slot)| slot.was_set) {
            self.stages.store(stage, id, slot.value);
            applied.stages.push((stage, id));
        }
        applied
    }
}
