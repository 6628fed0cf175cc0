//! Raw legacy Direct3D constants (DirectX 7 and older numbering).
//!
//! Render-state and texture-stage-state ids are 1-based, exactly as clients pass them. Everything
//! here is plain `u32` so callers can match on the wire values directly; typed views live next to
//! the code that consumes them.

// Render states.
pub const D3DRENDERSTATE_TEXTUREHANDLE: u32 = 1;
pub const D3DRENDERSTATE_ANTIALIAS: u32 = 2;
pub const D3DRENDERSTATE_TEXTUREADDRESS: u32 = 3;
pub const D3DRENDERSTATE_TEXTUREPERSPECTIVE: u32 = 4;
pub const D3DRENDERSTATE_WRAPU: u32 = 5;
pub const D3DRENDERSTATE_WRAPV: u32 = 6;
pub const D3DRENDERSTATE_ZENABLE: u32 = 7;
pub const D3DRENDERSTATE_FILLMODE: u32 = 8;
pub const D3DRENDERSTATE_SHADEMODE: u32 = 9;
pub const D3DRENDERSTATE_LINEPATTERN: u32 = 10;
pub const D3DRENDERSTATE_MONOENABLE: u32 = 11;
pub const D3DRENDERSTATE_ROP2: u32 = 12;
pub const D3DRENDERSTATE_PLANEMASK: u32 = 13;
pub const D3DRENDERSTATE_ZWRITEENABLE: u32 = 14;
pub const D3DRENDERSTATE_ALPHATESTENABLE: u32 = 15;
pub const D3DRENDERSTATE_LASTPIXEL: u32 = 16;
pub const D3DRENDERSTATE_TEXTUREMAG: u32 = 17;
pub const D3DRENDERSTATE_TEXTUREMIN: u32 = 18;
pub const D3DRENDERSTATE_SRCBLEND: u32 = 19;
pub const D3DRENDERSTATE_DESTBLEND: u32 = 20;
pub const D3DRENDERSTATE_TEXTUREMAPBLEND: u32 = 21;
pub const D3DRENDERSTATE_CULLMODE: u32 = 22;
pub const D3DRENDERSTATE_ZFUNC: u32 = 23;
pub const D3DRENDERSTATE_ALPHAREF: u32 = 24;
pub const D3DRENDERSTATE_ALPHAFUNC: u32 = 25;
pub const D3DRENDERSTATE_DITHERENABLE: u32 = 26;
pub const D3DRENDERSTATE_ALPHABLENDENABLE: u32 = 27;
pub const D3DRENDERSTATE_FOGENABLE: u32 = 28;
pub const D3DRENDERSTATE_SPECULARENABLE: u32 = 29;
pub const D3DRENDERSTATE_ZVISIBLE: u32 = 30;
pub const D3DRENDERSTATE_SUBPIXEL: u32 = 31;
pub const D3DRENDERSTATE_SUBPIXELX: u32 = 32;
pub const D3DRENDERSTATE_STIPPLEDALPHA: u32 = 33;
pub const D3DRENDERSTATE_FOGCOLOR: u32 = 34;
pub const D3DRENDERSTATE_FOGTABLEMODE: u32 = 35;
pub const D3DRENDERSTATE_FOGSTART: u32 = 36;
pub const D3DRENDERSTATE_FOGEND: u32 = 37;
pub const D3DRENDERSTATE_FOGDENSITY: u32 = 38;
pub const D3DRENDERSTATE_STIPPLEENABLE: u32 = 39;
pub const D3DRENDERSTATE_EDGEANTIALIAS: u32 = 40;
pub const D3DRENDERSTATE_COLORKEYENABLE: u32 = 41;
pub const D3DRENDERSTATE_BORDERCOLOR: u32 = 43;
pub const D3DRENDERSTATE_TEXTUREADDRESSU: u32 = 44;
pub const D3DRENDERSTATE_TEXTUREADDRESSV: u32 = 45;
pub const D3DRENDERSTATE_MIPMAPLODBIAS: u32 = 46;
pub const D3DRENDERSTATE_ZBIAS: u32 = 47;
pub const D3DRENDERSTATE_RANGEFOGENABLE: u32 = 48;
pub const D3DRENDERSTATE_ANISOTROPY: u32 = 49;
pub const D3DRENDERSTATE_FLUSHBATCH: u32 = 50;
pub const D3DRENDERSTATE_TRANSLUCENTSORTINDEPENDENT: u32 = 51;
pub const D3DRENDERSTATE_STENCILENABLE: u32 = 52;
pub const D3DRENDERSTATE_STENCILFAIL: u32 = 53;
pub const D3DRENDERSTATE_STENCILZFAIL: u32 = 54;
pub const D3DRENDERSTATE_STENCILPASS: u32 = 55;
pub const D3DRENDERSTATE_STENCILFUNC: u32 = 56;
pub const D3DRENDERSTATE_STENCILREF: u32 = 57;
pub const D3DRENDERSTATE_STENCILMASK: u32 = 58;
pub const D3DRENDERSTATE_STENCILWRITEMASK: u32 = 59;
pub const D3DRENDERSTATE_TEXTUREFACTOR: u32 = 60;
pub const D3DRENDERSTATE_STIPPLEPATTERN00: u32 = 64;
pub const D3DRENDERSTATE_STIPPLEPATTERN31: u32 = 95;
pub const D3DRENDERSTATE_WRAP0: u32 = 128;
pub const D3DRENDERSTATE_WRAP7: u32 = 135;
pub const D3DRENDERSTATE_CLIPPING: u32 = 136;
pub const D3DRENDERSTATE_LIGHTING: u32 = 137;
pub const D3DRENDERSTATE_EXTENTS: u32 = 138;
pub const D3DRENDERSTATE_AMBIENT: u32 = 139;
pub const D3DRENDERSTATE_FOGVERTEXMODE: u32 = 140;
pub const D3DRENDERSTATE_COLORVERTEX: u32 = 141;
pub const D3DRENDERSTATE_LOCALVIEWER: u32 = 142;
pub const D3DRENDERSTATE_NORMALIZENORMALS: u32 = 143;
pub const D3DRENDERSTATE_COLORKEYBLENDENABLE: u32 = 144;
pub const D3DRENDERSTATE_DIFFUSEMATERIALSOURCE: u32 = 145;
pub const D3DRENDERSTATE_SPECULARMATERIALSOURCE: u32 = 146;
pub const D3DRENDERSTATE_AMBIENTMATERIALSOURCE: u32 = 147;
pub const D3DRENDERSTATE_EMISSIVEMATERIALSOURCE: u32 = 148;
pub const D3DRENDERSTATE_VERTEXBLEND: u32 = 151;
pub const D3DRENDERSTATE_CLIPPLANEENABLE: u32 = 152;

// Texture stage states.
pub const D3DTSS_COLOROP: u32 = 1;
pub const D3DTSS_COLORARG1: u32 = 2;
pub const D3DTSS_COLORARG2: u32 = 3;
pub const D3DTSS_ALPHAOP: u32 = 4;
pub const D3DTSS_ALPHAARG1: u32 = 5;
pub const D3DTSS_ALPHAARG2: u32 = 6;
pub const D3DTSS_BUMPENVMAT00: u32 = 7;
pub const D3DTSS_BUMPENVMAT11: u32 = 10;
pub const D3DTSS_TEXCOORDINDEX: u32 = 11;
pub const D3DTSS_ADDRESS: u32 = 12;
pub const D3DTSS_ADDRESSU: u32 = 13;
pub const D3DTSS_ADDRESSV: u32 = 14;
pub const D3DTSS_BORDERCOLOR: u32 = 15;
pub const D3DTSS_MAGFILTER: u32 = 16;
pub const D3DTSS_MINFILTER: u32 = 17;
pub const D3DTSS_MIPFILTER: u32 = 18;
pub const D3DTSS_MIPMAPLODBIAS: u32 = 19;
pub const D3DTSS_MAXMIPLEVEL: u32 = 20;
pub const D3DTSS_MAXANISOTROPY: u32 = 21;
pub const D3DTSS_BUMPENVLSCALE: u32 = 22;
pub const D3DTSS_BUMPENVLOFFSET: u32 = 23;
pub const D3DTSS_TEXTURETRANSFORMFLAGS: u32 = 24;

pub const D3DTSS_TCI_PASSTHRU: u32 = 0x0000_0000;
pub const D3DTSS_TCI_MASK: u32 = 0xFFFF_0000;

pub const D3DTTFF_DISABLE: u32 = 0;
pub const D3DTTFF_COUNT1: u32 = 1;
pub const D3DTTFF_COUNT2: u32 = 2;
pub const D3DTTFF_COUNT3: u32 = 3;
pub const D3DTTFF_COUNT4: u32 = 4;
pub const D3DTTFF_PROJECTED: u32 = 256;

// Texture ops.
pub const D3DTOP_DISABLE: u32 = 1;
pub const D3DTOP_SELECTARG1: u32 = 2;
pub const D3DTOP_SELECTARG2: u32 = 3;
pub const D3DTOP_MODULATE: u32 = 4;
pub const D3DTOP_MODULATE2X: u32 = 5;
pub const D3DTOP_MODULATE4X: u32 = 6;
pub const D3DTOP_ADD: u32 = 7;
pub const D3DTOP_ADDSIGNED: u32 = 8;
pub const D3DTOP_ADDSIGNED2X: u32 = 9;
pub const D3DTOP_SUBTRACT: u32 = 10;
pub const D3DTOP_ADDSMOOTH: u32 = 11;
pub const D3DTOP_BLENDDIFFUSEALPHA: u32 = 12;
pub const D3DTOP_BLENDTEXTUREALPHA: u32 = 13;
pub const D3DTOP_BLENDFACTORALPHA: u32 = 14;
pub const D3DTOP_BLENDTEXTUREALPHAPM: u32 = 15;
pub const D3DTOP_BLENDCURRENTALPHA: u32 = 16;
pub const D3DTOP_PREMODULATE: u32 = 17;
pub const D3DTOP_MODULATEALPHA_ADDCOLOR: u32 = 18;
pub const D3DTOP_MODULATECOLOR_ADDALPHA: u32 = 19;
pub const D3DTOP_MODULATEINVALPHA_ADDCOLOR: u32 = 20;
pub const D3DTOP_MODULATEINVCOLOR_ADDALPHA: u32 = 21;
pub const D3DTOP_BUMPENVMAP: u32 = 22;
pub const D3DTOP_BUMPENVMAPLUMINANCE: u32 = 23;
pub const D3DTOP_DOTPRODUCT3: u32 = 24;

// Texture arguments.
pub const D3DTA_SELECTMASK: u32 = 0x0000_000F;
pub const D3DTA_DIFFUSE: u32 = 0x0000_0000;
pub const D3DTA_CURRENT: u32 = 0x0000_0001;
pub const D3DTA_TEXTURE: u32 = 0x0000_0002;
pub const D3DTA_TFACTOR: u32 = 0x0000_0003;
pub const D3DTA_SPECULAR: u32 = 0x0000_0004;
pub const D3DTA_COMPLEMENT: u32 = 0x0000_0010;
pub const D3DTA_ALPHAREPLICATE: u32 = 0x0000_0020;

// Texture addressing.
pub const D3DTADDRESS_WRAP: u32 = 1;
pub const D3DTADDRESS_MIRROR: u32 = 2;
pub const D3DTADDRESS_CLAMP: u32 = 3;
pub const D3DTADDRESS_BORDER: u32 = 4;

// Stage filters.
pub const D3DTFG_POINT: u32 = 1;
pub const D3DTFG_LINEAR: u32 = 2;
pub const D3DTFG_FLATCUBIC: u32 = 3;
pub const D3DTFG_GAUSSIANCUBIC: u32 = 4;
pub const D3DTFG_ANISOTROPIC: u32 = 5;
pub const D3DTFN_POINT: u32 = 1;
pub const D3DTFN_LINEAR: u32 = 2;
pub const D3DTFN_ANISOTROPIC: u32 = 3;
pub const D3DTFP_NONE: u32 = 1;
pub const D3DTFP_POINT: u32 = 2;
pub const D3DTFP_LINEAR: u32 = 3;

// Legacy render-state filters (TEXTUREMAG / TEXTUREMIN).
pub const D3DFILTER_NEAREST: u32 = 1;
pub const D3DFILTER_LINEAR: u32 = 2;
pub const D3DFILTER_MIPNEAREST: u32 = 3;
pub const D3DFILTER_MIPLINEAR: u32 = 4;
pub const D3DFILTER_LINEARMIPNEAREST: u32 = 5;
pub const D3DFILTER_LINEARMIPLINEAR: u32 = 6;

// Blend factors.
pub const D3DBLEND_ZERO: u32 = 1;
pub const D3DBLEND_ONE: u32 = 2;
pub const D3DBLEND_SRCCOLOR: u32 = 3;
pub const D3DBLEND_INVSRCCOLOR: u32 = 4;
pub const D3DBLEND_SRCALPHA: u32 = 5;
pub const D3DBLEND_INVSRCALPHA: u32 = 6;
pub const D3DBLEND_DESTALPHA: u32 = 7;
pub const D3DBLEND_INVDESTALPHA: u32 = 8;
pub const D3DBLEND_DESTCOLOR: u32 = 9;
pub const D3DBLEND_INVDESTCOLOR: u32 = 10;
pub const D3DBLEND_SRCALPHASAT: u32 = 11;
pub const D3DBLEND_BOTHSRCALPHA: u32 = 12;
pub const D3DBLEND_BOTHINVSRCALPHA: u32 = 13;

// Compare functions.
pub const D3DCMP_NEVER: u32 = 1;
pub const D3DCMP_LESS: u32 = 2;
pub const D3DCMP_EQUAL: u32 = 3;
pub const D3DCMP_LESSEQUAL: u32 = 4;
pub const D3DCMP_GREATER: u32 = 5;
pub const D3DCMP_NOTEQUAL: u32 = 6;
pub const D3DCMP_GREATEREQUAL: u32 = 7;
pub const D3DCMP_ALWAYS: u32 = 8;

// Stencil ops.
pub const D3DSTENCILOP_KEEP: u32 = 1;
pub const D3DSTENCILOP_ZERO: u32 = 2;
pub const D3DSTENCILOP_REPLACE: u32 = 3;
pub const D3DSTENCILOP_INCRSAT: u32 = 4;
pub const D3DSTENCILOP_DECRSAT: u32 = 5;
pub const D3DSTENCILOP_INVERT: u32 = 6;
pub const D3DSTENCILOP_INCR: u32 = 7;
pub const D3DSTENCILOP_DECR: u32 = 8;

pub const D3DCULL_NONE: u32 = 1;
pub const D3DCULL_CW: u32 = 2;
pub const D3DCULL_CCW: u32 = 3;

pub const D3DFILL_POINT: u32 = 1;
pub const D3DFILL_WIREFRAME: u32 = 2;
pub const D3DFILL_SOLID: u32 = 3;

pub const D3DSHADE_FLAT: u32 = 1;
pub const D3DSHADE_GOURAUD: u32 = 2;
pub const D3DSHADE_PHONG: u32 = 3;

pub const D3DZB_FALSE: u32 = 0;
pub const D3DZB_TRUE: u32 = 1;
pub const D3DZB_USEW: u32 = 2;

pub const D3DFOG_NONE: u32 = 0;
pub const D3DFOG_EXP: u32 = 1;
pub const D3DFOG_EXP2: u32 = 2;
pub const D3DFOG_LINEAR: u32 = 3;

pub const D3DMCS_MATERIAL: u32 = 0;
pub const D3DMCS_COLOR1: u32 = 1;
pub const D3DMCS_COLOR2: u32 = 2;

pub const R2_COPYPEN: u32 = 13;

pub const D3DWRAP_U: u32 = 0x0000_0001;
pub const D3DWRAP_V: u32 = 0x0000_0002;

// Primitive types.
pub const D3DPT_POINTLIST: u32 = 1;
pub const D3DPT_LINELIST: u32 = 2;
pub const D3DPT_LINESTRIP: u32 = 3;
pub const D3DPT_TRIANGLELIST: u32 = 4;
pub const D3DPT_TRIANGLESTRIP: u32 = 5;
pub const D3DPT_TRIANGLEFAN: u32 = 6;

// Transform states.
pub const D3DTRANSFORMSTATE_WORLD: u32 = 1;
pub const D3DTRANSFORMSTATE_VIEW: u32 = 2;
pub const D3DTRANSFORMSTATE_PROJECTION: u32 = 3;
pub const D3DTRANSFORMSTATE_TEXTURE0: u32 = 16;
pub const D3DTRANSFORMSTATE_TEXTURE7: u32 = 23;

// Light types.
pub const D3DLIGHT_POINT: u32 = 1;
pub const D3DLIGHT_SPOT: u32 = 2;
pub const D3DLIGHT_DIRECTIONAL: u32 = 3;
pub const D3DLIGHT_PARALLELPOINT: u32 = 4;

// Legacy light states (IDirect3DDevice2/3).
pub const D3DLIGHTSTATE_MATERIAL: u32 = 1;
pub const D3DLIGHTSTATE_AMBIENT: u32 = 2;
pub const D3DLIGHTSTATE_COLORMODEL: u32 = 3;
pub const D3DLIGHTSTATE_FOGMODE: u32 = 4;
pub const D3DLIGHTSTATE_FOGSTART: u32 = 5;
pub const D3DLIGHTSTATE_FOGEND: u32 = 6;
pub const D3DLIGHTSTATE_FOGDENSITY: u32 = 7;

pub const D3DCOLOR_MONO: u32 = 1;
pub const D3DCOLOR_RGB: u32 = 2;

// Legacy vertex types (IDirect3DDevice2).
pub const D3DVT_VERTEX: u32 = 1;
pub const D3DVT_LVERTEX: u32 = 2;
pub const D3DVT_TLVERTEX: u32 = 3;

// Clear flags.
pub const D3DCLEAR_TARGET: u32 = 0x0000_0001;
pub const D3DCLEAR_ZBUFFER: u32 = 0x0000_0002;
pub const D3DCLEAR_STENCIL: u32 = 0x0000_0004;
