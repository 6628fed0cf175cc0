//! Legacy Direct3D (DirectX 7 and earlier) device core.
//!
//! [`Device`] stores the fixed-function render state of a legacy device and realizes it on an
//! immediate-mode [`Backend`](backend::Backend), deduplicating redundant backend calls, then
//! rasterizes flexible-vertex-format primitives through it.

pub mod backend;
pub mod config;
pub mod d3d;
pub mod device;
mod draw;
pub mod error;
pub mod fixed_function;
pub mod light;
pub mod state;
pub mod transform;

pub use config::{BackendCaps, DeviceConfig, MAX_TEXTURE_STAGES};
pub use device::{Device, RenderTarget, TextureBinding, Viewport};
pub use error::{D3dError, Result};
pub use fixed_function::fvf::{Fvf, FvfError, FvfLayout, Stream, StrideView};
pub use light::{Light, LightType, Material};
pub use state::table::StateBlock;
pub use transform::Matrix;
