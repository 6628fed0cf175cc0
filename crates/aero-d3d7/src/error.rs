use thiserror::Error;

use crate::fixed_function::fvf::FvfError;

/// Errors surfaced through the public device interface.
///
/// Mirrors the legacy HRESULT families (`DDERR_INVALIDPARAMS`, `DDERR_OUTOFMEMORY`, ...) without
/// reproducing their numeric values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum D3dError {
    #[error("render state id {0} is out of range")]
    InvalidRenderState(u32),
    #[error("texture stage {0} is out of range")]
    InvalidTextureStage(u32),
    #[error("texture stage state id {0} is out of range")]
    InvalidTextureStageState(u32),
    #[error("light state id {0} is out of range")]
    InvalidLightState(u32),
    #[error("light {0} has never been set")]
    InvalidLight(u32),
    #[error("clip plane {index} is out of range (max {max})")]
    InvalidClipPlane { index: u32, max: usize },
    #[error("unknown transform state type {0}")]
    InvalidTransform(u32),
    #[error("unknown primitive type {0}")]
    InvalidPrimitiveType(u32),
    #[error("unknown vertex type {0}")]
    InvalidVertexType(u32),
    #[error("malformed rectangle ({x1}, {y1}) - ({x2}, {y2})")]
    InvalidRect { x1: i32, y1: i32, x2: i32, y2: i32 },
    #[error("{attribute} stream has {components} components, the vertex format needs {required}")]
    InvalidStream {
        attribute: &'static str,
        components: usize,
        required: usize,
    },
    #[error("vertex data holds {available} vertices but the draw reads {required}")]
    VertexBufferTooSmall { required: usize, available: usize },
    #[error("index {index} addresses past the {vertex_count} supplied vertices")]
    IndexOutOfRange { index: u16, vertex_count: usize },
    #[error("unsupported interface version {0}")]
    UnsupportedVersion(u8),
    #[error(transparent)]
    Fvf(#[from] FvfError),
    #[error("out of memory")]
    OutOfMemory,
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),
    #[error("internal state inconsistency: {0}")]
    StateInconsistency(&'static str),
}

impl D3dError {
    /// True for every variant in the invalid-parameter family.
    pub fn is_invalid_parameter(&self) -> bool {
        !matches!(
            self,
            D3dError::OutOfMemory
                | D3dError::UnsupportedFeature(_)
                | D3dError::StateInconsistency(_)
        )
    }
}

impl From<std::collections::TryReserveError> for D3dError {
    fn from(_: std::collections::TryReserveError) -> Self {
        D3dError::OutOfMemory
    }
}

pub type Result<T> = std::result::Result<T, D3dError>;
