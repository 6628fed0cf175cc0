//! World/view/projection and texture matrices, and the mode machine deciding which of them the
//! backend currently holds.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::backend::{Backend, MatrixMode};
use crate::config::MAX_TEXTURE_STAGES;
use crate::d3d;

/// Row-major 4×4 matrix in the client's layout (`_11` first, translation in `_41.._43`).
///
/// Loaded into the backend unchanged: a row-major matrix used with row vectors is the same array
/// as the column-major matrix used with column vectors.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Matrix(pub [f32; 16]);

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, //
    ]);

    pub fn rows(&self) -> &[[f32; 4]; 4] {
        bytemuck::cast_ref(&self.0)
    }

    /// `self × rhs`, so `rhs` is applied after `self` to row vectors.
    pub fn multiply(&self, rhs: &Matrix) -> Matrix {
        let a = self.rows();
        let b = rhs.rows();
        let mut out = [[0.0f32; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| a[i][k] * b[k][j]).sum();
            }
        }
        Matrix(bytemuck::cast(out))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Maps pixel coordinates of a `width`×`height` target (origin top-left) onto clip space,
    /// passing z through.
    pub fn screen_ortho(width: u32, height: u32) -> Matrix {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        Matrix([
            2.0 / w, 0.0, 0.0, 0.0, //
            0.0, -2.0 / h, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            -1.0, 1.0, 0.0, 1.0, //
        ])
    }

    /// Recovers eye-space z from a post-projection depth value, using only the depth column of a
    /// perspective matrix.
    pub fn unproject_z(&self, zp: f32) -> f32 {
        let [_, _, a, b] = self.rows()[2];
        let [_, _, c, d] = self.rows()[3];
        let denom = a - b * zp;
        if denom == 0.0 {
            return zp;
        }
        (d * zp - c) / denom
    }
}

/// Which transform the backend currently has loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransformMode {
    /// Unknown; the next draw reloads everything.
    #[default]
    None,
    /// World/view/projection for object-space vertices.
    Normal,
    /// Screen-space orthographic setup for pre-transformed vertices.
    Ortho,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MatrixChanged: u32 {
        const WORLD = 1 << 0;
        const VIEW = 1 << 1;
        const PROJECTION = 1 << 2;
        const TEXTURE0 = 1 << 3;
        const TEXTURE1 = 1 << 4;
        const TEXTURE2 = 1 << 5;
        const TEXTURE3 = 1 << 6;
        const TEXTURE4 = 1 << 7;
        const TEXTURE5 = 1 << 8;
        const TEXTURE6 = 1 << 9;
        const TEXTURE7 = 1 << 10;
    }
}

impl MatrixChanged {
    pub fn texture(stage: usize) -> Self {
        Self::from_bits_truncate(Self::TEXTURE0.bits() << stage)
    }

    pub fn camera() -> Self {
        Self::WORLD | Self::VIEW | Self::PROJECTION
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransformKind {
    World,
    View,
    Projection,
    Texture(usize),
}

impl TransformKind {
    pub fn from_d3d(value: u32) -> Option<Self> {
        Some(match value {
            d3d::D3DTRANSFORMSTATE_WORLD => TransformKind::World,
            d3d::D3DTRANSFORMSTATE_VIEW => TransformKind::View,
            d3d::D3DTRANSFORMSTATE_PROJECTION => TransformKind::Projection,
            d3d::D3DTRANSFORMSTATE_TEXTURE0..=d3d::D3DTRANSFORMSTATE_TEXTURE7 => {
                TransformKind::Texture((value - d3d::D3DTRANSFORMSTATE_TEXTURE0) as usize)
            }
            _ => return None,
        })
    }

    pub fn changed_bit(self) -> MatrixChanged {
        match self {
            TransformKind::World => MatrixChanged::WORLD,
            TransformKind::View => MatrixChanged::VIEW,
            TransformKind::Projection => MatrixChanged::PROJECTION,
            TransformKind::Texture(stage) => MatrixChanged::texture(stage),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TransformState {
    pub world: Matrix,
    pub view: Matrix,
    pub projection: Matrix,
    pub texture: [Matrix; MAX_TEXTURE_STAGES],
    pub mode: TransformMode,
    /// Texture matrices as last loaded into the backend.
    loaded_texture: [Matrix; MAX_TEXTURE_STAGES],
    loaded_texture_is_identity: [bool; MAX_TEXTURE_STAGES],
}

impl TransformState {
    pub fn new() -> Self {
        Self {
            loaded_texture_is_identity: [true; MAX_TEXTURE_STAGES],
            ..Self::default()
        }
    }

    pub fn get(&self, kind: TransformKind) -> &Matrix {
        match kind {
            TransformKind::World => &self.world,
            TransformKind::View => &self.view,
            TransformKind::Projection => &self.projection,
            TransformKind::Texture(stage) => &self.texture[stage],
        }
    }

    pub fn get_mut(&mut self, kind: TransformKind) -> &mut Matrix {
        match kind {
            TransformKind::World => &mut self.world,
            TransformKind::View => &mut self.view,
            TransformKind::Projection => &mut self.projection,
            TransformKind::Texture(stage) => &mut self.texture[stage],
        }
    }

    /// Reacts to client matrix changes. Camera changes invalidate a loaded object-space setup;
    /// texture matrices are pushed immediately, honoring each stage's TEXTURETRANSFORMFLAGS.
    pub fn matrices_updated<B: Backend>(
        &mut self,
        backend: &mut B,
        changed: MatrixChanged,
        backend_stages: usize,
        transform_flags: impl Fn(usize) -> u32,
    ) {
        if changed.intersects(MatrixChanged::camera()) && self.mode == TransformMode::Normal {
            self.mode = TransformMode::None;
        }

        for stage in 0..backend_stages.min(MAX_TEXTURE_STAGES) {
            if !changed.contains(MatrixChanged::texture(stage)) {
                continue;
            }
            let mode = MatrixMode::Texture(stage);
            if transform_flags(stage) & 0xFF != d3d::D3DTTFF_DISABLE {
                let matrix = self.texture[stage];
                if self.loaded_texture[stage] != matrix {
                    backend.load_matrix(mode, &matrix);
                    self.loaded_texture[stage] = matrix;
                    self.loaded_texture_is_identity[stage] = matrix.is_identity();
                }
            } else if !self.loaded_texture_is_identity[stage] {
                backend.load_identity(mode);
                self.loaded_texture[stage] = Matrix::IDENTITY;
                self.loaded_texture_is_identity[stage] = true;
            }
        }
    }

    /// Loads the pixel-space setup used by pre-transformed vertices.
    pub fn set_ortho<B: Backend>(&mut self, backend: &mut B, width: u32, height: u32) {
        backend.load_matrix(MatrixMode::Projection, &Matrix::screen_ortho(width, height));
        backend.load_identity(MatrixMode::ModelView);
        // Pixel centers.
        backend.translate(MatrixMode::ModelView, [0.375, 0.375, 0.0]);
        self.mode = TransformMode::Ortho;
    }

    /// Forgets everything about what the backend holds.
    pub fn invalidate(&mut self) {
        self.mode = TransformMode::None;
        self.loaded_texture = [Matrix::IDENTITY; MAX_TEXTURE_STAGES];
        self.loaded_texture_is_identity = [true; MAX_TEXTURE_STAGES];
    }
}
