use crate::error::{D3dError, Result};

/// Hard upper bound on texture stages addressable through the API.
pub const MAX_TEXTURE_STAGES: usize = 8;

/// What the backend can do. Filled in by whoever creates the backend context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackendCaps {
    pub max_active_lights: usize,
    pub max_clip_planes: usize,
    /// Texture units exposed by the backend; stages past this are stored only.
    pub max_texture_units: usize,
    pub mirrored_repeat: bool,
    pub combine_subtract: bool,
    pub secondary_color: bool,
    pub lod_bias: bool,
}

impl Default for BackendCaps {
    fn default() -> Self {
        Self {
            max_active_lights: 8,
            max_clip_planes: 6,
            max_texture_units: 2,
            mirrored_repeat: true,
            combine_subtract: true,
            secondary_color: false,
            lod_bias: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Interface version the client created the device through (1, 2, 3 or 7).
    pub version: u8,
    pub max_texture_stages: usize,
    pub caps: BackendCaps,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::for_version(7)
    }
}

impl DeviceConfig {
    pub fn for_version(version: u8) -> Self {
        Self {
            version,
            max_texture_stages: MAX_TEXTURE_STAGES,
            caps: BackendCaps::default(),
        }
    }

    pub fn with_caps(mut self, caps: BackendCaps) -> Self {
        self.caps = caps;
        self
    }

    pub fn with_max_texture_stages(mut self, stages: usize) -> Self {
        self.max_texture_stages = stages;
        self
    }

    /// Rejects unknown interface versions and clamps the stage count into `[1, 8]`.
    pub fn validated(mut self) -> Result<Self> {
        if !matches!(self.version, 1 | 2 | 3 | 7) {
            return Err(D3dError::UnsupportedVersion(self.version));
        }
        self.max_texture_stages = self.max_texture_stages.clamp(1, MAX_TEXTURE_STAGES);
        Ok(self)
    }

    /// Stages that actually reach a backend texture unit.
    pub fn backend_stages(&self) -> usize {
        self.max_texture_stages.min(self.caps.max_texture_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_versions() {
        assert_eq!(
            DeviceConfig::for_version(5).validated(),
            Err(D3dError::UnsupportedVersion(5))
        );
        assert!(DeviceConfig::for_version(3).validated().is_ok());
    }

    #[test]
    fn clamps_stage_count() {
        let config = DeviceConfig::default()
            .with_max_texture_stages(0)
            .validated()
            .unwrap();
        assert_eq!(config.max_texture_stages, 1);

        let config = DeviceConfig::default()
            .with_max_texture_stages(32)
            .validated()
            .unwrap();
        assert_eq!(config.max_texture_stages, 8);
        assert_eq!(config.backend_stages(), 2);
    }
}
