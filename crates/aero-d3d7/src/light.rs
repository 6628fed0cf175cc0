use tracing::{error, warn};

use crate::backend::{Backend, BackendLight, Capability};
use crate::d3d;
use crate::error::{D3dError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightType {
    Point,
    Spot,
    Directional,
    ParallelPoint,
}

impl LightType {
    pub fn from_d3d(value: u32) -> Option<Self> {
        Some(match value {
            d3d::D3DLIGHT_POINT => LightType::Point,
            d3d::D3DLIGHT_SPOT => LightType::Spot,
            d3d::D3DLIGHT_DIRECTIONAL => LightType::Directional,
            d3d::D3DLIGHT_PARALLELPOINT => LightType::ParallelPoint,
            _ => return None,
        })
    }
}

/// A client light description. Colors are RGBA floats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightType,
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub ambient: [f32; 4],
    pub position: [f32; 3],
    pub direction: [f32; 3],
    pub range: f32,
    pub falloff: f32,
    pub attenuation: [f32; 3],
    /// Inner cone angle in radians.
    pub theta: f32,
    /// Outer cone angle in radians.
    pub phi: f32,
}

impl Light {
    /// What enabling a never-described light turns on: white, pointing down +z.
    pub fn default_directional() -> Self {
        Self {
            kind: LightType::Directional,
            diffuse: [1.0, 1.0, 1.0, 0.0],
            specular: [0.0; 4],
            ambient: [0.0; 4],
            position: [0.0; 3],
            direction: [0.0, 0.0, 1.0],
            range: 0.0,
            falloff: 0.0,
            attenuation: [0.0; 3],
            theta: 0.0,
            phi: 0.0,
        }
    }

    /// Backend parameters for this light, or `None` when the backend cannot express it.
    pub fn to_backend(&self) -> Option<BackendLight> {
        let mut out = BackendLight {
            ambient: self.ambient,
            diffuse: self.diffuse,
            specular: self.specular,
            position: [0.0; 4],
            spot_direction: [0.0, 0.0, -1.0],
            spot_exponent: 0.0,
            spot_cutoff: 180.0,
            attenuation: [1.0, 0.0, 0.0],
        };
        match self.kind {
            LightType::Directional => {
                // The backend wants the direction towards the light.
                let [x, y, z] = self.direction;
                out.position = [-x, -y, -z, 0.0];
            }
            LightType::Point => {
                let [x, y, z] = self.position;
                out.position = [x, y, z, 1.0];
                out.attenuation = self.attenuation;
            }
            LightType::Spot => {
                let [x, y, z] = self.position;
                out.position = [x, y, z, 1.0];
                out.spot_direction = self.direction;
                out.attenuation = self.attenuation;
                out.spot_exponent = self.falloff.clamp(0.0, 128.0);
                out.spot_cutoff = (90.0 * self.phi / std::f32::consts::PI).clamp(0.0, 90.0);
            }
            LightType::ParallelPoint => return None,
        }
        Some(out)
    }
}

/// Surface material. Colors are RGBA floats.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Material {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub power: f32,
}

/// Client lights keyed by index, plus the mapping from backend light slots to client indices.
#[derive(Clone, Debug)]
pub struct LightSet {
    lights: Vec<Option<Light>>,
    slots: Vec<Option<u32>>,
}

/// Whether a light call changed what the next object-space draw must upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotChange {
    Unchanged,
    Changed,
}

impl LightSet {
    pub fn new(max_active: usize) -> Self {
        Self {
            lights: Vec::new(),
            slots: vec![None; max_active],
        }
    }

    fn entry(&mut self, index: u32) -> Result<&mut Option<Light>> {
        let index = index as usize;
        if index >= self.lights.len() {
            let grow = index + 1 - self.lights.len();
            self.lights.try_reserve(grow)?;
            self.lights.resize(index + 1, None);
        }
        Ok(&mut self.lights[index])
    }

    pub fn set(&mut self, index: u32, light: Light) -> Result<()> {
        match light.kind {
            LightType::Spot if light.theta != light.phi => {
                error!(
                    index,
                    theta = light.theta,
                    phi = light.phi,
                    "spot light inner cone is not supported"
                );
            }
            LightType::ParallelPoint => error!(index, "parallel point lights are not supported"),
            _ => {}
        }
        *self.entry(index)? = Some(light);
        Ok(())
    }

    pub fn get(&self, index: u32) -> Result<&Light> {
        self.lights
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(D3dError::InvalidLight(index))
    }

    fn slot_of(&self, index: u32) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(index))
    }

    /// Enables or disables a client light on a backend slot.
    pub fn enable<B: Backend>(
        &mut self,
        backend: &mut B,
        index: u32,
        enable: bool,
    ) -> Result<SlotChange> {
        let entry = self.entry(index)?;
        if entry.is_none() {
            *entry = Some(Light::default_directional());
        }

        if !enable {
            if let Some(slot) = self.slot_of(index) {
                backend.disable(Capability::Light(slot));
                self.slots[slot] = None;
            }
            return Ok(SlotChange::Unchanged);
        }

        if let Some(slot) = self.slot_of(index) {
            backend.enable(Capability::Light(slot));
            return Ok(SlotChange::Unchanged);
        }

        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            warn!(
                index,
                max_active = self.slots.len(),
                "no free backend light slot, light stays off"
            );
            return Ok(SlotChange::Unchanged);
        };
        backend.enable(Capability::Light(slot));
        self.slots[slot] = Some(index);
        Ok(SlotChange::Changed)
    }

    pub fn is_enabled(&self, index: u32) -> Result<bool> {
        self.get(index)?;
        Ok(self.slot_of(index).is_some())
    }

    /// Backend slots in use with the light they hold.
    pub fn active(&self) -> impl Iterator<Item = (usize, &Light)> + '_ {
        self.slots.iter().enumerate().filter_map(|(slot, index)| {
            let light = self.lights.get((*index)? as usize)?.as_ref()?;
            Some((slot, light))
        })
    }

    /// Uploads every active light. The modelview must hold the view matrix.
    pub fn upload<B: Backend>(&self, backend: &mut B) {
        for (slot, light) in self.active() {
            if let Some(params) = light.to_backend() {
                backend.light(slot, &params);
            }
        }
    }

    /// Re-enables the backend slots after the backend lost its state.
    pub fn restore<B: Backend>(&self, backend: &mut B) {
        for (slot, index) in self.slots.iter().enumerate() {
            if index.is_some() {
                backend.enable(Capability::Light(slot));
            }
        }
    }
}
