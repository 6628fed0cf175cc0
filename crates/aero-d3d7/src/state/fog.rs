/// Per-channel blend table for software fog on pre-transformed vertices.
///
/// `table[ch][(vcolor << 8) | intensity]` is the vertex channel `vcolor` blended towards the fog
/// color channel by fog intensity (255 = no fog). `ch` indexes the byte lanes of a packed color,
/// lane 0 being blue.
pub struct FogTable {
    channels: Box<[[u8; 65536]; 3]>,
}

impl std::fmt::Debug for FogTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FogTable")
            .field("fog_color", &self.color_key())
            .finish()
    }
}

fn lane(color: u32, ch: usize) -> u8 {
    (color >> (8 * ch)) as u8
}

impl FogTable {
    /// A table built for `fog_color`.
    pub fn new(fog_color: u32) -> Self {
        let mut table = Self {
            channels: Box::new([[0u8; 65536]; 3]),
        };
        table.rebuild(fog_color);
        table
    }

    fn color_key(&self) -> u32 {
        (0..3).fold(0, |acc, ch| acc | (u32::from(self.channels[ch][0]) << (8 * ch)))
    }

    /// Entry 0 of each channel (black vertex, full fog) is exactly the fog channel byte.
    pub fn is_current(&self, fog_color: u32) -> bool {
        (0..3).all(|ch| self.channels[ch][0] == lane(fog_color, ch))
    }

    pub fn rebuild(&mut self, fog_color: u32) {
        for (ch, table) in self.channels.iter_mut().enumerate() {
            let fog = u32::from(lane(fog_color, ch));
            for vcolor in 0..256u32 {
                for intensity in 0..256u32 {
                    let blended = (intensity * vcolor + (255 - intensity) * fog) / 255;
                    table[((vcolor << 8) | intensity) as usize] = blended as u8;
                }
            }
        }
    }

    pub fn rebuild_if_stale(&mut self, fog_color: u32) {
        if !self.is_current(fog_color) {
            self.rebuild(fog_color);
        }
    }

    pub fn channel(&self, ch: usize) -> &[u8; 65536] {
        &self.channels[ch]
    }

    /// Fogs the RGB lanes of a packed color, keeping alpha.
    pub fn apply(&self, color: u32, intensity: u8) -> u32 {
        let mut out = color & 0xFF00_0000;
        for ch in 0..3 {
            let v = usize::from(lane(color, ch));
            let fogged = self.channels[ch][(v << 8) | usize::from(intensity)];
            out |= u32::from(fogged) << (8 * ch);
        }
        out
    }
}
