use bytemuck::pod_read_unaligned;
use thiserror::Error;

use crate::d3d;

/// Flexible vertex format bitmask as passed to the draw entry points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Fvf(pub u32);

impl Fvf {
    pub const POSITION_MASK: u32 = 0x00E;
    pub const XYZ: u32 = 0x002;
    pub const XYZRHW: u32 = 0x004;
    pub const XYZB1: u32 = 0x006;
    pub const XYZB2: u32 = 0x008;
    pub const XYZB3: u32 = 0x00A;
    pub const XYZB4: u32 = 0x00C;
    pub const XYZB5: u32 = 0x00E;
    pub const NORMAL: u32 = 0x010;
    pub const RESERVED1: u32 = 0x020;
    pub const DIFFUSE: u32 = 0x040;
    pub const SPECULAR: u32 = 0x080;
    pub const TEXCOUNT_MASK: u32 = 0xF00;
    pub const TEXCOUNT_SHIFT: u32 = 8;

    /// `D3DFVF_VERTEX`: untransformed, unlit, one texture coordinate set.
    pub const VERTEX: Fvf = Fvf(Self::XYZ | Self::NORMAL | (1 << Self::TEXCOUNT_SHIFT));
    /// `D3DFVF_LVERTEX`: untransformed, pre-lit.
    pub const LVERTEX: Fvf = Fvf(
        Self::XYZ | Self::RESERVED1 | Self::DIFFUSE | Self::SPECULAR | (1 << Self::TEXCOUNT_SHIFT),
    );
    /// `D3DFVF_TLVERTEX`: pre-transformed and pre-lit.
    pub const TLVERTEX: Fvf =
        Fvf(Self::XYZRHW | Self::DIFFUSE | Self::SPECULAR | (1 << Self::TEXCOUNT_SHIFT));

    pub const fn position_bits(self) -> u32 {
        self.0 & Self::POSITION_MASK
    }

    pub const fn tex_count(self) -> u32 {
        (self.0 & Self::TEXCOUNT_MASK) >> Self::TEXCOUNT_SHIFT
    }

    pub const fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    /// Maps an `IDirect3DDevice2` vertex type (`D3DVT_*`) onto its FVF code.
    pub fn from_legacy_vertex_type(vertex_type: u32) -> Option<Fvf> {
        match vertex_type {
            d3d::D3DVT_VERTEX => Some(Self::VERTEX),
            d3d::D3DVT_LVERTEX => Some(Self::LVERTEX),
            d3d::D3DVT_TLVERTEX => Some(Self::TLVERTEX),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FvfError {
    #[error("FVF {0:#x} has no position component")]
    MissingPosition(u32),
    #[error("FVF {fvf:#x} uses weighted position XYZB{weights}, which is not supported")]
    UnsupportedPosition { fvf: u32, weights: u32 },
    #[error("FVF {fvf:#x} declares {count} texture coordinate sets (max 8)")]
    TooManyTexCoords { fvf: u32, count: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PositionType {
    /// Object-space position, transformed by world/view/projection.
    Xyz,
    /// Screen-space position with reciprocal homogeneous w.
    XyzRhw,
}

impl PositionType {
    pub fn components(self) -> usize {
        match self {
            PositionType::Xyz => 3,
            PositionType::XyzRhw => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TexCoordSize {
    One,
    Two,
    Three,
    Four,
}

impl TexCoordSize {
    /// Decodes the 2-bit `D3DFVF_TEXCOORDSIZEn` code. Zero means two components so that formats
    /// which never mention sizes default to 2D coordinates.
    fn from_code(code: u32) -> Self {
        match code & 0x3 {
            0 => TexCoordSize::Two,
            1 => TexCoordSize::Three,
            2 => TexCoordSize::Four,
            _ => TexCoordSize::One,
        }
    }

    pub fn components(self) -> usize {
        match self {
            TexCoordSize::One => 1,
            TexCoordSize::Two => 2,
            TexCoordSize::Three => 3,
            TexCoordSize::Four => 4,
        }
    }
}

/// Byte offsets of each attribute inside one vertex.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeOffsets {
    pub position: usize,
    pub normal: Option<usize>,
    pub diffuse: Option<usize>,
    pub specular: Option<usize>,
    pub texcoords: Vec<usize>,
}

/// Decoded vertex layout for an [`Fvf`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FvfLayout {
    pub fvf: Fvf,
    pub position: PositionType,
    pub has_normal: bool,
    pub has_diffuse: bool,
    pub has_specular: bool,
    pub texcoords: Vec<TexCoordSize>,
    pub offsets: AttributeOffsets,
    /// Total size of one vertex in bytes.
    pub vertex_stride: usize,
}

impl FvfLayout {
    /// Walks the attributes in canonical order. Both the stride and every offset come out of this
    /// single walk, so they cannot disagree.
    pub fn new(fvf: Fvf) -> Result<Self, FvfError> {
        let position = match fvf.position_bits() {
            Fvf::XYZ => PositionType::Xyz,
            Fvf::XYZRHW => PositionType::XyzRhw,
            0 => return Err(FvfError::MissingPosition(fvf.0)),
            bits => {
                return Err(FvfError::UnsupportedPosition {
                    fvf: fvf.0,
                    weights: (bits - Fvf::XYZ) / 2,
                })
            }
        };

        let tex_count = fvf.tex_count();
        if tex_count > 8 {
            return Err(FvfError::TooManyTexCoords {
                fvf: fvf.0,
                count: tex_count,
            });
        }

        let mut offset = 0usize;
        let mut offsets = AttributeOffsets {
            position: offset,
            ..AttributeOffsets::default()
        };
        offset += position.components() * 4;

        if fvf.has(Fvf::RESERVED1) {
            offset += 4;
        }

        let has_normal = fvf.has(Fvf::NORMAL);
        if has_normal {
            offsets.normal = Some(offset);
            offset += 12;
        }

        let has_diffuse = fvf.has(Fvf::DIFFUSE);
        if has_diffuse {
            offsets.diffuse = Some(offset);
            offset += 4;
        }

        let has_specular = fvf.has(Fvf::SPECULAR);
        if has_specular {
            offsets.specular = Some(offset);
            offset += 4;
        }

        let mut texcoords = Vec::with_capacity(tex_count as usize);
        for i in 0..tex_count {
            let size = TexCoordSize::from_code(fvf.0 >> (16 + i * 2));
            offsets.texcoords.push(offset);
            offset += size.components() * 4;
            texcoords.push(size);
        }

        Ok(Self {
            fvf,
            position,
            has_normal,
            has_diffuse,
            has_specular,
            texcoords,
            offsets,
            vertex_stride: offset,
        })
    }

    pub fn is_pretransformed(&self) -> bool {
        self.position == PositionType::XyzRhw
    }

    /// Vertices are considered lit (no backend lighting) unless they are plain XYZ with normals.
    pub fn is_prelit(&self) -> bool {
        self.position != PositionType::Xyz || !self.has_normal
    }

    /// Builds a strided view over an interleaved buffer starting at `start_vertex`.
    pub fn stride_view<'a>(&self, bytes: &'a [u8], start_vertex: usize) -> StrideView<'a> {
        let base = start_vertex.saturating_mul(self.vertex_stride);
        let bytes = bytes.get(base..).unwrap_or(&[]);
        let stride = self.vertex_stride;
        let stream = |offset: usize, components: usize| Stream {
            bytes,
            offset,
            stride,
            components,
        };

        let mut texcoords = [None; 8];
        for (slot, (&offset, size)) in self
            .offsets
            .texcoords
            .iter()
            .zip(&self.texcoords)
            .enumerate()
        {
            texcoords[slot] = Some(stream(offset, size.components()));
        }

        StrideView {
            position: Some(stream(self.offsets.position, self.position.components())),
            normal: self.offsets.normal.map(|o| stream(o, 3)),
            diffuse: self.offsets.diffuse.map(|o| stream(o, 1)),
            specular: self.offsets.specular.map(|o| stream(o, 1)),
            texcoords,
        }
    }
}

/// One attribute inside a caller-owned vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stream<'a> {
    pub bytes: &'a [u8],
    pub offset: usize,
    pub stride: usize,
    /// Number of 32-bit components (floats, or 1 for a packed color).
    pub components: usize,
}

impl<'a> Stream<'a> {
    pub fn new(bytes: &'a [u8], offset: usize, stride: usize, components: usize) -> Self {
        Self {
            bytes,
            offset,
            stride,
            components,
        }
    }

    fn element(&self, vertex: usize) -> Option<&'a [u8]> {
        let start = vertex.checked_mul(self.stride)?.checked_add(self.offset)?;
        let end = start.checked_add(self.components.checked_mul(4)?)?;
        self.bytes.get(start..end)
    }

    /// Number of whole elements readable from the buffer.
    pub fn len(&self) -> usize {
        let Some(end) = self
            .components
            .checked_mul(4)
            .and_then(|element| self.offset.checked_add(element))
        else {
            return 0;
        };
        if self.bytes.len() < end {
            return 0;
        }
        if self.stride == 0 {
            return usize::MAX;
        }
        (self.bytes.len() - end) / self.stride + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads `N` floats of vertex `vertex`; components past `self.components` are zero.
    pub fn floats<const N: usize>(&self, vertex: usize) -> [f32; N] {
        let mut out = [0.0f32; N];
        if let Some(bytes) = self.element(vertex) {
            for (dst, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
                *dst = pod_read_unaligned(chunk);
            }
        }
        out
    }

    /// Reads a packed 32-bit color (stored little-endian as B, G, R, A).
    pub fn color(&self, vertex: usize) -> u32 {
        self.element(vertex)
            .and_then(|bytes| bytes.get(..4))
            .map(pod_read_unaligned::<u32>)
            .unwrap_or(0)
    }
}

/// Non-owning per-attribute view over client vertex data, rebuilt for every draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrideView<'a> {
    pub position: Option<Stream<'a>>,
    pub normal: Option<Stream<'a>>,
    pub diffuse: Option<Stream<'a>>,
    pub specular: Option<Stream<'a>>,
    pub texcoords: [Option<Stream<'a>>; 8],
}

impl StrideView<'_> {
    /// Smallest element count over every populated stream.
    pub fn vertex_capacity(&self) -> usize {
        [self.position, self.normal, self.diffuse, self.specular]
            .iter()
            .chain(self.texcoords.iter())
            .flatten()
            .map(Stream::len)
            .min()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tlvertex_layout_matches_legacy_struct() {
        let layout = FvfLayout::new(Fvf::TLVERTEX).unwrap();
        assert_eq!(layout.position, PositionType::XyzRhw);
        assert_eq!(layout.offsets.diffuse, Some(16));
        assert_eq!(layout.offsets.specular, Some(20));
        assert_eq!(layout.offsets.texcoords, vec![24]);
        assert_eq!(layout.vertex_stride, 32);
    }

    #[test]
    fn lvertex_skips_reserved_dword() {
        let layout = FvfLayout::new(Fvf::LVERTEX).unwrap();
        assert_eq!(layout.offsets.diffuse, Some(16));
        assert_eq!(layout.offsets.specular, Some(20));
        assert_eq!(layout.vertex_stride, 32);
    }

    #[test]
    fn weighted_positions_are_reported() {
        let err = FvfLayout::new(Fvf(Fvf::XYZB2 | Fvf::NORMAL)).unwrap_err();
        assert_eq!(
            err,
            FvfError::UnsupportedPosition {
                fvf: Fvf::XYZB2 | Fvf::NORMAL,
                weights: 2
            }
        );
    }

    #[test]
    fn stream_reads_unaligned_floats() {
        let mut bytes = vec![0u8; 1];
        bytes.extend_from_slice(bytemuck::cast_slice(&[1.0f32, 2.0, 3.0]));
        let stream = Stream::new(&bytes, 1, 12, 3);
        assert_eq!(stream.floats::<3>(0), [1.0, 2.0, 3.0]);
        assert_eq!(stream.floats::<4>(0), [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(stream.len(), 1);
    }

    #[test]
    fn stride_view_starts_at_requested_vertex() {
        let layout = FvfLayout::new(Fvf(Fvf::XYZ)).unwrap();
        let data: Vec<f32> = (0..9).map(|v| v as f32).collect();
        let view = layout.stride_view(bytemuck::cast_slice(&data), 1);
        let position = view.position.unwrap();
        assert_eq!(position.floats::<3>(0), [3.0, 4.0, 5.0]);
        assert_eq!(view.vertex_capacity(), 2);
    }

    #[test]
    fn zero_component_color_stream_reads_as_zero() {
        let bytes = 0xFF00_FF00u32.to_le_bytes();
        let stream = Stream::new(&bytes, 0, 4, 0);
        assert_eq!(stream.color(0), 0);
        assert_eq!(Stream::new(&bytes, 0, 4, 1).color(0), 0xFF00_FF00);
    }

    #[test]
    fn stream_len_survives_overflowing_offsets() {
        let bytes = [0u8; 16];
        assert_eq!(Stream::new(&bytes, usize::MAX - 2, 4, 1).len(), 0);
        assert_eq!(Stream::new(&bytes, 0, 4, usize::MAX).len(), 0);
        assert_eq!(Stream::new(&bytes, usize::MAX, 4, 1).floats::<1>(0), [0.0]);
    }

    /// Dword counts per texture coordinate size code.
    fn code_dwords(code: u32) -> usize {
        match code & 3 {
            0 => 2,
            1 => 3,
            2 => 4,
            _ => 1,
        }
    }

    #[test]
    fn every_layout_matches_a_manual_walk() {
        let flag_bits = [Fvf::NORMAL, Fvf::RESERVED1, Fvf::DIFFUSE, Fvf::SPECULAR];
        // Uniform codes per set, then two mixed patterns.
        let code_patterns: Vec<[u32; 8]> = (0..4)
            .map(|code| [code; 8])
            .chain([
                [0, 1, 2, 3, 0, 1, 2, 3],
                [3, 2, 1, 0, 3, 2, 1, 0],
            ])
            .collect();

        for (position, position_bytes) in [(Fvf::XYZ, 12usize), (Fvf::XYZRHW, 16)] {
            for mask in 0..16u32 {
                let flags = flag_bits
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .fold(0, |acc, (_, &flag)| acc | flag);
                for count in 0..=8u32 {
                    for codes in &code_patterns {
                        let size_bits = codes[..count as usize]
                            .iter()
                            .enumerate()
                            .fold(0, |acc, (i, &code)| acc | (code << (16 + 2 * i)));
                        let fvf = Fvf(position | flags | (count << Fvf::TEXCOUNT_SHIFT) | size_bits);
                        let layout = FvfLayout::new(fvf).unwrap();

                        let mut walk = position_bytes;
                        if flags & Fvf::RESERVED1 != 0 {
                            walk += 4;
                        }
                        let normal = (flags & Fvf::NORMAL != 0).then(|| {
                            walk += 12;
                            walk - 12
                        });
                        let diffuse = (flags & Fvf::DIFFUSE != 0).then(|| {
                            walk += 4;
                            walk - 4
                        });
                        let specular = (flags & Fvf::SPECULAR != 0).then(|| {
                            walk += 4;
                            walk - 4
                        });
                        let mut texcoords = Vec::new();
                        for &code in &codes[..count as usize] {
                            texcoords.push(walk);
                            walk += code_dwords(code) * 4;
                        }

                        let context = format!("fvf {:#x}", fvf.0);
                        assert_eq!(layout.vertex_stride, walk, "{context}");
                        assert_eq!(layout.offsets.position, 0, "{context}");
                        assert_eq!(layout.offsets.normal, normal, "{context}");
                        assert_eq!(layout.offsets.diffuse, diffuse, "{context}");
                        assert_eq!(layout.offsets.specular, specular, "{context}");
                        assert_eq!(layout.offsets.texcoords, texcoords, "{context}");

                        let view = layout.stride_view(&[], 0);
                        let offset_of = |stream: Option<Stream<'_>>| stream.map(|s| s.offset);
                        assert_eq!(offset_of(view.position), Some(0), "{context}");
                        assert_eq!(offset_of(view.normal), normal, "{context}");
                        assert_eq!(offset_of(view.diffuse), diffuse, "{context}");
                        assert_eq!(offset_of(view.specular), specular, "{context}");
                        for set in 0..8 {
                            assert_eq!(
                                offset_of(view.texcoords[set]),
                                texcoords.get(set).copied(),
                                "{context} set {set}"
                            );
                            if let Some(stream) = view.texcoords[set] {
                                assert_eq!(stream.components, code_dwords(codes[set]), "{context}");
                                assert_eq!(stream.stride, walk, "{context}");
                            }
                        }
                    }
                }
            }
        }
    }
}
