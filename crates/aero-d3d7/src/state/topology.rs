use std::fmt;

use crate::backend::Topology;
use crate::d3d;

/// Primitive types a draw call can request.
///
/// Kept separate from the backend's [`Topology`] so logs and errors can name what the client asked
/// for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum D3DPrimitiveType {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

impl fmt::Display for D3DPrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            D3DPrimitiveType::PointList => "point_list",
            D3DPrimitiveType::LineList => "line_list",
            D3DPrimitiveType::LineStrip => "line_strip",
            D3DPrimitiveType::TriangleList => "triangle_list",
            D3DPrimitiveType::TriangleStrip => "triangle_strip",
            D3DPrimitiveType::TriangleFan => "triangle_fan",
        };
        f.write_str(s)
    }
}

impl D3DPrimitiveType {
    pub fn from_d3d(value: u32) -> Option<Self> {
        Some(match value {
            d3d::D3DPT_POINTLIST => D3DPrimitiveType::PointList,
            d3d::D3DPT_LINELIST => D3DPrimitiveType::LineList,
            d3d::D3DPT_LINESTRIP => D3DPrimitiveType::LineStrip,
            d3d::D3DPT_TRIANGLELIST => D3DPrimitiveType::TriangleList,
            d3d::D3DPT_TRIANGLESTRIP => D3DPrimitiveType::TriangleStrip,
            d3d::D3DPT_TRIANGLEFAN => D3DPrimitiveType::TriangleFan,
            _ => return None,
        })
    }
}

/// The backend draws every legacy primitive type natively, fans included.
pub fn translate_primitive_topology(primitive: D3DPrimitiveType) -> Topology {
    match primitive {
        D3DPrimitiveType::PointList => Topology::Points,
        D3DPrimitiveType::LineList => Topology::Lines,
        D3DPrimitiveType::LineStrip => Topology::LineStrip,
        D3DPrimitiveType::TriangleList => Topology::Triangles,
        D3DPrimitiveType::TriangleStrip => Topology::TriangleStrip,
        D3DPrimitiveType::TriangleFan => Topology::TriangleFan,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_legacy_primitive_types() {
        assert_eq!(
            D3DPrimitiveType::from_d3d(6),
            Some(D3DPrimitiveType::TriangleFan)
        );
        assert_eq!(D3DPrimitiveType::from_d3d(0), None);
        assert_eq!(D3DPrimitiveType::from_d3d(7), None);
    }

    #[test]
    fn fans_stay_fans() {
        assert_eq!(
            translate_primitive_topology(D3DPrimitiveType::TriangleFan),
            Topology::TriangleFan
        );
        assert_eq!(D3DPrimitiveType::LineStrip.to_string(), "line_strip");
    }
}
