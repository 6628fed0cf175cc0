use aero_d3d7::backend::recording::{BackendCall, RecordingBackend};
use aero_d3d7::backend::{Capability, ClearBuffers, Rect};
use aero_d3d7::d3d;
use aero_d3d7::{D3dError, Device, DeviceConfig, RenderTarget, Viewport};
use pretty_assertions::assert_eq;

fn device() -> Device<RecordingBackend> {
    let target = RenderTarget {
        width: 640,
        height: 480,
        has_depth_buffer: true,
    };
    let device = Device::new(RecordingBackend::new(), DeviceConfig::default(), target).unwrap();
    device.backend().clear_calls();
    device
}

#[test]
fn clear_whole_target_and_cache_values() -> anyhow::Result<()> {
    let device = device();
    let flags = d3d::D3DCLEAR_TARGET | d3d::D3DCLEAR_ZBUFFER;
    device.clear(&[], flags, 0xFF00_FF00, 1.0, 0)?;
    assert_eq!(
        device.backend().take_calls(),
        vec![
            BackendCall::ClearColor([0.0, 1.0, 0.0, 1.0]),
            BackendCall::ClearDepth(1.0),
            BackendCall::Enable(Capability::ScissorTest),
            BackendCall::Scissor(0, 0, 640, 480),
            BackendCall::Clear(ClearBuffers::COLOR | ClearBuffers::DEPTH),
            BackendCall::Disable(Capability::ScissorTest),
        ]
    );

    device.clear(&[], flags, 0xFF00_FF00, 1.0, 0)?;
    let calls = device.backend().take_calls();
    assert!(!calls
        .iter()
        .any(|c| matches!(c, BackendCall::ClearColor(_) | BackendCall::ClearDepth(_))));
    Ok(())
}

#[test]
fn clear_rects_flip_y() -> anyhow::Result<()> {
    let device = device();
    let rects = [Rect::new(10, 20, 110, 70), Rect::new(0, 0, 1, 1)];
    device.clear(&rects, d3d::D3DCLEAR_STENCIL, 0, 0.0, 3)?;
    assert_eq!(
        device.backend().take_calls(),
        vec![
            BackendCall::ClearStencil(3),
            BackendCall::Enable(Capability::ScissorTest),
            BackendCall::Scissor(10, 410, 100, 50),
            BackendCall::Clear(ClearBuffers::STENCIL),
            BackendCall::Scissor(0, 479, 1, 1),
            BackendCall::Clear(ClearBuffers::STENCIL),
            BackendCall::Disable(Capability::ScissorTest),
        ]
    );
    Ok(())
}

#[test]
fn depth_clear_forces_depth_writes() -> anyhow::Result<()> {
    let device = device();
    device.set_render_state(d3d::D3DRENDERSTATE_ZWRITEENABLE, 0)?;
    device.backend().clear_calls();

    device.clear(&[], d3d::D3DCLEAR_ZBUFFER, 0, 0.0, 0)?;
    let calls = device.backend().take_calls();
    assert_eq!(calls.first(), Some(&BackendCall::DepthMask(true)));
    assert_eq!(calls.last(), Some(&BackendCall::DepthMask(false)));
    Ok(())
}

#[test]
fn malformed_rect_is_rejected_before_any_call() {
    let device = device();
    let rects = [Rect::new(0, 0, 10, 10), Rect::new(5, 5, 4, 9)];
    assert_eq!(
        device.clear(&rects, d3d::D3DCLEAR_TARGET, 0, 1.0, 0),
        Err(D3dError::InvalidRect {
            x1: 5,
            y1: 5,
            x2: 4,
            y2: 9
        })
    );
    assert!(device.backend().calls().is_empty());
}

#[test]
fn clear_after_unlock_uploads_memory_first() -> anyhow::Result<()> {
    let device = device();
    let rect = Rect::new(0, 0, 16, 16);
    device.lock_region(rect)?;
    device.unlock_region()?;
    device.backend().clear_calls();

    device.clear(&[], d3d::D3DCLEAR_TARGET, 0, 1.0, 0)?;
    assert_eq!(
        device.backend().calls().first(),
        Some(&BackendCall::FlushToFramebuffer(rect))
    );
    Ok(())
}

#[test]
fn viewport_defaults_to_the_target() {
    let device = device();
    assert_eq!(
        device.get_viewport(),
        Viewport {
            x: 0,
            y: 0,
            width: 640,
            height: 480,
            min_z: 0.0,
            max_z: 1.0,
        }
    );

    let viewport = Viewport {
        x: 0,
        y: 0,
        width: 320,
        height: 240,
        min_z: 0.0,
        max_z: 1.0,
    };
    device.set_viewport(&viewport);
    device.set_viewport(&viewport);
    assert_eq!(device.get_viewport(), viewport);
    assert_eq!(
        device.backend().take_calls(),
        vec![
            BackendCall::DepthRange(0.0, 1.0),
            BackendCall::Viewport(0, 240, 320, 240),
        ]
    );
}
