use aero_d3d7::backend::recording::{BackendCall, RecordingBackend};
use aero_d3d7::backend::{BlendFactor, Capability, CombineFunc, CombineSource, Winding};
use aero_d3d7::d3d;
use aero_d3d7::{D3dError, Device, DeviceConfig, RenderTarget};
use pretty_assertions::assert_eq;

fn device(version: u8) -> Device<RecordingBackend> {
    let target = RenderTarget {
        width: 640,
        height: 480,
        has_depth_buffer: true,
    };
    Device::new(
        RecordingBackend::new(),
        DeviceConfig::for_version(version),
        target,
    )
    .unwrap()
}

#[test]
fn version_one_defaults() -> anyhow::Result<()> {
    let device = device(1);
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_SPECULARENABLE)?,
        1
    );
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_CULLMODE)?,
        d3d::D3DCULL_CCW
    );
    // Culling counter-clockwise faces leaves clockwise ones in front.
    assert!(device
        .backend()
        .calls()
        .contains(&BackendCall::FrontFace(Winding::Cw)));
    Ok(())
}

#[test]
fn fresh_device_defaults() -> anyhow::Result<()> {
    let device = device(7);
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_SPECULARENABLE)?,
        0
    );
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_ZENABLE)?,
        d3d::D3DZB_TRUE
    );
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_ZFUNC)?,
        d3d::D3DCMP_LESSEQUAL
    );
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_FOGDENSITY)?,
        1.0f32.to_bits()
    );
    assert_eq!(
        device.get_texture_stage_state(0, d3d::D3DTSS_COLOROP)?,
        d3d::D3DTOP_MODULATE
    );
    assert_eq!(
        device.get_texture_stage_state(0, d3d::D3DTSS_ALPHAARG2)?,
        d3d::D3DTA_DIFFUSE
    );
    assert_eq!(
        device.get_texture_stage_state(1, d3d::D3DTSS_COLOROP)?,
        d3d::D3DTOP_DISABLE
    );
    assert_eq!(
        device.get_texture_stage_state(3, d3d::D3DTSS_TEXCOORDINDEX)?,
        3
    );

    let calls = device.backend().take_calls();
    assert_eq!(calls.first(), Some(&BackendCall::ClearDepth(0.0)));
    assert!(calls.contains(&BackendCall::Disable(Capability::Lighting)));
    assert!(calls.contains(&BackendCall::Disable(Capability::Fog)));
    Ok(())
}

#[test]
fn out_of_range_ids_are_rejected() {
    let device = device(7);
    assert_eq!(
        device.set_render_state(0, 1),
        Err(D3dError::InvalidRenderState(0))
    );
    assert_eq!(
        device.get_render_state(153),
        Err(D3dError::InvalidRenderState(153))
    );
    assert_eq!(
        device.set_texture_stage_state(8, d3d::D3DTSS_COLOROP, d3d::D3DTOP_ADD),
        Err(D3dError::InvalidTextureStage(8))
    );
    assert_eq!(
        device.get_texture_stage_state(0, 25),
        Err(D3dError::InvalidTextureStageState(25))
    );
    assert!(device
        .set_render_state(0, 1)
        .unwrap_err()
        .is_invalid_parameter());
}

#[test]
fn redundant_toggles_emit_nothing() -> anyhow::Result<()> {
    let device = device(7);
    device.backend().clear_calls();

    device.set_render_state(d3d::D3DRENDERSTATE_ALPHABLENDENABLE, 1)?;
    device.set_render_state(d3d::D3DRENDERSTATE_ALPHABLENDENABLE, 1)?;
    device.set_render_state(d3d::D3DRENDERSTATE_ZENABLE, d3d::D3DZB_TRUE)?;
    device.set_render_state(d3d::D3DRENDERSTATE_ZFUNC, d3d::D3DCMP_LESSEQUAL)?;
    assert_eq!(
        device.backend().take_calls(),
        vec![BackendCall::Enable(Capability::Blend)]
    );

    device.set_render_state(d3d::D3DRENDERSTATE_ALPHABLENDENABLE, 0)?;
    device.set_render_state(d3d::D3DRENDERSTATE_ALPHABLENDENABLE, 0)?;
    assert_eq!(
        device.backend().take_calls(),
        vec![BackendCall::Disable(Capability::Blend)]
    );
    Ok(())
}

#[test]
fn both_src_alpha_normalizes_blend_pair() -> anyhow::Result<()> {
    let device = device(7);
    device.backend().clear_calls();

    device.set_render_state(d3d::D3DRENDERSTATE_SRCBLEND, d3d::D3DBLEND_BOTHSRCALPHA)?;
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_SRCBLEND)?,
        d3d::D3DBLEND_SRCALPHA
    );
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_DESTBLEND)?,
        d3d::D3DBLEND_INVSRCALPHA
    );
    assert_eq!(
        device.backend().take_calls(),
        vec![BackendCall::BlendFunc(
            BlendFactor::SrcAlpha,
            BlendFactor::InvSrcAlpha
        )]
    );

    device.set_render_state(d3d::D3DRENDERSTATE_SRCBLEND, d3d::D3DBLEND_BOTHINVSRCALPHA)?;
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_SRCBLEND)?,
        d3d::D3DBLEND_INVSRCALPHA
    );
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_DESTBLEND)?,
        d3d::D3DBLEND_SRCALPHA
    );
    Ok(())
}

#[test]
fn texture_address_writes_both_axes() -> anyhow::Result<()> {
    let device = device(7);
    device.set_render_state(d3d::D3DRENDERSTATE_TEXTUREADDRESS, d3d::D3DTADDRESS_CLAMP)?;
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_TEXTUREADDRESSU)?,
        d3d::D3DTADDRESS_CLAMP
    );
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_TEXTUREADDRESSV)?,
        d3d::D3DTADDRESS_CLAMP
    );
    // The legacy sampler render states alias stage 0.
    assert_eq!(
        device.get_texture_stage_state(0, d3d::D3DTSS_ADDRESSU)?,
        d3d::D3DTADDRESS_CLAMP
    );

    device.set_texture_stage_state(1, d3d::D3DTSS_ADDRESS, d3d::D3DTADDRESS_MIRROR)?;
    assert_eq!(
        device.get_texture_stage_state(1, d3d::D3DTSS_ADDRESSU)?,
        d3d::D3DTADDRESS_MIRROR
    );
    assert_eq!(
        device.get_texture_stage_state(1, d3d::D3DTSS_ADDRESSV)?,
        d3d::D3DTADDRESS_MIRROR
    );
    Ok(())
}

#[test]
fn select_arg2_routes_second_argument_first() -> anyhow::Result<()> {
    let device = device(7);
    device.set_texture_stage_state(0, d3d::D3DTSS_COLORARG1, d3d::D3DTA_TEXTURE)?;
    device.set_texture_stage_state(0, d3d::D3DTSS_COLORARG2, d3d::D3DTA_DIFFUSE)?;
    device.set_texture_stage_state(0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_SELECTARG2)?;

    let color = device.stage_combine(0).unwrap().color;
    assert_eq!(color.func, Some(CombineFunc::Replace));
    assert_eq!(color.args[0].unwrap().source, CombineSource::PrimaryColor);
    assert_eq!(color.args[1].unwrap().source, CombineSource::Texture);

    device.set_texture_stage_state(0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_MODULATE)?;
    let color = device.stage_combine(0).unwrap().color;
    assert_eq!(color.func, Some(CombineFunc::Modulate));
    assert_eq!(color.args[0].unwrap().source, CombineSource::Texture);
    assert_eq!(color.args[1].unwrap().source, CombineSource::PrimaryColor);
    Ok(())
}

#[test]
fn stages_past_backend_units_are_stored_only() -> anyhow::Result<()> {
    let device = device(7);
    device.backend().clear_calls();
    device.set_texture_stage_state(5, d3d::D3DTSS_COLOROP, d3d::D3DTOP_ADD)?;
    assert_eq!(
        device.get_texture_stage_state(5, d3d::D3DTSS_COLOROP)?,
        d3d::D3DTOP_ADD
    );
    assert!(device.backend().calls().is_empty());
    Ok(())
}

#[test]
fn applying_a_state_block_twice_is_idempotent() -> anyhow::Result<()> {
    let device = device(7);
    device.set_render_state(d3d::D3DRENDERSTATE_ALPHATESTENABLE, 1)?;
    device.set_render_state(d3d::D3DRENDERSTATE_ALPHAREF, 0x80)?;
    device.set_texture_stage_state(0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_ADD)?;
    let block = device.capture_state_block();

    device.set_render_state(d3d::D3DRENDERSTATE_ALPHATESTENABLE, 0)?;
    device.set_texture_stage_state(0, d3d::D3DTSS_COLOROP, d3d::D3DTOP_MODULATE)?;

    device.apply_state_block(&block)?;
    let once = device.capture_state_block();
    assert_eq!(once, block);
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_ALPHATESTENABLE)?,
        1
    );
    assert_eq!(
        device.stage_combine(0).unwrap().color.func,
        Some(CombineFunc::Add)
    );

    device.backend().clear_calls();
    device.apply_state_block(&block)?;
    assert_eq!(device.capture_state_block(), once);
    // Render states are all cached already; only the combiner re-pushes its stage setup.
    assert_eq!(
        device
            .backend()
            .count(|call| matches!(call, BackendCall::Enable(_) | BackendCall::Disable(_))),
        0
    );
    Ok(())
}

#[test]
fn state_block_restores_zero_valued_defaults() -> anyhow::Result<()> {
    let device = device(7);
    let block = device.capture_state_block();
    device.set_render_state(d3d::D3DRENDERSTATE_ALPHABLENDENABLE, 1)?;
    device.set_render_state(d3d::D3DRENDERSTATE_FOGCOLOR, 0x0012_3456)?;

    device.backend().clear_calls();
    device.apply_state_block(&block)?;
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_ALPHABLENDENABLE)?,
        0
    );
    assert_eq!(device.get_render_state(d3d::D3DRENDERSTATE_FOGCOLOR)?, 0);
    assert!(device
        .backend()
        .calls()
        .contains(&BackendCall::Disable(Capability::Blend)));
    Ok(())
}

#[test]
fn state_block_carries_legacy_filter_onto_stage_zero() -> anyhow::Result<()> {
    let device = device(7);
    device.set_render_state(d3d::D3DRENDERSTATE_TEXTUREMAG, d3d::D3DFILTER_LINEAR)?;
    let block = device.capture_state_block();

    device.set_render_state(d3d::D3DRENDERSTATE_TEXTUREMAG, d3d::D3DFILTER_NEAREST)?;
    assert_eq!(
        device.get_texture_stage_state(0, d3d::D3DTSS_MAGFILTER)?,
        d3d::D3DTFG_POINT
    );

    device.apply_state_block(&block)?;
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_TEXTUREMAG)?,
        d3d::D3DFILTER_LINEAR
    );
    assert_eq!(
        device.get_texture_stage_state(0, d3d::D3DTSS_MAGFILTER)?,
        d3d::D3DTFG_LINEAR
    );
    Ok(())
}

#[test]
fn invalidating_the_cache_replays_state() -> anyhow::Result<()> {
    let device = device(7);
    device.set_render_state(d3d::D3DRENDERSTATE_ALPHABLENDENABLE, 1)?;
    device.backend().clear_calls();

    device.invalidate_backend_cache();
    let calls = device.backend().take_calls();
    // Initial state turns blending off, then the table turns it back on.
    let disable = calls
        .iter()
        .position(|c| *c == BackendCall::Disable(Capability::Blend));
    let enable = calls
        .iter()
        .position(|c| *c == BackendCall::Enable(Capability::Blend));
    assert!(disable.is_some() && enable.is_some());
    assert!(disable < enable);
    Ok(())
}

#[test]
fn light_states_alias_render_states() -> anyhow::Result<()> {
    let device = device(3);
    device.set_light_state(d3d::D3DLIGHTSTATE_FOGSTART, 2.5f32.to_bits())?;
    assert_eq!(
        device.get_render_state(d3d::D3DRENDERSTATE_FOGSTART)?,
        2.5f32.to_bits()
    );
    device.set_light_state(d3d::D3DLIGHTSTATE_MATERIAL, 42)?;
    assert_eq!(device.get_light_state(d3d::D3DLIGHTSTATE_MATERIAL)?, 42);
    assert_eq!(
        device.get_light_state(0),
        Err(D3dError::InvalidLightState(0))
    );
    Ok(())
}
