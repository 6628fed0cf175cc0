use aero_d3d7::backend::recording::{BackendCall, RecordingBackend};
use aero_d3d7::backend::{Capability, FogMode, MatrixMode};
use aero_d3d7::d3d;
use aero_d3d7::{
    BackendCaps, D3dError, Device, DeviceConfig, Fvf, Light, LightType, Material, Matrix,
    RenderTarget,
};
use pretty_assertions::assert_eq;

fn device_with(config: DeviceConfig) -> Device<RecordingBackend> {
    let target = RenderTarget {
        width: 320,
        height: 240,
        has_depth_buffer: true,
    };
    Device::new(RecordingBackend::new(), config, target).unwrap()
}

fn device() -> Device<RecordingBackend> {
    device_with(DeviceConfig::default())
}

fn translation(x: f32, y: f32, z: f32) -> Matrix {
    let mut m = Matrix::IDENTITY;
    m.0[12] = x;
    m.0[13] = y;
    m.0[14] = z;
    m
}

fn draw_prelit(device: &Device<RecordingBackend>) {
    let words = [0.0f32, 0.0, 0.0, f32::from_bits(0xFFFF_FFFF)];
    device
        .draw_primitive(
            d3d::D3DPT_POINTLIST,
            Fvf::XYZ | Fvf::DIFFUSE,
            bytemuck::cast_slice(&words),
            1,
        )
        .unwrap();
}

fn draw_unlit(device: &Device<RecordingBackend>) {
    let words = [0.0f32, 0.0, 0.0, 0.0, 0.0, 1.0];
    device
        .draw_primitive(
            d3d::D3DPT_POINTLIST,
            Fvf::XYZ | Fvf::NORMAL,
            bytemuck::cast_slice(&words),
            1,
        )
        .unwrap();
}

fn matrix_calls(calls: &[BackendCall]) -> Vec<BackendCall> {
    calls
        .iter()
        .filter(|c| {
            matches!(
                c,
                BackendCall::LoadMatrix(..)
                    | BackendCall::LoadIdentity(_)
                    | BackendCall::MultiplyMatrix(..)
            )
        })
        .cloned()
        .collect()
}

#[test]
fn transforms_round_trip_and_multiply() -> anyhow::Result<()> {
    let device = device();
    device.set_transform(d3d::D3DTRANSFORMSTATE_WORLD, &translation(1.0, 2.0, 3.0))?;

    let mut scale = Matrix::IDENTITY;
    scale.0[0] = 2.0;
    scale.0[5] = 2.0;
    scale.0[10] = 2.0;
    device.multiply_transform(d3d::D3DTRANSFORMSTATE_WORLD, &scale)?;

    let mut expected = scale;
    expected.0[12] = 2.0;
    expected.0[13] = 4.0;
    expected.0[14] = 6.0;
    assert_eq!(device.get_transform(d3d::D3DTRANSFORMSTATE_WORLD)?, expected);
    Ok(())
}

#[test]
fn unknown_transform_types() {
    let device = device();
    assert_eq!(device.set_transform(4, &Matrix::IDENTITY), Ok(()));
    assert_eq!(
        device.get_transform(4),
        Err(D3dError::InvalidTransform(4))
    );
    assert_eq!(
        device.multiply_transform(24, &Matrix::IDENTITY),
        Err(D3dError::InvalidTransform(24))
    );
}

#[test]
fn object_space_draws_load_the_camera_once() -> anyhow::Result<()> {
    let device = device();
    let world = translation(1.0, 0.0, 0.0);
    let view = translation(0.0, 0.0, 5.0);
    let mut projection = Matrix::IDENTITY;
    projection.0[0] = 0.5;
    device.set_transform(d3d::D3DTRANSFORMSTATE_WORLD, &world)?;
    device.set_transform(d3d::D3DTRANSFORMSTATE_VIEW, &view)?;
    device.set_transform(d3d::D3DTRANSFORMSTATE_PROJECTION, &projection)?;
    device.backend().clear_calls();

    draw_prelit(&device);
    draw_prelit(&device);
    let camera = vec![
        BackendCall::LoadMatrix(MatrixMode::ModelView, view),
        BackendCall::MultiplyMatrix(MatrixMode::ModelView, world),
        BackendCall::LoadMatrix(MatrixMode::Projection, projection),
    ];
    assert_eq!(matrix_calls(&device.backend().take_calls()), camera);

    // Changing a camera matrix forces a reload on the next draw.
    device.set_transform(d3d::D3DTRANSFORMSTATE_WORLD, &world)?;
    draw_prelit(&device);
    assert_eq!(matrix_calls(&device.backend().take_calls()), camera);
    Ok(())
}

#[test]
fn texture_matrices_follow_transform_flags() -> anyhow::Result<()> {
    let device = device();
    device.set_texture_stage_state(
        0,
        d3d::D3DTSS_TEXTURETRANSFORMFLAGS,
        d3d::D3DTTFF_COUNT2,
    )?;
    device.backend().clear_calls();

    let m = translation(0.5, 0.25, 0.0);
    device.set_transform(d3d::D3DTRANSFORMSTATE_TEXTURE0, &m)?;
    assert_eq!(
        device.backend().take_calls(),
        vec![BackendCall::LoadMatrix(MatrixMode::Texture(0), m)]
    );

    device.set_texture_stage_state(
        0,
        d3d::D3DTSS_TEXTURETRANSFORMFLAGS,
        d3d::D3DTTFF_DISABLE,
    )?;
    assert_eq!(
        device.backend().take_calls(),
        vec![BackendCall::LoadIdentity(MatrixMode::Texture(0))]
    );
    Ok(())
}

#[test]
fn enabling_an_unset_light_uses_the_default() -> anyhow::Result<()> {
    let device = device();
    assert_eq!(device.get_light(3), Err(D3dError::InvalidLight(3)));
    assert_eq!(device.get_light_enable(3), Err(D3dError::InvalidLight(3)));

    device.light_enable(3, true)?;
    assert_eq!(device.get_light(3)?, Light::default_directional());
    assert!(device.get_light_enable(3)?);
    assert!(device
        .backend()
        .calls()
        .contains(&BackendCall::Enable(Capability::Light(0))));

    device.backend().clear_calls();
    draw_unlit(&device);
    let uploaded: Vec<_> = device
        .backend()
        .calls()
        .iter()
        .filter_map(|c| match c {
            BackendCall::Light(slot, light) => Some((*slot, light.position)),
            _ => None,
        })
        .collect();
    // Directional lights point from the light; the backend wants the direction towards it.
    assert_eq!(uploaded, vec![(0, [0.0, 0.0, -1.0, 0.0])]);

    device.light_enable(3, false)?;
    assert!(!device.get_light_enable(3)?);
    assert!(device
        .backend()
        .calls()
        .contains(&BackendCall::Disable(Capability::Light(0))));
    Ok(())
}

#[test]
fn lights_past_the_backend_slots_stay_off() -> anyhow::Result<()> {
    let caps = BackendCaps {
        max_active_lights: 1,
        ..BackendCaps::default()
    };
    let device = device_with(DeviceConfig::default().with_caps(caps));
    let point = Light {
        kind: LightType::Point,
        position: [1.0, 2.0, 3.0],
        attenuation: [1.0, 0.0, 0.0],
        ..Light::default_directional()
    };
    device.set_light(0, &point)?;
    device.set_light(1, &point)?;
    device.light_enable(0, true)?;
    device.light_enable(1, true)?;
    assert!(device.get_light_enable(0)?);
    assert!(!device.get_light_enable(1)?);
    Ok(())
}

#[test]
fn clip_planes_upload_when_clipping() -> anyhow::Result<()> {
    let device = device();
    assert_eq!(
        device.set_clip_plane(6, [0.0; 4]),
        Err(D3dError::InvalidClipPlane { index: 6, max: 6 })
    );

    device.set_clip_plane(0, [0.0, 1.0, 0.0, -2.0])?;
    assert_eq!(device.get_clip_plane(0)?, [0.0, 1.0, 0.0, -2.0]);
    device.set_render_state(d3d::D3DRENDERSTATE_CLIPPING, 1)?;
    device.set_render_state(d3d::D3DRENDERSTATE_CLIPPLANEENABLE, 1)?;
    assert!(device
        .backend()
        .calls()
        .contains(&BackendCall::Enable(Capability::ClipPlane(0))));

    device.backend().clear_calls();
    draw_prelit(&device);
    assert!(device
        .backend()
        .calls()
        .contains(&BackendCall::ClipPlane(0, [0.0, 1.0, 0.0, -2.0])));
    Ok(())
}

#[test]
fn material_reaches_the_backend() {
    let device = device();
    let material = Material {
        diffuse: [1.0, 0.5, 0.25, 1.0],
        power: 8.0,
        ..Material::default()
    };
    device.backend().clear_calls();
    device.set_material(&material);
    assert_eq!(device.get_material(), material);
    assert_eq!(
        device.backend().take_calls(),
        vec![BackendCall::Material(material)]
    );
}

#[test]
fn pixel_fog_unprojects_start_and_end() -> anyhow::Result<()> {
    let device = device();
    // Perspective depth with near 1 and far 11.
    let mut projection = Matrix::IDENTITY;
    projection.0[10] = 1.1;
    projection.0[11] = 1.0;
    projection.0[14] = -1.1;
    projection.0[15] = 0.0;
    device.set_transform(d3d::D3DTRANSFORMSTATE_PROJECTION, &projection)?;
    device.set_render_state(d3d::D3DRENDERSTATE_FOGENABLE, 1)?;
    device.set_render_state(d3d::D3DRENDERSTATE_FOGTABLEMODE, d3d::D3DFOG_LINEAR)?;
    device.set_render_state(d3d::D3DRENDERSTATE_FOGSTART, 0.5f32.to_bits())?;
    device.set_render_state(d3d::D3DRENDERSTATE_FOGEND, 0.9f32.to_bits())?;
    device.backend().clear_calls();

    draw_prelit(&device);
    let calls = device.backend().take_calls();
    assert!(calls.contains(&BackendCall::FogMode(FogMode::Linear)));
    assert!(calls.contains(&BackendCall::Enable(Capability::Fog)));
    assert!(calls.contains(&BackendCall::FogParams {
        start: projection.unproject_z(0.5),
        end: projection.unproject_z(0.9),
        density: 1.0,
    }));

    // Unlit vertices take fog distances as given.
    draw_unlit(&device);
    assert!(device.backend().calls().contains(&BackendCall::FogParams {
        start: 0.5,
        end: 0.9,
        density: 1.0,
    }));
    Ok(())
}
