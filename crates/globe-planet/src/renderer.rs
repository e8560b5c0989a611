//! GPU side of the planet: pipelines, uniforms and the per-frame pass.
//!
//! Every shell draws the same unit sphere scaled by its model matrix. The
//! surface pipeline is built the first time a frame is rendered, which is
//! when the surface material's program is compiled and the patched uniform
//! handle comes to life.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};
use globe_config::RenderConfig;
use globe_render::{
    Camera, CameraUniform, DepthBuffer, DirectionalLightUniform, GpuMesh, GpuTexture,
    RenderContext, ShaderError, SphereVertex, TextureData, TextureOptions, create_shader_module,
    generate_uv_sphere,
};
use tracing::{info, trace};
use wgpu::util::DeviceExt;

use crate::material::{AtmosphereMaterial, CloudMaterial, SurfaceMaterial};
use crate::params::SceneParameters;
use crate::patch::{PATCH_BIND_GROUP, PatchUniform};
use crate::scene::SceneRoot;
use crate::shell::ShellTransform;

const CLOUDS_SHADER_SOURCE: &str = include_str!("clouds.wgsl");
const ATMOSPHERE_SHADER_SOURCE: &str = include_str!("atmosphere.wgsl");
const BACKGROUND_SHADER_SOURCE: &str = include_str!("background.wgsl");

/// Additive blending used by the clouds and the atmosphere glow.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no planet has been composed into the scene")]
    NotComposed,

    #[error(transparent)]
    Shader(#[from] ShaderError),
}

/// `struct Surface` in `surface.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SurfaceUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub emissive: [f32; 4],
    pub bump_scale: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub padding: f32,
}

impl SurfaceUniform {
    pub fn new(transform: &ShellTransform, material: &SurfaceMaterial) -> Self {
        Self {
            model: transform.model.to_cols_array_2d(),
            normal_matrix: normal_matrix(transform.normal),
            emissive: material.emissive.extend(1.0).to_array(),
            bump_scale: material.bump_scale,
            roughness: material.roughness,
            metalness: material.metalness,
            padding: 0.0,
        }
    }
}

/// `struct Clouds` in `clouds.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CloudUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl CloudUniform {
    pub fn new(transform: &ShellTransform, material: &CloudMaterial) -> Self {
        Self {
            model: transform.model.to_cols_array_2d(),
            normal_matrix: normal_matrix(transform.normal),
            color: material.color.extend(material.opacity).to_array(),
        }
    }
}

/// `struct Atmosphere` in `atmosphere.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct AtmosphereUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub opacity: f32,
    pub power: f32,
    pub multiplier: f32,
    pub padding: f32,
}

impl AtmosphereUniform {
    pub fn new(transform: &ShellTransform, material: &AtmosphereMaterial) -> Self {
        Self {
            model: transform.model.to_cols_array_2d(),
            normal_matrix: normal_matrix(transform.normal),
            opacity: material.opacity,
            power: material.power,
            multiplier: material.multiplier,
            padding: 0.0,
        }
    }
}

/// `struct Background` in `background.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct BackgroundUniform {
    pub inv_view_proj: [[f32; 4]; 4],
}

impl BackgroundUniform {
    pub fn new(camera: &Camera) -> Self {
        Self {
            inv_view_proj: background_inv_view_proj(camera).to_cols_array_2d(),
        }
    }
}

/// Inverse of projection times the view rotation, so clip coordinates map
/// to world directions independent of the camera's position.
pub fn background_inv_view_proj(camera: &Camera) -> Mat4 {
    let rotation = Mat4::from_mat3(Mat3::from_mat4(camera.view_matrix()));
    (camera.projection_matrix() * rotation).inverse()
}

fn normal_matrix(normal: Mat3) -> [[f32; 4]; 4] {
    Mat4::from_mat3(normal).to_cols_array_2d()
}

fn uniform_buffer<T: Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn uniform_entry<T>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

/// A filterable 2D texture at `binding` and its sampler at `binding + 1`.
fn texture_entries(binding: u32) -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: binding + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}

fn texture_bindings(binding: u32, texture: &GpuTexture) -> [wgpu::BindGroupEntry<'_>; 2] {
    [
        wgpu::BindGroupEntry {
            binding,
            resource: wgpu::BindingResource::TextureView(&texture.view),
        },
        wgpu::BindGroupEntry {
            binding: binding + 1,
            resource: wgpu::BindingResource::Sampler(&texture.sampler),
        },
    ]
}

struct ShellPipelineDesc<'a> {
    label: &'a str,
    module: &'a wgpu::ShaderModule,
    layout: &'a wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    cull_mode: wgpu::Face,
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
}

fn shell_pipeline(device: &wgpu::Device, desc: ShellPipelineDesc<'_>) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.module,
            entry_point: Some("vs_main"),
            buffers: &[SphereVertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(desc.cull_mode),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(DepthBuffer::stencil_state(desc.depth_write)),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: desc.module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: desc.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

struct SurfacePass {
    material_layout: wgpu::BindGroupLayout,
    patch_layout: wgpu::BindGroupLayout,
    uniform: wgpu::Buffer,
    patch_uniform: wgpu::Buffer,
    material_group: wgpu::BindGroup,
    patch_group: wgpu::BindGroup,
    _textures: [GpuTexture; 4],
    pipeline: Option<wgpu::RenderPipeline>,
}

struct ShellPass {
    pipeline: wgpu::RenderPipeline,
    uniform: wgpu::Buffer,
    group: wgpu::BindGroup,
}

struct BackgroundPass {
    pipeline: wgpu::RenderPipeline,
    uniform: wgpu::Buffer,
    group: wgpu::BindGroup,
    _texture: GpuTexture,
}

/// Draws the composed planet and its background.
pub struct PlanetRenderer {
    format: wgpu::TextureFormat,
    clear_color: wgpu::Color,
    depth: DepthBuffer,
    sphere: GpuMesh,
    frame_layout: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_group: wgpu::BindGroup,
    surface: SurfacePass,
    clouds: ShellPass,
    atmosphere: Option<ShellPass>,
    background: Option<BackgroundPass>,
    // Kept alive for both the cloud shell and the surface's shadow lookup.
    _cloud_texture: GpuTexture,
}

impl PlanetRenderer {
    /// Upload the scene's textures and build every pipeline but the surface's.
    pub fn new(
        ctx: &RenderContext,
        scene: &SceneRoot,
        config: &RenderConfig,
    ) -> Result<Self, RenderError> {
        let device = &ctx.device;
        let queue = &ctx.queue;
        let format = ctx.surface_format;
        let layers = scene.layers().ok_or(RenderError::NotComposed)?;
        let (width, height) = ctx.size();

        let segments = config.sphere_segments;
        let sphere = GpuMesh::upload(
            device,
            "globe-unit-sphere",
            &generate_uv_sphere(1.0, segments, segments),
        );

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-frame-layout"),
            entries: &[
                uniform_entry::<CameraUniform>(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ),
                uniform_entry::<DirectionalLightUniform>(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let camera_buffer = uniform_buffer(device, "globe-camera", &CameraUniform::zeroed());
        let light_buffer = uniform_buffer(device, "globe-light", &scene.light.to_uniform());
        let frame_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globe-frame-group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let cloud_texture = GpuTexture::upload(
            device,
            queue,
            "globe-clouds",
            &layers.clouds.material.alpha,
            TextureOptions::DATA.wrapping(),
        );

        let surface = Self::surface_pass(ctx, &layers.surface.material, &cloud_texture);
        let clouds = Self::clouds_pass(ctx, &frame_layout, &cloud_texture);
        let atmosphere = layers
            .atmosphere
            .is_some()
            .then(|| Self::atmosphere_pass(ctx, &frame_layout));
        let background = scene
            .background
            .as_ref()
            .filter(|_| config.show_background)
            .map(|sky| Self::background_pass(ctx, sky));

        let [r, g, b] = config.clear_color;
        info!(
            segments,
            atmosphere = atmosphere.is_some(),
            background = background.is_some(),
            "planet renderer ready"
        );

        Ok(Self {
            format,
            clear_color: wgpu::Color { r, g, b, a: 1.0 },
            depth: DepthBuffer::new(device, width, height),
            sphere,
            frame_layout,
            camera_buffer,
            light_buffer,
            frame_group,
            surface,
            clouds,
            atmosphere,
            background,
            _cloud_texture: cloud_texture,
        })
    }

    fn surface_pass(
        ctx: &RenderContext,
        material: &SurfaceMaterial,
        cloud_texture: &GpuTexture,
    ) -> SurfacePass {
        let device = &ctx.device;
        let queue = &ctx.queue;

        let albedo = GpuTexture::upload(
            device,
            queue,
            "globe-albedo",
            &material.albedo,
            TextureOptions::COLOR,
        );
        let bump = GpuTexture::upload(
            device,
            queue,
            "globe-bump",
            &material.bump,
            TextureOptions::DATA,
        );
        // Without a mask, metalness applies everywhere.
        let white = TextureData::solid([255; 4]);
        let ocean = GpuTexture::upload(
            device,
            queue,
            "globe-ocean",
            material.ocean.as_ref().unwrap_or(&white),
            TextureOptions::DATA,
        );
        let black = TextureData::solid([0, 0, 0, 255]);
        let night = GpuTexture::upload(
            device,
            queue,
            "globe-night-lights",
            material.night_lights.as_ref().unwrap_or(&black),
            TextureOptions::COLOR,
        );

        let [a0, a1] = texture_entries(1);
        let [b0, b1] = texture_entries(3);
        let [o0, o1] = texture_entries(5);
        let [n0, n1] = texture_entries(7);
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-surface-layout"),
            entries: &[
                uniform_entry::<SurfaceUniform>(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ),
                a0,
                a1,
                b0,
                b1,
                o0,
                o1,
                n0,
                n1,
            ],
        });
        let uniform = uniform_buffer(device, "globe-surface", &SurfaceUniform::zeroed());
        let [ta0, ta1] = texture_bindings(1, &albedo);
        let [tb0, tb1] = texture_bindings(3, &bump);
        let [to0, to1] = texture_bindings(5, &ocean);
        let [tn0, tn1] = texture_bindings(7, &night);
        let material_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globe-surface-group"),
            layout: &material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                ta0,
                ta1,
                tb0,
                tb1,
                to0,
                to1,
                tn0,
                tn1,
            ],
        });

        let [c0, c1] = texture_entries(1);
        let patch_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-patch-layout"),
            entries: &[uniform_entry::<PatchUniform>(0, wgpu::ShaderStages::FRAGMENT), c0, c1],
        });
        let patch_uniform = uniform_buffer(device, "globe-patch", &PatchUniform::zeroed());
        let [tc0, tc1] = texture_bindings(1, cloud_texture);
        let patch_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globe-patch-group"),
            layout: &patch_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: patch_uniform.as_entire_binding(),
                },
                tc0,
                tc1,
            ],
        });

        SurfacePass {
            material_layout,
            patch_layout,
            uniform,
            patch_uniform,
            material_group,
            patch_group,
            _textures: [albedo, bump, ocean, night],
            pipeline: None,
        }
    }

    fn clouds_pass(
        ctx: &RenderContext,
        frame_layout: &wgpu::BindGroupLayout,
        cloud_texture: &GpuTexture,
    ) -> ShellPass {
        let device = &ctx.device;
        let [t0, t1] = texture_entries(1);
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-clouds-layout"),
            entries: &[
                uniform_entry::<CloudUniform>(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ),
                t0,
                t1,
            ],
        });
        let uniform = uniform_buffer(device, "globe-clouds", &CloudUniform::zeroed());
        let [b0, b1] = texture_bindings(1, cloud_texture);
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globe-clouds-group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                b0,
                b1,
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe-clouds-pipeline-layout"),
            bind_group_layouts: &[frame_layout, &layout],
            immediate_size: 0,
        });
        let module = create_shader_module(device, "globe-clouds", CLOUDS_SHADER_SOURCE);
        let pipeline = shell_pipeline(
            device,
            ShellPipelineDesc {
                label: "globe-clouds-pipeline",
                module: &module,
                layout: &pipeline_layout,
                format: ctx.surface_format,
                cull_mode: wgpu::Face::Back,
                blend: Some(ADDITIVE),
                depth_write: false,
            },
        );

        ShellPass {
            pipeline,
            uniform,
            group,
        }
    }

    fn atmosphere_pass(ctx: &RenderContext, frame_layout: &wgpu::BindGroupLayout) -> ShellPass {
        let device = &ctx.device;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-atmosphere-layout"),
            entries: &[uniform_entry::<AtmosphereUniform>(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let uniform = uniform_buffer(device, "globe-atmosphere", &AtmosphereUniform::zeroed());
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globe-atmosphere-group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe-atmosphere-pipeline-layout"),
            bind_group_layouts: &[frame_layout, &layout],
            immediate_size: 0,
        });
        let module = create_shader_module(device, "globe-atmosphere", ATMOSPHERE_SHADER_SOURCE);
        // Only the far side of the shell is drawn, so the glow hugs the limb.
        let pipeline = shell_pipeline(
            device,
            ShellPipelineDesc {
                label: "globe-atmosphere-pipeline",
                module: &module,
                layout: &pipeline_layout,
                format: ctx.surface_format,
                cull_mode: wgpu::Face::Front,
                blend: Some(ADDITIVE),
                depth_write: false,
            },
        );

        ShellPass {
            pipeline,
            uniform,
            group,
        }
    }

    fn background_pass(ctx: &RenderContext, sky: &TextureData) -> BackgroundPass {
        let device = &ctx.device;
        let texture = GpuTexture::upload(
            device,
            &ctx.queue,
            "globe-background",
            sky,
            TextureOptions {
                mipmaps: false,
                ..TextureOptions::COLOR
            }
            .wrapping(),
        );

        let [t0, t1] = texture_entries(1);
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe-background-layout"),
            entries: &[
                uniform_entry::<BackgroundUniform>(0, wgpu::ShaderStages::FRAGMENT),
                t0,
                t1,
            ],
        });
        let uniform = uniform_buffer(device, "globe-background", &BackgroundUniform::zeroed());
        let [b0, b1] = texture_bindings(1, &texture);
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globe-background-group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                b0,
                b1,
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe-background-pipeline-layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });
        let module = create_shader_module(device, "globe-background", BACKGROUND_SHADER_SOURCE);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("globe-background-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                depth_compare: wgpu::CompareFunction::Always,
                ..DepthBuffer::stencil_state(false)
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        BackgroundPass {
            pipeline,
            uniform,
            group,
            _texture: texture,
        }
    }

    /// Recreate the depth target after the surface was resized.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
    }

    /// Compile the surface material and build its pipeline, once.
    fn ensure_surface_pipeline(
        &mut self,
        device: &wgpu::Device,
        scene: &mut SceneRoot,
        params: &SceneParameters,
    ) -> Result<(), RenderError> {
        if self.surface.pipeline.is_some() {
            return Ok(());
        }
        let layers = scene.layers_mut().ok_or(RenderError::NotComposed)?;
        let source = layers.surface.material.compile(params)?;
        let module = create_shader_module(device, "globe-surface", source);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe-surface-pipeline-layout"),
            bind_group_layouts: &[
                &self.frame_layout,
                &self.surface.material_layout,
                &self.surface.patch_layout,
            ],
            immediate_size: 0,
        });
        self.surface.pipeline = Some(shell_pipeline(
            device,
            ShellPipelineDesc {
                label: "globe-surface-pipeline",
                module: &module,
                layout: &pipeline_layout,
                format: self.format,
                cull_mode: wgpu::Face::Back,
                blend: None,
                depth_write: true,
            },
        ));
        info!(
            patched = layers.surface.material.program().is_some(),
            "surface program compiled"
        );
        Ok(())
    }

    fn write_uniforms(
        &self,
        queue: &wgpu::Queue,
        camera: &Camera,
        scene: &SceneRoot,
        params: &SceneParameters,
    ) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera.to_uniform()));
        queue.write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&scene.light.to_uniform()));
        if let Some(background) = &self.background {
            queue.write_buffer(
                &background.uniform,
                0,
                bytemuck::bytes_of(&BackgroundUniform::new(camera)),
            );
        }

        let Some(layers) = scene.layers() else {
            return;
        };
        let surface = &layers.surface;
        let transform = layers.shell_transform(surface.radius, surface.yaw);
        queue.write_buffer(
            &self.surface.uniform,
            0,
            bytemuck::bytes_of(&SurfaceUniform::new(&transform, &surface.material)),
        );
        let patch = surface
            .material
            .program()
            .map(|program| program.uniform())
            .unwrap_or(PatchUniform {
                cloud_offset: 0.0,
                fresnel_intensity: params.fresnel_intensity,
                padding: [0.0; 2],
            });
        queue.write_buffer(&self.surface.patch_uniform, 0, bytemuck::bytes_of(&patch));

        let clouds = &layers.clouds;
        let transform = layers.shell_transform(clouds.radius, clouds.yaw);
        queue.write_buffer(
            &self.clouds.uniform,
            0,
            bytemuck::bytes_of(&CloudUniform::new(&transform, &clouds.material)),
        );

        if let (Some(pass), Some(shell)) = (&self.atmosphere, &layers.atmosphere) {
            let transform = layers.shell_transform(shell.radius, shell.yaw);
            queue.write_buffer(
                &pass.uniform,
                0,
                bytemuck::bytes_of(&AtmosphereUniform::new(&transform, &shell.material)),
            );
        }
    }

    /// Upload this frame's uniforms and draw background, surface, clouds, then atmosphere.
    pub fn render(
        &mut self,
        ctx: &RenderContext,
        target: &wgpu::TextureView,
        camera: &Camera,
        scene: &mut SceneRoot,
        params: &SceneParameters,
    ) -> Result<(), RenderError> {
        self.ensure_surface_pipeline(&ctx.device, scene, params)?;
        self.write_uniforms(&ctx.queue, camera, scene, params);

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("globe-frame"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("globe-planet-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(self.depth.clear_attachment()),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(background) = &self.background {
                pass.set_pipeline(&background.pipeline);
                pass.set_bind_group(0, &background.group, &[]);
                pass.draw(0..3, 0..1);
            }

            if let Some(pipeline) = &self.surface.pipeline {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.frame_group, &[]);
                pass.set_bind_group(1, &self.surface.material_group, &[]);
                pass.set_bind_group(PATCH_BIND_GROUP, &self.surface.patch_group, &[]);
                self.sphere.draw(&mut pass);
            }

            pass.set_pipeline(&self.clouds.pipeline);
            pass.set_bind_group(0, &self.frame_group, &[]);
            pass.set_bind_group(1, &self.clouds.group, &[]);
            self.sphere.draw(&mut pass);

            if let Some(atmosphere) = &self.atmosphere {
                pass.set_pipeline(&atmosphere.pipeline);
                pass.set_bind_group(0, &self.frame_group, &[]);
                pass.set_bind_group(1, &atmosphere.group, &[]);
                self.sphere.draw(&mut pass);
            }
        }
        ctx.queue.submit(std::iter::once(encoder.finish()));
        trace!("planet frame submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::LayerComposer;
    use crate::loader::SceneAssets;
    use glam::{Vec3, Vec4};
    use globe_config::PlanetConfig;
    use globe_render::DirectionalLight;
    use std::mem::size_of;

    #[test]
    fn test_uniform_sizes_match_shaders() {
        assert_eq!(size_of::<SurfaceUniform>(), 160);
        assert_eq!(size_of::<CloudUniform>(), 144);
        assert_eq!(size_of::<AtmosphereUniform>(), 144);
        assert_eq!(size_of::<BackgroundUniform>(), 64);
    }

    #[test]
    fn test_shell_uniforms_follow_materials() {
        let params = SceneParameters::default();
        let mut root = SceneRoot::new(DirectionalLight::default());
        let assets = SceneAssets {
            background: None,
            albedo: TextureData::solid([0; 4]),
            bump: TextureData::solid([0; 4]),
            clouds: TextureData::solid([0; 4]),
            ocean: None,
            night_lights: None,
        };
        LayerComposer::from_config(&PlanetConfig::default())
            .compose(assets, &params, &mut root)
            .unwrap();
        let layers = root.layers().unwrap();

        let surface = &layers.surface;
        let transform = layers.shell_transform(surface.radius, surface.yaw);
        let uniform = SurfaceUniform::new(&transform, &surface.material);
        assert_eq!(uniform.bump_scale, params.bump_scale);
        assert_eq!(uniform.metalness, params.ocean_metalness);
        assert_eq!(uniform.emissive, [1.0, 1.0, 0.53, 1.0]);
        // Model column 0 carries the radius scale.
        let x_axis = Vec4::from_array(uniform.model[0]);
        assert!((x_axis.truncate().length() - surface.radius).abs() < 1e-4);

        let atmosphere = layers.atmosphere.as_ref().unwrap();
        let transform = layers.shell_transform(atmosphere.radius, atmosphere.yaw);
        let uniform = AtmosphereUniform::new(&transform, &atmosphere.material);
        assert_eq!(
            (uniform.opacity, uniform.power, uniform.multiplier),
            (0.7, 4.1, 9.5)
        );

        let uniform = CloudUniform::new(&transform, &layers.clouds.material);
        assert_eq!(uniform.color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_background_ignores_camera_position() {
        let near = Camera {
            position: Vec3::new(0.0, 0.0, 30.0),
            ..Camera::default()
        };
        let far = Camera {
            position: Vec3::new(0.0, 0.0, 90.0),
            ..Camera::default()
        };
        let a = background_inv_view_proj(&near);
        let b = background_inv_view_proj(&far);
        assert!(a.abs_diff_eq(b, 1e-4));
    }

    #[test]
    fn test_background_center_looks_at_target() {
        let camera = Camera::default();
        let p = background_inv_view_proj(&camera) * Vec4::new(0.0, 0.0, 1.0, 1.0);
        let dir = (p.truncate() / p.w).normalize();
        // Default camera sits on +Z looking at the origin.
        assert!((dir - Vec3::NEG_Z).length() < 1e-3);
    }
}
