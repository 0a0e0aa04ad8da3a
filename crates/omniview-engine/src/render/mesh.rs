use wgpu::util::DeviceExt;

use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{Object3D, PerspectiveCamera, Scene, TextureImage};

use super::common::{interleave, is_transparent, DrawUniform, FrameUniform, MeshVertex};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Lit mesh renderer.
///
/// Draws every object of a [`Scene`] from a [`PerspectiveCamera`] in one
/// render pass: clear to the scene background, opaque meshes, then meshes with
/// opacity below one (blended, no depth write).
///
/// GPU resources are created lazily. Objects are uploaded the first frame they
/// appear; `Scene` is append-only, so the object index identifies an upload.
/// Depth and MSAA targets follow the surface size.
#[derive(Default)]
pub struct MeshRenderer {
    pipeline_key: Option<(wgpu::TextureFormat, u32)>,
    opaque_pipeline: Option<wgpu::RenderPipeline>,
    blend_pipeline: Option<wgpu::RenderPipeline>,

    frame_bgl: Option<wgpu::BindGroupLayout>,
    draw_bgl: Option<wgpu::BindGroupLayout>,

    frame_ubo: Option<wgpu::Buffer>,
    frame_bind_group: Option<wgpu::BindGroup>,

    sampler: Option<wgpu::Sampler>,
    white_texture: Option<wgpu::TextureView>,

    targets: Option<FrameTargets>,
    objects: Vec<GpuObject>,
}

struct FrameTargets {
    size: (u32, u32),
    sample_count: u32,
    depth: wgpu::TextureView,
    /// Multisampled color, resolved into the surface view.
    msaa: Option<wgpu::TextureView>,
}

struct GpuObject {
    meshes: Vec<GpuMesh>,
}

struct GpuMesh {
    mesh_index: usize,
    vbo: wgpu::Buffer,
    ibo: wgpu::Buffer,
    index_count: u32,
    draw_ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    transparent: bool,
}

impl MeshRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `scene` as seen from `camera` into `target`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        self.ensure_pipeline(ctx);
        self.ensure_shared_resources(ctx);
        self.ensure_targets(ctx);
        self.upload_new_objects(ctx, scene);

        // Uniform writes happen before the pass borrows anything.
        if let Some(ubo) = self.frame_ubo.as_ref() {
            let u = FrameUniform::new(camera, scene);
            ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
        }
        for (gpu_object, object) in self.objects.iter().zip(scene.objects()) {
            for gpu_mesh in &gpu_object.meshes {
                let mesh = &object.meshes[gpu_mesh.mesh_index];
                let u = DrawUniform::new(object, object.material_for(mesh));
                ctx.queue.write_buffer(&gpu_mesh.draw_ubo, 0, bytemuck::bytes_of(&u));
            }
        }

        let Some(opaque_pipeline) = self.opaque_pipeline.as_ref() else { return };
        let Some(blend_pipeline) = self.blend_pipeline.as_ref() else { return };
        let Some(frame_bind_group) = self.frame_bind_group.as_ref() else { return };
        let Some(targets) = self.targets.as_ref() else { return };

        let (view, resolve_target, store) = match targets.msaa.as_ref() {
            Some(msaa) => (msaa, Some(target.color_view), wgpu::StoreOp::Discard),
            None => (target.color_view, None, wgpu::StoreOp::Store),
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("omniview mesh pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scene.background.to_wgpu()),
                    store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, frame_bind_group, &[]);

        for (pipeline, transparent) in [(opaque_pipeline, false), (blend_pipeline, true)] {
            rpass.set_pipeline(pipeline);
            for gpu_mesh in self
                .objects
                .iter()
                .flat_map(|o| o.meshes.iter())
                .filter(|m| m.transparent == transparent)
            {
                rpass.set_bind_group(1, &gpu_mesh.bind_group, &[]);
                rpass.set_vertex_buffer(0, gpu_mesh.vbo.slice(..));
                rpass.set_index_buffer(gpu_mesh.ibo.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..gpu_mesh.index_count, 0, 0..1);
            }
        }
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        let key = (ctx.surface_format, ctx.sample_count);
        if self.pipeline_key == Some(key) && self.opaque_pipeline.is_some() {
            return;
        }

        let shader_src = include_str!("shaders/mesh.wgsl");
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("omniview mesh shader"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let frame_bgl = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("omniview mesh frame bgl"),
                entries: &[uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX_FRAGMENT,
                    std::mem::size_of::<FrameUniform>(),
                )],
            });

        let draw_bgl = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("omniview mesh draw bgl"),
                entries: &[
                    uniform_entry(
                        0,
                        wgpu::ShaderStages::VERTEX_FRAGMENT,
                        std::mem::size_of::<DrawUniform>(),
                    ),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("omniview mesh pipeline layout"),
                bind_group_layouts: &[&frame_bgl, &draw_bgl],
                immediate_size: 0,
            });

        let build = |label: &str, depth_write: bool, blend: wgpu::BlendState| {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[MeshVertex::layout()],
                },

                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                // OBJ winding is not reliable; both faces are drawn and the
                // shader flips back-face normals.
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: ctx.sample_count,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },

                multiview_mask: None,
                cache: None,
            })
        };

        let opaque = build("omniview mesh pipeline", true, wgpu::BlendState::REPLACE);
        let blended = build(
            "omniview mesh blend pipeline",
            false,
            wgpu::BlendState::ALPHA_BLENDING,
        );

        log::debug!(
            "mesh pipeline built: {:?}, {}x MSAA",
            ctx.surface_format,
            ctx.sample_count
        );

        self.pipeline_key = Some(key);
        self.opaque_pipeline = Some(opaque);
        self.blend_pipeline = Some(blended);
        self.frame_bgl = Some(frame_bgl);
        self.draw_bgl = Some(draw_bgl);

        // Everything bound against the old layouts or sample count is stale.
        self.frame_ubo = None;
        self.frame_bind_group = None;
        self.targets = None;
        self.objects.clear();
    }

    fn ensure_shared_resources(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_none() {
            self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("omniview mesh sampler"),
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                address_mode_w: wgpu::AddressMode::Repeat,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            }));
        }

        if self.white_texture.is_none() {
            let white = TextureImage {
                source: "white".into(),
                width: 1,
                height: 1,
                rgba: vec![255; 4],
            };
            self.white_texture = Some(upload_texture(ctx, &white));
        }

        if self.frame_bind_group.is_some() && self.frame_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.frame_bgl.as_ref() else { return };

        let frame_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("omniview mesh frame ubo"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("omniview mesh frame bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_ubo.as_entire_binding(),
            }],
        });

        self.frame_ubo = Some(frame_ubo);
        self.frame_bind_group = Some(bind_group);
    }

    fn ensure_targets(&mut self, ctx: &RenderCtx<'_>) {
        let size = (
            ctx.surface_size.width.max(1),
            ctx.surface_size.height.max(1),
        );
        if let Some(t) = self.targets.as_ref() {
            if t.size == size && t.sample_count == ctx.sample_count {
                return;
            }
        }

        let extent = wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        };

        let depth = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("omniview depth target"),
            size: extent,
            mip_level_count: 1,
            sample_count: ctx.sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let msaa = (ctx.sample_count > 1).then(|| {
            ctx.device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("omniview msaa target"),
                    size: extent,
                    mip_level_count: 1,
                    sample_count: ctx.sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format: ctx.surface_format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        self.targets = Some(FrameTargets {
            size,
            sample_count: ctx.sample_count,
            depth: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            msaa,
        });
    }

    fn upload_new_objects(&mut self, ctx: &RenderCtx<'_>, scene: &Scene) {
        if self.objects.len() >= scene.objects().len() {
            return;
        }
        let Some(bgl) = self.draw_bgl.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };
        let Some(white) = self.white_texture.as_ref() else { return };

        for object in &scene.objects()[self.objects.len()..] {
            let uploaded = upload_object(ctx, bgl, sampler, white, object);
            log::debug!(
                "uploaded '{}': {} meshes, {} vertices",
                object.name,
                uploaded.meshes.len(),
                object.vertex_count()
            );
            self.objects.push(uploaded);
        }
    }
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size as u64),
        },
        count: None,
    }
}

fn upload_object(
    ctx: &RenderCtx<'_>,
    bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    white: &wgpu::TextureView,
    object: &Object3D,
) -> GpuObject {
    let textures: Vec<Option<wgpu::TextureView>> = object
        .materials
        .iter()
        .map(|m| m.diffuse_map.as_ref().map(|img| upload_texture(ctx, img)))
        .collect();

    let meshes = object
        .meshes
        .iter()
        .enumerate()
        .filter(|(_, mesh)| !mesh.indices.is_empty())
        .map(|(mesh_index, mesh)| {
            let vertices = interleave(mesh);
            let vbo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("omniview mesh vbo"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let ibo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("omniview mesh ibo"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            let material = object.material_for(mesh);
            let draw_ubo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("omniview mesh draw ubo"),
                contents: bytemuck::bytes_of(&DrawUniform::new(object, material)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

            let texture = mesh
                .material
                .and_then(|i| textures.get(i))
                .and_then(Option::as_ref)
                .unwrap_or(white);

            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("omniview mesh draw bind group"),
                layout: bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: draw_ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(texture),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            });

            GpuMesh {
                mesh_index,
                vbo,
                ibo,
                index_count: mesh.indices.len() as u32,
                draw_ubo,
                bind_group,
                transparent: is_transparent(material),
            }
        })
        .collect();

    GpuObject { meshes }
}

/// Uploads decoded RGBA8 pixels as an sRGB texture (sampling yields linear).
fn upload_texture(ctx: &RenderCtx<'_>, image: &TextureImage) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: image.width.max(1),
        height: image.height.max(1),
        depth_or_array_layers: 1,
    };

    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("omniview diffuse map"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let expected = (size.width * size.height * 4) as usize;
    if image.rgba.len() == expected {
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );
    } else {
        log::warn!(
            "texture {} has {} bytes, expected {}; left blank",
            image.source.display(),
            image.rgba.len(),
            expected
        );
    }

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
