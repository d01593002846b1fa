//! GPU side of the scene: uploads dirty vertex spans and sheet images, then
//! issues the background, field and card passes.

use duel_engine::render::{RenderCtx, RenderTarget};
use wgpu::util::DeviceExt;

use crate::assets::{AssetProvider, SheetKind};
use crate::buffers::{FIELD_SLOTS, MISC_SLOTS, SceneBuffers, VertexRegion};
use crate::layout::ZONE_BLOCKS;
use crate::scene::DuelScene;
use crate::vertex::{FieldVertex, quad_indices};

const INDICES_PER_QUAD: u32 = 6;
const QUADS_PER_CARD: u32 = 3;
const MVP_SIZE: u64 = std::mem::size_of::<[f32; 16]>() as u64;

/// Index counts for one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCounts {
    pub background: u32,
    pub field: u32,
    pub misc: u32,
    pub cards: u32,
}

impl DrawCounts {
    /// Blocks of both sides, every marker slot, and every live card.
    pub fn for_scene(scene: &DuelScene) -> Self {
        Self {
            background: INDICES_PER_QUAD,
            field: (ZONE_BLOCKS * 2) as u32 * INDICES_PER_QUAD,
            misc: MISC_SLOTS as u32 * INDICES_PER_QUAD,
            cards: scene.card_count() as u32 * QUADS_PER_CARD * INDICES_PER_QUAD,
        }
    }
}

/// Indices for the card quads of `slots`, in the given order.
pub fn card_indices(slots: &[usize]) -> Vec<u16> {
    let quads = QUADS_PER_CARD as usize;
    slots
        .iter()
        .flat_map(|slot| slot * quads..(slot + 1) * quads)
        .flat_map(|q| {
            let b = (q * 4) as u16;
            [b, b + 2, b + 1, b + 1, b + 2, b + 3]
        })
        .collect()
}

// ── sheet textures ────────────────────────────────────────────────────────

#[derive(Default)]
struct SheetTexture {
    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    size: (u32, u32),
    /// Generation of the sheet image last uploaded; 0 forces an upload.
    uploaded: u64,
    bind_group: Option<wgpu::BindGroup>,
}

impl SheetTexture {
    fn recreate(&mut self, ctx: &RenderCtx<'_>, label: &str, width: u32, height: u32) {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.texture = Some(texture);
        self.size = (width, height);
        self.uploaded = 0;
        self.bind_group = None;
    }

    fn upload(&self, ctx: &RenderCtx<'_>, pixels: &[u8]) {
        let Some(texture) = self.texture.as_ref() else {
            return;
        };
        let (width, height) = self.size;
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}

// ── renderer ──────────────────────────────────────────────────────────────

/// Draws a [`DuelScene`].
///
/// GPU resources are created lazily on the first frame and rebuilt only when
/// their inputs change: pipelines on a surface format change, sheet textures
/// on a size change, vertex buffers on a region size change. Sheet pixels are
/// re-uploaded when the provider's generation counter moves; vertex data is
/// uploaded as the regions' dirty spans.
#[derive(Default)]
pub struct FieldRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    field_pipeline: Option<wgpu::RenderPipeline>,
    card_pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,

    identity_ubo: Option<wgpu::Buffer>,
    camera_ubo: Option<wgpu::Buffer>,

    sheets: [SheetTexture; 3],

    /// Background, field, cards, misc, in `SceneBuffers::regions_mut` order.
    vbos: [Option<(wgpu::Buffer, u64)>; 4],
    quad_ibo: Option<wgpu::Buffer>,
    card_ibo: Option<(wgpu::Buffer, usize)>,
}

impl FieldRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        scene: &mut DuelScene,
    ) {
        self.ensure_pipelines(ctx);
        self.ensure_sampler(ctx);
        self.ensure_uniforms(ctx);
        for kind in SheetKind::ALL {
            self.sync_sheet(ctx, kind, scene.assets());
        }
        self.ensure_bind_groups(ctx);
        self.ensure_geometry(ctx, scene.buffers_mut());
        self.upload_vertices(ctx, scene.buffers_mut());

        if let Some(ubo) = self.camera_ubo.as_ref() {
            let mvp = scene.camera().mvp().to_cols_array();
            ctx.queue.write_buffer(ubo, 0, bytemuck::cast_slice(&mvp));
        }
        let card_order = card_indices(&scene.card_draw_order());
        if let Some((ibo, _)) = self.card_ibo.as_ref()
            && !card_order.is_empty()
        {
            ctx.queue.write_buffer(ibo, 0, bytemuck::cast_slice(&card_order));
        }

        let counts = DrawCounts::for_scene(scene);

        let Some(field_pipeline) = self.field_pipeline.as_ref() else { return };
        let Some(card_pipeline) = self.card_pipeline.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };
        let Some((card_ibo, _)) = self.card_ibo.as_ref() else { return };
        let [Some((bg_vbo, _)), Some((field_vbo, _)), Some((card_vbo, _)), Some((misc_vbo, _))] =
            &self.vbos
        else {
            return;
        };
        let [Some(bg_group), Some(field_group), Some(card_group)] =
            self.sheets.each_ref().map(|s| s.bind_group.as_ref())
        else {
            return;
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("duel field pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        // Background: identity transform.
        rpass.set_pipeline(field_pipeline);
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.set_bind_group(0, bg_group, &[]);
        rpass.set_vertex_buffer(0, bg_vbo.slice(..));
        rpass.draw_indexed(0..counts.background, 0, 0..1);

        // Field blocks, then markers on top with the same sheet.
        rpass.set_bind_group(0, field_group, &[]);
        rpass.set_vertex_buffer(0, field_vbo.slice(..));
        rpass.draw_indexed(0..counts.field, 0, 0..1);
        rpass.set_vertex_buffer(0, misc_vbo.slice(..));
        rpass.draw_indexed(0..counts.misc, 0, 0..1);

        if counts.cards > 0 {
            rpass.set_pipeline(card_pipeline);
            rpass.set_bind_group(0, card_group, &[]);
            rpass.set_vertex_buffer(0, card_vbo.slice(..));
            rpass.set_index_buffer(card_ibo.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..counts.cards, 0, 0..1);
        }
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.field_pipeline.is_some() {
            return;
        }

        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("duel shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/duel.wgsl").into()),
            });

        let bgl = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("duel bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(MVP_SIZE),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
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
                label: Some("duel pipeline layout"),
                bind_group_layouts: &[&bgl],
                immediate_size: 0,
            });

        let build = |label: &str, cull_mode: Option<wgpu::Face>| {
            ctx.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        compilation_options: Default::default(),
                        buffers: &[FieldVertex::layout()],
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        compilation_options: Default::default(),
                        targets: &[Some(wgpu::ColorTargetState {
                            format: ctx.surface_format,
                            blend: Some(premul_alpha_blend()),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview_mask: None,
                    cache: None,
                })
        };

        // Blocks are mirrored for the far side, so the field pass draws both windings.
        self.field_pipeline = Some(build("duel field pipeline", None));
        self.card_pipeline = Some(build("duel card pipeline", Some(wgpu::Face::Back)));
        self.pipeline_format = Some(ctx.surface_format);
        self.bind_group_layout = Some(bgl);
        for sheet in &mut self.sheets {
            sheet.bind_group = None;
        }
        log::debug!("duel pipelines built for {:?}", ctx.surface_format);
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_some() {
            return;
        }
        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("duel sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
    }

    fn ensure_uniforms(&mut self, ctx: &RenderCtx<'_>) {
        if self.identity_ubo.is_some() && self.camera_ubo.is_some() {
            return;
        }
        let identity = glam::Mat4::IDENTITY.to_cols_array();
        self.identity_ubo = Some(ctx.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some("duel identity ubo"),
                contents: bytemuck::cast_slice(&identity),
                usage: wgpu::BufferUsages::UNIFORM,
            },
        ));
        self.camera_ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("duel camera ubo"),
            size: MVP_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        for sheet in &mut self.sheets {
            sheet.bind_group = None;
        }
    }

    /// Keeps the GPU copy of `kind` in step with the provider. A missing
    /// sheet is stood in for by a single white texel.
    fn sync_sheet(&mut self, ctx: &RenderCtx<'_>, kind: SheetKind, assets: &dyn AssetProvider) {
        let slot = &mut self.sheets[kind.index()];
        let label = format!("duel {kind:?} sheet");

        let Some(view) = assets.sheet(kind) else {
            if slot.texture.is_none() {
                slot.recreate(ctx, &label, 1, 1);
                slot.upload(ctx, &[255; 4]);
                slot.uploaded = u64::MAX;
            }
            return;
        };

        let size = view.image.dimensions();
        if slot.texture.is_none() || slot.size != size {
            log::debug!("creating {kind:?} sheet texture {}x{}", size.0, size.1);
            slot.recreate(ctx, &label, size.0, size.1);
        }
        if slot.uploaded != view.generation {
            slot.upload(ctx, view.image.as_raw());
            slot.uploaded = view.generation;
        }
    }

    fn ensure_bind_groups(&mut self, ctx: &RenderCtx<'_>) {
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };
        let Some(identity_ubo) = self.identity_ubo.as_ref() else { return };
        let Some(camera_ubo) = self.camera_ubo.as_ref() else { return };

        for kind in SheetKind::ALL {
            let sheet = &mut self.sheets[kind.index()];
            if sheet.bind_group.is_some() {
                continue;
            }
            let Some(view) = sheet.view.as_ref() else { continue };
            let ubo = match kind {
                SheetKind::Background => identity_ubo,
                SheetKind::Field | SheetKind::Card => camera_ubo,
            };
            sheet.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("duel bind group"),
                layout: bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: ubo.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            }));
        }
    }

    /// Sizes one vertex buffer per region and the two index buffers. A new
    /// buffer starts empty, so its region is marked dirty in full. The card
    /// index buffer is rewritten every frame in draw order.
    fn ensure_geometry(&mut self, ctx: &RenderCtx<'_>, buffers: &mut SceneBuffers) {
        for (slot, region) in self.vbos.iter_mut().zip(buffers.regions_mut()) {
            let size = region.byte_size();
            if matches!(slot, Some((_, s)) if *s == size) {
                continue;
            }
            *slot = Some((create_vbo(ctx, region), size));
            region.mark_all_dirty();
        }

        if self.quad_ibo.is_none() {
            let indices = quad_indices(FIELD_SLOTS.max(MISC_SLOTS));
            self.quad_ibo = Some(create_ibo(ctx, "duel quad ibo", &indices));
        }

        let card_slots = buffers.cards.slots();
        if !matches!(&self.card_ibo, Some((_, n)) if *n == card_slots) {
            let size = (card_slots * (QUADS_PER_CARD * INDICES_PER_QUAD) as usize
                * std::mem::size_of::<u16>()) as u64;
            let ibo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("duel card ibo"),
                size,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.card_ibo = Some((ibo, card_slots));
        }
    }

    fn upload_vertices(&mut self, ctx: &RenderCtx<'_>, buffers: &mut SceneBuffers) {
        for (slot, region) in self.vbos.iter().zip(buffers.regions_mut()) {
            let Some((vbo, _)) = slot else { continue };
            let label = region.label();
            if let Some((offset, bytes)) = region.take_dirty() {
                log::trace!("{label}: uploading {} bytes at {offset}", bytes.len());
                ctx.queue.write_buffer(vbo, offset, bytes);
            }
        }
    }
}

fn create_vbo(ctx: &RenderCtx<'_>, region: &VertexRegion) -> wgpu::Buffer {
    ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(region.label()),
        size: region.byte_size(),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_ibo(ctx: &RenderCtx<'_>, label: &str, indices: &[u16]) -> wgpu::Buffer {
    ctx.device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        })
}

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardKey, CardZone, Side};
    use crate::config::SceneConfig;
    use crate::layout::FieldLayout;
    use crate::testing::StubAssets;

    #[test]
    fn draw_counts_track_live_cards() {
        let mut scene = DuelScene::new(
            SceneConfig::default(),
            FieldLayout::default(),
            StubAssets::default(),
        );
        let counts = DrawCounts::for_scene(&scene);
        assert_eq!(counts.field, 34 * 6);
        assert_eq!(counts.cards, 0);

        let a = CardKey::new(Side::Near, CardZone::Monster, 0, 0);
        let b = CardKey::new(Side::Near, CardZone::Monster, 1, 0);
        scene.add_card(a, 1, 0.0).unwrap();
        scene.add_card(b, 2, 0.0).unwrap();
        scene.remove_card(&a).unwrap();
        assert_eq!(DrawCounts::for_scene(&scene).cards, 18);
        assert_eq!(
            card_indices(&scene.card_draw_order()).len() as u32,
            DrawCounts::for_scene(&scene).cards
        );
    }

    #[test]
    fn card_indices_follow_slot_order() {
        let indices = card_indices(&[2, 0]);
        assert_eq!(indices.len(), 36);
        // Slot 2 starts at vertex 24, slot 0 at vertex 0.
        assert_eq!(indices[..6], [24, 26, 25, 25, 26, 27]);
        assert_eq!(indices[18..24], [0, 2, 1, 1, 2, 3]);
        assert_eq!(card_indices(&[1]), quad_indices(6)[18..].to_vec());
    }

    #[test]
    fn highlight_pushes_alpha_toward_opaque() {
        let shader = include_str!("shaders/duel.wgsl");
        assert!(shader.contains("mix(texel.a, 1.0, in.hcolor.a)"));
    }

    #[test]
    fn index_buffers_cover_their_regions() {
        let buffers = SceneBuffers::new(4);
        let quads = quad_indices(FIELD_SLOTS.max(MISC_SLOTS));
        let max_quad = *quads.iter().max().unwrap() as usize;
        assert!(max_quad < buffers.field.vertices().len());

        let all: Vec<usize> = (0..buffers.cards.slots()).collect();
        let cards = card_indices(&all);
        assert_eq!(
            *cards.iter().max().unwrap() as usize + 1,
            buffers.cards.vertices().len()
        );
    }
}
