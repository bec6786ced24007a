use crate::config::Variant;

fn storage_entry(binding: u32, read_only: bool, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

// Pipelines and layouts for one variant: a compute step over the grid and a
// full-screen presentation pass reading its color field
pub struct RenderConfig {
    pub surface_format: wgpu::TextureFormat,
    pub compute_pipeline: wgpu::ComputePipeline,
    pub compute_layout: wgpu::BindGroupLayout,
    pub post_pipeline: wgpu::RenderPipeline,
    pub post_layout: wgpu::BindGroupLayout,
}

impl RenderConfig {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, variant: Variant) -> Self {
        let (label, source) = match variant {
            Variant::Fluid => ("Fluid Compute Shader", include_str!("shaders/fluid_compute.wgsl")),
            Variant::Synapse => ("Synapse Compute Shader", include_str!("shaders/synapse_compute.wgsl")),
        };
        let compute_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let post_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/post.wgsl").into()),
        });

        // Binding 2 is the velocity output for the fluid and the connection list
        // for the synapse kernel
        let compute = wgpu::ShaderStages::COMPUTE;
        let compute_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Grid Compute Bind Group Layout"),
            entries: &[
                uniform_entry(0, compute),
                storage_entry(1, true, compute),
                storage_entry(2, variant == Variant::Synapse, compute),
                storage_entry(3, true, compute),
                storage_entry(4, false, compute),
            ],
        });

        let post_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                storage_entry(1, true, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let compute_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Grid Compute Pipeline Layout"),
            bind_group_layouts: &[&compute_layout],
            push_constant_ranges: &[],
        });

        let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Grid Compute Pipeline"),
            layout: Some(&compute_pipeline_layout),
            module: &compute_module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let post_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&post_layout],
            push_constant_ranges: &[],
        });

        let post_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Post Render Pipeline"),
            layout: Some(&post_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &post_module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &post_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            surface_format,
            compute_pipeline,
            compute_layout,
            post_pipeline,
            post_layout,
        }
    }

    /// Compute bind groups; group `i` reads slot `i` and writes slot `1 - i`.
    ///
    /// `aux` are bindings 1 and 2 for each direction: velocity in/out for the
    /// fluid, nodes and connections (same for both) for the synapse kernel.
    pub fn create_compute_bind_groups(
        &self,
        device: &wgpu::Device,
        uniforms: &wgpu::Buffer,
        aux: [[&wgpu::Buffer; 2]; 2],
        fields: &[wgpu::Buffer; 2],
    ) -> [wgpu::BindGroup; 2] {
        [0usize, 1].map(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(if i == 0 { "Grid Compute Bind Group 0" } else { "Grid Compute Bind Group 1" }),
                layout: &self.compute_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: aux[i][0].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: aux[i][1].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: fields[i].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: fields[1 - i].as_entire_binding(),
                    },
                ],
            })
        })
    }

    /// Post bind groups; group `i` presents slot `i`.
    pub fn create_post_bind_groups(
        &self,
        device: &wgpu::Device,
        uniforms: &wgpu::Buffer,
        fields: &[wgpu::Buffer; 2],
    ) -> [wgpu::BindGroup; 2] {
        [0usize, 1].map(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(if i == 0 { "Post Bind Group 0" } else { "Post Bind Group 1" }),
                layout: &self.post_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: fields[i].as_entire_binding(),
                    },
                ],
            })
        })
    }
}
