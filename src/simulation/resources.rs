use crate::config::Variant;
use crate::rendering::render_config::RenderConfig;
use crate::simulation::pingpong::PingPong;
use crate::simulation::types::{
    FluidUniforms, GpuConnection, GpuNode, MAX_CONNECTIONS, PostUniforms, SynapseUniforms,
};

/// Bytes of one color field slot (`vec4<f32>` per cell).
pub fn field_bytes(grid: u32) -> u64 {
    u64::from(grid) * u64::from(grid) * 16
}

// Variant-specific buffers bound at slots 1 and 2 of the compute kernel
pub enum AuxBuffers {
    Fluid {
        velocity: [wgpu::Buffer; 2], // Ping-pong, like the color field
    },
    Synapse {
        nodes: wgpu::Buffer,
        connections: wgpu::Buffer,
    },
}

// Bind groups that read one slot
pub struct SlotBindings {
    pub compute: wgpu::BindGroup,
    pub post: wgpu::BindGroup,
}

// GPU resources of the accelerated grid path
pub struct GridResources {
    pub uniform_buffer: wgpu::Buffer,
    pub post_uniform_buffer: wgpu::Buffer,
    pub fields: [wgpu::Buffer; 2],
    pub aux: AuxBuffers,
    pub bindings: PingPong<SlotBindings>,
}

fn create_storage_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_uniform_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl GridResources {
    /// Allocates zeroed slots for a `grid × grid` field.
    pub fn new(
        device: &wgpu::Device,
        render_config: &RenderConfig,
        variant: Variant,
        grid: u32,
        node_capacity: usize,
    ) -> Self {
        let cells = u64::from(grid) * u64::from(grid);
        let fields = [
            create_storage_buffer(device, "Color Field Buffer 0", field_bytes(grid)),
            create_storage_buffer(device, "Color Field Buffer 1", field_bytes(grid)),
        ];

        let (uniform_buffer, aux) = match variant {
            Variant::Fluid => (
                create_uniform_buffer(device, "Fluid Uniform Buffer", size_of::<FluidUniforms>()),
                AuxBuffers::Fluid {
                    velocity: [
                        create_storage_buffer(device, "Velocity Buffer 0", cells * 8),
                        create_storage_buffer(device, "Velocity Buffer 1", cells * 8),
                    ],
                },
            ),
            Variant::Synapse => (
                create_uniform_buffer(device, "Synapse Uniform Buffer", size_of::<SynapseUniforms>()),
                AuxBuffers::Synapse {
                    nodes: create_storage_buffer(
                        device,
                        "Node Buffer",
                        (node_capacity.max(1) * size_of::<GpuNode>()) as u64,
                    ),
                    connections: create_storage_buffer(
                        device,
                        "Connection Buffer",
                        (MAX_CONNECTIONS * size_of::<GpuConnection>()) as u64,
                    ),
                },
            ),
        };

        let post_uniform_buffer = create_uniform_buffer(device, "Post Uniform Buffer", size_of::<PostUniforms>());

        let aux_bindings = match &aux {
            AuxBuffers::Fluid { velocity } => {
                [[&velocity[0], &velocity[1]], [&velocity[1], &velocity[0]]]
            }
            AuxBuffers::Synapse { nodes, connections } => [[nodes, connections], [nodes, connections]],
        };

        let [compute0, compute1] =
            render_config.create_compute_bind_groups(device, &uniform_buffer, aux_bindings, &fields);
        let [post0, post1] = render_config.create_post_bind_groups(device, &post_uniform_buffer, &fields);

        Self {
            uniform_buffer,
            post_uniform_buffer,
            fields,
            aux,
            bindings: PingPong::new(
                SlotBindings {
                    compute: compute0,
                    post: post0,
                },
                SlotBindings {
                    compute: compute1,
                    post: post1,
                },
            ),
        }
    }

    pub fn update_fluid_uniforms(&self, queue: &wgpu::Queue, uniforms: &FluidUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Uploads the synapse uniforms and node data. Connections beyond the
    /// buffer capacity are dropped.
    pub fn update_synapse(
        &self,
        queue: &wgpu::Queue,
        uniforms: &SynapseUniforms,
        nodes: &[GpuNode],
        connections: &[GpuConnection],
    ) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
        if let AuxBuffers::Synapse {
            nodes: node_buffer,
            connections: connection_buffer,
        } = &self.aux
        {
            let node_capacity = (node_buffer.size() / size_of::<GpuNode>() as u64) as usize;
            let nodes = &nodes[..nodes.len().min(node_capacity)];
            let connections = &connections[..connections.len().min(MAX_CONNECTIONS)];
            if !nodes.is_empty() {
                queue.write_buffer(node_buffer, 0, bytemuck::cast_slice(nodes));
            }
            if !connections.is_empty() {
                queue.write_buffer(connection_buffer, 0, bytemuck::cast_slice(connections));
            }
        }
    }

    pub fn update_post_uniforms(&self, queue: &wgpu::Queue, uniforms: &PostUniforms) {
        queue.write_buffer(&self.post_uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Bindings reading the latest result.
    pub fn current(&self) -> &SlotBindings {
        self.bindings.current()
    }

    pub fn swap_buffers(&mut self) {
        // Swap buffers for ping-pong computation
        self.bindings.swap();
    }
}
