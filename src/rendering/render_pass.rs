use glam::Vec3;

pub fn clear_color(color: Vec3) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(color.x),
        g: f64::from(color.y),
        b: f64::from(color.z),
        a: 1.0,
    }
}

/// Starts the presentation pass, clearing the frame to `background` so the
/// premultiplied post output composites over it.
pub fn begin_post_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    texture_view: &'a wgpu::TextureView,
    background: Vec3,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Post Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: texture_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear_color(background)),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    })
}
