use media::MediaFrame;

/// One GPU texture per unique media id, sized to the decoded stream and
/// rewritten in place each frame while its stream plays.
pub(crate) struct MediaTexture {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    width: u32,
    height: u32,
    last_uploaded: Option<u64>,
}

impl MediaTexture {
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
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
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
            last_uploaded: None,
        }
    }

    /// Uploads `frame` unless `frame_key` matches the previous upload, so a
    /// paused stream costs nothing per frame.
    pub fn upload(&mut self, queue: &wgpu::Queue, frame: &MediaFrame, frame_key: u64) {
        if self.last_uploaded == Some(frame_key) {
            return;
        }
        if frame.width != self.width || frame.height != self.height {
            tracing::warn!(
                expected = format!("{}x{}", self.width, self.height),
                actual = format!("{}x{}", frame.width, frame.height),
                "media frame size changed mid-stream; skipping upload"
            );
            return;
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(frame.width * 4),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
        self.last_uploaded = Some(frame_key);
    }
}

/// 1x1 dark placeholder bound wherever a stream has not produced a frame
/// yet, so unready media renders as a blank slab instead of failing.
pub(crate) fn placeholder_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> MediaTexture {
    let mut texture = MediaTexture::new(device, "placeholder media texture", 1, 1);
    texture.upload(
        queue,
        &MediaFrame {
            width: 1,
            height: 1,
            rgba: vec![18, 18, 22, 255],
        },
        u64::MAX,
    );
    texture
}
