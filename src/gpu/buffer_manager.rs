//! Buffer Manager - grow-or-overwrite GPU buffers
use wgpu::{Buffer, BufferUsages, Device, Queue};

/// How an upload of `len` bytes lands in a buffer of `capacity` bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPlan {
    Skip,
    /// Reallocate to the new capacity and write everything
    Grow(u64),
    /// Sub-update starting at offset 0
    Overwrite,
}

pub fn plan_upload(capacity: u64, len: usize) -> UploadPlan {
    let len = aligned_len(len);
    if len == 0 {
        UploadPlan::Skip
    } else if len > capacity {
        UploadPlan::Grow(len)
    } else {
        UploadPlan::Overwrite
    }
}

/// Byte length rounded up to `wgpu::COPY_BUFFER_ALIGNMENT`
pub fn aligned_len(len: usize) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    (len as u64 + align - 1) / align * align
}

/// A wgpu buffer that grows when an upload exceeds its capacity
pub struct GpuBuffer {
    label: &'static str,
    usage: BufferUsages,
    buffer: Option<Buffer>,
    capacity: u64,
    min_capacity: u64,
}

impl GpuBuffer {
    pub fn new(label: &'static str, usage: BufferUsages) -> Self {
        Self {
            label,
            usage: usage | BufferUsages::COPY_DST,
            buffer: None,
            capacity: 0,
            min_capacity: 0,
        }
    }

    /// Fixed-size buffers (uniform tables) are allocated at this size up
    /// front so bind groups over them stay valid.
    pub fn with_min_capacity(mut self, device: &Device, min_capacity: u64) -> Self {
        self.min_capacity = aligned_len(min_capacity as usize);
        self.allocate(device, self.min_capacity);
        self
    }

    /// Upload `bytes`. Returns true when the underlying buffer was replaced.
    pub fn upload(&mut self, device: &Device, queue: &Queue, bytes: &[u8]) -> bool {
        let plan = plan_upload(self.capacity, bytes.len());
        let grew = match plan {
            UploadPlan::Skip => return false,
            UploadPlan::Grow(size) => {
                self.allocate(device, size.max(self.min_capacity));
                true
            }
            UploadPlan::Overwrite => false,
        };
        if let Some(buffer) = &self.buffer {
            if bytes.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0 {
                queue.write_buffer(buffer, 0, bytes);
            } else {
                let mut padded = bytes.to_vec();
                padded.resize(aligned_len(bytes.len()) as usize, 0);
                queue.write_buffer(buffer, 0, &padded);
            }
        }
        grew
    }

    fn allocate(&mut self, device: &Device, size: u64) {
        log::trace!(
            "[GpuBuffer::allocate] {} {} -> {} bytes",
            self.label,
            self.capacity,
            size
        );
        self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size,
            usage: self.usage,
            mapped_at_creation: false,
        }));
        self.capacity = size;
    }

    pub fn buffer(&self) -> Option<&Buffer> {
        self.buffer.as_ref()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}
