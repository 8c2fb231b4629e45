// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2026 Gridvec Contributors
// Part of Gridvec — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

#![cfg(feature = "wgpu")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use wgpu::util::DeviceExt;
use wgpu::{BindGroupLayout, Buffer, ComputePipeline, Device, PipelineLayout, Queue};

const GEMV_WGSL: &str = include_str!("../wgpu_shaders/dense_gemv.wgsl");
const GEVM_WGSL: &str = include_str!("../wgpu_shaders/dense_gevm.wgsl");
const AXPY_T_WGSL: &str = include_str!("../wgpu_shaders/dense_axpy_t.wgsl");

const WORKGROUP_SIZE: u32 = 64;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Blas2Params {
    rows: u32,
    cols: u32,
    alpha: f32,
    _pad: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Kernel {
    Gemv,
    Gevm,
    AxpyTranspose,
}

impl Kernel {
    fn source(self) -> &'static str {
        match self {
            Kernel::Gemv => GEMV_WGSL,
            Kernel::Gevm => GEVM_WGSL,
            Kernel::AxpyTranspose => AXPY_T_WGSL,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Kernel::Gemv => "gv.array.wgpu_dense.gemv",
            Kernel::Gevm => "gv.array.wgpu_dense.gevm",
            Kernel::AxpyTranspose => "gv.array.wgpu_dense.axpy_t",
        }
    }
}

struct DenseContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
    blas2_layout: BindGroupLayout,
    blas2_pipeline_layout: PipelineLayout,
    axpy_layout: BindGroupLayout,
    axpy_pipeline_layout: PipelineLayout,
    pipelines: Mutex<HashMap<Kernel, Arc<ComputePipeline>>>,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl DenseContext {
    fn new() -> Result<Self, String> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(async {
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
        })
        .ok_or_else(|| "no suitable WGPU adapter".to_string())?;

        let (device, queue) = pollster::block_on(async {
            adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: None,
                        required_features: wgpu::Features::empty(),
                        required_limits: adapter.limits(),
                    },
                    None,
                )
                .await
        })
        .map_err(|err| err.to_string())?;

        let device: Arc<Device> = Arc::new(device);
        let queue: Arc<Queue> = Arc::new(queue);

        let blas2_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gv.array.wgpu_dense.blas2_layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, false),
                uniform_entry(3),
            ],
        });
        let blas2_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("gv.array.wgpu_dense.blas2_pipeline_layout"),
                bind_group_layouts: &[&blas2_layout],
                push_constant_ranges: &[],
            });

        let axpy_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gv.array.wgpu_dense.axpy_layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, false),
                uniform_entry(2),
            ],
        });
        let axpy_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("gv.array.wgpu_dense.axpy_pipeline_layout"),
                bind_group_layouts: &[&axpy_layout],
                push_constant_ranges: &[],
            });

        Ok(Self {
            device,
            queue,
            blas2_layout,
            blas2_pipeline_layout,
            axpy_layout,
            axpy_pipeline_layout,
            pipelines: Mutex::new(HashMap::new()),
        })
    }

    fn pipeline(&self, kernel: Kernel) -> Arc<ComputePipeline> {
        let mut cache = self
            .pipelines
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        if let Some(pipeline) = cache.get(&kernel) {
            return Arc::clone(pipeline);
        }
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kernel.label()),
                source: wgpu::ShaderSource::Wgsl(kernel.source().into()),
            });
        let layout = match kernel {
            Kernel::Gemv | Kernel::Gevm => &self.blas2_pipeline_layout,
            Kernel::AxpyTranspose => &self.axpy_pipeline_layout,
        };
        let pipeline = Arc::new(self.device.create_compute_pipeline(
            &wgpu::ComputePipelineDescriptor {
                label: Some(kernel.label()),
                layout: Some(layout),
                module: &module,
                entry_point: "main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
        ));
        cache.insert(kernel, Arc::clone(&pipeline));
        pipeline
    }
}

fn context() -> Result<Arc<DenseContext>, String> {
    static CONTEXT: OnceLock<Result<Arc<DenseContext>, String>> = OnceLock::new();
    CONTEXT
        .get_or_init(|| DenseContext::new().map(Arc::new))
        .clone()
}

pub fn is_available() -> bool {
    context().is_ok()
}

pub fn should_use(rows: usize, cols: usize) -> bool {
    rows * cols >= 128 * 128
}

fn readback_f32(device: &Device, queue: &Queue, src: &Buffer, len: usize) -> Result<Vec<f32>, String> {
    let size_bytes = (len * std::mem::size_of::<f32>()) as u64;
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("gv.array.wgpu_dense.readback"),
        size: size_bytes,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("gv.array.wgpu_dense.readback_enc"),
    });
    encoder.copy_buffer_to_buffer(src, 0, &staging, 0, size_bytes);
    queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    receiver
        .recv()
        .map_err(|_| "map_async callback dropped".to_string())?
        .map_err(|err| err.to_string())?;

    let data = slice.get_mapped_range();
    let mut out = vec![0.0f32; len];
    out.copy_from_slice(bytemuck::cast_slice(&data));
    drop(data);
    staging.unmap();
    Ok(out)
}

fn run_blas2(
    kernel: Kernel,
    matrix: &[f32],
    input: &[f32],
    out_len: usize,
    params: Blas2Params,
    invocations: u32,
) -> Result<Vec<f32>, String> {
    let ctx = context()?;
    let pipeline = ctx.pipeline(kernel);

    let matrix_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gv.array.wgpu_dense.matrix"),
            contents: bytemuck::cast_slice(matrix),
            usage: wgpu::BufferUsages::STORAGE,
        });
    let input_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gv.array.wgpu_dense.input"),
            contents: bytemuck::cast_slice(input),
            usage: wgpu::BufferUsages::STORAGE,
        });
    let output_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("gv.array.wgpu_dense.output"),
        size: (out_len * std::mem::size_of::<f32>()) as u64,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        mapped_at_creation: false,
    });
    let params_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gv.array.wgpu_dense.params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("gv.array.wgpu_dense.blas2_bind"),
        layout: &ctx.blas2_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: matrix_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: input_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: output_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: params_buffer.as_entire_binding(),
            },
        ],
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("gv.array.wgpu_dense.blas2_enc"),
        });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(kernel.label()),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(invocations.div_ceil(WORKGROUP_SIZE), 1, 1);
    }
    ctx.queue.submit(Some(encoder.finish()));

    readback_f32(&ctx.device, &ctx.queue, &output_buffer, out_len)
}

/// `y = A * x` for a row-major `rows x cols` matrix.
pub fn gemv(lhs: &[f32], input: &[f32], rows: usize, cols: usize) -> Result<Vec<f32>, String> {
    if lhs.len() != rows * cols || input.len() != cols {
        return Err(format!(
            "gemv operand lengths ({}, {}) do not match a {rows} x {cols} matrix",
            lhs.len(),
            input.len()
        ));
    }
    let params = Blas2Params {
        rows: rows as u32,
        cols: cols as u32,
        alpha: 0.0,
        _pad: 0,
    };
    run_blas2(Kernel::Gemv, lhs, input, rows, params, rows as u32)
}

/// `y = B^T * x` for a row-major `rows x cols` matrix.
pub fn gevm(rhs: &[f32], input: &[f32], rows: usize, cols: usize) -> Result<Vec<f32>, String> {
    if rhs.len() != rows * cols || input.len() != rows {
        return Err(format!(
            "gevm operand lengths ({}, {}) do not match a {rows} x {cols} matrix",
            rhs.len(),
            input.len()
        ));
    }
    let params = Blas2Params {
        rows: rows as u32,
        cols: cols as u32,
        alpha: 0.0,
        _pad: 0,
    };
    run_blas2(Kernel::Gevm, rhs, input, cols, params, cols as u32)
}

/// Returns `dst + alpha * src^T`; `dst` is `rows x cols`, `src` is
/// `cols x rows`, both row-major.
pub fn axpy_transpose(
    dst: &[f32],
    src: &[f32],
    rows: usize,
    cols: usize,
    alpha: f32,
) -> Result<Vec<f32>, String> {
    let total = rows * cols;
    if dst.len() != total || src.len() != total {
        return Err(format!(
            "axpy operand lengths ({}, {}) do not match a {rows} x {cols} destination",
            dst.len(),
            src.len()
        ));
    }
    let ctx = context()?;
    let pipeline = ctx.pipeline(Kernel::AxpyTranspose);

    let src_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gv.array.wgpu_dense.axpy_src"),
            contents: bytemuck::cast_slice(src),
            usage: wgpu::BufferUsages::STORAGE,
        });
    let dst_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gv.array.wgpu_dense.axpy_dst"),
            contents: bytemuck::cast_slice(dst),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        });
    let params = Blas2Params {
        rows: rows as u32,
        cols: cols as u32,
        alpha,
        _pad: 0,
    };
    let params_buffer = ctx
        .device
        .create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gv.array.wgpu_dense.axpy_params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("gv.array.wgpu_dense.axpy_bind"),
        layout: &ctx.axpy_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: src_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: dst_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params_buffer.as_entire_binding(),
            },
        ],
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("gv.array.wgpu_dense.axpy_enc"),
        });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(Kernel::AxpyTranspose.label()),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups((total as u32).div_ceil(WORKGROUP_SIZE), 1, 1);
    }
    ctx.queue.submit(Some(encoder.finish()));

    readback_f32(&ctx.device, &ctx.queue, &dst_buffer, total)
}
