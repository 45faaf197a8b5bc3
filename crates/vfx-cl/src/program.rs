//! Program builder and embedded kernel sources.
//!
//! Each transfer strategy runs its own kernel. Kernels are shipped as
//! named, versioned [`KernelAsset`]s and compiled once per filter call.

use tracing::{debug, warn};

use crate::config::FilterConfig;
use crate::driver::Driver;
use crate::ClResult;

/// Entry point of the linear-buffer kernel.
pub const ENTRY_LINEAR: &str = "find_edge";

/// Entry point of the image-surface kernel.
pub const ENTRY_IMAGE: &str = "find_edge_image";

/// Embedded kernel program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelAsset {
    /// Asset name, used in logs.
    pub name: &'static str,
    /// Bumped whenever the source changes behavior.
    pub version: u32,
    /// Kernel function to extract after the build.
    pub entry: &'static str,
    /// OpenCL C source text.
    pub source: &'static str,
}

impl KernelAsset {
    /// `name@version` label.
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Flat byte buffers, one work-item per pixel, border pixels skipped.
pub const LINEAR_KERNEL: KernelAsset = KernelAsset {
    name: "sobel-linear",
    version: 2,
    entry: ENTRY_LINEAR,
    source: r#"
__kernel void find_edge(__global const uchar *in,
                        __global uchar *out,
                        const uint w,
                        const uint h)
{
    const uint id = get_global_id(0);
    if (id >= w * h) return;

    const int W = (int)w;
    const int H = (int)h;
    const int x = (int)(id % w);
    const int y = (int)(id / w);
    if (x == 0 || x == W - 1 || y == 0 || y == H - 1) return;

#define P(dx, dy) ((float)in[(y + (dy)) * W + (x + (dx))])
    const float gx = P(-1, -1) - P(1, -1) + 2.0f * P(-1, 0) - 2.0f * P(1, 0) + P(-1, 1) - P(1, 1);
    const float gy = P(-1, -1) + 2.0f * P(0, -1) + P(1, -1) - P(-1, 1) - 2.0f * P(0, 1) - P(1, 1);
#undef P

    out[id] = convert_uchar_sat(255.0f - ceil(sqrt(gx * gx + gy * gy)));
}
"#,
};

/// 2D UNORM8 surfaces, clamp-to-edge sampler, dimension 0 = rows.
pub const IMAGE_KERNEL: KernelAsset = KernelAsset {
    name: "sobel-image",
    version: 2,
    entry: ENTRY_IMAGE,
    source: r#"
__constant sampler_t edge_sampler =
    CLK_NORMALIZED_COORDS_FALSE | CLK_ADDRESS_CLAMP_TO_EDGE | CLK_FILTER_NEAREST;

__kernel void find_edge_image(__read_only image2d_t in, __write_only image2d_t out)
{
    const int y = get_global_id(0);
    const int x = get_global_id(1);
    if (x >= get_image_width(out) || y >= get_image_height(out)) return;

#define P(dx, dy) read_imagef(in, edge_sampler, (int2)(x + (dx), y + (dy))).x
    const float gx = P(-1, -1) - P(1, -1) + 2.0f * P(-1, 0) - 2.0f * P(1, 0) + P(-1, 1) - P(1, 1);
    const float gy = P(-1, -1) + 2.0f * P(0, -1) + P(1, -1) - P(-1, 1) - 2.0f * P(0, 1) - P(1, 1);
#undef P

    write_imagef(out, (int2)(x, y), (float4)(1.0f - sqrt(gx * gx + gy * gy), 0.0f, 0.0f, 1.0f));
}
"#,
};

/// Compile `asset` for `device`.
///
/// On failure the error carries the compiler log. On success the log is
/// emitted at debug level when `config.log_build_output` is set.
pub fn build<D: Driver>(
    driver: &D,
    context: &D::Context,
    device: &D::Device,
    asset: &KernelAsset,
    config: &FilterConfig,
) -> ClResult<D::Program> {
    debug!(asset = %asset.label(), options = %config.build_options, "building kernel program");
    let program = driver.build_program(context, device, asset.source, &config.build_options)?;

    if config.log_build_output {
        match driver.build_log(&program, device) {
            Ok(log) => debug!(asset = %asset.label(), "build log:\n{}", log.trim_end()),
            Err(e) => warn!(asset = %asset.label(), "build log unavailable: {}", e),
        }
    }
    Ok(program)
}

/// Extract the asset's entry point from a built program.
pub fn create_kernel<D: Driver>(driver: &D, program: &D::Program, asset: &KernelAsset) -> ClResult<D::Kernel> {
    debug!(entry = asset.entry, "creating kernel");
    driver.create_kernel(program, asset.entry)
}
