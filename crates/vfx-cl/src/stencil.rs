//! Reference 3x3 gradient stencil.
//!
//! Host-side evaluation of the math the device kernels run. The host
//! driver executes kernels through these functions and tests use
//! [`reference`] as the expected output of a full filter call.

use crate::TransferMode;

/// Horizontal and vertical gradient at a pixel.
///
/// `n(dx, dy)` returns the neighbor at offset `(dx, dy)`.
#[inline]
pub fn gradient<F: Fn(isize, isize) -> f32>(n: F) -> (f32, f32) {
    let gx = n(-1, -1) - n(1, -1) + 2.0 * n(-1, 0) - 2.0 * n(1, 0) + n(-1, 1) - n(1, 1);
    let gy = n(-1, -1) + 2.0 * n(0, -1) + n(1, -1) - n(-1, 1) - 2.0 * n(0, 1) - n(1, 1);
    (gx, gy)
}

/// Gradient magnitude.
#[inline]
pub fn magnitude(gx: f32, gy: f32) -> f32 {
    (gx * gx + gy * gy).sqrt()
}

/// Linear-buffer output byte: `255 - ceil(magnitude)`, saturated.
#[inline]
pub fn invert_linear(magnitude: f32) -> u8 {
    (255.0 - magnitude.ceil()).clamp(0.0, 255.0) as u8
}

/// Image-surface output byte: `1.0 - magnitude` in normalized space,
/// converted the way a UNORM8 surface write converts it.
#[inline]
pub fn invert_normalized(magnitude: f32) -> u8 {
    unorm8(1.0 - magnitude)
}

/// Float to UNORM8 conversion (clamp, scale, round half to even).
#[inline]
pub fn unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round_ties_even() as u8
}

/// Clamp-to-edge sample of a normalized single-channel surface.
#[inline]
pub fn sample_clamped(data: &[u8], width: usize, height: usize, x: isize, y: isize) -> f32 {
    let cx = x.clamp(0, width as isize - 1) as usize;
    let cy = y.clamp(0, height as isize - 1) as usize;
    data[cy * width + cx] as f32 / 255.0
}

/// Whether `(x, y)` lies on the outermost ring of the image.
#[inline]
pub fn is_border(x: usize, y: usize, width: usize, height: usize) -> bool {
    x == 0 || x == width - 1 || y == 0 || y == height - 1
}

/// Linear-buffer value at `(x, y)`; caller guarantees an interior pixel.
pub fn linear_at(data: &[u8], width: usize, x: usize, y: usize) -> u8 {
    let (gx, gy) = gradient(|dx, dy| {
        let sx = (x as isize + dx) as usize;
        let sy = (y as isize + dy) as usize;
        data[sy * width + sx] as f32
    });
    invert_linear(magnitude(gx, gy))
}

/// Image-surface value at `(x, y)` with clamp-to-edge neighbors.
pub fn clamped_at(data: &[u8], width: usize, height: usize, x: usize, y: usize) -> u8 {
    let (gx, gy) = gradient(|dx, dy| {
        sample_clamped(data, width, height, x as isize + dx, y as isize + dy)
    });
    invert_normalized(magnitude(gx, gy))
}

/// Expected output of one filter call for `mode`.
///
/// Pixels outside the mode's work partition carry the input value.
pub fn reference(input: &[u8], width: usize, height: usize, mode: TransferMode) -> Vec<u8> {
    let mut out = input.to_vec();
    match mode {
        TransferMode::LinearBuffer => {
            for y in 1..height - 1 {
                for x in 1..width - 1 {
                    out[y * width + x] = linear_at(input, width, x, y);
                }
            }
        }
        TransferMode::ClampedImage => {
            for y in 1..height {
                for x in 1..width {
                    out[y * width + x] = clamped_at(input, width, height, x, y);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gradient_flat() {
        let (gx, gy) = gradient(|_, _| 0.75);
        assert_abs_diff_eq!(gx, 0.0);
        assert_abs_diff_eq!(gy, 0.0);
    }

    #[test]
    fn test_gradient_vertical_step() {
        // Left column 0, right column 1
        let (gx, gy) = gradient(|dx, _| if dx > 0 { 1.0 } else { 0.0 });
        assert_abs_diff_eq!(gx, -4.0);
        assert_abs_diff_eq!(gy, 0.0);
    }

    #[test]
    fn test_gradient_horizontal_step() {
        // Top row bright
        let (gx, gy) = gradient(|_, dy| if dy < 0 { 1.0 } else { 0.0 });
        assert_abs_diff_eq!(gx, 0.0);
        assert_abs_diff_eq!(gy, 4.0);
    }

    #[test]
    fn test_invert_linear_saturates() {
        assert_eq!(invert_linear(0.0), 255);
        assert_eq!(invert_linear(0.2), 254);
        assert_eq!(invert_linear(1020.0), 0);
    }

    #[test]
    fn test_invert_normalized() {
        assert_eq!(invert_normalized(0.0), 255);
        assert_eq!(invert_normalized(4.0), 0);
        assert_eq!(invert_normalized(0.5), 128);
    }

    #[test]
    fn test_sample_clamped_edges() {
        let data = [0u8, 51, 102, 153, 204, 255];
        // 3x2 surface
        assert_abs_diff_eq!(sample_clamped(&data, 3, 2, -4, 0), 0.0);
        assert_abs_diff_eq!(sample_clamped(&data, 3, 2, 5, 0), 0.4);
        assert_abs_diff_eq!(sample_clamped(&data, 3, 2, 2, 9), 1.0);
    }

    #[test]
    fn test_reference_flat() {
        let input = vec![90u8; 5 * 4];
        let lin = reference(&input, 5, 4, TransferMode::LinearBuffer);
        assert_eq!(lin[1 * 5 + 1], 255);
        assert_eq!(lin[0], 90);
        let img = reference(&input, 5, 4, TransferMode::ClampedImage);
        assert_eq!(img[3 * 5 + 4], 255);
        assert_eq!(img[0], 90);
    }
}
