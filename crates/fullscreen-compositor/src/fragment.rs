//! Host-side mirrors of the fragment entry points
//!
//! Both functions are pure: the same window-space position (and image) always yields the same
//! color. They define the expected GPU output for tests and for the verification crate.

use crate::descriptor::EdgePolicy;

/// Blue channel written by the debug gradient
pub const DEBUG_GRADIENT_BLUE: f32 = 0.1;

/// Mirror of `frag_debug`: window-space x and y passed through unnormalized
pub fn debug_gradient(position: [f32; 4]) -> [f32; 4] {
    [position[0], position[1], DEBUG_GRADIENT_BLUE, 1.0]
}

/// Resolves an integer source coordinate against the image bounds
///
/// Returns `None` when the policy maps the coordinate outside the image.
pub fn resolve_texel(coord: (i64, i64), dimensions: (u32, u32), edge_policy: EdgePolicy) -> Option<(u32, u32)> {
    let (width, height) = (dimensions.0 as i64, dimensions.1 as i64);
    if width == 0 || height == 0 {
        return None;
    }

    match edge_policy {
        EdgePolicy::Clamp => Some((coord.0.clamp(0, width - 1) as u32, coord.1.clamp(0, height - 1) as u32)),
        EdgePolicy::Repeat => Some((coord.0.rem_euclid(width) as u32, coord.1.rem_euclid(height) as u32)),
        EdgePolicy::Transparent => {
            if (0..width).contains(&coord.0) && (0..height).contains(&coord.1) {
                Some((coord.0 as u32, coord.1 as u32))
            } else {
                None
            }
        }
    }
}

/// Mirror of `frag_main`: the source texel at floor(position.xy)
pub fn passthrough(image: &image::Rgba32FImage, position: [f32; 4], edge_policy: EdgePolicy) -> [f32; 4] {
    let coord = (position[0].floor() as i64, position[1].floor() as i64);
    match resolve_texel(coord, image.dimensions(), edge_policy) {
        Some((x, y)) => image.get_pixel(x, y).0,
        None => [0.0; 4],
    }
}

/// Window-space position of the center of pixel (x, y), as rasterization reports it
pub fn pixel_center(x: u32, y: u32) -> [f32; 4] {
    [x as f32 + 0.5, y as f32 + 0.5, 0.0, 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_image() -> image::Rgba32FImage {
        image::Rgba32FImage::from_fn(3, 2, |x, y| image::Rgba([x as f32, y as f32, 0.5, 1.0]))
    }

    #[test]
    fn test_debug_gradient_channels() {
        for position in [[0.5, 0.5, 0.0, 1.0], [1919.5, 1079.5, 0.0, 1.0], [12.25, 3.75, 0.3, 1.0]] {
            let color = debug_gradient(position);
            assert_eq!(color[0], position[0]);
            assert_eq!(color[1], position[1]);
            assert_eq!(color[2], 0.1);
            assert_eq!(color[3], 1.0);
            assert_eq!(color, debug_gradient(position));
        }
    }

    #[test]
    fn test_passthrough_identity_in_bounds() {
        let image = checker_image();
        for y in 0..image.height() {
            for x in 0..image.width() {
                assert_eq!(passthrough(&image, pixel_center(x, y), EdgePolicy::Clamp), image.get_pixel(x, y).0);
            }
        }
    }

    #[test]
    fn test_clamp_policy() {
        assert_eq!(resolve_texel((-4, 1), (3, 2), EdgePolicy::Clamp), Some((0, 1)));
        assert_eq!(resolve_texel((7, 9), (3, 2), EdgePolicy::Clamp), Some((2, 1)));
    }

    #[test]
    fn test_repeat_policy() {
        assert_eq!(resolve_texel((3, 2), (3, 2), EdgePolicy::Repeat), Some((0, 0)));
        assert_eq!(resolve_texel((-1, -1), (3, 2), EdgePolicy::Repeat), Some((2, 1)));
        assert_eq!(resolve_texel((7, 5), (3, 2), EdgePolicy::Repeat), Some((1, 1)));
    }

    #[test]
    fn test_transparent_policy() {
        let image = checker_image();
        assert_eq!(resolve_texel((3, 0), (3, 2), EdgePolicy::Transparent), None);
        assert_eq!(passthrough(&image, pixel_center(5, 0), EdgePolicy::Transparent), [0.0; 4]);
        assert_eq!(passthrough(&image, pixel_center(1, 1), EdgePolicy::Transparent), [1.0, 1.0, 0.5, 1.0]);
    }

    #[test]
    fn test_empty_image_resolves_nothing() {
        assert_eq!(resolve_texel((0, 0), (0, 4), EdgePolicy::Clamp), None);
    }
}
