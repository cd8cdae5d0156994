use bytemuck::{Pod, Zeroable};

/// World extent of the equirectangular projection, in degrees.
const WORLD_WIDTH: f32 = 360.0;
const WORLD_HEIGHT: f32 = 180.0;

/// View uniform (16 bytes).
///
///  offset 0  scale  [f32; 2]  degrees -> NDC
///  offset 8  pixel  [f32; 2]  logical px -> NDC
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ViewUniform {
    pub scale: [f32; 2],
    pub pixel: [f32; 2],
}

/// Equirectangular lon/lat view fitting the whole world into the surface.
///
/// The world is centered and letterboxed so that one degree covers the same
/// number of pixels horizontally and vertically.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapView {
    width: f32,
    height: f32,
    scale_factor: f32,
}

impl MapView {
    /// `width`/`height` in physical pixels.
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        let mut view = Self { width: 1.0, height: 1.0, scale_factor: 1.0 };
        view.resize(width, height, scale_factor);
        view
    }

    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        self.width = width.max(1) as f32;
        self.height = height.max(1) as f32;
        self.scale_factor = if scale_factor > 0.0 { scale_factor as f32 } else { 1.0 };
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    /// Degrees to NDC.
    pub fn scale(&self) -> [f32; 2] {
        let aspect = self.width / self.height;
        let world_aspect = WORLD_WIDTH / WORLD_HEIGHT;

        if aspect >= world_aspect {
            // wider than the world: fit height
            let sy = 2.0 / WORLD_HEIGHT;
            [sy / aspect, sy]
        } else {
            let sx = 2.0 / WORLD_WIDTH;
            [sx, sx * aspect]
        }
    }

    pub fn project(&self, lon: f32, lat: f32) -> [f32; 2] {
        let [sx, sy] = self.scale();
        [lon * sx, lat * sy]
    }

    pub fn uniform(&self) -> ViewUniform {
        ViewUniform {
            scale: self.scale(),
            pixel: [
                2.0 * self.scale_factor / self.width,
                2.0 * self.scale_factor / self.height,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-5 && (a[1] - b[1]).abs() < 1e-5
    }

    #[test]
    fn exact_world_aspect_fills_the_surface() {
        let view = MapView::new(720, 360, 1.0);
        assert!(close(view.project(180.0, 90.0), [1.0, 1.0]));
        assert!(close(view.project(-180.0, -90.0), [-1.0, -1.0]));
        assert!(close(view.project(0.0, 0.0), [0.0, 0.0]));
    }

    #[test]
    fn wide_surface_letterboxes_horizontally() {
        let view = MapView::new(2000, 500, 1.0);
        assert!(close(view.project(180.0, 90.0), [0.5, 1.0]));
    }

    #[test]
    fn tall_surface_letterboxes_vertically() {
        let view = MapView::new(800, 800, 1.0);
        assert!(close(view.project(180.0, 90.0), [1.0, 0.5]));
    }

    #[test]
    fn degrees_stay_square_in_pixels() {
        for (w, h) in [(1280, 720), (640, 1024), (3000, 400)] {
            let view = MapView::new(w, h, 1.0);
            let [sx, sy] = view.scale();
            let px_per_deg_x = sx * w as f32 / 2.0;
            let px_per_deg_y = sy * h as f32 / 2.0;
            assert!((px_per_deg_x - px_per_deg_y).abs() < 1e-3, "{w}x{h}");
        }
    }

    #[test]
    fn zero_size_is_clamped() {
        let view = MapView::new(0, 0, 0.0);
        assert_eq!(view.size(), (1, 1));
        let u = view.uniform();
        assert!(u.scale.iter().chain(u.pixel.iter()).all(|v| v.is_finite()));
    }

    #[test]
    fn pixel_scale_follows_scale_factor() {
        let view = MapView::new(1000, 500, 2.0);
        assert!(close(view.uniform().pixel, [0.004, 0.008]));
    }
}
