/// ASCII rasterizer for terminal rendering of engine parts
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Vector3};
use rotary_core::{Camera, Mesh, Triangle};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Z-buffered renderer that converts world-space meshes to terminal cells
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
}

/// Per-frame projection state shared by every mesh drawn in that frame
pub struct Frame {
    view_projection: Matrix4<f32>,
    toward_camera: Vector3<f32>,
}

impl Frame {
    pub fn new(camera: &Camera) -> Self {
        Self {
            view_projection: camera.view_projection(),
            toward_camera: (camera.position() - camera.target)
                .try_normalize(1e-6)
                .unwrap_or_else(Vector3::z),
        }
    }
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::Reset; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::Reset);
    }

    /// Character stored at a cell, for inspection
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    pub fn render_mesh(&mut self, mesh: &Mesh, frame: &Frame, tint: Color) {
        for triangle in &mesh.triangles {
            self.render_triangle(triangle, frame, tint);
        }
    }

    fn render_triangle(&mut self, triangle: &Triangle, frame: &Frame, tint: Color) {
        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match Camera::project_to_screen(
                &frame.view_projection,
                &vertex.position,
                self.width as u32,
                self.height as u32,
            ) {
                Some(coords) => *slot = coords,
                None => return, // Triangle is clipped
            }
        }

        let Some(normal) = triangle.face_normal() else {
            return;
        };
        // Two-sided lighting from the viewer's direction
        let brightness = normal.dot(&frame.toward_camera).abs();

        // Map brightness to character, keeping lit faces visible
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];

        self.rasterize_triangle(&screen_coords, character, tint);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, tint: Color) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                    self.color_buffer[idx] = tint;
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = Color::Reset;
        writer.queue(ResetColor)?;
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = self.color_buffer[idx];
                if color != current {
                    writer.queue(SetForegroundColor(color))?;
                    current = color;
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn camera_on(mesh: &Mesh, width: u32, height: u32) -> Camera {
        let mut camera = Camera::new(width, height);
        camera.fit(&mesh.bounds().unwrap());
        camera
    }

    #[test]
    fn test_barycentric_inside_and_degenerate() {
        let (w0, w1, w2) =
            barycentric((0.0, 0.0), (4.0, 0.0), (0.0, 4.0), (1.0, 1.0)).unwrap();
        assert!(w0 > 0.0 && w1 > 0.0 && w2 > 0.0);
        assert!((w0 + w1 + w2 - 1.0).abs() < 1e-6);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 0.0)).is_none());
    }

    #[test]
    fn test_mesh_fills_center() {
        let mesh = Mesh::cuboid(Vector3::new(1.0, 1.0, 1.0), Point3::origin());
        let camera = camera_on(&mesh, 40, 20);
        let mut renderer = AsciiRenderer::new(40, 20);

        renderer.render_mesh(&mesh, &Frame::new(&camera), Color::Cyan);
        assert_ne!(renderer.cell(20, 10), Some(' '));
        assert_eq!(renderer.cell(40, 10), None);

        renderer.clear();
        assert_eq!(renderer.cell(20, 10), Some(' '));
    }

    #[test]
    fn test_draw_emits_every_cell() {
        let renderer = AsciiRenderer::new(4, 2);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("    \r\n    "));
    }
}
