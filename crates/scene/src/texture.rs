//! Procedural RGBA8 textures.
//!
//! Generated on the CPU at startup; nothing is loaded from disk.

/// Row-major sRGB RGBA8 texels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureData {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    fn from_fn(name: &'static str, size: u32, texel: impl Fn(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                pixels.extend_from_slice(&texel(x, y));
            }
        }
        Self {
            name,
            width: size,
            height: size,
            pixels,
        }
    }

    /// Texel at `(x, y)`, or `None` outside the image.
    pub fn texel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = ((y * self.width + x) * 4) as usize;
        let texel = self.pixels.get(start..start + 4)?;
        texel.try_into().ok()
    }
}

/// `size` x `size` checkerboard of `cells` x `cells` squares, starting with
/// `a` in the top-left corner. `cells` is clamped to `1..=size`.
pub fn checker(name: &'static str, size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> TextureData {
    let size = size.max(1);
    let cell = size / cells.clamp(1, size);
    TextureData::from_fn(name, size, |x, y| {
        if ((x / cell) + (y / cell)).is_multiple_of(2) { a } else { b }
    })
}

/// `size` x `size` tile with a `line`-colored border `width` texels thick
/// and `fill` inside. Repeated, it draws a grid.
pub fn grid(name: &'static str, size: u32, width: u32, line: [u8; 4], fill: [u8; 4]) -> TextureData {
    let size = size.max(1);
    TextureData::from_fn(name, size, |x, y| {
        let edge = x < width || y < width || x >= size - width.min(size) || y >= size - width.min(size);
        if edge { line } else { fill }
    })
}

/// Index of the checker texture in [`demo_textures`].
pub const CHECKER: usize = 0;
/// Index of the grid texture in [`demo_textures`].
pub const GRID: usize = 1;

/// Textures the demo scene refers to by index.
pub fn demo_textures() -> Vec<TextureData> {
    vec![
        checker("checker", 64, 4, [255, 255, 255, 255], [190, 190, 190, 255]),
        grid("grid", 64, 2, [60, 60, 60, 255], [255, 255, 255, 255]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 4] = [255; 4];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    #[test]
    fn test_checker_alternates_cells() {
        let texture = checker("t", 8, 2, WHITE, BLACK);
        assert_eq!(texture.pixels.len(), 8 * 8 * 4);
        assert_eq!(texture.texel(0, 0), Some(WHITE));
        assert_eq!(texture.texel(3, 3), Some(WHITE));
        assert_eq!(texture.texel(4, 0), Some(BLACK));
        assert_eq!(texture.texel(0, 4), Some(BLACK));
        assert_eq!(texture.texel(7, 7), Some(WHITE));
    }

    #[test]
    fn test_checker_clamps_cell_count() {
        let texture = checker("t", 4, 0, WHITE, BLACK);
        assert!(texture.pixels.chunks_exact(4).all(|t| t == WHITE));

        let texture = checker("t", 4, 100, WHITE, BLACK);
        assert_eq!(texture.texel(1, 0), Some(BLACK));
    }

    #[test]
    fn test_grid_draws_border() {
        let texture = grid("t", 8, 1, BLACK, WHITE);
        assert_eq!(texture.texel(0, 3), Some(BLACK));
        assert_eq!(texture.texel(7, 3), Some(BLACK));
        assert_eq!(texture.texel(3, 7), Some(BLACK));
        assert_eq!(texture.texel(3, 3), Some(WHITE));
    }

    #[test]
    fn test_texel_out_of_bounds() {
        let texture = grid("t", 4, 1, BLACK, WHITE);
        assert_eq!(texture.texel(4, 0), None);
        assert_eq!(texture.texel(0, 4), None);
    }

    #[test]
    fn test_demo_texture_indices() {
        let textures = demo_textures();
        assert_eq!(textures[CHECKER].name, "checker");
        assert_eq!(textures[GRID].name, "grid");
        for texture in &textures {
            let len = (texture.width * texture.height * 4) as usize;
            assert_eq!(texture.pixels.len(), len);
        }
    }
}
