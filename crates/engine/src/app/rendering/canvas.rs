/// Mutable RGBA8 frame with clipped drawing primitives. Every write outside the
/// frame is dropped silently.
pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl ScreenRect {
    pub(crate) fn centered(cx: i32, cy: i32, width: i32, height: i32) -> Self {
        Self {
            left: cx - width / 2,
            top: cy - height / 2,
            width,
            height,
        }
    }

    pub(crate) fn grow(self, by: i32) -> Self {
        Self {
            left: self.left - by,
            top: self.top - by,
            width: self.width + by * 2,
            height: self.height + by * 2,
        }
    }
}

/// Decoded RGBA image, row-major.
pub(crate) struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Writes one pixel; partially transparent colors are blended over the frame.
    pub(crate) fn put(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let Some(offset) = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
            .and_then(|pixel| pixel.checked_mul(4))
        else {
            return;
        };
        let Some(dst) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };
        match color[3] {
            0 => {}
            255 => dst.copy_from_slice(&color),
            alpha => {
                let a = alpha as u16;
                for channel in 0..3 {
                    let blended = (color[channel] as u16 * a + dst[channel] as u16 * (255 - a)) / 255;
                    dst[channel] = blended as u8;
                }
                dst[3] = 255;
            }
        }
    }

    pub(crate) fn fill_rect(&mut self, rect: ScreenRect, color: [u8; 4]) {
        let start_x = rect.left.max(0);
        let start_y = rect.top.max(0);
        let end_x = (rect.left + rect.width).min(self.width as i32);
        let end_y = (rect.top + rect.height).min(self.height as i32);
        for y in start_y..end_y {
            for x in start_x..end_x {
                self.put(x, y, color);
            }
        }
    }

    pub(crate) fn outline_rect(&mut self, rect: ScreenRect, thickness: i32, color: [u8; 4]) {
        if rect.width <= 0 || rect.height <= 0 {
            return;
        }
        let t = thickness.max(1).min(rect.width).min(rect.height);
        let right = rect.left + rect.width - t;
        let bottom = rect.top + rect.height - t;
        self.fill_rect(ScreenRect { height: t, ..rect }, color);
        self.fill_rect(
            ScreenRect {
                top: bottom,
                height: t,
                ..rect
            },
            color,
        );
        self.fill_rect(ScreenRect { width: t, ..rect }, color);
        self.fill_rect(
            ScreenRect {
                left: right,
                width: t,
                ..rect
            },
            color,
        );
    }

    pub(crate) fn fill_circle(&mut self, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= r2 {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    pub(crate) fn ring(&mut self, cx: i32, cy: i32, radius: i32, color: [u8; 4]) {
        let outer = radius * radius;
        let inner = (radius - 2).max(0).pow(2);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d2 = dx * dx + dy * dy;
                if d2 <= outer && d2 > inner {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Copies the `cell` region of `bitmap` scaled into `dest`, nearest neighbour.
    pub(crate) fn blit_region(&mut self, bitmap: &Bitmap, cell: ScreenRect, dest: ScreenRect) {
        if cell.width <= 0 || cell.height <= 0 || dest.width <= 0 || dest.height <= 0 {
            return;
        }
        let expected = bitmap.width as usize * bitmap.height as usize * 4;
        if bitmap.rgba.len() < expected {
            return;
        }
        for oy in 0..dest.height {
            let sy = cell.top + oy * cell.height / dest.height;
            if sy < 0 || sy >= bitmap.height as i32 {
                continue;
            }
            for ox in 0..dest.width {
                let sx = cell.left + ox * cell.width / dest.width;
                if sx < 0 || sx >= bitmap.width as i32 {
                    continue;
                }
                let src = (sy as usize * bitmap.width as usize + sx as usize) * 4;
                let color = [
                    bitmap.rgba[src],
                    bitmap.rgba[src + 1],
                    bitmap.rgba[src + 2],
                    bitmap.rgba[src + 3],
                ];
                self.put(dest.left + ox, dest.top + oy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &[u8], width: u32, x: usize, y: usize) -> [u8; 4] {
        let offset = (y * width as usize + x) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn fill_rect_clips_to_frame() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        let mut canvas = Canvas::new(&mut frame, 8, 8);
        canvas.fill_rect(
            ScreenRect {
                left: -4,
                top: 6,
                width: 6,
                height: 10,
            },
            [255, 0, 0, 255],
        );
        assert_eq!(pixel(&frame, 8, 0, 7), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 8, 1, 6), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 8, 2, 6), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 8, 0, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn zero_sized_canvas_ignores_drawing() {
        let mut frame = Vec::new();
        let mut canvas = Canvas::new(&mut frame, 0, 0);
        canvas.fill_circle(0, 0, 5, [1, 2, 3, 255]);
        canvas.outline_rect(ScreenRect::centered(0, 0, 4, 4), 1, [1, 2, 3, 255]);
        assert!(frame.is_empty());
    }

    #[test]
    fn translucent_colors_blend() {
        let mut frame = vec![0u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.clear([0, 0, 200, 255]);
        canvas.put(0, 0, [200, 0, 0, 128]);
        let blended = pixel(&frame, 1, 0, 0);
        assert_eq!(blended[0], 100);
        assert_eq!(blended[2], 99);
        assert_eq!(blended[3], 255);
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let mut frame = vec![0u8; 6 * 6 * 4];
        let mut canvas = Canvas::new(&mut frame, 6, 6);
        canvas.outline_rect(
            ScreenRect {
                left: 0,
                top: 0,
                width: 6,
                height: 6,
            },
            1,
            [9, 9, 9, 255],
        );
        assert_eq!(pixel(&frame, 6, 0, 0), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 6, 5, 5), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 6, 3, 3), [0, 0, 0, 0]);
    }

    #[test]
    fn blit_region_scales_selected_cell() {
        // 2x1 bitmap: red then green.
        let bitmap = Bitmap {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 255, 0, 255],
        };
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.blit_region(
            &bitmap,
            ScreenRect {
                left: 1,
                top: 0,
                width: 1,
                height: 1,
            },
            ScreenRect {
                left: 0,
                top: 0,
                width: 2,
                height: 2,
            },
        );
        assert_eq!(pixel(&frame, 4, 1, 1), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, 4, 2, 2), [0, 0, 0, 0]);
    }
}
