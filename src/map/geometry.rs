use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a filled circle, clipped to the canvas. Chord math runs in i64 so
/// radii far larger than the canvas stay exact.
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    let max_x = (canvas.width() * 2) as i64;
    let max_y = (canvas.height() * 4) as i64;
    let (cx, cy, radius) = (i64::from(cx), i64::from(cy), i64::from(radius.max(0)));
    let y_lo = (cy - radius).max(0);
    let y_hi = (cy + radius).min(max_y - 1);
    let r2 = radius * radius;

    for y in y_lo..=y_hi {
        let dy = y - cy;
        // Half-width of the chord at this row
        let half = ((r2 - dy * dy) as f64).sqrt() as i64;
        let x_lo = (cx - half).max(0);
        let x_hi = (cx + half).min(max_x - 1);
        for x in x_lo..=x_hi {
            canvas.set_pixel(x as usize, y as usize);
        }
    }
}

/// Draw a circle outline using the midpoint algorithm
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    if radius <= 0 {
        canvas.set_pixel_signed(cx, cy);
        return;
    }

    let mut x = radius;
    let mut y = 0;
    let mut err = 1 - radius;

    while x >= y {
        for (px, py) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            canvas.set_pixel_signed(cx + px, cy + py);
        }

        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_filled_circle_clipped() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_circle(&mut canvas, 0, 0, 3);
        assert!(canvas.lit_cells() > 0);
        // Far corner stays empty
        assert!(canvas.cell(3, 1).is_none());
    }

    #[test]
    fn test_huge_circle_fills_canvas() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_circle(&mut canvas, 4, 4, 60_000);
        assert_eq!(canvas.lit_cells(), 8);

        let mut canvas = BrailleCanvas::new(4, 2);
        draw_circle(&mut canvas, 4, 4, i32::MAX);
        assert_eq!(canvas.lit_cells(), 8);
    }

    #[test]
    fn test_circle_centered_far_off_canvas() {
        // Left edge of a huge circle reaches into the canvas
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_circle(&mut canvas, -100_000, 4, 100_004);
        assert!(canvas.lit_cells() > 0);
        assert!(canvas.cell(3, 1).is_none());

        let mut canvas = BrailleCanvas::new(4, 2);
        draw_circle(&mut canvas, i32::MIN, i32::MIN, 10);
        assert_eq!(canvas.lit_cells(), 0);
    }

    #[test]
    fn test_ring_is_hollow() {
        let mut canvas = BrailleCanvas::new(10, 5);
        draw_ring(&mut canvas, 10, 10, 8);
        // Center cell of the ring stays empty
        assert!(canvas.cell(5, 2).is_none());
        assert!(canvas.lit_cells() > 0);
    }
}
