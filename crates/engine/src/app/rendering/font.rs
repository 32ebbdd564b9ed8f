use super::canvas::Canvas;

const GLYPH_COLUMNS: i32 = 3;
const GLYPH_ROWS: i32 = 5;

/// Each row is three bits, most significant bit on the left.
type GlyphRows = [u8; GLYPH_ROWS as usize];

const UNKNOWN: GlyphRows = [0b110, 0b001, 0b010, 0b000, 0b010];

fn glyph(ch: char) -> Option<GlyphRows> {
    let rows = match ch.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        ' ' => [0; 5],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => UNKNOWN,
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '^' => [0b010, 0b101, 0b000, 0b000, 0b000],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '[' => [0b011, 0b010, 0b010, 0b010, 0b011],
        ']' => [0b110, 0b010, 0b010, 0b010, 0b110],
        _ => return None,
    };
    Some(rows)
}

pub(crate) fn char_advance(scale: i32) -> i32 {
    (GLYPH_COLUMNS + 1) * scale
}

pub(crate) fn line_height(scale: i32) -> i32 {
    (GLYPH_ROWS + 2) * scale
}

pub(crate) fn text_width(text: &str, scale: i32) -> i32 {
    let count = text.chars().count() as i32;
    if count == 0 {
        return 0;
    }
    count * char_advance(scale) - scale
}

/// Draws `text` with its top-left corner at (x, y). Unsupported characters
/// render as '?'.
pub(crate) fn draw_text(
    canvas: &mut Canvas<'_>,
    x: i32,
    y: i32,
    text: &str,
    scale: i32,
    color: [u8; 4],
) {
    let scale = scale.max(1);
    let mut pen_x = x;
    for ch in text.chars() {
        let rows = glyph(ch).unwrap_or(UNKNOWN);
        for (row, bits) in rows.iter().enumerate() {
            for column in 0..GLYPH_COLUMNS {
                if bits & (1 << (GLYPH_COLUMNS - 1 - column)) == 0 {
                    continue;
                }
                let px = pen_x + column * scale;
                let py = y + row as i32 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        canvas.put(px + sx, py + sy, color);
                    }
                }
            }
        }
        pen_x += char_advance(scale);
    }
}

pub(crate) fn draw_text_centered(
    canvas: &mut Canvas<'_>,
    center_x: i32,
    y: i32,
    text: &str,
    scale: i32,
    color: [u8; 4],
) {
    let x = center_x - text_width(text, scale) / 2;
    draw_text(canvas, x, y, text, scale, color);
}
