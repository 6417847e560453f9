use crate::coords::{Rect, Vec2};

use super::atlas::{GlyphTable, PackedChar};

/// Spaces a tab expands to.
const TAB_WIDTH: f32 = 4.0;

/// One textured glyph quad: atlas texels and destination pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphQuad {
    pub src: Rect,
    pub dst: Rect,
}

/// Lays out a string one glyph quad at a time.
///
/// `(x, y)` is the top-left of the first line; the first baseline sits at
/// `y + ascent`. `\n` returns to `x` and moves down one line, `\r` is ignored
/// and `\t` advances by four spaces. Characters without a glyph fall back to
/// the table's replacement glyph and are skipped if that is missing too.
/// Blank glyphs advance the pen without producing a quad.
#[derive(Debug, Clone)]
pub struct TextLayout<'a> {
    glyphs: &'a GlyphTable,
    chars: std::str::Chars<'a>,
    origin: Vec2,
    pen: Vec2,
    max_x: f32,
    lines: u32,
}

impl<'a> TextLayout<'a> {
    pub fn new(glyphs: &'a GlyphTable, text: &'a str, x: f32, y: f32) -> Self {
        Self {
            glyphs,
            chars: text.chars(),
            origin: Vec2::new(x, y),
            pen: Vec2::new(x, y + glyphs.ascent()),
            max_x: x,
            lines: 1,
        }
    }

    /// Current pen position on the baseline.
    pub fn pen(&self) -> Vec2 {
        self.pen
    }

    /// Size of the text laid out so far. The height spans whole lines from
    /// the top of the first to the descent of the last.
    pub fn extent(&self) -> Vec2 {
        let g = self.glyphs;
        Vec2::new(
            self.max_x - self.origin.x,
            (self.lines - 1) as f32 * g.y_advance() + g.ascent() - g.descent(),
        )
    }

    fn newline(&mut self) {
        self.pen.x = self.origin.x;
        self.pen.y += self.glyphs.y_advance();
        self.lines += 1;
    }

    /// Advances by four space widths. Without a space glyph the replacement
    /// glyph's advance is used; nothing is drawn either way.
    fn tab(&mut self) {
        let advance = self.glyphs.glyph_or_replacement(' ').map_or(0.0, |g| g.xadvance);
        self.pen.x += advance * TAB_WIDTH;
        self.max_x = self.max_x.max(self.pen.x);
    }

    fn place(&mut self, glyph: &PackedChar) -> Option<GlyphQuad> {
        let pen = self.pen;
        self.pen.x += glyph.xadvance;
        self.max_x = self.max_x.max(self.pen.x);
        if glyph.is_blank() {
            return None;
        }

        // Snap to whole pixels so glyph texels map 1:1 onto the target.
        let x = (pen.x + glyph.xoff + 0.5).floor();
        let y = (pen.y + glyph.yoff + 0.5).floor();
        let w = (glyph.x1 - glyph.x0) as f32;
        let h = (glyph.y1 - glyph.y0) as f32;
        Some(GlyphQuad {
            src: Rect::new(glyph.x0 as f32, glyph.y0 as f32, w, h),
            dst: Rect::new(x, y, w, h),
        })
    }
}

impl Iterator for TextLayout<'_> {
    type Item = GlyphQuad;

    fn next(&mut self) -> Option<GlyphQuad> {
        loop {
            let ch = match self.chars.next()? {
                '\r' => continue,
                '\n' => {
                    self.newline();
                    continue;
                }
                '\t' => {
                    self.tab();
                    continue;
                }
                c => c,
            };

            let glyphs = self.glyphs;
            let Some(glyph) = glyphs.glyph_or_replacement(ch) else {
                continue;
            };
            if let Some(quad) = self.place(glyph) {
                return Some(quad);
            }
        }
    }
}

/// Size of `text` as [`TextLayout`] would lay it out.
pub fn measure(glyphs: &GlyphTable, text: &str) -> Vec2 {
    let mut layout = TextLayout::new(glyphs, text, 0.0, 0.0);
    layout.by_ref().for_each(drop);
    layout.extent()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> GlyphTable {
        GlyphTable::synthetic(10.0, -2.0, 1.0)
    }

    fn quads(text: &str) -> Vec<GlyphQuad> {
        let t = table();
        TextLayout::new(&t, text, 0.0, 0.0).collect()
    }

    #[test]
    fn first_baseline_is_ascent_below_origin() {
        let t = table();
        let q: Vec<_> = TextLayout::new(&t, "A", 20.0, 5.0).collect();
        assert_eq!(q.len(), 1);
        // yoff is -10, so the glyph top lands on the origin row.
        assert_eq!(q[0].dst, Rect::new(21.0, 5.0, 6.0, 10.0));
        assert_eq!(q[0].src, Rect::new(0.0, 0.0, 6.0, 10.0));
    }

    #[test]
    fn newline_advances_by_line_height() {
        let q = quads("A\nB");
        assert_eq!(q.len(), 2);
        assert_eq!(q[1].dst.y - q[0].dst.y, 13.0);
        assert_eq!(q[1].dst.x, q[0].dst.x);
        assert_eq!(q[1].src.x, 8.0);
    }

    #[test]
    fn carriage_return_is_ignored() {
        assert_eq!(quads("\rA\r"), quads("A"));
    }

    #[test]
    fn tab_is_four_spaces() {
        let q = quads("\tA");
        assert_eq!(q[0].dst.x, 4.0 * 8.0 + 1.0);
    }

    #[test]
    fn tab_without_space_glyph_draws_nothing() {
        let t = table().without(' ');
        let q: Vec<_> = TextLayout::new(&t, "\tA", 0.0, 0.0).collect();
        assert_eq!(q.len(), 1);
        assert_eq!(q[0].src.x, 0.0);
        assert_eq!(q[0].dst.x, 4.0 * 8.0 + 1.0);
        assert_eq!(measure(&t, "\t").x, 32.0);
    }

    #[test]
    fn blank_glyphs_only_advance() {
        let q = quads("A B");
        assert_eq!(q.len(), 2);
        assert_eq!(q[1].dst.x, 17.0);
    }

    #[test]
    fn missing_chars_use_replacement() {
        // 'C' is in range but missing, 'é' is out of range.
        let q = quads("Cé");
        assert_eq!(q.len(), 2);
        assert!(q.iter().all(|g| g.src.x == 16.0));
        assert_eq!(q[1].dst.x, 9.0);
    }

    #[test]
    fn fractional_origin_snaps_to_pixels() {
        let t = table();
        let q: Vec<_> = TextLayout::new(&t, "A", 0.4, 0.6).collect();
        assert_eq!(q[0].dst.x, 1.0);
        assert_eq!(q[0].dst.y, 1.0);
    }

    #[test]
    fn measure_spans_widest_line() {
        let t = table();
        assert_eq!(measure(&t, "AB\nA"), Vec2::new(16.0, 25.0));
        assert_eq!(measure(&t, ""), Vec2::new(0.0, 12.0));
    }
}
