//! Packs a character range of a font into a single coverage atlas.

use etagere::BucketedAtlasAllocator;

use crate::error::FontError;

/// Largest atlas side accepted by [`pack_font`].
pub const MAX_ATLAS_SIZE: u32 = 16384;

/// Atlas packing policy.
#[derive(Debug, Clone, PartialEq)]
pub struct FontAtlasConfig {
    /// First packed character code.
    pub first_char: u32,
    /// One past the last packed character code.
    ///
    /// The default range `[0, 256)` is extended ASCII. This is a policy, not a
    /// limit: wider ranges simply need a larger atlas.
    pub last_char: u32,
    pub atlas_width: u32,
    pub atlas_height: u32,
    /// Empty texels kept between neighbouring glyphs.
    pub padding: u32,
    /// Drawn for characters outside the range or missing from the font.
    pub replacement: char,
}

impl Default for FontAtlasConfig {
    fn default() -> Self {
        Self {
            first_char: 0,
            last_char: 256,
            atlas_width: 512,
            atlas_height: 512,
            padding: 1,
            replacement: '?',
        }
    }
}

/// Where a glyph lives in the atlas and how it sits on the baseline.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PackedChar {
    /// Atlas texel rect `[x0, x1) x [y0, y1)`. Empty for blank glyphs.
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
    /// Bitmap rect relative to the pen on the baseline, +Y down.
    pub xoff: f32,
    pub yoff: f32,
    pub xoff2: f32,
    pub yoff2: f32,
    pub xadvance: f32,
}

impl PackedChar {
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.x1 == self.x0 || self.y1 == self.y0
    }
}

/// Per-character lookup table and vertical metrics of a packed font.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphTable {
    first_char: u32,
    last_char: u32,
    chars: Vec<Option<PackedChar>>,
    replacement: char,
    pixel_size: f32,
    ascent: f32,
    descent: f32,
    line_gap: f32,
    atlas_width: u32,
    atlas_height: u32,
}

impl GlyphTable {
    /// Character range as `[first, last)`.
    pub fn char_range(&self) -> std::ops::Range<u32> {
        self.first_char..self.last_char
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    /// Distance from baseline to the top of the tallest glyphs.
    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    /// Distance from baseline to the bottom of the lowest glyphs (negative).
    pub fn descent(&self) -> f32 {
        self.descent
    }

    pub fn line_gap(&self) -> f32 {
        self.line_gap
    }

    /// Baseline-to-baseline distance.
    pub fn y_advance(&self) -> f32 {
        self.ascent - self.descent + self.line_gap
    }

    pub fn atlas_size(&self) -> (u32, u32) {
        (self.atlas_width, self.atlas_height)
    }

    /// Packed glyph for `ch`, if it is in range and present in the font.
    pub fn glyph(&self, ch: char) -> Option<&PackedChar> {
        let code = ch as u32;
        if !(self.first_char..self.last_char).contains(&code) {
            return None;
        }
        self.chars.get((code - self.first_char) as usize)?.as_ref()
    }

    /// Like [`glyph`](Self::glyph), substituting the replacement glyph.
    pub fn glyph_or_replacement(&self, ch: char) -> Option<&PackedChar> {
        self.glyph(ch).or_else(|| self.glyph(self.replacement))
    }
}

/// Result of packing: lookup table plus the single-channel coverage bitmap.
#[derive(Debug, Clone)]
pub struct PackedFont {
    pub glyphs: GlyphTable,
    /// `atlas_width * atlas_height` coverage values, row-major.
    pub coverage: Vec<u8>,
}

/// Rasterizes `[first_char, last_char)` at `pixel_size` and packs it.
///
/// Fails with [`FontError::AtlasFull`] when the range does not fit; the atlas
/// never grows.
pub fn pack_font(
    font_bytes: &[u8],
    pixel_size: f32,
    config: &FontAtlasConfig,
) -> Result<PackedFont, FontError> {
    if !(pixel_size.is_finite() && pixel_size > 0.0) {
        return Err(FontError::InvalidSize(pixel_size));
    }
    if config.first_char >= config.last_char || config.last_char > char::MAX as u32 + 1 {
        return Err(FontError::InvalidRange {
            first: config.first_char,
            last: config.last_char,
        });
    }
    let (width, height, padding) = (config.atlas_width, config.atlas_height, config.padding);
    if !(1..=MAX_ATLAS_SIZE).contains(&width)
        || !(1..=MAX_ATLAS_SIZE).contains(&height)
        || padding >= width.min(height)
    {
        return Err(FontError::InvalidAtlas { width, height, padding });
    }

    let settings = fontdue::FontSettings {
        scale: pixel_size,
        ..fontdue::FontSettings::default()
    };
    let font = fontdue::Font::from_bytes(font_bytes, settings)
        .map_err(|e| FontError::Parse(e.to_string()))?;
    let line = font
        .horizontal_line_metrics(pixel_size)
        .ok_or(FontError::MissingMetrics)?;

    let mut coverage = vec![0u8; width as usize * height as usize];
    let mut allocator =
        BucketedAtlasAllocator::new(euclid::size2(width as i32, height as i32));

    let mut chars = Vec::with_capacity((config.last_char - config.first_char) as usize);
    for code in config.first_char..config.last_char {
        let Some(ch) = char::from_u32(code) else {
            chars.push(None);
            continue;
        };
        let index = font.lookup_glyph_index(ch);
        if index == 0 {
            chars.push(None);
            continue;
        }

        let (metrics, bitmap) = font.rasterize_indexed(index, pixel_size);
        let (w, h) = (metrics.width as u32, metrics.height as u32);
        if w == 0 || h == 0 {
            chars.push(Some(PackedChar {
                xadvance: metrics.advance_width,
                ..PackedChar::default()
            }));
            continue;
        }

        let full = FontError::AtlasFull { width, height, code };
        let (Some(pw), Some(ph)) = (padded_side(w, padding), padded_side(h, padding)) else {
            return Err(full);
        };
        let allocation = allocator.allocate(euclid::size2(pw, ph)).ok_or(full)?;
        let x0 = allocation.rectangle.min.x as u32;
        let y0 = allocation.rectangle.min.y as u32;

        for row in 0..h as usize {
            let dst = (y0 as usize + row) * width as usize + x0 as usize;
            let src = row * w as usize;
            coverage[dst..dst + w as usize].copy_from_slice(&bitmap[src..src + w as usize]);
        }

        // fontdue's ymin is the bitmap bottom relative to the baseline, +Y up.
        let xoff = metrics.xmin as f32;
        let yoff = -(metrics.ymin as f32 + h as f32);
        chars.push(Some(PackedChar {
            x0,
            y0,
            x1: x0 + w,
            y1: y0 + h,
            xoff,
            yoff,
            xoff2: xoff + w as f32,
            yoff2: yoff + h as f32,
            xadvance: metrics.advance_width,
        }));
    }

    log::debug!(
        "packed {} glyphs at {pixel_size}px into a {width}x{height} atlas",
        chars.iter().flatten().count()
    );

    Ok(PackedFont {
        glyphs: GlyphTable {
            first_char: config.first_char,
            last_char: config.last_char,
            chars,
            replacement: config.replacement,
            pixel_size,
            ascent: line.ascent,
            descent: line.descent,
            line_gap: line.line_gap,
            atlas_width: width,
            atlas_height: height,
        },
        coverage,
    })
}

/// Glyph side plus padding, if it still fits the allocator's coordinates.
fn padded_side(side: u32, padding: u32) -> Option<i32> {
    side.checked_add(padding).and_then(|v| i32::try_from(v).ok())
}

/// Expands coverage into RGBA8 with white color and coverage as alpha, so a
/// tint multiplies against white.
pub fn coverage_to_rgba(coverage: &[u8]) -> Vec<u8> {
    coverage.iter().flat_map(|&a| [0xFF, 0xFF, 0xFF, a]).collect()
}

#[cfg(test)]
impl GlyphTable {
    /// Monospace table covering `[32, 128)` with 8 px advances: blank space,
    /// 6x10 boxes for `A`, `B` and `?`; every other char is missing.
    pub(crate) fn synthetic(ascent: f32, descent: f32, line_gap: f32) -> Self {
        let boxed = |slot: u32| PackedChar {
            x0: slot * 8,
            y0: 0,
            x1: slot * 8 + 6,
            y1: 10,
            xoff: 1.0,
            yoff: -10.0,
            xoff2: 7.0,
            yoff2: 0.0,
            xadvance: 8.0,
        };
        let mut chars = vec![None; 96];
        chars[(' ' as u32 - 32) as usize] = Some(PackedChar { xadvance: 8.0, ..PackedChar::default() });
        chars[('A' as u32 - 32) as usize] = Some(boxed(0));
        chars[('B' as u32 - 32) as usize] = Some(boxed(1));
        chars[('?' as u32 - 32) as usize] = Some(boxed(2));
        Self {
            first_char: 32,
            last_char: 128,
            chars,
            replacement: '?',
            pixel_size: 12.0,
            ascent,
            descent,
            line_gap,
            atlas_width: 64,
            atlas_height: 16,
        }
    }

    /// Drops `ch` from the table, as if the font had no glyph for it.
    pub(crate) fn without(mut self, ch: char) -> Self {
        let slot = (ch as u32).checked_sub(self.first_char);
        if let Some(entry) = slot.and_then(|slot| self.chars.get_mut(slot as usize)) {
            *entry = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::testing::TEST_FONT as MONO;

    fn atlas_bounds(t: &GlyphTable) -> Rect {
        let (w, h) = t.atlas_size();
        Rect::from_size(w, h)
    }

    #[test]
    fn packs_extended_ascii_at_default_size() {
        let packed = pack_font(MONO, 16.0, &FontAtlasConfig::default()).unwrap();
        let t = &packed.glyphs;
        assert_eq!(t.char_range(), 0..256);
        assert_eq!(packed.coverage.len(), 512 * 512);
        assert!(t.ascent() > 0.0);
        assert!(t.descent() < 0.0);
        assert!(t.y_advance() > 16.0 * 0.9);
    }

    #[test]
    fn glyph_a_is_inside_atlas_with_ink() {
        let packed = pack_font(MONO, 16.0, &FontAtlasConfig::default()).unwrap();
        let a = packed.glyphs.glyph('A').unwrap();
        let src = Rect::new(
            a.x0 as f32,
            a.y0 as f32,
            (a.x1 - a.x0) as f32,
            (a.y1 - a.y0) as f32,
        );
        assert!(!src.is_empty());
        assert!(atlas_bounds(&packed.glyphs).contains_rect(src));

        let ink: u32 = (a.y0..a.y1)
            .flat_map(|y| (a.x0..a.x1).map(move |x| (x, y)))
            .map(|(x, y)| packed.coverage[(y * 512 + x) as usize] as u32)
            .sum();
        assert!(ink > 0);
    }

    #[test]
    fn monospace_advances_match() {
        let packed = pack_font(MONO, 16.0, &FontAtlasConfig::default()).unwrap();
        let t = &packed.glyphs;
        let i = t.glyph('i').unwrap().xadvance;
        let m = t.glyph('M').unwrap().xadvance;
        assert_eq!(i, m);
        let space = t.glyph(' ').unwrap();
        assert!(space.is_blank());
        assert_eq!(space.xadvance, m);
    }

    #[test]
    fn out_of_range_uses_replacement() {
        let packed = pack_font(MONO, 16.0, &FontAtlasConfig::default()).unwrap();
        let t = &packed.glyphs;
        assert!(t.glyph('\u{4e2d}').is_none());
        assert_eq!(t.glyph_or_replacement('\u{4e2d}'), t.glyph('?'));
    }

    #[test]
    fn oversized_font_reports_full_atlas() {
        let err = pack_font(MONO, 200.0, &FontAtlasConfig::default()).unwrap_err();
        assert!(matches!(err, FontError::AtlasFull { width: 512, height: 512, .. }));
    }

    #[test]
    fn larger_atlas_fits_what_the_default_cannot() {
        let config = FontAtlasConfig {
            first_char: 32,
            last_char: 127,
            atlas_width: 2048,
            atlas_height: 2048,
            ..FontAtlasConfig::default()
        };
        assert!(pack_font(MONO, 96.0, &config).is_ok());
    }

    #[test]
    fn rejects_bad_inputs() {
        let config = FontAtlasConfig::default();
        assert!(matches!(pack_font(b"nope", 16.0, &config), Err(FontError::Parse(_))));
        assert_eq!(pack_font(MONO, 0.0, &config).unwrap_err(), FontError::InvalidSize(0.0));
        let empty = FontAtlasConfig { first_char: 65, last_char: 65, ..config };
        assert_eq!(
            pack_font(MONO, 16.0, &empty).unwrap_err(),
            FontError::InvalidRange { first: 65, last: 65 }
        );
    }

    #[test]
    fn absurd_atlas_geometry_is_an_error() {
        let base = FontAtlasConfig::default();
        let cases = [
            FontAtlasConfig { padding: u32::MAX, ..base.clone() },
            FontAtlasConfig { padding: 512, ..base.clone() },
            FontAtlasConfig { atlas_width: 0, ..base.clone() },
            FontAtlasConfig { atlas_height: u32::MAX, ..base.clone() },
            FontAtlasConfig { atlas_width: MAX_ATLAS_SIZE + 1, ..base.clone() },
        ];
        for config in cases {
            assert_eq!(
                pack_font(MONO, 16.0, &config).unwrap_err(),
                FontError::InvalidAtlas {
                    width: config.atlas_width,
                    height: config.atlas_height,
                    padding: config.padding,
                }
            );
        }
    }

    #[test]
    fn padded_side_rejects_overflow() {
        assert_eq!(padded_side(10, 1), Some(11));
        assert_eq!(padded_side(u32::MAX, 1), None);
        assert_eq!(padded_side(i32::MAX as u32, 1), None);
    }

    #[test]
    fn coverage_becomes_white_with_alpha() {
        assert_eq!(
            coverage_to_rgba(&[0, 128, 255]),
            [255, 255, 255, 0, 255, 255, 255, 128, 255, 255, 255, 255]
        );
    }
}
