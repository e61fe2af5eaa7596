use std::num::NonZeroUsize;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Weight};
use lru::LruCache;

const MEASURE_CACHE_CAPACITY: usize = 512;

#[derive(Hash, PartialEq, Eq, Clone)]
struct MeasureKey {
    text: String,
    font_size_bits: u32,
    is_bold: bool,
    is_code: bool,
}

/// Single-line text metrics used to size entity boxes.
pub trait TextMeasure {
    /// Returns `(width, height)` of `text` set on one line.
    fn measure_text(&mut self, text: &str, font_size: f32, is_bold: bool, is_code: bool)
    -> (f32, f32);
}

pub struct CosmicTextMeasure {
    font_system: FontSystem,
    cache: LruCache<MeasureKey, (f32, f32)>,
}

impl CosmicTextMeasure {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            cache: LruCache::new(
                NonZeroUsize::new(MEASURE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ),
        }
    }
}

impl Default for CosmicTextMeasure {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for CosmicTextMeasure {
    fn measure_text(
        &mut self,
        text: &str,
        font_size: f32,
        is_bold: bool,
        is_code: bool,
    ) -> (f32, f32) {
        let key = MeasureKey {
            text: text.to_string(),
            font_size_bits: font_size.to_bits(),
            is_bold,
            is_code,
        };

        if let Some(cached) = self.cache.get(&key) {
            return *cached;
        }

        let line_height = font_size * 1.2;
        let mut buffer = Buffer::new(
            &mut self.font_system,
            Metrics {
                font_size,
                line_height,
            },
        );
        buffer.set_size(&mut self.font_system, None, None);

        let attrs = Attrs::new()
            .family(if is_code {
                Family::Monospace
            } else {
                Family::SansSerif
            })
            .weight(if is_bold {
                Weight::BOLD
            } else {
                Weight::NORMAL
            });

        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);

        let mut width: f32 = 0.0;
        let mut height: f32 = 0.0;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            height += run.line_height;
        }
        if height == 0.0 {
            height = line_height;
        }

        self.cache.put(key, (width, height));
        (width, height)
    }
}

/// Deterministic measurer: every char advances by a fixed share of the font size.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthMeasure {
    pub advance: f32,
}

impl Default for FixedWidthMeasure {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasure for FixedWidthMeasure {
    fn measure_text(
        &mut self,
        text: &str,
        font_size: f32,
        is_bold: bool,
        _is_code: bool,
    ) -> (f32, f32) {
        let advance = if is_bold {
            self.advance * 1.1
        } else {
            self.advance
        };
        (
            text.chars().count() as f32 * font_size * advance,
            font_size * 1.2,
        )
    }
}
