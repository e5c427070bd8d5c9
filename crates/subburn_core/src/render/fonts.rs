//! Font loading and fontdue-backed text rasterization.

use std::fs;
use std::path::{Path, PathBuf};

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};

use crate::layout::{FontSpec, TextMeasure};
use crate::style::GENERIC_SANS;

use super::{GlyphMask, TextRaster};

/// Font loading errors.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("No usable fonts found in {0}")]
    NoFonts(PathBuf),

    #[error("Failed to read font directory {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to parse font {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Stem suffixes and the CSS weights they denote.
const WEIGHT_SUFFIXES: &[(&str, u16)] = &[
    ("extralight", 200),
    ("ultralight", 200),
    ("extrabold", 800),
    ("ultrabold", 800),
    ("semibold", 600),
    ("demibold", 600),
    ("regular", 400),
    ("medium", 500),
    ("normal", 400),
    ("black", 900),
    ("heavy", 900),
    ("light", 300),
    ("thin", 100),
    ("bold", 700),
    ("book", 400),
];

/// One loaded font file.
pub struct FontFace {
    pub family: String,
    pub weight: u16,
    pub italic: bool,
    pub font: Font,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("weight", &self.weight)
            .field("italic", &self.italic)
            .finish()
    }
}

/// Lower-case a family name and drop separators: `Open Sans` == `OpenSans`.
fn family_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Derive `(family, weight, italic)` from a file stem like `Roboto-BoldItalic`.
///
/// Stems without a recognised style suffix name the whole family.
pub fn parse_font_stem(stem: &str) -> (String, u16, bool) {
    if let Some((family, style)) = stem.rsplit_once(['-', '_']) {
        let style = style.to_ascii_lowercase();
        let upright = style
            .strip_suffix("italic")
            .or_else(|| style.strip_suffix("oblique"));
        let italic = upright.is_some();
        let base = upright.unwrap_or(style.as_str());

        let weight = if base.is_empty() {
            Some(400)
        } else {
            WEIGHT_SUFFIXES
                .iter()
                .find(|(suffix, _)| *suffix == base)
                .map(|(_, weight)| *weight)
        };
        if let Some(weight) = weight {
            return (family.to_string(), weight, italic);
        }
    }
    (stem.to_string(), 400, false)
}

/// A set of faces with family/weight selection.
#[derive(Debug, Default)]
pub struct FontLibrary {
    faces: Vec<FontFace>,
    /// Family used for the generic `sans-serif` candidate.
    fallback_family: Option<String>,
}

impl FontLibrary {
    /// Load every `.ttf`/`.otf` file in `dir`.
    ///
    /// Unparseable files are skipped with a warning; an empty result is an
    /// error.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, FontError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| FontError::Io {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut library = Self::default();
        for path in paths {
            match load_face(&path) {
                Ok(face) => {
                    tracing::debug!(
                        "[Fonts] Loaded {} ({} {})",
                        path.display(),
                        face.family,
                        face.weight
                    );
                    library.faces.push(face);
                }
                Err(e) => tracing::warn!("[Fonts] Skipping {}", e),
            }
        }

        if library.faces.is_empty() {
            return Err(FontError::NoFonts(dir.to_path_buf()));
        }
        tracing::info!("[Fonts] {} font face(s) loaded from {}", library.faces.len(), dir.display());
        Ok(library)
    }

    /// Build a library from in-memory font data.
    pub fn from_bytes(
        family: &str,
        weight: u16,
        bytes: Vec<u8>,
    ) -> Result<Self, FontError> {
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| FontError::Parse {
            path: PathBuf::from(family),
            message: e.to_string(),
        })?;
        Ok(Self {
            faces: vec![FontFace {
                family: family.to_string(),
                weight,
                italic: false,
                font,
            }],
            fallback_family: None,
        })
    }

    /// Use `family` for the generic sans-serif candidate.
    pub fn with_fallback(mut self, family: impl Into<String>) -> Self {
        self.fallback_family = Some(family.into());
        self
    }

    pub fn faces(&self) -> &[FontFace] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Best face for a font request.
    ///
    /// Family candidates are tried in order; within a family the weight
    /// closest to the request wins and upright faces beat italics. The
    /// generic sans-serif candidate maps to the configured fallback family.
    /// When nothing matches by name, sans faces are preferred over serif
    /// ones before weight is considered.
    pub fn select(&self, spec: &FontSpec) -> Option<&FontFace> {
        choose_face(&self.faces, spec, self.fallback_family.as_deref())
    }
}

/// Selection view of a face.
trait FaceTraits {
    fn family(&self) -> &str;
    fn weight(&self) -> u16;
    fn italic(&self) -> bool;
}

impl FaceTraits for FontFace {
    fn family(&self) -> &str {
        &self.family
    }

    fn weight(&self) -> u16 {
        self.weight
    }

    fn italic(&self) -> bool {
        self.italic
    }
}

/// Serif faces are the last resort for an unresolved family.
fn looks_serif(family: &str) -> bool {
    let key = family_key(family);
    key.contains("serif") && !key.contains("sans")
}

fn choose_face<'a, F: FaceTraits>(
    faces: &'a [F],
    spec: &FontSpec,
    fallback: Option<&str>,
) -> Option<&'a F> {
    let fallback_key = fallback.map(family_key);

    for candidate in &spec.families {
        let key = if candidate.eq_ignore_ascii_case(GENERIC_SANS) {
            match &fallback_key {
                Some(key) => key.clone(),
                None => continue,
            }
        } else {
            family_key(candidate)
        };

        let best = faces
            .iter()
            .filter(|f| family_key(f.family()) == key)
            .min_by_key(|f| (f.italic(), f.weight().abs_diff(spec.weight)));
        if best.is_some() {
            return best;
        }
    }

    faces.iter().min_by_key(|f| {
        (
            looks_serif(f.family()),
            f.italic(),
            f.weight().abs_diff(spec.weight),
        )
    })
}

fn load_face(path: &Path) -> Result<FontFace, FontError> {
    let bytes = fs::read(path).map_err(|e| FontError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|e| FontError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let (family, weight, italic) = parse_font_stem(stem);
    Ok(FontFace {
        family,
        weight,
        italic,
        font,
    })
}

/// [`TextRaster`] over a [`FontLibrary`] using fontdue.
#[derive(Debug)]
pub struct FontdueText {
    library: FontLibrary,
}

impl FontdueText {
    pub fn new(library: FontLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &FontLibrary {
        &self.library
    }
}

fn advance_width(font: &Font, text: &str, px: f32) -> f32 {
    let mut width = 0.0;
    let mut prev: Option<char> = None;
    for ch in text.chars() {
        if let Some(left) = prev {
            width += font.horizontal_kern(left, ch, px).unwrap_or(0.0);
        }
        width += font.metrics(ch, px).advance_width;
        prev = Some(ch);
    }
    width
}

impl TextMeasure for FontdueText {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        match self.library.select(font) {
            Some(face) => advance_width(&face.font, text, font.size_px),
            None => 0.0,
        }
    }
}

impl TextRaster for FontdueText {
    fn rasterize(&self, text: &str, spec: &FontSpec) -> GlyphMask {
        let Some(face) = self.library.select(spec) else {
            return GlyphMask::empty();
        };
        let font = &face.font;
        let px = spec.size_px;

        let (ascent, descent) = font
            .horizontal_line_metrics(px)
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((px * 0.8, -px * 0.2));
        let advance = advance_width(font, text, px);

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: 0.0,
            y: 0.0,
            ..LayoutSettings::default()
        });
        layout.append(&[font], &TextStyle::new(text, px, 0));

        // Bounds cover the em box and any glyph overhang.
        let mut min_x = 0.0f32;
        let mut min_y = 0.0f32;
        let mut max_x = advance;
        let mut max_y = ascent - descent;
        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            min_x = min_x.min(glyph.x);
            min_y = min_y.min(glyph.y);
            max_x = max_x.max(glyph.x + glyph.width as f32);
            max_y = max_y.max(glyph.y + glyph.height as f32);
        }

        let origin_x = min_x.floor();
        let origin_y = min_y.floor();
        let width = (max_x - origin_x).ceil().max(0.0) as u32;
        let height = (max_y - origin_y).ceil().max(0.0) as u32;
        let mut mask = GlyphMask::new(
            width,
            height,
            vec![0; (width * height) as usize],
            advance / 2.0 - origin_x,
            (ascent - descent) / 2.0 - origin_y,
        );

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (_, bitmap) = font.rasterize_config(glyph.key);
            let gx = (glyph.x - origin_x).round() as i64;
            let gy = (glyph.y - origin_y).round() as i64;
            for row in 0..glyph.height {
                for col in 0..glyph.width {
                    let value = bitmap[row * glyph.width + col];
                    mask.max_at(gx + col as i64, gy + row as i64, value);
                }
            }
        }

        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_font_stems() {
        assert_eq!(parse_font_stem("Roboto-Bold"), ("Roboto".to_string(), 700, false));
        assert_eq!(
            parse_font_stem("OpenSans-SemiBoldItalic"),
            ("OpenSans".to_string(), 600, true)
        );
        assert_eq!(parse_font_stem("Verdana"), ("Verdana".to_string(), 400, false));
        assert_eq!(parse_font_stem("Arial_Regular"), ("Arial".to_string(), 400, false));
        assert_eq!(parse_font_stem("Bebas-Neue"), ("Bebas-Neue".to_string(), 400, false));
    }

    #[test]
    fn family_keys_ignore_spacing_and_case() {
        assert_eq!(family_key("Open Sans"), family_key("OpenSans"));
        assert_eq!(family_key("Bebas Neue"), "bebasneue");
    }

    impl FaceTraits for (&'static str, u16, bool) {
        fn family(&self) -> &str {
            self.0
        }

        fn weight(&self) -> u16 {
            self.1
        }

        fn italic(&self) -> bool {
            self.2
        }
    }

    fn bold_open_sans() -> FontSpec {
        let style = crate::style::SubtitleStyle::default();
        FontSpec::new(style.font_candidates(), 700, 48.0)
    }

    #[test]
    fn unknown_family_uses_configured_sans() {
        let faces: [(&str, u16, bool); 2] = [("DejaVuSerif", 700, false), ("DejaVuSans", 400, false)];
        let spec = bold_open_sans();

        let chosen = choose_face(&faces, &spec, Some("DejaVu Sans")).unwrap();
        assert_eq!(chosen.0, "DejaVuSans");
    }

    #[test]
    fn unresolved_family_avoids_serif_without_fallback() {
        let faces: [(&str, u16, bool); 2] = [("DejaVuSerif", 700, false), ("DejaVuSans", 400, false)];
        let spec = bold_open_sans();

        assert_eq!(choose_face(&faces, &spec, None).unwrap().0, "DejaVuSans");
        // A fallback that is not installed behaves like no fallback.
        assert_eq!(
            choose_face(&faces, &spec, Some("Liberation Sans")).unwrap().0,
            "DejaVuSans"
        );
    }

    #[test]
    fn named_family_still_wins_over_fallback() {
        let faces: [(&str, u16, bool); 3] = [
            ("DejaVuSans", 700, false),
            ("Roboto", 400, false),
            ("Roboto", 700, true),
        ];
        let spec = FontSpec::new(vec!["Roboto".into(), GENERIC_SANS.into()], 700, 48.0);

        let chosen = choose_face(&faces, &spec, Some("DejaVu Sans")).unwrap();
        assert_eq!(*chosen, ("Roboto", 400, false));
    }

    #[test]
    fn loaded_library_falls_back_to_sans_face() {
        let system = Path::new("/usr/share/fonts/truetype/dejavu");
        let sans = system.join("DejaVuSans.ttf");
        let serif = system.join("DejaVuSerif-Bold.ttf");
        if !sans.is_file() || !serif.is_file() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        std::fs::copy(&sans, dir.path().join("DejaVuSans.ttf")).unwrap();
        std::fs::copy(&serif, dir.path().join("DejaVuSerif-Bold.ttf")).unwrap();

        let fallback = crate::config::Settings::default().paths.fallback_font;
        let library = FontLibrary::load_dir(dir.path()).unwrap().with_fallback(fallback);
        let face = library.select(&bold_open_sans()).unwrap();
        assert_eq!(face.family, "DejaVuSans");
        assert_eq!(face.weight, 400);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let err = FontLibrary::load_dir("/definitely/not/a/font/dir").unwrap_err();
        assert!(matches!(err, FontError::Io { .. }));
    }

    #[test]
    fn empty_directory_has_no_fonts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not a font").unwrap();
        std::fs::write(dir.path().join("broken.ttf"), b"garbage").unwrap();

        let err = FontLibrary::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, FontError::NoFonts(_)));
    }
}
