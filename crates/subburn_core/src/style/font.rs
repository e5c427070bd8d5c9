//! Font-family tokens.

/// Generic family used as the last-resort candidate.
pub const GENERIC_SANS: &str = "sans-serif";

const CSS_VARIABLES: &[(&str, &str)] = &[
    ("--font-bangers", "Bangers"),
    ("--font-montserrat", "Montserrat"),
    ("--font-inter", "Inter"),
    ("--font-bebas-neue", "Bebas Neue"),
    ("--font-poppins", "Poppins"),
    ("--font-open-sans", "Open Sans"),
    ("--font-oswald", "Oswald"),
    ("--font-anton", "Anton"),
    ("--font-fredoka", "Fredoka"),
    ("--font-righteous", "Righteous"),
    ("--font-nunito", "Nunito"),
    ("--font-roboto", "Roboto"),
];

/// Families offered by the style picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Arial,
    Roboto,
    Verdana,
    Helvetica,
    OpenSans,
}

impl FontFamily {
    pub const ALL: [FontFamily; 5] = [
        FontFamily::Arial,
        FontFamily::Roboto,
        FontFamily::Verdana,
        FontFamily::Helvetica,
        FontFamily::OpenSans,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FontFamily::Arial => "Arial",
            FontFamily::Roboto => "Roboto",
            FontFamily::Verdana => "Verdana",
            FontFamily::Helvetica => "Helvetica",
            FontFamily::OpenSans => "Open Sans",
        }
    }

    /// The family token stored in a style.
    pub fn value(&self) -> &'static str {
        match self {
            FontFamily::Arial => "Arial, sans-serif",
            FontFamily::Roboto => "Roboto, sans-serif",
            FontFamily::Verdana => "Verdana, sans-serif",
            FontFamily::Helvetica => "Helvetica, Arial, sans-serif",
            FontFamily::OpenSans => "var(--font-open-sans), 'Open Sans', sans-serif",
        }
    }
}

/// Resolve a CSS family list into ordered, de-duplicated family names.
///
/// `var(--font-x)` entries map to their concrete family (unknown variables
/// are skipped), quotes are stripped, and [`GENERIC_SANS`] always ends the
/// list.
pub fn resolve_font_family(token: &str) -> Vec<String> {
    let mut families: Vec<String> = Vec::new();

    for entry in token.split(',') {
        let entry = entry.trim().trim_matches(|c| c == '\'' || c == '"').trim();
        if entry.is_empty() {
            continue;
        }

        let resolved = match entry.strip_prefix("var(").and_then(|v| v.strip_suffix(')')) {
            Some(var) => CSS_VARIABLES
                .iter()
                .find(|(name, _)| *name == var.trim())
                .map(|(_, family)| family.to_string()),
            None => Some(entry.to_string()),
        };

        if let Some(family) = resolved {
            if !families.iter().any(|f| f.eq_ignore_ascii_case(&family)) {
                families.push(family);
            }
        }
    }

    families.retain(|f| !f.eq_ignore_ascii_case(GENERIC_SANS));
    families.push(GENERIC_SANS.to_string());
    families
}
