//! Color recognition for style property values

/// Named colors accepted by key-scoped lookups
const BASIC_NAMED_COLORS: &[&str] = &[
    "red", "green", "blue", "yellow", "cyan", "magenta", "white", "black",
];

/// Extra names accepted by the unscoped last-resort scan
const BROAD_NAMED_COLORS: &[&str] = &["orange", "purple", "brown", "pink", "gray", "grey"];

/// Which named colors count as colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColors {
    Basic,
    Broad,
}

impl NamedColors {
    fn contains(self, value: &str) -> bool {
        let matches = |names: &[&str]| names.iter().any(|n| n.eq_ignore_ascii_case(value));
        match self {
            NamedColors::Basic => matches(BASIC_NAMED_COLORS),
            NamedColors::Broad => matches(BASIC_NAMED_COLORS) || matches(BROAD_NAMED_COLORS),
        }
    }
}

/// Return the value as a color string if it looks like one
///
/// `#…` and `rgb…` values pass through unchanged, named colors are
/// lowercased and QGIS `r,g,b[,a]` tuples become hex.
pub fn recognize_color(value: &str, names: NamedColors) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with('#') {
        return Some(value.to_string());
    }
    if value
        .get(..3)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("rgb"))
    {
        return Some(value.to_string());
    }
    if let Some(hex) = qgis_color_tuple(value) {
        return Some(hex);
    }
    names.contains(value).then(|| value.to_ascii_lowercase())
}

/// `255,0,0,255` or `255,0,0,255,rgb:1,0,0,1` as `#rrggbb[aa]`
///
/// Alpha is appended only when it is not fully opaque.
fn qgis_color_tuple(value: &str) -> Option<String> {
    let components = value.split(",rgb:").next()?;
    let parts = components
        .split(',')
        .map(|p| p.trim().parse::<u8>().ok())
        .collect::<Option<Vec<u8>>>()?;

    match parts.as_slice() {
        [r, g, b] | [r, g, b, 255] => Some(format!("#{:02x}{:02x}{:02x}", r, g, b)),
        [r, g, b, a] => Some(format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)),
        _ => None,
    }
}

/// Hex color from 0-255 channel values, clamped and rounded
pub fn hex_from_components(r: f64, g: f64, b: f64) -> String {
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
}

/// Hex color from textual channel values
pub fn hex_from_text_components(components: &[&str; 3]) -> Option<String> {
    let [r, g, b] = components.map(|c| c.trim().parse::<f64>().ok());
    Some(hex_from_components(r?, g?, b?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_and_rgb_pass_through() {
        assert_eq!(recognize_color("#FF0000", NamedColors::Basic), Some("#FF0000".into()));
        assert_eq!(
            recognize_color(" rgb(1, 2, 3) ", NamedColors::Basic),
            Some("rgb(1, 2, 3)".into())
        );
        assert_eq!(recognize_color("RGBA(1,2,3,0.5)", NamedColors::Basic), Some("RGBA(1,2,3,0.5)".into()));
    }

    #[test]
    fn test_named_sets() {
        assert_eq!(recognize_color("Red", NamedColors::Basic), Some("red".into()));
        assert_eq!(recognize_color("orange", NamedColors::Basic), None);
        assert_eq!(recognize_color("orange", NamedColors::Broad), Some("orange".into()));
        assert_eq!(recognize_color("grey", NamedColors::Broad), Some("grey".into()));
        assert_eq!(recognize_color("teal", NamedColors::Broad), None);
    }

    #[test]
    fn test_qgis_tuples() {
        assert_eq!(recognize_color("255,0,0,255", NamedColors::Basic), Some("#ff0000".into()));
        assert_eq!(recognize_color("0,128,255", NamedColors::Basic), Some("#0080ff".into()));
        assert_eq!(
            recognize_color("16,32,48,128", NamedColors::Basic),
            Some("#10203080".into())
        );
        assert_eq!(
            recognize_color("255,0,0,255,rgb:1,0,0,1", NamedColors::Basic),
            Some("#ff0000".into())
        );
        assert_eq!(recognize_color("256,0,0", NamedColors::Basic), None);
        assert_eq!(recognize_color("0.26", NamedColors::Broad), None);
        assert_eq!(recognize_color("1,2", NamedColors::Broad), None);
    }

    #[test]
    fn test_rejects_non_colors() {
        assert_eq!(recognize_color("", NamedColors::Broad), None);
        assert_eq!(recognize_color("solid", NamedColors::Broad), None);
        assert_eq!(recognize_color("é", NamedColors::Broad), None);
    }

    #[test]
    fn test_components() {
        assert_eq!(hex_from_components(255.0, 127.6, -3.0), "#ff8000");
        assert_eq!(hex_from_text_components(&["0", "255", "16"]), Some("#00ff10".into()));
        assert_eq!(hex_from_text_components(&["0", "x", "16"]), None);
    }
}
