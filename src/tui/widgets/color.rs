use ratatui::style::Color;

use crate::calendar::DueClass;
use crate::models::Priority;

/// Planner palette: the colour names records carry
const LAVENDER: Color = Color::Rgb(0xC8, 0xB6, 0xE2);
const PINK: Color = Color::Rgb(0xF6, 0xC1, 0xD6);
const PURPLE: Color = Color::Rgb(0x9B, 0x7E, 0xDE);
const SOFT_BLUE: Color = Color::Rgb(0xA7, 0xC7, 0xE7);
const SOFT_GREEN: Color = Color::Rgb(0xB5, 0xE0, 0xB9);
const SOFT_YELLOW: Color = Color::Rgb(0xF9, 0xE7, 0x9F);

/// Parse a color string into a ratatui Color
/// Supports:
/// - Planner colours: lavender, pink, purple (and soft blue/green/yellow for record colours)
/// - Named terminal colors: black, red, green, yellow, blue, magenta, cyan, white, gray/grey,
///   darkgray and the light* variants
/// - Hex format: #RRGGBB or #RGB (short form)
/// - RGB format: rgb(255,0,0) or rgb(255, 0, 0) (with spaces)
/// Returns Color::White as default for unrecognized colors
pub fn parse_color(color_str: &str) -> Color {
    let s = color_str.trim().to_lowercase();

    match s.as_str() {
        "lavender" => LAVENDER,
        "pink" => PINK,
        "purple" => PURPLE,
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "lightgray" | "lightgrey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        _ => {
            if s.starts_with('#') {
                if let Some(color) = parse_hex_color(&s) {
                    return color;
                }
            } else if s.starts_with("rgb(") {
                if let Some(color) = parse_rgb_color(&s) {
                    return color;
                }
            }
            Color::White
        }
    }
}

/// Card colour for a record's stored colour name. The form palette maps to
/// soft tones so dark text stays readable on every card.
pub fn record_color(name: &str) -> Color {
    match name.trim().to_lowercase().as_str() {
        "blue" => SOFT_BLUE,
        "green" => SOFT_GREEN,
        "yellow" => SOFT_YELLOW,
        other => parse_color(other),
    }
}

/// Border colour for an event's due-proximity class
pub fn due_color(due: Option<DueClass>) -> Option<Color> {
    due.map(|class| match class {
        DueClass::Today => Color::Red,
        DueClass::OneDay => Color::LightRed,
        DueClass::TwoDays => Color::Yellow,
        DueClass::ThreeDays => Color::LightYellow,
    })
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::LightRed,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::LightGreen,
    }
}

/// Parse hex color format (#RRGGBB or #RGB)
fn parse_hex_color(s: &str) -> Option<Color> {
    let hex = s.trim_start_matches('#');

    if hex.len() == 6 {
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        return Some(Color::Rgb(r, g, b));
    } else if hex.len() == 3 {
        // Short format: #RGB -> #RRGGBB
        let r = u8::from_str_radix(hex.get(0..1)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(1..2)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(2..3)?, 16).ok()?;
        return Some(Color::Rgb((r << 4) | r, (g << 4) | g, (b << 4) | b));
    }

    None
}

/// Parse RGB color format (rgb(r,g,b) or rgb(r, g, b))
fn parse_rgb_color(s: &str) -> Option<Color> {
    let content = s.strip_prefix("rgb(")?.strip_suffix(')')?;

    let parts: Vec<&str> = content.split(',').map(|s| s.trim()).collect();
    if parts.len() != 3 {
        return None;
    }

    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;

    Some(Color::Rgb(r, g, b))
}

/// Format a Color back to string for display
pub fn format_color_for_display(color: &Color) -> String {
    match color {
        Color::Black => "black".to_string(),
        Color::Red => "red".to_string(),
        Color::Green => "green".to_string(),
        Color::Yellow => "yellow".to_string(),
        Color::Blue => "blue".to_string(),
        Color::Magenta => "magenta".to_string(),
        Color::Cyan => "cyan".to_string(),
        Color::White => "white".to_string(),
        Color::Gray => "gray".to_string(),
        Color::DarkGray => "darkgray".to_string(),
        Color::LightRed => "lightred".to_string(),
        Color::LightGreen => "lightgreen".to_string(),
        Color::LightYellow => "lightyellow".to_string(),
        Color::LightBlue => "lightblue".to_string(),
        Color::LightMagenta => "lightmagenta".to_string(),
        Color::LightCyan => "lightcyan".to_string(),
        Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Indexed(_) => "indexed".to_string(),
        Color::Reset => "reset".to_string(),
    }
}

/// Relative luminance (WCAG formula), 0.0 dark to 1.0 light
fn calculate_luminance(r: u8, g: u8, b: u8) -> f64 {
    let channel = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// Get an appropriate foreground color for text on a given background color
/// Returns black for light backgrounds, white for dark backgrounds
pub fn get_contrast_text_color(background: Color) -> Color {
    let dark = match background {
        Color::Rgb(r, g, b) => calculate_luminance(r, g, b) < 0.5,
        // Gray renders light in most terminals
        other => matches!(
            other,
            Color::Black | Color::Blue | Color::Magenta | Color::Red | Color::DarkGray
        ),
    };
    if dark { Color::White } else { Color::Black }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_palette_names_parse() {
        assert_eq!(parse_color("Lavender"), LAVENDER);
        assert_eq!(record_color("green"), SOFT_GREEN);
        assert_eq!(parse_color("#fff"), Color::Rgb(255, 255, 255));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Color::Rgb(1, 2, 3));
        assert_eq!(parse_color("chartreuse"), Color::White);
    }

    #[test]
    fn contrast_picks_dark_text_on_pastels() {
        assert_eq!(get_contrast_text_color(LAVENDER), Color::Black);
        assert_eq!(get_contrast_text_color(Color::Rgb(20, 20, 40)), Color::White);
        assert_eq!(get_contrast_text_color(Color::Blue), Color::White);
    }
}
