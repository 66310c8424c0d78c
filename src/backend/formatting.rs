use serde::{Deserialize, Serialize};

use super::analysis::Emphasis;

/// Card colouring for a category, RGBA like the rest of the UI palette.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct CardFormat {
    pub bg_color: Option<[u8; 4]>,
    pub text_color: Option<[u8; 4]>,
}

impl CardFormat {
    pub fn for_emphasis(emphasis: Option<Emphasis>) -> Self {
        let bg_color = emphasis.map(|e| match e {
            Emphasis::High => [0xff, 0xcc, 0xcc, 0xff],
            Emphasis::Medium => [0xff, 0xff, 0xcc, 0xff],
            Emphasis::Low => [0xcc, 0xff, 0xcc, 0xff],
        });
        Self {
            bg_color,
            // Pastel fills need dark text regardless of theme.
            text_color: bg_color.map(|_| [0x20, 0x20, 0x20, 0xff]),
        }
    }
}

/// Formats an integer with comma thousands separators: 12345 -> "12,345".
pub fn format_grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Count with the unit suffix used on cards, e.g. "1,024 건".
pub fn format_count(value: u64) -> String {
    format!("{} 건", format_grouped(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(0), "0");
        assert_eq!(format_grouped(999), "999");
        assert_eq!(format_grouped(1000), "1,000");
        assert_eq!(format_grouped(1234567), "1,234,567");
        assert_eq!(format_count(12345), "12,345 건");
    }

    #[test]
    fn test_card_format() {
        assert_eq!(CardFormat::for_emphasis(None), CardFormat::default());
        assert_eq!(
            CardFormat::for_emphasis(Some(Emphasis::High)).bg_color,
            Some([0xff, 0xcc, 0xcc, 0xff])
        );
    }
}
