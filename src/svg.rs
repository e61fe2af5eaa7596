/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars().filter(|&c| is_valid_xml_char(c)) {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap diagram content in a standalone document with a painted background.
pub fn document(inner: &str, width: f32, height: f32, padding: f32, background: &str) -> String {
    let total_w = width + padding * 2.0;
    let total_h = height + padding * 2.0;
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{total_w:.2}" height="{total_h:.2}" viewBox="0 0 {total_w:.2} {total_h:.2}">
<rect width="{total_w:.2}" height="{total_h:.2}" fill="{background}"/>
<g transform="translate({padding:.2},{padding:.2})">
{inner}
</g>
</svg>"#,
        background = escape_xml(background),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_invalid_control_chars() {
        assert_eq!(escape_xml("A\u{0007}B\u{000C}C"), "ABC");
        assert_eq!(escape_xml("a\tb\nc"), "a\tb\nc");
    }

    #[test]
    fn escapes_markup_in_column_names() {
        assert_eq!(
            escape_xml(r#"<col name="a&b">'x'"#),
            "&lt;col name=&quot;a&amp;b&quot;&gt;&apos;x&apos;"
        );
    }

    #[test]
    fn document_adds_padding_to_viewbox() {
        let svg = document("<g/>", 100.0, 50.0, 10.0, "#fff");
        assert!(svg.contains(r#"viewBox="0 0 120.00 70.00""#));
        assert!(svg.contains("translate(10.00,10.00)"));
    }
}
