use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Display width of a string in terminal columns (CJK and emoji count as 2).
fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates `s` to at most `max_width` columns, ending in `...` when cut.
///
/// Widths of 3 or less leave no room for an ellipsis, so the string is cut
/// bare. Borrows when nothing is cut.
///
/// ```
/// use onta::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let (budget, suffix) = if max_width <= ELLIPSIS_WIDTH {
        (max_width, "")
    } else {
        (max_width - ELLIPSIS_WIDTH, ELLIPSIS)
    };

    let mut width = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        end = idx + c.len_utf8();
    }
    Cow::Owned(format!("{}{}", &s[..end], suffix))
}

fn is_stripped(b: u8) -> bool {
    b == 0x1b || b == 0x7f || (b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
}

/// Removes terminal control characters and ANSI escape sequences.
///
/// Titles come from other users' input via the server and are printed
/// straight to the terminal. Tab, newline and carriage return are kept;
/// CSI (`ESC [`) and OSC (`ESC ]` .. BEL/ST) sequences are dropped whole.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.iter().any(|&b| is_stripped(b)) {
        return Cow::Borrowed(s);
    }

    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        if b == 0x1b {
            match bytes.get(i + 1) {
                Some(b'[') => {
                    i += 2;
                    while i < len {
                        let c = bytes[i];
                        i += 1;
                        if (0x40..=0x7e).contains(&c) {
                            break;
                        }
                    }
                }
                Some(b']') => {
                    i += 2;
                    while i < len {
                        if bytes[i] == 0x07 {
                            i += 1;
                            break;
                        }
                        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        } else if is_stripped(b) {
            i += 1;
        } else {
            let start = i;
            while i < len && !is_stripped(bytes[i]) {
                i += 1;
            }
            // Only ASCII bytes end a run, so the slice is on a char boundary.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}

/// Collapses internal newlines and tabs so a title fits on one line.
pub fn single_line(s: &str) -> Cow<'_, str> {
    if !s.contains(['\n', '\r', '\t']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_truncation() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert_eq!(truncate_to_width("Exactly", 7), "Exactly");
    }

    #[test]
    fn test_wide_char_truncation() {
        // 4 CJK chars = 8 columns; 7 leaves 4 for text + ellipsis.
        assert_eq!(truncate_to_width("你好世界", 7), "你好...");
    }

    #[test]
    fn test_accented_text_is_narrow() {
        assert_eq!(display_width("Sí, mañana"), 10);
        assert_eq!(truncate_to_width("Reunión del equipo", 10), "Reunión...");
    }

    #[test]
    fn test_narrow_widths() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "T");
        assert_eq!(truncate_to_width("Test", 3), "Tes");
    }

    #[test]
    fn test_truncation_borrows_when_fits() {
        assert!(matches!(truncate_to_width("ok", 5), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_clean_string_borrows() {
        assert!(matches!(strip_control_chars("Comprar pan"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_strip_csi_sequence() {
        assert_eq!(strip_control_chars("\x1b[31mRojo\x1b[0m"), "Rojo");
    }

    #[test]
    fn test_strip_osc_sequence() {
        assert_eq!(
            strip_control_chars("a\x1b]0;title\x07b\x1b]8;;http://x\x1b\\c"),
            "abc"
        );
    }

    #[test]
    fn test_strip_keeps_whitespace_controls() {
        assert_eq!(strip_control_chars("a\tb\nc\x00d\x7f"), "a\tb\ncd");
    }

    #[test]
    fn test_strip_preserves_multibyte() {
        assert_eq!(strip_control_chars("\x07Año\x1bnuevo"), "Añonuevo");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("Lista\nde la\tcompra"), "Lista de la compra");
        assert!(matches!(single_line("una línea"), Cow::Borrowed(_)));
    }
}
