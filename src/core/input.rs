//! Legacy terminal key parsing.
//!
//! Raw reads are first split into one sequence per key press, then each sequence is mapped to a
//! normalized key id such as `enter`, `ctrl+c`, `pageUp` or `ctrl+up`.

use crate::core::text::ansi::extract_ansi_code;

const MOD_SHIFT: u8 = 1;
const MOD_ALT: u8 = 2;
const MOD_CTRL: u8 = 4;

/// Split a raw chunk into individual sequences.
///
/// Escape sequences and control bytes each become their own entry. Runs of printable text are
/// kept together so pasted-without-brackets text reaches widgets as a single insert.
pub fn split_sequences(data: &str) -> Vec<&str> {
    let bytes = data.as_bytes();
    let mut sequences = Vec::new();
    let mut idx = 0;
    while idx < bytes.len() {
        let byte = bytes[idx];
        if byte == 0x1b {
            let len = escape_sequence_len(data, idx);
            sequences.push(&data[idx..idx + len]);
            idx += len;
            continue;
        }
        if byte < 0x20 || byte == 0x7f {
            sequences.push(&data[idx..idx + 1]);
            idx += 1;
            continue;
        }

        let start = idx;
        while idx < bytes.len() && bytes[idx] >= 0x20 && bytes[idx] != 0x7f && bytes[idx] != 0x1b
        {
            idx += 1;
        }
        sequences.push(&data[start..idx]);
    }
    sequences
}

fn escape_sequence_len(data: &str, pos: usize) -> usize {
    if let Some(code) = extract_ansi_code(data, pos) {
        return code.length;
    }
    // `ESC <char>` is an alt-modified key; a lone trailing ESC is the escape key itself.
    match data[pos + 1..].chars().next() {
        Some(ch) if ch != '\x1b' => 1 + ch.len_utf8(),
        _ => 1,
    }
}

/// Decode printable text, if the sequence is not a key.
pub fn parse_text(data: &str) -> Option<String> {
    if data.is_empty() || data.chars().any(|ch| ch.is_control()) {
        return None;
    }
    Some(data.to_string())
}

/// Map one sequence to a normalized key id.
pub fn parse_key(data: &str) -> Option<String> {
    if let Some(key_id) = legacy_sequence_key_id(data) {
        return Some(key_id.to_string());
    }
    if let Some(key_id) = modified_csi_key_id(data) {
        return Some(key_id);
    }

    match data {
        "\x1b" => return Some("escape".to_string()),
        "\t" => return Some("tab".to_string()),
        "\r" | "\n" | "\x1bOM" => return Some("enter".to_string()),
        "\x00" => return Some("ctrl+space".to_string()),
        "\x7f" | "\x08" => return Some("backspace".to_string()),
        "\x1b\r" => return Some("alt+enter".to_string()),
        "\x1b\x7f" | "\x1b\x08" => return Some("alt+backspace".to_string()),
        "\x1bb" => return Some("alt+left".to_string()),
        "\x1bf" => return Some("alt+right".to_string()),
        _ => {}
    }

    let bytes = data.as_bytes();
    if bytes.len() == 2 && bytes[0] == 0x1b && bytes[1].is_ascii_lowercase() {
        return Some(format!("alt+{}", bytes[1] as char));
    }
    if bytes.len() == 1 && (1..=26).contains(&bytes[0]) {
        return Some(format!("ctrl+{}", (bytes[0] + 96) as char));
    }

    None
}

fn legacy_sequence_key_id(data: &str) -> Option<&'static str> {
    let key_id = match data {
        "\x1b[A" | "\x1bOA" => "up",
        "\x1b[B" | "\x1bOB" => "down",
        "\x1b[C" | "\x1bOC" => "right",
        "\x1b[D" | "\x1bOD" => "left",
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => "home",
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => "end",
        "\x1b[2~" => "insert",
        "\x1b[3~" => "delete",
        "\x1b[5~" => "pageUp",
        "\x1b[6~" => "pageDown",
        "\x1b[Z" => "shift+tab",
        _ => return None,
    };
    Some(key_id)
}

/// `CSI 1;<mod> <final>` and `CSI <num>;<mod> ~` forms.
fn modified_csi_key_id(data: &str) -> Option<String> {
    let body = data.strip_prefix("\x1b[")?;
    let final_char = body.chars().last()?;
    let params = &body[..body.len() - final_char.len_utf8()];
    let (number, modifier) = params.split_once(';')?;
    let modifier: u8 = modifier.parse().ok()?;
    let modifier = modifier.checked_sub(1)?;

    let key_name = match (final_char, number) {
        ('A', "1") => "up",
        ('B', "1") => "down",
        ('C', "1") => "right",
        ('D', "1") => "left",
        ('H', "1") => "home",
        ('F', "1") => "end",
        ('~', "3") => "delete",
        ('~', "5") => "pageUp",
        ('~', "6") => "pageDown",
        _ => return None,
    };

    let mut mods = Vec::new();
    if modifier & MOD_SHIFT != 0 {
        mods.push("shift");
    }
    if modifier & MOD_CTRL != 0 {
        mods.push("ctrl");
    }
    if modifier & MOD_ALT != 0 {
        mods.push("alt");
    }
    if mods.is_empty() {
        return Some(key_name.to_string());
    }
    Some(format!("{}+{key_name}", mods.join("+")))
}
