//! ANSI escape sequence parsing.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiCodeKind {
    Csi,
    Osc,
    Ss3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsiCode {
    pub code: String,
    pub length: usize,
    pub kind: AnsiCodeKind,
}

/// Extract the escape sequence starting at byte `pos`, if there is a complete one.
pub fn extract_ansi_code(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    if pos + 1 >= bytes.len() || bytes[pos] != 0x1b {
        return None;
    }

    match bytes[pos + 1] {
        b'[' => extract_csi(input, pos),
        b']' => extract_osc(input, pos),
        b'O' => extract_ss3(input, pos),
        _ => None,
    }
}

fn code_at(input: &str, pos: usize, end: usize, kind: AnsiCodeKind) -> AnsiCode {
    AnsiCode {
        code: input[pos..end].to_string(),
        length: end - pos,
        kind,
    }
}

fn extract_csi(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    let final_idx = (pos + 2..bytes.len()).find(|&idx| (0x40..=0x7e).contains(&bytes[idx]))?;
    Some(code_at(input, pos, final_idx + 1, AnsiCodeKind::Csi))
}

/// OSC sequences end with BEL or ST (`ESC \`).
fn extract_osc(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if bytes[idx] == 0x07 {
            return Some(code_at(input, pos, idx + 1, AnsiCodeKind::Osc));
        }
        if bytes[idx] == 0x1b && bytes.get(idx + 1) == Some(&b'\\') {
            return Some(code_at(input, pos, idx + 2, AnsiCodeKind::Osc));
        }
        idx += 1;
    }
    None
}

fn extract_ss3(input: &str, pos: usize) -> Option<AnsiCode> {
    let end = pos + 3;
    if end > input.len() || !input.is_char_boundary(end) {
        return None;
    }
    Some(code_at(input, pos, end, AnsiCodeKind::Ss3))
}

/// Remove every complete escape sequence from `input`.
pub fn strip_ansi(input: &str) -> String {
    let mut clean = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(code) = extract_ansi_code(input, idx) {
            idx += code.length;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        clean.push(ch);
        idx += ch.len_utf8();
    }
    clean
}

#[cfg(test)]
mod tests {
    use super::{extract_ansi_code, strip_ansi, AnsiCodeKind};

    #[test]
    fn extracts_sgr_sequence() {
        let code = extract_ansi_code("\x1b[31mred", 0).expect("csi");
        assert_eq!(code.code, "\x1b[31m");
        assert_eq!(code.length, 5);
        assert_eq!(code.kind, AnsiCodeKind::Csi);
    }

    #[test]
    fn incomplete_csi_is_not_a_code() {
        assert_eq!(extract_ansi_code("\x1b[31", 0), None);
    }

    #[test]
    fn osc_accepts_bel_and_st_terminators() {
        let bel = extract_ansi_code("\x1b]8;;x\x07", 0).expect("bel");
        assert_eq!(bel.kind, AnsiCodeKind::Osc);
        let st = extract_ansi_code("\x1b]8;;x\x1b\\", 0).expect("st");
        assert_eq!(st.length, 8);
    }

    #[test]
    fn strip_removes_styles_only() {
        assert_eq!(strip_ansi("\x1b[1m참고한 메일\x1b[22m"), "참고한 메일");
    }
}
