//! Line terminator detection for file content.
//!
//! Files are stored internally with `\n` only. The dominant terminator of the
//! source is remembered so saving writes the same convention back.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Cr,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::Crlf => "\r\n",
        }
    }

    /// Convention used for files created from scratch.
    pub fn platform() -> Self {
        if cfg!(windows) {
            LineEnding::Crlf
        } else {
            LineEnding::Lf
        }
    }
}

/// Content rewritten to `\n` terminators plus what was found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detected {
    pub text: String,
    pub ending: LineEnding,
    /// More than one terminator style occurred.
    pub mixed: bool,
}

/// Rewrite every CRLF / CR / LF in `input` to LF and report the majority
/// style. Ties prefer CRLF, then LF, then CR. Input without any terminator
/// reports `fallback`.
pub fn detect(input: &str, fallback: LineEnding) -> Detected {
    let mut text = String::with_capacity(input.len());
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                crlf += 1;
                text.push('\n');
            }
            '\r' => {
                cr += 1;
                text.push('\n');
            }
            '\n' => {
                lf += 1;
                text.push('\n');
            }
            other => text.push(other),
        }
    }
    let mut ending = fallback;
    let mut best = 0;
    for (style, count) in [
        (LineEnding::Crlf, crlf),
        (LineEnding::Lf, lf),
        (LineEnding::Cr, cr),
    ] {
        if count > best {
            best = count;
            ending = style;
        }
    }
    let styles_seen = [crlf, lf, cr].iter().filter(|n| **n > 0).count();
    Detected {
        text,
        ending,
        mixed: styles_seen > 1,
    }
}

/// Join rune lines with `ending`. No terminator follows the last line, so a
/// trailing terminator is only written when the buffer ends with an empty line.
pub fn join_lines(lines: &[Vec<char>], ending: LineEnding) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push_str(ending.as_str());
        }
        out.extend(line.iter());
    }
    out
}
