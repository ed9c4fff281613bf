//! Final text cleanup of rendered Markdown.
//!
//! Works line by line and leaves fenced code untouched:
//! - byte order marks are dropped and tabs become four spaces
//! - non-breaking spaces leading a line are kept as `&nbsp;` (they carry indentation),
//!   all others become plain spaces
//! - trailing spaces are removed and runs of blank lines collapse to one
//! - the result ends with exactly one newline

/// Clean up a rendered note body.
pub fn finalize(text: &str) -> String {
    let text = text.replace('\u{feff}', "");
    let mut out: Vec<String> = Vec::new();
    let mut fence: Option<String> = None;
    let mut blank = false;

    for line in text.split('\n') {
        let trimmed = line.trim_start();

        if let Some(open) = &fence {
            if closes_fence(trimmed, open) {
                fence = None;
            }
            out.push(line.trim_end_matches(' ').to_string());
            blank = false;
            continue;
        }
        if let Some(marker) = fence_marker(trimmed) {
            fence = Some(marker);
            out.push(clean_line(line));
            blank = false;
            continue;
        }

        let cleaned = clean_line(line);
        if cleaned.is_empty() {
            if blank {
                continue;
            }
            blank = true;
        } else {
            blank = false;
        }
        out.push(cleaned);
    }

    let joined = out.join("\n");
    let body = joined.trim_start_matches('\n').trim_end();
    if body.is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    }
}

fn clean_line(line: &str) -> String {
    let line = line.replace('\t', "    ");
    if line.chars().all(|c| c == ' ' || c == '\u{a0}') {
        return String::new();
    }

    let mut cleaned = String::with_capacity(line.len());
    let mut leading = true;
    for c in line.chars() {
        match c {
            '\u{a0}' if leading => cleaned.push_str("&nbsp;"),
            '\u{a0}' => cleaned.push(' '),
            ' ' => cleaned.push(' '),
            c => {
                leading = false;
                cleaned.push(c);
            }
        }
    }
    cleaned.trim_end_matches(' ').to_string()
}

/// The backtick run opening a fenced code block.
fn fence_marker(line: &str) -> Option<String> {
    let run = line.chars().take_while(|c| *c == '`').count();
    (run >= 3).then(|| "`".repeat(run))
}

fn closes_fence(line: &str, open: &str) -> bool {
    let line = line.trim_end();
    line.len() >= open.len() && line.chars().all(|c| c == '`')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nbsp_handling() {
        assert_eq!(
            finalize("\u{a0}\u{a0}indented a\u{a0}b"),
            "&nbsp;&nbsp;indented a b\n"
        );
    }

    #[test]
    fn test_blank_runs_collapse_and_trailing_spaces_go() {
        assert_eq!(finalize("\u{feff}a  \n\n\n\n\tb\n\n"), "a\n\n    b\n");
    }

    #[test]
    fn test_code_is_untouched() {
        let text = "```bash\nx\u{a0}=\t1\n\n\n\ny\n```\n\n\n\nafter";
        assert_eq!(finalize(text), "```bash\nx\u{a0}=\t1\n\n\n\ny\n```\n\nafter\n");
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(finalize("\n \u{a0}\n"), "");
    }
}
