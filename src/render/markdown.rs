//! A small markdown reader for bot answers.
//!
//! Only the constructs the answering service actually produces are
//! recognized: paragraphs, unordered lists, thematic breaks, strong and
//! emphasis spans. Anything else (headings, tables, code fences, links, ...)
//! is kept as literal paragraph text. Parsing is total: every input yields a
//! block list, and unmatched delimiters are simply text.

use super::{Block, Inline};

/// Returns true for a thematic break such as `---`, `* * *` or `___`.
fn is_rule(line: &str) -> bool {
    let trimmed = line.trim();

    let marker = match trimmed.chars().next() {
        Some(c @ ('-' | '*' | '_')) => c,
        _ => return false,
    };

    let mut count = 0;

    for c in trimmed.chars() {
        if c == marker {
            count += 1;
        } else if c != ' ' && c != '\t' {
            return false;
        }
    }

    count >= 3
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Returns the item text if `line` opens an unordered list item.
fn list_item(line: &str) -> Option<&str> {
    if indent_of(line) > 3 {
        return None;
    }

    let rest = line.trim_start();
    let mut chars = rest.chars();

    match chars.next() {
        Some('-' | '*' | '+') => {}
        _ => return None,
    }

    let after = chars.as_str();

    if after.is_empty() {
        Some("")
    } else if after.starts_with(' ') || after.starts_with('\t') {
        Some(after.trim())
    } else {
        None
    }
}

enum Open {
    Nothing,
    Paragraph(Vec<String>),
    List(Vec<String>),
}

fn close(open: Open, blocks: &mut Vec<Block>) {
    match open {
        Open::Nothing => {}
        Open::Paragraph(lines) => blocks.push(Block::Paragraph(parse_inline(&lines.join(" ")))),
        Open::List(items) => blocks.push(Block::List(
            items.iter().map(|item| parse_inline(item)).collect(),
        )),
    }
}

/// Parses `text` into blocks. Never fails.
pub(crate) fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut open = Open::Nothing;

    for line in text.lines() {
        if line.trim().is_empty() {
            close(std::mem::replace(&mut open, Open::Nothing), &mut blocks);
            continue;
        }

        if is_rule(line) {
            close(std::mem::replace(&mut open, Open::Nothing), &mut blocks);
            blocks.push(Block::Rule);
            continue;
        }

        if let Some(item) = list_item(line) {
            match &mut open {
                Open::List(items) => items.push(item.to_string()),
                _ => {
                    close(std::mem::replace(&mut open, Open::Nothing), &mut blocks);
                    open = Open::List(vec![item.to_string()]);
                }
            }
            continue;
        }

        let content = line.trim();

        match &mut open {
            Open::Paragraph(lines) => lines.push(content.to_string()),
            // Indented lines continue the previous item.
            Open::List(items) if indent_of(line) >= 2 => {
                if let Some(last) = items.last_mut() {
                    if !last.is_empty() {
                        last.push(' ');
                    }
                    last.push_str(content);
                }
            }
            _ => {
                close(std::mem::replace(&mut open, Open::Nothing), &mut blocks);
                open = Open::Paragraph(vec![content.to_string()]);
            }
        }
    }

    close(open, &mut blocks);

    blocks
}

fn push_text(spans: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }

    if let Some(Inline::Text(prev)) = spans.last_mut() {
        prev.push_str(text);
    } else {
        spans.push(Inline::Text(text.to_string()));
    }
}

fn is_word_char(c: Option<char>) -> bool {
    c.map_or(false, |c| c.is_alphanumeric())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delim {
    StrongEmphasisStar,
    StrongEmphasisUnderscore,
    StrongStar,
    StrongUnderscore,
    EmphasisStar,
    EmphasisUnderscore,
}

impl Delim {
    fn of(marker: u8, run: usize) -> Delim {
        match (marker, run) {
            (b'*', 3) => Delim::StrongEmphasisStar,
            (_, 3) => Delim::StrongEmphasisUnderscore,
            (b'*', 2) => Delim::StrongStar,
            (_, 2) => Delim::StrongUnderscore,
            (b'*', _) => Delim::EmphasisStar,
            _ => Delim::EmphasisUnderscore,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Delim::StrongEmphasisStar => "***",
            Delim::StrongEmphasisUnderscore => "___",
            Delim::StrongStar => "**",
            Delim::StrongUnderscore => "__",
            Delim::EmphasisStar => "*",
            Delim::EmphasisUnderscore => "_",
        }
    }

    fn wrap(self, inner: Vec<Inline>) -> Inline {
        match self.as_str().len() {
            3 => Inline::Strong(vec![Inline::Emphasis(inner)]),
            2 => Inline::Strong(inner),
            _ => Inline::Emphasis(inner),
        }
    }
}

/// Whether `delim` found at byte `at` can close a span: it must not follow
/// whitespace, and a closing underscore must not sit inside a word.
fn closes_at(text: &str, at: usize, delim: Delim) -> bool {
    let before = text[..at].chars().next_back();
    let after = text[at + delim.as_str().len()..].chars().next();

    let after_space = before.map_or(true, char::is_whitespace);
    let intraword = delim.as_str().starts_with('_') && is_word_char(after);

    !after_space && !intraword
}

/// Searches for closing delimiters within one piece of inline text.
///
/// Whether a delimiter closes depends only on where it sits, so once a search
/// from some position has failed, every search from a later position fails
/// too. The earliest failed start is kept per delimiter, which keeps a text
/// full of unmatched markers linear to parse.
struct Closers<'t> {
    text: &'t str,
    exhausted: [Option<usize>; 6],
}

impl<'t> Closers<'t> {
    fn new(text: &'t str) -> Closers<'t> {
        Closers {
            text,
            exhausted: [None; 6],
        }
    }

    /// Finds the closing `delim` for a span whose content starts at `from`.
    /// The content must not be empty nor begin with whitespace.
    fn find(&mut self, from: usize, delim: Delim) -> Option<usize> {
        let rest = self.text.get(from..)?;

        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return None;
        }

        let slot = delim as usize;

        if self.exhausted[slot].map_or(false, |failed| from >= failed) {
            return None;
        }

        let pattern = delim.as_str();
        let mut search = from + 1;

        // Delimiters are ASCII, so stepping one byte past a match stays on a
        // character boundary.
        while let Some(offset) = self.text[search..].find(pattern) {
            let at = search + offset;

            if closes_at(self.text, at, delim) {
                return Some(at);
            }

            search = at + 1;
        }

        self.exhausted[slot] = Some(self.exhausted[slot].map_or(from, |f| f.min(from)));

        None
    }
}

/// Parses strong (`**`, `__`), emphasis (`*`, `_`) and combined (`***`,
/// `___`) spans. Underscore delimiters only open at word boundaries so that
/// identifiers such as `gdp_per_capita` stay untouched.
pub(crate) fn parse_inline(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut closers = Closers::new(text);
    let bytes = text.as_bytes();
    let mut i = 0;
    let mut seg_start = 0;

    'outer: while i < bytes.len() {
        let c = bytes[i];

        if c == b'*' || c == b'_' {
            let prev = text[..i].chars().next_back();

            if c == b'_' && is_word_char(prev) {
                // Intraword underscore: skip the whole run.
                while i < bytes.len() && bytes[i] == b'_' {
                    i += 1;
                }
                continue;
            }

            let run = bytes[i..].iter().take_while(|&&b| b == c).count();

            // Try the longest delimiter first, then fall back to shorter ones.
            for len in (1..=run.min(3)).rev() {
                let delim = Delim::of(c, len);

                if let Some(end) = closers.find(i + len, delim) {
                    push_text(&mut spans, &text[seg_start..i]);
                    spans.push(delim.wrap(parse_inline(&text[i + len..end])));
                    i = end + len;
                    seg_start = i;
                    continue 'outer;
                }
            }

            // Unmatched: skip the whole delimiter run as literal text.
            i += run;
            continue;
        }

        // Advance by one character (handle multi-byte safely).
        i += text[i..].chars().next().map_or(1, |c| c.len_utf8());
    }

    push_text(&mut spans, &text[seg_start..]);

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn test_paragraphs() {
        let blocks = parse("First line\nstill first.\n\nSecond.");

        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![text("First line still first.")]),
                Block::Paragraph(vec![text("Second.")]),
            ]
        );
    }

    #[test]
    fn test_strong_and_emphasis() {
        let spans = parse_inline("GDP grew **3.2%** in *2023*, per __GASTAT__ and _Vision 2030_.");

        assert_eq!(
            spans,
            vec![
                text("GDP grew "),
                Inline::Strong(vec![text("3.2%")]),
                text(" in "),
                Inline::Emphasis(vec![text("2023")]),
                text(", per "),
                Inline::Strong(vec![text("GASTAT")]),
                text(" and "),
                Inline::Emphasis(vec![text("Vision 2030")]),
                text("."),
            ]
        );
    }

    #[test]
    fn test_nested_spans() {
        let spans = parse_inline("**total *population* count**");

        assert_eq!(
            spans,
            vec![Inline::Strong(vec![
                text("total "),
                Inline::Emphasis(vec![text("population")]),
                text(" count"),
            ])]
        );
    }

    #[test]
    fn test_strong_emphasis_triple_delimiters() {
        assert_eq!(
            parse_inline("The ***total*** is 5"),
            vec![
                text("The "),
                Inline::Strong(vec![Inline::Emphasis(vec![text("total")])]),
                text(" is 5"),
            ]
        );

        assert_eq!(
            parse_inline("___all regions___"),
            vec![Inline::Strong(vec![Inline::Emphasis(vec![text("all regions")])])]
        );

        // Without a triple closer the run falls back to strong.
        assert_eq!(
            parse_inline("***total** only"),
            vec![
                Inline::Strong(vec![text("*total")]),
                text(" only"),
            ]
        );
    }

    #[test]
    fn test_unmatched_markers_parse_in_linear_time() {
        let inputs = [
            "*a ".repeat(20_000),
            "**a ".repeat(20_000),
            "_a ".repeat(20_000),
            "***a ".repeat(20_000),
        ];

        for input in &inputs {
            let started = std::time::Instant::now();
            let blocks = parse(input);

            assert_eq!(blocks.len(), 1);
            assert!(
                started.elapsed() < std::time::Duration::from_secs(2),
                "parsing {} bytes took {:?}",
                input.len(),
                started.elapsed()
            );
        }
    }

    #[test]
    fn test_unmatched_delimiters_are_literal() {
        assert_eq!(parse_inline("5 * 3 = 15"), vec![text("5 * 3 = 15")]);
        assert_eq!(parse_inline("**open ended"), vec![text("**open ended")]);
        assert_eq!(parse_inline("a ** b"), vec![text("a ** b")]);
        assert_eq!(parse_inline("*"), vec![text("*")]);
        assert_eq!(parse_inline(""), vec![]);
    }

    #[test]
    fn test_intraword_underscores() {
        assert_eq!(
            parse_inline("see gdp_per_capita and _x_"),
            vec![
                text("see gdp_per_capita and "),
                Inline::Emphasis(vec![text("x")]),
            ]
        );
    }

    #[test]
    fn test_lists() {
        let blocks = parse("Highlights:\n- **Riyadh**: 7.0M\n* Jeddah: 3.7M\n  (2022 census)\n+ Mecca\n\nDone.");

        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![text("Highlights:")]),
                Block::List(vec![
                    vec![Inline::Strong(vec![text("Riyadh")]), text(": 7.0M")],
                    vec![text("Jeddah: 3.7M (2022 census)")],
                    vec![text("Mecca")],
                ]),
                Block::Paragraph(vec![text("Done.")]),
            ]
        );
    }

    #[test]
    fn test_unindented_line_ends_list() {
        let blocks = parse("- one\nafter");

        assert_eq!(
            blocks,
            vec![
                Block::List(vec![vec![text("one")]]),
                Block::Paragraph(vec![text("after")]),
            ]
        );
    }

    #[test]
    fn test_rules() {
        let blocks = parse("Above\n---\n* * *\n___\nBelow");

        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![text("Above")]),
                Block::Rule,
                Block::Rule,
                Block::Rule,
                Block::Paragraph(vec![text("Below")]),
            ]
        );

        assert!(!is_rule("--"));
        assert!(!is_rule("-- x"));
        assert!(is_rule("  - - -  "));
    }

    #[test]
    fn test_unsupported_constructs_pass_through() {
        let answer = "**Population**\n\n| Year | Total |\n|------|-------|\n| 2022 | 32.2M |\n\n# Heading\n\nThanks for asking.";

        let blocks = parse(answer);

        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![Inline::Strong(vec![text("Population")])]),
                Block::Paragraph(vec![text(
                    "| Year | Total | |------|-------| | 2022 | 32.2M |"
                )]),
                Block::Paragraph(vec![text("# Heading")]),
                Block::Paragraph(vec![text("Thanks for asking.")]),
            ]
        );
    }

    #[test]
    fn test_multibyte_text() {
        let spans = parse_inline("الرياض **عاصمة** — ok");

        assert_eq!(
            spans,
            vec![
                text("الرياض "),
                Inline::Strong(vec![text("عاصمة")]),
                text(" — ok"),
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("\n \n").is_empty());
    }
}
