//! Chord-annotated lyrics layout.
//!
//! Source lines look like `lyric text<CS>chord group`, where the chord
//! insertion marker `CI` inside the lyric text marks where each chord of the
//! group starts. Three layouts are supported; a layout that cannot render a
//! text (no `CS` anywhere) reports so and the caller moves on to the next.

use std::collections::VecDeque;

use crate::settings::RenderSettings;
use crate::tree::ChordMode;
use crate::xml::{XmlDocument, XmlNodeId};

const NBSP: char = '\u{a0}';

/// One source line carrying chords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineWithChords {
    pub text: String,
    /// Chord groups in source order, each a whitespace-separated token list.
    pub chords: Vec<String>,
}

impl LineWithChords {
    pub fn new(text: impl Into<String>, chords: Vec<String>) -> Self {
        Self {
            text: text.into(),
            chords,
        }
    }

    /// The first chord group, or an empty string.
    pub fn first_group(&self) -> &str {
        self.chords.first().map(String::as_str).unwrap_or("")
    }
}

/// A classified run of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Chorded(LineWithChords),
    /// Consecutive lines without chords.
    Plain(Vec<String>),
}

/// Split text into chorded lines and runs of plain lines.
pub fn identify_lines_with_chords(text: &str, separator: char) -> Vec<Line> {
    let mut out = Vec::new();
    let mut plain: Vec<String> = Vec::new();

    for line in text.split('\n') {
        let line = line.trim();
        if line.contains(separator) {
            if !plain.is_empty() {
                out.push(Line::Plain(std::mem::take(&mut plain)));
            }
            let mut segments = line.split(separator).map(str::trim);
            let lyric = segments.next().unwrap_or_default();
            let chords = segments.map(str::to_string).collect();
            out.push(Line::Chorded(LineWithChords::new(lyric, chords)));
        } else {
            plain.push(line.to_string());
        }
    }
    if !plain.is_empty() {
        out.push(Line::Plain(plain));
    }
    out
}

/// Render `text` into `parent` in `mode`, falling back ABOVE to BESIDE to
/// NONE. Returns the created paragraph and the mode actually used.
pub fn render_part(
    doc: &mut XmlDocument,
    parent: XmlNodeId,
    text: &str,
    mode: ChordMode,
    settings: &RenderSettings,
) -> (XmlNodeId, ChordMode) {
    let mut mode = mode;
    loop {
        let rendered = match mode {
            ChordMode::Above => write_chords_above(doc, parent, text, settings),
            ChordMode::Beside => write_chords_beside(doc, parent, text, settings),
            ChordMode::None => Some(write_without_chords(doc, parent, text, settings)),
        };
        if let Some(p) = rendered {
            return (p, mode);
        }
        match mode.fallback() {
            Some(next) => mode = next,
            None => return (write_without_chords(doc, parent, text, settings), ChordMode::None),
        }
    }
}

/// Chords stacked above the lyric fragment they start on.
///
/// Each chorded line becomes a two-row table. Returns `None` without
/// touching `doc` when the text has no chord separator.
pub fn write_chords_above(
    doc: &mut XmlDocument,
    parent: XmlNodeId,
    text: &str,
    settings: &RenderSettings,
) -> Option<XmlNodeId> {
    let text = text.trim();
    if !text.contains(settings.chord_separator) {
        return None;
    }

    let p = doc.add_element(parent, "p");
    for line in identify_lines_with_chords(text, settings.chord_separator) {
        match line {
            Line::Chorded(line) => {
                let cells = align_chords(&line, settings.chord_insertion);
                let table = doc.add_element(p, "table");
                let chord_row = doc.add_element(table, "tr");
                doc.set_attr(chord_row, "class", "chords_above");
                let text_row = doc.add_element(table, "tr");
                for (chord, lyric) in &cells {
                    doc.add_text_element(chord_row, "td", chord);
                    doc.add_text_element(text_row, "td", lyric);
                }
            }
            Line::Plain(lines) => write_spans(doc, p, &lines),
        }
    }
    Some(p)
}

/// Pair chord tokens with lyric chunks.
///
/// The chord list is padded with one empty token in front, since the first
/// chunk precedes the first chord. Surplus chunks trail the last lyric cell;
/// surplus chords share one final cell.
fn align_chords(line: &LineWithChords, insertion: char) -> Vec<(String, String)> {
    let mut chords: VecDeque<String> = std::iter::once(String::new())
        .chain(line.first_group().split_whitespace().map(str::to_string))
        .collect();
    let mut chunks: VecDeque<String> = line.text.split(insertion).map(str::to_string).collect();
    let mut cells: Vec<(String, String)> = Vec::new();

    loop {
        match (chords.pop_front(), chunks.pop_front()) {
            (None, None) => break,
            (Some(chord), Some(mut chunk)) => {
                if chunk.ends_with(' ') {
                    chunk.pop();
                    chunk.push(NBSP);
                }
                cells.push((chord, chunk));
            }
            (None, Some(chunk)) => {
                let rest: String = std::iter::once(chunk).chain(chunks.drain(..)).collect();
                match cells.last_mut() {
                    Some((_, last)) => {
                        if last.ends_with(NBSP) {
                            last.pop();
                            last.push(' ');
                        }
                        last.push_str(&rest);
                    }
                    None => cells.push((String::new(), rest)),
                }
                break;
            }
            (Some(chord), None) => {
                let rest: Vec<String> = std::iter::once(chord).chain(chords.drain(..)).collect();
                cells.push((rest.join(" "), String::new()));
                break;
            }
        }
    }
    cells
}

/// Lyrics in one column, the first chord group of each line in another.
///
/// Consecutive chorded lines share a table; a plain run in between closes it.
/// Returns `None` without touching `doc` when the text has no chord separator.
pub fn write_chords_beside(
    doc: &mut XmlDocument,
    parent: XmlNodeId,
    text: &str,
    settings: &RenderSettings,
) -> Option<XmlNodeId> {
    let text = text.trim();
    if !text.contains(settings.chord_separator) {
        return None;
    }

    let p = doc.add_element(parent, "p");
    let mut table: Option<XmlNodeId> = None;
    for line in identify_lines_with_chords(text, settings.chord_separator) {
        match line {
            Line::Chorded(line) => {
                let current = match table {
                    Some(t) => t,
                    None => {
                        let t = doc.add_element(p, "table");
                        doc.set_attr(t, "class", "chords_beside");
                        table = Some(t);
                        t
                    }
                };
                let tr = doc.add_element(current, "tr");
                let lyric = line.text.replace(settings.chord_insertion, "");
                doc.add_text_element(tr, "td", &lyric);
                let chords = doc.add_text_element(tr, "td", line.first_group());
                doc.set_attr(chords, "class", "chords");
            }
            Line::Plain(lines) => {
                table = None;
                write_spans(doc, p, &lines);
            }
        }
    }
    Some(p)
}

/// Lyrics only; chord groups and insertion markers are dropped.
pub fn write_without_chords(
    doc: &mut XmlDocument,
    parent: XmlNodeId,
    text: &str,
    settings: &RenderSettings,
) -> XmlNodeId {
    let lines: Vec<String> = text
        .trim()
        .split('\n')
        .map(|line| {
            line.trim()
                .split(settings.chord_separator)
                .next()
                .unwrap_or_default()
                .trim_end()
                .replace(settings.chord_insertion, "")
        })
        .collect();

    let p = doc.add_element(parent, "p");
    write_spans(doc, p, &lines);
    p
}

/// One span per line with a `<br/>` between lines.
fn write_spans(doc: &mut XmlDocument, p: XmlNodeId, lines: &[String]) {
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            doc.add_element(p, "br");
        }
        doc.add_text_element(p, "span", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::serialize_node;

    fn settings() -> RenderSettings {
        RenderSettings::default()
    }

    fn render(mode: ChordMode, text: &str) -> (String, ChordMode) {
        let mut doc = XmlDocument::new();
        let body = doc.add_element(doc.document(), "body");
        let (_, used) = render_part(&mut doc, body, text, mode, &settings());
        (serialize_node(&doc, body), used)
    }

    fn chorded(text: &str, chords: &[&str]) -> Line {
        Line::Chorded(LineWithChords::new(
            text,
            chords.iter().map(|c| c.to_string()).collect(),
        ))
    }

    #[test]
    fn test_identify_lines() {
        let lines = identify_lines_with_chords(
            "Line1>F E E D\nLine2>F E E D\nLine3\nLine4",
            '>',
        );
        assert_eq!(
            lines,
            vec![
                chorded("Line1", &["F E E D"]),
                chorded("Line2", &["F E E D"]),
                Line::Plain(vec!["Line3".into(), "Line4".into()]),
            ]
        );
    }

    #[test]
    fn test_identify_plain_runs_split_by_chorded_line() {
        let lines = identify_lines_with_chords("  a \nb>C\n c\nd\ne > G > Am", '>');
        assert_eq!(
            lines,
            vec![
                Line::Plain(vec!["a".into()]),
                chorded("b", &["C"]),
                Line::Plain(vec!["c".into(), "d".into()]),
                chorded("e", &["G", "Am"]),
            ]
        );
    }

    #[test]
    fn test_align_equal_counts() {
        let line = LineWithChords::new("Hello |world", vec!["C G".into()]);
        assert_eq!(
            align_chords(&line, '|'),
            vec![
                (String::new(), "Hello\u{a0}".to_string()),
                ("C".to_string(), "world".to_string()),
                ("G".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_align_trailing_space_becomes_nbsp() {
        let line = LineWithChords::new("Hello |wor|ld", vec!["C G".into()]);
        assert_eq!(
            align_chords(&line, '|'),
            vec![
                (String::new(), "Hello\u{a0}".to_string()),
                ("C".to_string(), "wor".to_string()),
                ("G".to_string(), "ld".to_string()),
            ]
        );
    }

    #[test]
    fn test_align_surplus_chunks_trail_last_cell() {
        let line = LineWithChords::new("Hello |world |again", vec!["C".into()]);
        assert_eq!(
            align_chords(&line, '|'),
            vec![
                (String::new(), "Hello\u{a0}".to_string()),
                ("C".to_string(), "world again".to_string()),
            ]
        );
    }

    #[test]
    fn test_align_surplus_chords_share_final_cell() {
        let line = LineWithChords::new("|Hey", vec!["C G Am F".into()]);
        assert_eq!(
            align_chords(&line, '|'),
            vec![
                (String::new(), String::new()),
                ("C".to_string(), "Hey".to_string()),
                ("G Am F".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_chords_above_markup() {
        let (xml, used) = render(ChordMode::Above, "Hello |world>C\nplain one\nplain two");
        assert_eq!(used, ChordMode::Above);
        assert_eq!(
            xml,
            "<body>\n  <p>\n    <table>\n      <tr class=\"chords_above\"><td/><td>C</td></tr>\n      <tr><td>Hello&#xA0;</td><td>world</td></tr>\n    </table>\n    <span>plain one</span>\n    <br/>\n    <span>plain two</span>\n  </p>\n</body>"
        );
    }

    #[test]
    fn test_chords_beside_shares_table_between_chorded_lines() {
        let (xml, used) = render(ChordMode::Beside, "a|b>C G\nc>D\nplain\nd>E");
        assert_eq!(used, ChordMode::Beside);
        assert_eq!(xml.matches("<table class=\"chords_beside\">").count(), 2);
        assert!(xml.contains("<tr><td>ab</td><td class=\"chords\">C G</td></tr>"));
        assert!(xml.contains("<tr><td>c</td><td class=\"chords\">D</td></tr>"));
        assert!(xml.contains("<span>plain</span>"));
    }

    #[test]
    fn test_without_chords_strips_markers() {
        let (xml, used) = render(ChordMode::None, "Hel|lo >C\nworld");
        assert_eq!(used, ChordMode::None);
        assert_eq!(
            xml,
            "<body>\n  <p>\n    <span>Hello</span>\n    <br/>\n    <span>world</span>\n  </p>\n</body>"
        );
    }

    #[test]
    fn test_fallback_is_transparent() {
        let text = "\n  First line\n  Second line\n";
        let (above, used_above) = render(ChordMode::Above, text);
        let (beside, used_beside) = render(ChordMode::Beside, text);
        let (none, _) = render(ChordMode::None, text);
        assert_eq!(above, none);
        assert_eq!(beside, none);
        assert_eq!(used_above, ChordMode::None);
        assert_eq!(used_beside, ChordMode::None);
    }
}
