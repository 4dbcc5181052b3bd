//! Line breaking, overflow and alignment over a pluggable measurer.

use crate::foundation::error::TesseraResult;
use crate::text::model::{Overflow, Text, TextAlign, TextStyle, VerticalAlign};

pub const ELLIPSIS: &str = "\u{2026}";

/// Horizontal advance of shaped text.
pub trait TextMeasure {
    /// Width of `text` in `style`, including `letter_spacing` after every character.
    fn advance(&mut self, text: &str, style: &TextStyle, letter_spacing: f64) -> TesseraResult<f64>;
}

/// A word or whitespace segment placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub text: String,
    /// Index into [`TextLayout::styles`].
    pub run: usize,
    pub x: f64,
    pub width: f64,
    pub space: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub pieces: Vec<Piece>,
    pub width: f64,
}

impl Line {
    fn push(&mut self, piece: Piece) {
        self.width += piece.width;
        self.pieces.push(piece);
    }

    fn trim_trailing_space(&mut self) {
        while let Some(p) = self.pieces.last()
            && p.space
        {
            self.width -= p.width;
            self.pieces.pop();
        }
    }

    pub fn text(&self) -> String {
        self.pieces.iter().map(|p| p.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<Line>,
    pub styles: Vec<TextStyle>,
    pub line_height: f64,
    /// Canvas size.
    pub width: f64,
    pub height: f64,
    /// Vertical offset of the first line inside the canvas.
    pub top: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegKind {
    Word,
    Space,
    Newline,
}

fn segments(text: &str) -> Vec<(SegKind, &str)> {
    let class = |c: char| match c {
        '\n' => SegKind::Newline,
        c if c.is_whitespace() => SegKind::Space,
        _ => SegKind::Word,
    };
    let mut out = Vec::new();
    let mut start = 0;
    let mut current: Option<SegKind> = None;
    for (i, c) in text.char_indices() {
        if c == '\r' {
            continue;
        }
        let k = class(c);
        match current {
            Some(cur) if cur == k && k != SegKind::Newline => {}
            Some(cur) => {
                out.push((cur, text[start..i].trim_end_matches('\r')));
                start = i;
                current = Some(k);
            }
            None => {
                start = i;
                current = Some(k);
            }
        }
    }
    if let Some(cur) = current {
        out.push((cur, text[start..].trim_end_matches('\r')));
    }
    out
}

/// Break, truncate and align `text` into positioned lines.
pub fn layout_text(text: &Text, measure: &mut dyn TextMeasure) -> TesseraResult<TextLayout> {
    let opts = &text.layout;
    let ls = opts.letter_spacing;
    let runs = text.runs();
    let styles: Vec<TextStyle> = runs.iter().map(|(_, s)| (*s).clone()).collect();

    let mut lines = vec![Line::default()];
    let mut soft_wrapped = false;
    for (run, (content, style)) in runs.iter().enumerate() {
        for (kind, seg) in segments(content) {
            let cur = lines.len() - 1;
            match kind {
                SegKind::Newline => {
                    lines.push(Line::default());
                    soft_wrapped = false;
                }
                SegKind::Space => {
                    if soft_wrapped && lines[cur].pieces.is_empty() {
                        continue;
                    }
                    let width = measure.advance(seg, style, ls)?;
                    lines[cur].push(Piece {
                        text: seg.to_owned(),
                        run,
                        x: 0.0,
                        width,
                        space: true,
                    });
                }
                SegKind::Word => {
                    let width = measure.advance(seg, style, ls)?;
                    if let Some(bw) = opts.width
                        && !lines[cur].pieces.is_empty()
                        && lines[cur].width + width > bw
                    {
                        lines[cur].trim_trailing_space();
                        lines.push(Line::default());
                        soft_wrapped = true;
                    }
                    let cur = lines.len() - 1;
                    lines[cur].push(Piece {
                        text: seg.to_owned(),
                        run,
                        x: 0.0,
                        width,
                        space: false,
                    });
                }
            }
        }
    }

    let max_size = styles.iter().map(|s| f64::from(s.size)).fold(0.0, f64::max);
    let line_height = if opts.line_height <= 3.0 {
        opts.line_height * max_size
    } else {
        opts.line_height
    };

    if let Some(max_h) = opts.max_height
        && opts.overflow != Overflow::Visible
    {
        let max_lines = ((max_h / line_height).floor() as usize).max(1);
        let truncated = lines.len() > max_lines;
        lines.truncate(max_lines);
        if opts.overflow == Overflow::Ellipsis
            && let Some(last) = lines.last_mut()
        {
            let too_wide = opts.width.is_some_and(|bw| last.width > bw);
            if truncated || too_wide {
                let fallback = styles.len() - 1;
                ellipsize(last, &styles, fallback, opts.width, ls, measure)?;
            }
        }
    }

    let widest = lines.iter().map(|l| l.width).fold(0.0, f64::max);
    let box_w = opts.width.unwrap_or(widest);
    let last = lines.len() - 1;
    for (i, line) in lines.iter_mut().enumerate() {
        align_line(line, opts.align, box_w, i == last);
    }

    let content_h = lines.len() as f64 * line_height;
    let box_h = opts.max_height.unwrap_or(content_h);
    let top = match opts.vertical_align {
        VerticalAlign::Top => 0.0,
        VerticalAlign::Middle => ((box_h - content_h) / 2.0).max(0.0),
        VerticalAlign::Bottom => (box_h - content_h).max(0.0),
    };
    let height = if opts.overflow == Overflow::Visible {
        box_h.max(content_h)
    } else {
        box_h
    };

    Ok(TextLayout {
        lines,
        styles,
        line_height,
        width: box_w,
        height,
        top,
    })
}

fn ellipsize(
    line: &mut Line,
    styles: &[TextStyle],
    fallback_run: usize,
    box_width: Option<f64>,
    ls: f64,
    measure: &mut dyn TextMeasure,
) -> TesseraResult<()> {
    let run = line.pieces.last().map(|p| p.run).unwrap_or(fallback_run);
    let ellipsis_w = measure.advance(ELLIPSIS, &styles[run], ls)?;

    if let Some(bw) = box_width {
        while line.width + ellipsis_w > bw {
            let Some(piece) = line.pieces.last_mut() else {
                break;
            };
            piece.text.pop();
            if piece.text.is_empty() {
                line.width -= piece.width;
                line.pieces.pop();
                continue;
            }
            let width = measure.advance(&piece.text, &styles[piece.run], ls)?;
            line.width += width - piece.width;
            piece.width = width;
        }
    }
    line.trim_trailing_space();
    line.push(Piece {
        text: ELLIPSIS.to_owned(),
        run,
        x: 0.0,
        width: ellipsis_w,
        space: false,
    });
    Ok(())
}

fn align_line(line: &mut Line, align: TextAlign, box_w: f64, is_last: bool) {
    let slack = (box_w - line.width).max(0.0);
    let gaps = line
        .pieces
        .iter()
        .enumerate()
        .filter(|(i, p)| p.space && *i > 0 && *i + 1 < line.pieces.len())
        .count();
    let (mut x, extra) = match align {
        TextAlign::Left => (0.0, 0.0),
        TextAlign::Center => (slack / 2.0, 0.0),
        TextAlign::Right => (slack, 0.0),
        TextAlign::Justify if !is_last && gaps > 0 => (0.0, slack / gaps as f64),
        TextAlign::Justify => (0.0, 0.0),
    };
    let n = line.pieces.len();
    for (i, piece) in line.pieces.iter_mut().enumerate() {
        piece.x = x;
        x += piece.width;
        if piece.space && i > 0 && i + 1 < n {
            piece.width += extra;
            x += extra;
        }
    }
    if extra > 0.0 {
        line.width = box_w;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/layout.rs"]
mod tests;
