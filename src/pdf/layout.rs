use pdf_writer::{Content, Name, Str};

use crate::fonts::{FontEntry, FontMetrics};
use crate::model::Alignment;

/// One word placed on a line. Words are separated by ASCII spaces only, so a
/// no-break space keeps its neighbours in the same word.
#[derive(Clone, Debug)]
pub(super) struct WordChunk {
    pub(super) text: String,
    pub(super) x_offset: f32,
    pub(super) width: f32,
}

#[derive(Clone, Debug, Default)]
pub(super) struct TextLine {
    pub(super) chunks: Vec<WordChunk>,
    pub(super) total_width: f32,
}

impl TextLine {
    pub(super) fn text(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn finish_line(chunks: &mut Vec<WordChunk>) -> TextLine {
    let total_width = chunks.last().map(|c| c.x_offset + c.width).unwrap_or(0.0);
    TextLine {
        chunks: std::mem::take(chunks),
        total_width,
    }
}

/// Greedy word wrap. A word wider than `max_width` gets a line of its own and
/// overhangs the measure.
pub(super) fn build_lines(
    text: &str,
    metrics: &FontMetrics,
    font_size: f32,
    max_width: f32,
) -> Vec<TextLine> {
    let space_w = metrics.space_width(font_size);
    let mut lines = Vec::new();
    let mut current: Vec<WordChunk> = Vec::new();
    let mut current_x = 0.0f32;

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let width = metrics.text_width(word, font_size);
        let x = if current.is_empty() {
            0.0
        } else {
            current_x + space_w
        };
        if !current.is_empty() && x + width > max_width {
            lines.push(finish_line(&mut current));
            current_x = 0.0;
        } else {
            current_x = x;
        }
        current.push(WordChunk {
            text: word.to_string(),
            x_offset: current_x,
            width,
        });
        current_x += width;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(finish_line(&mut current));
    }
    lines
}

/// Draw laid-out lines, starting at `first_baseline_y` and stepping down by
/// `line_pitch`.
#[allow(clippy::too_many_arguments)]
pub(super) fn render_lines(
    content: &mut Content,
    lines: &[TextLine],
    alignment: Alignment,
    margin_left: f32,
    text_width: f32,
    first_baseline_y: f32,
    line_pitch: f32,
    font: &FontEntry,
    font_size: f32,
    color: Option<[u8; 3]>,
) {
    if lines.iter().all(|l| l.chunks.is_empty()) {
        return;
    }

    match color {
        Some([r, g, b]) => content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0),
        None => content.set_fill_gray(0.0),
    };

    let last_line_idx = lines.len().saturating_sub(1);
    content.begin_text();
    content.set_font(Name(font.pdf_name.as_bytes()), font_size);

    let mut td_x = 0.0f32;
    let mut td_y = 0.0f32;
    for (line_num, line) in lines.iter().enumerate() {
        let y = first_baseline_y - line_num as f32 * line_pitch;

        let is_justified =
            alignment == Alignment::Justify && line_num != last_line_idx && line.chunks.len() > 1;
        let line_start_x = match alignment {
            Alignment::Center => margin_left + (text_width - line.total_width) / 2.0,
            Alignment::Right => margin_left + text_width - line.total_width,
            Alignment::Left | Alignment::Justify => margin_left,
        };
        let extra_per_gap = if is_justified {
            (text_width - line.total_width) / (line.chunks.len() - 1) as f32
        } else {
            0.0
        };

        for (chunk_idx, chunk) in line.chunks.iter().enumerate() {
            let x = line_start_x + chunk.x_offset + chunk_idx as f32 * extra_per_gap;
            // Td is relative to the previous line start.
            content.next_line(x - td_x, y - td_y);
            td_x = x;
            td_y = y;
            content.show(Str(&font.encode(&chunk.text)));
        }
    }
    content.end_text();
}
