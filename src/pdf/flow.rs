use std::path::{Path, PathBuf};

use crate::error::{Error, SurfaceError};
use crate::fonts::FontBook;
use crate::model::{FrameBounds, ParagraphRole};
use crate::surface::{Advance, LineCount, OverflowQuery, ParagraphId, PointSize, TextFlow};
use crate::template::Template;

use super::layout::{TextLine, build_lines};

/// Content may exceed the frame by this much before it counts as overflowing.
const OVERFLOW_EPSILON: f32 = 0.01;

pub(super) struct Paragraph {
    pub(super) role: ParagraphRole,
    pub(super) text: String,
    pub(super) point_size: f32,
    pub(super) frame_break_before: bool,
    pub(super) lines: Vec<TextLine>,
}

/// Vertical placement of one paragraph inside its frame, as offsets from the
/// frame top.
#[derive(Clone, Copy, Debug)]
pub(super) struct Slot {
    pub(super) index: usize,
    pub(super) first_baseline: f32,
    pub(super) line_pitch: f32,
    pub(super) bottom: f32,
}

/// A text-flow engine that lays paragraphs into one margin-filling frame per
/// page and writes the result as PDF.
///
/// The paragraphs form a single story. Frame `i` sits on page `i` and holds the
/// paragraphs from `frame_starts[i]` up to the next frame's start; the last
/// frame runs to the first pending frame break, and anything after that break
/// is overset until [`TextFlow::advance`] opens a new frame for it.
pub struct PdfSurface {
    pub(super) template: Template,
    pub(super) fonts: FontBook,
    group_spacing: f32,
    checkpoint_path: Option<PathBuf>,
    pub(super) paragraphs: Vec<Paragraph>,
    frame_starts: Vec<usize>,
    page_count: usize,
    measure: f32,
}

impl PdfSurface {
    pub fn new(template: Template, fonts: FontBook) -> Result<Self, Error> {
        let bounds = template.geometry.frame_bounds(0);
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(Error::InvalidTemplate(format!(
                "margins leave no room for text ({:.1}x{:.1}pt)",
                bounds.width(),
                bounds.height()
            )));
        }
        let page_count = template.initial_pages.max(1);
        Ok(Self {
            template,
            fonts,
            group_spacing: 15.0,
            checkpoint_path: None,
            paragraphs: Vec::new(),
            frame_starts: vec![0],
            page_count,
            measure: bounds.width(),
        })
    }

    /// Vertical room taken by a spacer paragraph that does not start a frame.
    pub fn with_group_spacing(mut self, spacing: f32) -> Self {
        self.group_spacing = spacing;
        self
    }

    /// Where [`TextFlow::checkpoint`] writes the PDF. Without one, checkpoints
    /// are no-ops.
    pub fn with_checkpoint_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_path = Some(path.into());
        self
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Frame holding the paragraph, if it is placed in one.
    pub fn frame_of(&self, id: ParagraphId) -> Option<usize> {
        (0..self.frame_starts.len()).find(|&f| self.frame_range(f).contains(&id.0))
    }

    pub fn frame_bounds(&self, frame: usize) -> FrameBounds {
        self.template.geometry.frame_bounds(frame)
    }

    /// Render the document and write it to `path`.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let bytes = super::render(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn current_frame(&self) -> usize {
        self.frame_starts.len() - 1
    }

    pub(super) fn frame_range(&self, frame: usize) -> std::ops::Range<usize> {
        let start = self.frame_starts[frame];
        let end = match self.frame_starts.get(frame + 1) {
            Some(&next) => next,
            None => self.paragraphs[start.min(self.paragraphs.len())..]
                .iter()
                .skip(1)
                .position(|p| p.frame_break_before)
                .map(|i| start + 1 + i)
                .unwrap_or(self.paragraphs.len()),
        };
        start..end
    }

    /// Stack the frame's paragraphs from the top. The first line of a frame
    /// hangs from its cap height; a spacer at the top of a frame takes no room.
    pub(super) fn layout_frame(&self, frame: usize) -> Vec<Slot> {
        let mut slots = Vec::new();
        let mut cursor = 0.0f32;
        let mut at_top = true;
        for index in self.frame_range(frame) {
            let para = &self.paragraphs[index];
            if para.role == ParagraphRole::Spacer {
                if !at_top {
                    cursor += self.group_spacing;
                }
                slots.push(Slot {
                    index,
                    first_baseline: cursor,
                    line_pitch: 0.0,
                    bottom: cursor,
                });
                continue;
            }

            let style = self.template.style(para.role);
            let metrics = self.fonts.metrics(para.role);
            let size = para.point_size;
            if !at_top {
                cursor += style.space_before;
            }
            let line_pitch = metrics.line_height(size);
            let first_baseline = cursor
                + if at_top {
                    metrics.cap_height(size)
                } else {
                    metrics.ascent(size)
                };
            let descent = line_pitch - metrics.ascent(size);
            let bottom = first_baseline
                + para.lines.len().saturating_sub(1) as f32 * line_pitch
                + descent;
            slots.push(Slot {
                index,
                first_baseline,
                line_pitch,
                bottom,
            });
            cursor = bottom + style.space_after;
            at_top = false;
        }
        slots
    }

    /// Whether the paragraph's last line falls below the current frame.
    fn is_overset(&self, index: usize) -> bool {
        let height = self.frame_bounds(self.current_frame()).height();
        self.layout_frame(self.current_frame())
            .iter()
            .find(|s| s.index == index)
            .is_none_or(|s| s.bottom > height + OVERFLOW_EPSILON)
    }

    fn measurable(&self, id: ParagraphId) -> Option<&Paragraph> {
        if !self.frame_range(self.current_frame()).contains(&id.0) || self.is_overset(id.0) {
            return None;
        }
        self.paragraphs.get(id.0)
    }

    fn relayout(&mut self, index: usize) {
        let measure = self.measure;
        let para = &self.paragraphs[index];
        let lines = if para.role == ParagraphRole::Spacer {
            Vec::new()
        } else {
            build_lines(&para.text, self.fonts.metrics(para.role), para.point_size, measure)
        };
        self.paragraphs[index].lines = lines;
    }
}

impl OverflowQuery for PdfSurface {
    fn overflows(&self) -> bool {
        let frame = self.current_frame();
        if self.frame_range(frame).end < self.paragraphs.len() {
            return true;
        }
        let height = self.frame_bounds(frame).height();
        self.layout_frame(frame)
            .iter()
            .any(|s| s.bottom > height + OVERFLOW_EPSILON)
    }
}

impl LineCount for PdfSurface {
    fn line_count(&self, id: ParagraphId) -> Option<usize> {
        self.measurable(id).map(|p| p.lines.len())
    }

    fn lines(&self, id: ParagraphId) -> Option<Vec<String>> {
        self.measurable(id)
            .map(|p| p.lines.iter().map(TextLine::text).collect())
    }

    fn widest_line(&self, id: ParagraphId) -> Option<(usize, f32)> {
        let para = self.paragraphs.get(id.0)?;
        Some(
            para.lines
                .iter()
                .map(|l| l.total_width)
                .enumerate()
                .fold((0, 0.0f32), |best, (i, w)| if w > best.1 { (i, w) } else { best }),
        )
    }

    fn overhangs(&self, id: ParagraphId) -> bool {
        self.paragraphs.get(id.0).is_some_and(|p| {
            p.lines
                .iter()
                .any(|l| l.total_width > self.measure + OVERFLOW_EPSILON)
        })
    }
}

impl PointSize for PdfSurface {
    fn point_size(&self, id: ParagraphId) -> f32 {
        self.paragraphs.get(id.0).map_or(0.0, |p| p.point_size)
    }

    fn set_point_size(&mut self, id: ParagraphId, size: f32) {
        let Some(para) = self.paragraphs.get_mut(id.0) else {
            return;
        };
        para.point_size = size;
        self.relayout(id.0);
    }
}

impl TextFlow for PdfSurface {
    fn append_paragraph(&mut self, role: ParagraphRole, text: &str) -> ParagraphId {
        let index = self.paragraphs.len();
        self.paragraphs.push(Paragraph {
            role,
            text: text.to_string(),
            point_size: self.template.style(role).font_size,
            frame_break_before: false,
            lines: Vec::new(),
        });
        self.relayout(index);
        ParagraphId(index)
    }

    fn contents(&self, id: ParagraphId) -> Option<String> {
        self.paragraphs.get(id.0).map(|p| p.text.clone())
    }

    fn insert_frame_break(&mut self, before: ParagraphId) -> Result<(), SurfaceError> {
        let range = self.frame_range(self.current_frame());
        if before.0 == range.start {
            return Err(SurfaceError::BreakAtFrameStart(before.0));
        }
        if !range.contains(&before.0) {
            return Err(SurfaceError::NotInCurrentFrame(before.0));
        }
        self.paragraphs[before.0].frame_break_before = true;
        Ok(())
    }

    fn advance(&mut self) -> Advance {
        let current = self.current_frame();
        let next_start = self.frame_range(current).end;
        self.frame_starts.push(next_start);
        if current + 1 >= self.page_count {
            self.page_count += 1;
            Advance::NewPage
        } else {
            Advance::ExistingPage
        }
    }

    fn frame_count(&self) -> usize {
        self.frame_starts.len()
    }

    fn checkpoint(&mut self) -> Result<(), Error> {
        let Some(path) = &self.checkpoint_path else {
            return Ok(());
        };
        self.save(path)?;
        log::debug!("Checkpoint written to {}", path.display());
        Ok(())
    }
}
