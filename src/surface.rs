//! Capability traits for the rendering surface the paginator drives.
//!
//! The fit search only needs to measure and resize text, so it is written
//! against the small traits; the pagination loop needs the whole
//! [`TextFlow`] collaborator.

use crate::error::{Error, SurfaceError};
use crate::model::ParagraphRole;

/// Handle to a paragraph placed on a surface, in story order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParagraphId(pub usize);

/// What the surface did to give the paginator a fresh frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// The current page was the last one; a page was added.
    NewPage,
    /// A following page already existed and received the frame.
    ExistingPage,
}

pub trait OverflowQuery {
    /// True when the current frame's content exceeds its bounds.
    fn overflows(&self) -> bool;
}

pub trait LineCount {
    /// Number of lines the paragraph currently spans, or `None` when it
    /// cannot be measured (overset, or not on the surface).
    fn line_count(&self, id: ParagraphId) -> Option<usize>;

    /// Text of each line as currently broken, with `None` under the same
    /// conditions as [`LineCount::line_count`].
    fn lines(&self, id: ParagraphId) -> Option<Vec<String>>;

    /// Index and width (points) of the paragraph's widest line.
    fn widest_line(&self, id: ParagraphId) -> Option<(usize, f32)>;

    /// True when a line runs wider than the frame, e.g. a single word that
    /// cannot be broken.
    fn overhangs(&self, id: ParagraphId) -> bool;

    fn first_line(&self, id: ParagraphId) -> Option<String> {
        self.lines(id)?.into_iter().next()
    }

    /// Horizontal extent of the paragraph's widest line, in points.
    fn line_extent(&self, id: ParagraphId) -> Option<f32> {
        self.widest_line(id).map(|(_, width)| width)
    }
}

pub trait PointSize {
    fn point_size(&self, id: ParagraphId) -> f32;
    fn set_point_size(&mut self, id: ParagraphId, size: f32);
}

/// The layout collaborator: owns pages, frames and the paragraph story.
pub trait TextFlow: OverflowQuery + LineCount + PointSize {
    /// Append a paragraph at the end of the story, in the current frame.
    fn append_paragraph(&mut self, role: ParagraphRole, text: &str) -> ParagraphId;

    fn contents(&self, id: ParagraphId) -> Option<String>;

    /// Insert a frame break before `id`, so content from `id` onward moves
    /// into the next frame on [`TextFlow::advance`].
    fn insert_frame_break(&mut self, before: ParagraphId) -> Result<(), SurfaceError>;

    /// Start the next frame, on the following page. Content after the last
    /// frame break in the current frame moves into it.
    fn advance(&mut self) -> Advance;

    /// Number of frames (one per page) created so far.
    fn frame_count(&self) -> usize;

    /// Persist progress so far.
    fn checkpoint(&mut self) -> Result<(), Error>;
}
