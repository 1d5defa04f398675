//! Overflow-driven pagination: place groups one after another, size them, and
//! move a group to the next page with a frame break when it does not fit.

use crate::compose::keep_names_together;
use crate::error::Error;
use crate::fit::{FitParams, SizingTarget, fit_coupled, fit_longest_line, fit_paragraph};
use crate::model::{ParagraphRole, RenderGroup};
use crate::surface::{Advance, LineCount, OverflowQuery, ParagraphId, PointSize, TextFlow};

/// Per-group placement state. Every group starts in `Placing` and ends in
/// `Done`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementState {
    Placing,
    Overflowed,
    Advancing,
    Sizing,
    Done,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaginateOptions {
    pub fit: FitParams,
    pub sizing: SizingTarget,
    pub keep_names_together: bool,
    /// Call [`TextFlow::checkpoint`] every this many placed groups; 0 disables.
    pub checkpoint_interval: usize,
}

impl Default for PaginateOptions {
    fn default() -> Self {
        Self {
            fit: FitParams::default(),
            sizing: SizingTarget::default(),
            keep_names_together: true,
            checkpoint_interval: 50,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationReport {
    pub groups_placed: usize,
    pub empty_groups: usize,
    pub frame_breaks: usize,
    pub failed_breaks: usize,
    pub pages_added: usize,
    pub pages_reused: usize,
    pub checkpoints: usize,
}

/// Paragraphs created on the surface for one group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlacedGroup {
    pub spacer: Option<ParagraphId>,
    pub demographics: Option<ParagraphId>,
    pub disease: Option<ParagraphId>,
    pub names: Option<ParagraphId>,
}

impl PlacedGroup {
    /// Where a frame break for this group goes.
    pub fn first(&self) -> Option<ParagraphId> {
        self.spacer
            .or(self.demographics)
            .or(self.disease)
            .or(self.names)
    }

    fn text_ids(&self) -> impl Iterator<Item = ParagraphId> {
        [self.demographics, self.disease, self.names]
            .into_iter()
            .flatten()
    }
}

fn place_group<S: TextFlow>(
    surface: &mut S,
    group: &RenderGroup,
    after_previous: bool,
    options: &PaginateOptions,
) -> PlacedGroup {
    let mut placed = PlacedGroup {
        spacer: after_previous.then(|| surface.append_paragraph(ParagraphRole::Spacer, "")),
        ..PlacedGroup::default()
    };
    for (role, text) in group.lines() {
        match role {
            ParagraphRole::Demographics => {
                placed.demographics = Some(surface.append_paragraph(role, text));
            }
            ParagraphRole::Disease => {
                placed.disease = Some(surface.append_paragraph(role, text));
            }
            ParagraphRole::Names => {
                let id = if options.keep_names_together {
                    surface.append_paragraph(role, &keep_names_together(text))
                } else {
                    surface.append_paragraph(role, text)
                };
                placed.names = Some(id);
            }
            ParagraphRole::Spacer => {}
        }
    }
    placed
}

/// Size the demographic and disease lines of a placed group. Names lines keep
/// their style size. Returns the chosen size, if anything was sized.
pub fn size_group<S>(
    surface: &mut S,
    placed: &PlacedGroup,
    target: SizingTarget,
    params: &FitParams,
) -> Option<f32>
where
    S: LineCount + OverflowQuery + PointSize,
{
    let candidates: Vec<ParagraphId> = [placed.demographics, placed.disease]
        .into_iter()
        .flatten()
        .collect();
    if candidates.is_empty() {
        return None;
    }

    let longest_line = match target {
        SizingTarget::LongestLine => true,
        SizingTarget::Paragraph => false,
        SizingTarget::Adaptive => candidates
            .iter()
            .any(|&id| surface.line_count(id).is_some_and(|n| n > 1)),
    };
    if longest_line {
        return fit_longest_line(surface, &candidates, params);
    }

    match (placed.disease, placed.demographics) {
        (Some(disease), Some(demographics)) => {
            Some(fit_coupled(surface, disease, demographics, params))
        }
        (Some(id), None) | (None, Some(id)) => Some(fit_paragraph(surface, id, params)),
        (None, None) => None,
    }
}

fn group_contents<S: TextFlow>(surface: &S, placed: &PlacedGroup) -> String {
    placed
        .text_ids()
        .filter_map(|id| surface.contents(id))
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Place every group on `surface`, in order.
///
/// A group that overflows its frame is moved, whole, to the next frame behind
/// a frame break; groups placed earlier never move. When a break cannot be
/// inserted the failure is logged and the group stays where it is.
pub fn paginate<S: TextFlow>(
    surface: &mut S,
    groups: &[RenderGroup],
    options: &PaginateOptions,
) -> Result<PaginationReport, Error> {
    let t0 = std::time::Instant::now();
    let mut report = PaginationReport::default();

    for (idx, group) in groups.iter().enumerate() {
        if group.is_empty() {
            log::debug!("Group {}: no fields present, skipped", idx + 1);
            report.empty_groups += 1;
            continue;
        }

        let mut placed = PlacedGroup::default();
        let mut sized = false;
        let mut state = PlacementState::Placing;

        while state != PlacementState::Done {
            state = match state {
                PlacementState::Placing => {
                    placed = place_group(surface, group, report.groups_placed > 0, options);
                    if surface.overflows() {
                        PlacementState::Overflowed
                    } else {
                        PlacementState::Sizing
                    }
                }
                PlacementState::Overflowed => {
                    let Some(first) = placed.first() else {
                        break;
                    };
                    match surface.insert_frame_break(first) {
                        Ok(()) => {
                            report.frame_breaks += 1;
                            PlacementState::Advancing
                        }
                        Err(err) => {
                            log::warn!(
                                "Group {}: {err}; left unbroken: {}",
                                idx + 1,
                                group_contents(surface, &placed)
                            );
                            report.failed_breaks += 1;
                            if sized {
                                PlacementState::Done
                            } else {
                                PlacementState::Sizing
                            }
                        }
                    }
                }
                PlacementState::Advancing => {
                    match surface.advance() {
                        Advance::NewPage => report.pages_added += 1,
                        Advance::ExistingPage => report.pages_reused += 1,
                    }
                    log::debug!(
                        "Group {}: moved to frame {}",
                        idx + 1,
                        surface.frame_count()
                    );
                    if sized {
                        PlacementState::Done
                    } else {
                        PlacementState::Sizing
                    }
                }
                PlacementState::Sizing => {
                    let size = size_group(surface, &placed, options.sizing, &options.fit);
                    sized = true;
                    if let Some(size) = size {
                        log::debug!("Group {}: sized to {size}pt", idx + 1);
                    }
                    if surface.overflows() {
                        PlacementState::Overflowed
                    } else {
                        PlacementState::Done
                    }
                }
                PlacementState::Done => PlacementState::Done,
            };
        }

        report.groups_placed += 1;

        if options.checkpoint_interval > 0 && report.groups_placed % options.checkpoint_interval == 0
        {
            surface.checkpoint()?;
            report.checkpoints += 1;
            log::info!("Checkpoint after {} groups", report.groups_placed);
        }
    }

    log::info!(
        "Paginated {} groups into {} frames in {:.1}ms ({} frame breaks, {} failed)",
        report.groups_placed,
        surface.frame_count(),
        t0.elapsed().as_secs_f64() * 1000.0,
        report.frame_breaks,
        report.failed_breaks,
    );

    Ok(report)
}
