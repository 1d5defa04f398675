//! Auto-fit sizing: grow a paragraph's point size until it stops fitting its
//! constraint, then settle on the last size that fit.

use crate::surface::{LineCount, OverflowQuery, ParagraphId, PointSize};

/// Sizes are never corrected below this while fixing up a coupled paragraph.
const SMALLEST_POINT_SIZE: f32 = 1.0;

/// Slack for comparing sizes built from repeated float increments.
const SIZE_EPSILON: f32 = 1e-3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Grow by the fine increment; step back once on the first violation.
    #[default]
    FineStep,
    /// Grow by the coarse increment, then shrink by the fine increment until
    /// the constraint holds again.
    CoarseThenFine,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FitConstraint {
    /// Violated when the target spans more than one line.
    #[default]
    SingleLine,
    /// Violated when the target's first line no longer holds the text it held
    /// before the search started, i.e. a word was pushed to the next line.
    StableFirstLine,
}

/// Which paragraphs of a group the paginator sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizingTarget {
    /// The disease line (coupled with the demographic line), or the
    /// demographic line alone when there is no disease line.
    Paragraph,
    /// The widest single line of the demographic and disease paragraphs; the
    /// result is applied to both.
    LongestLine,
    /// `LongestLine` when either line already wraps at its style size,
    /// `Paragraph` otherwise.
    #[default]
    Adaptive,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitParams {
    pub strategy: SearchStrategy,
    pub constraint: FitConstraint,
    pub fine_increment: f32,
    pub coarse_increment: f32,
    pub max_point_size: f32,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::FineStep,
            constraint: FitConstraint::SingleLine,
            fine_increment: 0.25,
            coarse_increment: 2.0,
            max_point_size: 48.0,
        }
    }
}

impl FitParams {
    /// Both increments must be positive and the ceiling finite, or a search
    /// would never terminate.
    pub fn is_usable(&self) -> bool {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        positive(self.fine_increment)
            && positive(self.coarse_increment)
            && self.max_point_size.is_finite()
    }
}

/// What a search watches on its target.
enum Check {
    SingleLine,
    /// First line as it was broken before the search.
    StableFirstLine(Option<String>),
    /// Words of the widest line, which must stay together on one line.
    LineIntact(Option<Vec<String>>),
}

/// The fit predicate for one target. Baselines are captured once so the same
/// test is applied across the whole search.
struct Watch {
    id: ParagraphId,
    check: Check,
    watch_overflow: bool,
}

impl Watch {
    fn new<S: LineCount>(
        surface: &S,
        id: ParagraphId,
        constraint: FitConstraint,
        watch_overflow: bool,
    ) -> Self {
        let check = match constraint {
            FitConstraint::SingleLine => Check::SingleLine,
            FitConstraint::StableFirstLine => Check::StableFirstLine(surface.first_line(id)),
        };
        Self {
            id,
            check,
            watch_overflow,
        }
    }

    fn widest_line<S: LineCount>(surface: &S, id: ParagraphId, line: usize) -> Self {
        let run = surface
            .lines(id)
            .and_then(|lines| lines.into_iter().nth(line))
            .map(|text| words(&text));
        Self {
            id,
            check: Check::LineIntact(run),
            watch_overflow: true,
        }
    }

    /// An unmeasurable target counts as overset, which is a violation. So
    /// does a line running past the frame edge.
    fn violated<S: LineCount + OverflowQuery>(&self, surface: &S) -> bool {
        if self.watch_overflow && surface.overflows() {
            return true;
        }
        if surface.overhangs(self.id) {
            return true;
        }
        match &self.check {
            Check::SingleLine => surface.line_count(self.id).is_none_or(|n| n > 1),
            Check::StableFirstLine(baseline) => match (baseline, surface.first_line(self.id)) {
                (Some(before), Some(now)) => *before != now,
                _ => true,
            },
            Check::LineIntact(baseline) => match (baseline, surface.lines(self.id)) {
                (Some(run), Some(lines)) => !lines.iter().any(|l| holds_run(&words(l), run)),
                _ => true,
            },
        }
    }
}

fn words(line: &str) -> Vec<String> {
    line.split(' ')
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

fn holds_run(line: &[String], run: &[String]) -> bool {
    run.is_empty() || line.windows(run.len()).any(|w| w == run)
}

fn fine_step<S>(surface: &mut S, watch: &Watch, floor: f32, max: f32, fine: f32) -> f32
where
    S: LineCount + OverflowQuery + PointSize,
{
    let at = |steps: u32| floor + steps as f32 * fine;
    let mut steps = 0u32;
    loop {
        if watch.violated(surface) {
            steps = steps.saturating_sub(1);
            break;
        }
        if at(steps + 1) > max + SIZE_EPSILON {
            break;
        }
        steps += 1;
        surface.set_point_size(watch.id, at(steps));
    }
    at(steps)
}

fn coarse_then_fine<S>(
    surface: &mut S,
    watch: &Watch,
    floor: f32,
    max: f32,
    params: &FitParams,
) -> f32
where
    S: LineCount + OverflowQuery + PointSize,
{
    let mut size = floor;
    while size < max && !watch.violated(surface) {
        size = (size + params.coarse_increment).min(max);
        surface.set_point_size(watch.id, size);
    }
    while size > floor && watch.violated(surface) {
        size = (size - params.fine_increment).max(floor);
        surface.set_point_size(watch.id, size);
    }
    // Land on the fine grid anchored at the starting size, so the result never
    // exceeds what the fine-step search finds.
    let steps = ((size - floor) / params.fine_increment + SIZE_EPSILON).floor();
    floor + steps * params.fine_increment
}

fn search<S>(surface: &mut S, watch: &Watch, params: &FitParams) -> f32
where
    S: LineCount + OverflowQuery + PointSize,
{
    let floor = surface.point_size(watch.id);
    let max = params.max_point_size.max(floor);
    let size = match params.strategy {
        SearchStrategy::FineStep => fine_step(surface, watch, floor, max, params.fine_increment),
        SearchStrategy::CoarseThenFine => coarse_then_fine(surface, watch, floor, max, params),
    };
    surface.set_point_size(watch.id, size);
    size
}

/// Grow one paragraph to the largest size that still satisfies the
/// constraint. The paragraph's current size is the floor of the search.
pub fn fit_paragraph<S>(surface: &mut S, id: ParagraphId, params: &FitParams) -> f32
where
    S: LineCount + OverflowQuery + PointSize,
{
    if !params.is_usable() {
        log::warn!("fit parameters {params:?} cannot be searched, keeping the current size");
        return surface.point_size(id);
    }
    let watch = Watch::new(surface, id, params.constraint, false);
    search(surface, &watch, params)
}

/// Size `primary`, give `secondary` the same size, and shrink both while
/// `secondary` wraps or runs past the frame edge.
pub fn fit_coupled<S>(
    surface: &mut S,
    primary: ParagraphId,
    secondary: ParagraphId,
    params: &FitParams,
) -> f32
where
    S: LineCount + OverflowQuery + PointSize,
{
    if !params.is_usable() {
        log::warn!("fit parameters {params:?} cannot be searched, keeping the current size");
        return surface.point_size(primary);
    }
    let mut size = fit_paragraph(surface, primary, params);
    surface.set_point_size(secondary, size);

    while (surface.line_count(secondary).is_some_and(|n| n > 1) || surface.overhangs(secondary))
        && size - params.fine_increment >= SMALLEST_POINT_SIZE
    {
        size -= params.fine_increment;
        surface.set_point_size(secondary, size);
        surface.set_point_size(primary, size);
    }
    size
}

/// Find the widest single line across `ids` and grow its paragraph while that
/// line stays whole inside the frame and the surface does not overflow. The
/// result is applied to all of `ids`.
///
/// Works whether or not the paragraphs already wrap: only the widest line is
/// watched, so a paragraph spanning several lines at its starting size can
/// still grow.
pub fn fit_longest_line<S>(surface: &mut S, ids: &[ParagraphId], params: &FitParams) -> Option<f32>
where
    S: LineCount + OverflowQuery + PointSize,
{
    let (target, line, _) = ids
        .iter()
        .filter_map(|&id| surface.widest_line(id).map(|(line, width)| (id, line, width)))
        .max_by(|a, b| a.2.total_cmp(&b.2))?;

    if !params.is_usable() {
        log::warn!("fit parameters {params:?} cannot be searched, keeping the current size");
        return Some(surface.point_size(target));
    }

    let watch = Watch::widest_line(surface, target, line);
    let size = search(surface, &watch, params);
    for &id in ids {
        surface.set_point_size(id, size);
    }
    Some(size)
}
