mod common;

use cellflow_pdf::Error;
use cellflow_pdf::fit::SizingTarget;
use cellflow_pdf::model::{ParagraphRole, RenderGroup};
use cellflow_pdf::paginate::{PaginateOptions, paginate};
use cellflow_pdf::surface::{LineCount, ParagraphId, PointSize, TextFlow};
use common::{MockSurface, group};

/// Ten-character demographic and disease lines plus a one-character names
/// line. On a 100pt measure both size lines settle at 20pt, so a sized group
/// is 24 + 24 + 12 = 60pt tall (50.4pt before sizing).
fn sized_group(i: usize) -> RenderGroup {
    group(
        Some(&format!("demo-{i:05}")),
        Some(&format!("dis--{i:05}")),
        Some("n"),
    )
}

fn options() -> PaginateOptions {
    PaginateOptions {
        checkpoint_interval: 0,
        ..PaginateOptions::default()
    }
}

#[test]
fn groups_that_fit_stay_on_the_first_frame() {
    common::init_logger();
    let mut surface = MockSurface::new(100.0, 10_000.0);
    let groups: Vec<RenderGroup> = (0..8).map(sized_group).collect();
    let report = paginate(&mut surface, &groups, &options()).unwrap();

    assert_eq!(report.groups_placed, 8);
    assert_eq!(report.frame_breaks, 0);
    assert_eq!(report.pages_added, 0);
    assert_eq!(surface.frame_count(), 1);
    assert_eq!(surface.pages, 1);
    assert_eq!(surface.frame_texts(0).len(), 24);
}

#[test]
fn overflowing_group_moves_whole_to_the_next_frame() {
    common::init_logger();
    // Two sized groups plus a spacer take 130pt; the third does not fit in 180pt.
    let mut surface = MockSurface::new(100.0, 180.0);
    let groups: Vec<RenderGroup> = (0..5).map(sized_group).collect();
    let report = paginate(&mut surface, &groups, &options()).unwrap();

    assert_eq!(report.groups_placed, 5);
    assert_eq!(report.frame_breaks, 2);
    assert_eq!(report.pages_added, 2);
    assert_eq!(report.failed_breaks, 0);
    assert_eq!(surface.frame_count(), 3);

    let expect = |ids: &[usize]| -> Vec<String> {
        ids.iter()
            .flat_map(|&i| {
                [
                    format!("demo-{i:05}"),
                    format!("dis--{i:05}"),
                    "n".to_string(),
                ]
            })
            .collect()
    };
    assert_eq!(surface.frame_texts(0), expect(&[0, 1]));
    assert_eq!(surface.frame_texts(1), expect(&[2, 3]));
    assert_eq!(surface.frame_texts(2), expect(&[4]));
}

#[test]
fn earlier_groups_keep_their_place_and_size() {
    let mut surface = MockSurface::new(100.0, 180.0);
    let groups: Vec<RenderGroup> = (0..3).map(sized_group).collect();
    paginate(&mut surface, &groups, &options()).unwrap();

    // Group 0 is paragraphs 0..3, group 1 is spacer 3 then 4..7.
    for id in [0, 1, 4, 5] {
        assert_eq!(surface.frame_of(ParagraphId(id)), Some(0));
        assert_eq!(surface.point_size(ParagraphId(id)), 20.0);
    }
    // Group 2 starts with its spacer at paragraph 7, which opens frame 1.
    assert!(surface.paras[7].break_before);
    assert_eq!(surface.paras[7].role, ParagraphRole::Spacer);
    for id in 7..11 {
        assert_eq!(surface.frame_of(ParagraphId(id)), Some(1));
    }
    assert_eq!(surface.paras.len(), 11);
}

#[test]
fn template_pages_are_reused_before_new_ones_are_added() {
    let mut surface = MockSurface::new(100.0, 180.0);
    surface.pages = 2;
    let groups: Vec<RenderGroup> = (0..5).map(sized_group).collect();
    let report = paginate(&mut surface, &groups, &options()).unwrap();
    assert_eq!(report.pages_reused, 1);
    assert_eq!(report.pages_added, 1);
    assert_eq!(surface.pages, 3);
}

#[test]
fn break_at_frame_start_is_logged_and_skipped() {
    common::init_logger();
    // Each group is taller than the frame on its own.
    let mut surface = MockSurface::new(100.0, 30.0);
    let groups: Vec<RenderGroup> = (0..2).map(sized_group).collect();
    let report = paginate(&mut surface, &groups, &options()).unwrap();

    assert_eq!(report.groups_placed, 2);
    assert_eq!(report.frame_breaks, 1);
    assert_eq!(report.failed_breaks, 3);
    assert_eq!(surface.frame_count(), 2);
    assert_eq!(surface.frame_of(ParagraphId(0)), Some(0));
    assert_eq!(surface.frame_of(ParagraphId(3)), Some(1));
}

#[test]
fn empty_groups_are_skipped_without_a_spacer() {
    let mut surface = MockSurface::new(100.0, 10_000.0);
    let groups = vec![
        RenderGroup::default(),
        sized_group(0),
        RenderGroup::default(),
        sized_group(1),
    ];
    let report = paginate(&mut surface, &groups, &options()).unwrap();
    assert_eq!(report.empty_groups, 2);
    assert_eq!(report.groups_placed, 2);
    let spacers = surface
        .paras
        .iter()
        .filter(|p| p.role == ParagraphRole::Spacer)
        .count();
    assert_eq!(spacers, 1);
    assert_eq!(surface.paras[0].role, ParagraphRole::Demographics);
}

#[test]
fn names_lines_get_no_break_spaces_when_enabled() {
    let mut surface = MockSurface::new(100.0, 10_000.0);
    let groups = vec![group(None, None, Some("Hep G2; liver"))];
    paginate(&mut surface, &groups, &options()).unwrap();
    assert_eq!(surface.paras[0].text, "Hep\u{a0}G2; liver");

    let mut surface = MockSurface::new(100.0, 10_000.0);
    let opts = PaginateOptions {
        keep_names_together: false,
        ..options()
    };
    paginate(&mut surface, &groups, &opts).unwrap();
    assert_eq!(surface.paras[0].text, "Hep G2; liver");
}

#[test]
fn names_lines_keep_their_style_size() {
    let mut surface = MockSurface::new(100.0, 10_000.0);
    paginate(&mut surface, &[sized_group(0)], &options()).unwrap();
    assert_eq!(surface.point_size(ParagraphId(2)), 10.0);
}

#[test]
fn longest_line_target_applies_one_size_to_both_lines() {
    let mut surface = MockSurface::new(100.0, 10_000.0);
    let opts = PaginateOptions {
        sizing: SizingTarget::LongestLine,
        ..options()
    };
    let groups = vec![group(Some("xxxxxxxxxx"), Some("with xxxxxxx"), None)];
    paginate(&mut surface, &groups, &opts).unwrap();
    // The 12-character disease line is widest: 16.5pt is the last single-line size.
    assert_eq!(surface.point_size(ParagraphId(0)), 16.5);
    assert_eq!(surface.point_size(ParagraphId(1)), 16.5);
}

#[test]
fn adaptive_target_grows_a_group_whose_disease_line_already_wraps() {
    let mut surface = MockSurface::new(100.0, 10_000.0);
    // 14 characters at 16pt are 112pt wide, so the disease line breaks after
    // "with". Its widest line, the 9-character word, fills the measure at 22pt.
    let groups = vec![group(Some("xxxx"), Some("with xxxxxxxxx"), None)];
    paginate(&mut surface, &groups, &options()).unwrap();
    assert_eq!(surface.point_size(ParagraphId(0)), 22.0);
    assert_eq!(surface.point_size(ParagraphId(1)), 22.0);
    assert_eq!(surface.line_count(ParagraphId(1)), Some(2));
    assert!(!surface.overhangs(ParagraphId(1)));
}

#[test]
fn adaptive_target_measures_the_widest_line_across_both_paragraphs() {
    let mut surface = MockSurface::new(100.0, 10_000.0);
    // The single-line demographic text (96pt) is wider than either line of
    // the wrapped disease text, so it caps the group at 16.5pt.
    let groups = vec![group(Some("xxxxxxxxxxxx"), Some("with xxxxxxxxx"), None)];
    paginate(&mut surface, &groups, &options()).unwrap();
    assert_eq!(surface.point_size(ParagraphId(0)), 16.5);
    assert_eq!(surface.point_size(ParagraphId(1)), 16.5);
    assert_eq!(surface.line_count(ParagraphId(0)), Some(1));
}

#[test]
fn checkpoints_follow_the_interval() {
    let mut surface = MockSurface::new(100.0, 10_000.0);
    let groups: Vec<RenderGroup> = (0..7).map(sized_group).collect();
    let opts = PaginateOptions {
        checkpoint_interval: 3,
        ..PaginateOptions::default()
    };
    let report = paginate(&mut surface, &groups, &opts).unwrap();
    assert_eq!(report.checkpoints, 2);
    assert_eq!(surface.checkpoints, 2);
}

#[test]
fn checkpoint_failure_stops_the_run() {
    let mut surface = MockSurface::new(100.0, 10_000.0);
    surface.fail_checkpoint = true;
    let groups: Vec<RenderGroup> = (0..3).map(sized_group).collect();
    let opts = PaginateOptions {
        checkpoint_interval: 1,
        ..PaginateOptions::default()
    };
    let err = paginate(&mut surface, &groups, &opts).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(surface.paras.len(), 3);
}
