mod common;

use std::path::PathBuf;

use cellflow_pdf::fit::SearchStrategy;
use cellflow_pdf::{Config, Error};
use common::{build_docx, paragraph_style};

const HEADER: &str = "Age\tPopulation\tSex\tDisease\tName\tSynonyms\tTissue of origin";

fn write_data(dir: &std::path::Path, rows: usize) -> PathBuf {
    let body: String = (0..rows)
        .map(|i| {
            format!(
                "{}\t{}\t{}\tlung adenocarcinoma\tPATIENT-{i}\tPT-{i} line\tlung\n",
                30 + i % 50,
                1 + i % 3,
                if i % 2 == 0 { "F" } else { "M" },
            )
        })
        .collect();
    let path = dir.join("data.txt");
    std::fs::write(&path, format!("{HEADER}\n{body}")).unwrap();
    path
}

fn config(dir: &std::path::Path, rows: usize) -> Config {
    Config {
        data: write_data(dir, rows),
        output: dir.join("out.pdf"),
        builtin_fonts: true,
        ..Config::default()
    }
}

#[test]
fn many_records_produce_a_multi_page_pdf() {
    common::init_logger();
    let dir = common::output_dir("end_to_end_builtin");
    let report = cellflow_pdf::run(&config(&dir, 40)).unwrap();

    assert_eq!(report.records, 40);
    assert_eq!(report.pagination.groups_placed, 40);
    assert!(report.pages > 1);

    let bytes = std::fs::read(dir.join("out.pdf")).unwrap();
    assert_eq!(bytes.len(), report.output_bytes);
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(common::count_pages(&bytes), report.pages);
}

#[test]
fn record_cap_and_coarse_search_are_honoured() {
    let dir = common::output_dir("end_to_end_capped");
    let config = Config {
        max_records: Some(5),
        strategy: SearchStrategy::CoarseThenFine,
        checkpoint_interval: 2,
        ..config(&dir, 40)
    };
    let report = cellflow_pdf::run(&config).unwrap();
    assert_eq!(report.records, 5);
    assert_eq!(report.pagination.checkpoints, 2);
}

#[test]
fn template_geometry_and_pages_are_used() {
    let dir = common::output_dir("end_to_end_template");
    let styles = vec![
        paragraph_style("agepopulationsex", "age-population-sex", "Helvetica", 14.0, true, false),
        paragraph_style("disease", "disease", "Helvetica", 14.0, false, false),
        paragraph_style("names", "names", "Helvetica", 9.0, false, true),
        paragraph_style("spacebetween", "space between", "Helvetica", 6.0, false, false),
    ];
    // A5 with one explicit page break: the template starts with two pages.
    let docx = build_docx(&styles, (8391, 11906), (720, 720, 720, 720), 1, true);
    let template_path = dir.join("template.docx");
    std::fs::write(&template_path, docx).unwrap();

    let config = Config {
        template: Some(template_path),
        ..config(&dir, 30)
    };
    let report = cellflow_pdf::run(&config).unwrap();
    assert!(report.pages >= 2);
    assert!(report.pagination.pages_reused <= 1);

    let bytes = std::fs::read(&config.output).unwrap();
    assert_eq!(common::count_pages(&bytes), report.pages);
}

#[test]
fn missing_data_file_fails_before_writing() {
    let dir = common::output_dir("end_to_end_missing");
    let output = dir.join("never.pdf");
    let _ = std::fs::remove_file(&output);
    let config = Config {
        data: dir.join("no-such-data.txt"),
        output: output.clone(),
        builtin_fonts: true,
        ..Config::default()
    };
    let err = cellflow_pdf::run(&config).unwrap_err();
    assert!(matches!(err, Error::DataFile { .. }));
    assert!(!output.exists());
}

#[test]
fn invalid_configuration_is_rejected() {
    let bad = [
        Config {
            fine_increment: 0.0,
            ..Config::default()
        },
        Config {
            coarse_increment: -2.0,
            ..Config::default()
        },
        Config {
            min_point_size: 60.0,
            ..Config::default()
        },
        Config {
            group_spacing: f32::NAN,
            ..Config::default()
        },
    ];
    for config in bad {
        assert!(matches!(config.validate(), Err(Error::Config(_))), "{config:?}");
    }
    assert!(Config::default().validate().is_ok());
}

#[test]
fn config_maps_onto_pagination_options() {
    let config = Config {
        fine_increment: 0.5,
        keep_names_together: false,
        checkpoint_interval: 7,
        ..Config::default()
    };
    let options = config.paginate_options();
    assert_eq!(options.fit.fine_increment, 0.5);
    assert_eq!(options.fit.max_point_size, 48.0);
    assert!(!options.keep_names_together);
    assert_eq!(options.checkpoint_interval, 7);
}
