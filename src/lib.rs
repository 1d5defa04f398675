pub mod compose;
pub mod config;
pub mod data;
mod error;
pub mod fit;
pub mod fonts;
pub mod model;
pub mod paginate;
pub mod pdf;
pub mod surface;
pub mod template;

pub use config::Config;
pub use error::{Error, SurfaceError};
pub use paginate::PaginationReport;
pub use pdf::PdfSurface;
pub use template::Template;

use std::time::Instant;

use fonts::FontBook;

/// Outcome of one [`run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub records: usize,
    pub pages: usize,
    pub output_bytes: usize,
    pub pagination: PaginationReport,
}

/// Read the data file, typeset every record into the template and write the
/// PDF to `config.output`.
pub fn run(config: &Config) -> Result<RunReport, Error> {
    config.validate()?;
    let t0 = Instant::now();

    let records = data::read_data_file(&config.data, config.max_records)?;
    let groups = compose::compose_groups(&records);
    let t_read = t0.elapsed();

    let template = match &config.template {
        Some(path) => Template::open(path)?,
        None => Template::builtin(),
    };
    let fonts = if config.builtin_fonts {
        FontBook::builtin(&template)
    } else {
        FontBook::system(&template)
    };
    log::info!(
        "Point sizes: min={} max={} (search starts at each style's size)",
        config.min_point_size,
        config.max_point_size,
    );
    let mut surface = PdfSurface::new(template, fonts)?
        .with_group_spacing(config.group_spacing)
        .with_checkpoint_path(&config.output);
    let t_setup = t0.elapsed();

    let pagination = paginate::paginate(&mut surface, &groups, &config.paginate_options())?;
    let t_paginate = t0.elapsed();

    let bytes = pdf::render(&surface)?;
    std::fs::write(&config.output, &bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: read={:.1}ms, setup={:.1}ms, paginate={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_read.as_secs_f64() * 1000.0,
        (t_setup - t_read).as_secs_f64() * 1000.0,
        (t_paginate - t_setup).as_secs_f64() * 1000.0,
        (t_total - t_paginate).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(RunReport {
        records: records.len(),
        pages: surface.page_count(),
        output_bytes: bytes.len(),
        pagination,
    })
}
