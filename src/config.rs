use std::path::PathBuf;

use crate::error::Error;
use crate::fit::{FitConstraint, FitParams, SearchStrategy, SizingTarget};
use crate::paginate::PaginateOptions;

/// Everything a run needs. The CLI fills this from its flags; library callers
/// start from [`Config::default`] and override what they need.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// DOCX template; the built-in US Letter template when `None`.
    pub template: Option<PathBuf>,
    pub data: PathBuf,
    pub output: PathBuf,
    /// Stop after this many records. `None` and `Some(0)` read them all.
    pub max_records: Option<usize>,
    pub coarse_increment: f32,
    pub fine_increment: f32,
    pub max_point_size: f32,
    pub min_point_size: f32,
    pub group_spacing: f32,
    pub checkpoint_interval: usize,
    pub strategy: SearchStrategy,
    pub constraint: FitConstraint,
    pub sizing: SizingTarget,
    pub keep_names_together: bool,
    /// Measure with built-in Helvetica metrics instead of system fonts.
    pub builtin_fonts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: None,
            data: PathBuf::from("data.txt"),
            output: PathBuf::from("cell-lines.pdf"),
            max_records: None,
            coarse_increment: 2.0,
            fine_increment: 0.25,
            max_point_size: 48.0,
            min_point_size: 16.0,
            group_spacing: 15.0,
            checkpoint_interval: 50,
            strategy: SearchStrategy::default(),
            constraint: FitConstraint::default(),
            sizing: SizingTarget::default(),
            keep_names_together: true,
            builtin_fonts: false,
        }
    }
}

fn positive(name: &str, value: f32) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::Config(format!("{name} must be a positive number, got {value}")))
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        positive("fine increment", self.fine_increment)?;
        positive("coarse increment", self.coarse_increment)?;
        positive("max point size", self.max_point_size)?;
        positive("min point size", self.min_point_size)?;
        if self.min_point_size > self.max_point_size {
            return Err(Error::Config(format!(
                "min point size {} is larger than max point size {}",
                self.min_point_size, self.max_point_size
            )));
        }
        if !self.group_spacing.is_finite() || self.group_spacing < 0.0 {
            return Err(Error::Config(format!(
                "group spacing must not be negative, got {}",
                self.group_spacing
            )));
        }
        Ok(())
    }

    pub fn fit_params(&self) -> FitParams {
        FitParams {
            strategy: self.strategy,
            constraint: self.constraint,
            fine_increment: self.fine_increment,
            coarse_increment: self.coarse_increment,
            max_point_size: self.max_point_size,
        }
    }

    pub fn paginate_options(&self) -> PaginateOptions {
        PaginateOptions {
            fit: self.fit_params(),
            sizing: self.sizing,
            keep_names_together: self.keep_names_together,
            checkpoint_interval: self.checkpoint_interval,
        }
    }
}
