use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use cellflow_pdf::Config;
use cellflow_pdf::fit::{FitConstraint, SearchStrategy, SizingTarget};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Strategy {
    /// Grow in fine steps, step back on the first miss
    Fine,
    /// Grow in coarse steps, then shrink in fine steps
    CoarseFine,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Constraint {
    /// The line must not wrap
    SingleLine,
    /// The first line must keep the words it started with
    StableFirstLine,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Sizing {
    Paragraph,
    LongestLine,
    Adaptive,
}

/// Typeset tab-separated cell-line records into auto-sized, paginated PDF pages.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Tab-separated data file; the first row is a header
    data: PathBuf,

    /// Output PDF
    #[arg(short, long, default_value = "cell-lines.pdf")]
    output: PathBuf,

    /// DOCX template with page setup and the paragraph styles
    /// `age-population-sex`, `disease`, `names` and `space between`
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Stop after this many records (0 reads all)
    #[arg(short = 'n', long)]
    max_records: Option<usize>,

    #[arg(long, default_value_t = 0.25)]
    fine_increment: f32,

    #[arg(long, default_value_t = 2.0)]
    coarse_increment: f32,

    #[arg(long, default_value_t = 48.0)]
    max_point_size: f32,

    #[arg(long, default_value_t = 16.0)]
    min_point_size: f32,

    /// Space between record groups, in points
    #[arg(long, default_value_t = 15.0)]
    group_spacing: f32,

    /// Write the PDF every N records (0 disables)
    #[arg(long, default_value_t = 50)]
    checkpoint_interval: usize,

    #[arg(long, value_enum, default_value_t = Strategy::Fine)]
    strategy: Strategy,

    #[arg(long, value_enum, default_value_t = Constraint::SingleLine)]
    constraint: Constraint,

    #[arg(long, value_enum, default_value_t = Sizing::Adaptive)]
    sizing: Sizing,

    /// Let names lines wrap between words, not only after semicolons
    #[arg(long)]
    break_names: bool,

    /// Measure with built-in Helvetica metrics instead of system fonts
    #[arg(long)]
    builtin_fonts: bool,

    /// Append log lines to this file [default: $HOME/Logs/cellflow_log.txt]
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(long)]
    log_stderr: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            template: self.template.clone(),
            data: self.data.clone(),
            output: self.output.clone(),
            max_records: self.max_records,
            coarse_increment: self.coarse_increment,
            fine_increment: self.fine_increment,
            max_point_size: self.max_point_size,
            min_point_size: self.min_point_size,
            group_spacing: self.group_spacing,
            checkpoint_interval: self.checkpoint_interval,
            strategy: match self.strategy {
                Strategy::Fine => SearchStrategy::FineStep,
                Strategy::CoarseFine => SearchStrategy::CoarseThenFine,
            },
            constraint: match self.constraint {
                Constraint::SingleLine => FitConstraint::SingleLine,
                Constraint::StableFirstLine => FitConstraint::StableFirstLine,
            },
            sizing: match self.sizing {
                Sizing::Paragraph => SizingTarget::Paragraph,
                Sizing::LongestLine => SizingTarget::LongestLine,
                Sizing::Adaptive => SizingTarget::Adaptive,
            },
            keep_names_together: !self.break_names,
            builtin_fonts: self.builtin_fonts,
        }
    }
}

fn default_log_file() -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join("Logs").join("cellflow_log.txt")
}

fn init_logging(args: &Args) -> std::io::Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if !args.log_stderr {
        let path = args.log_file.clone().unwrap_or_else(default_log_file);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("Error: cannot open log file: {e}");
        return ExitCode::FAILURE;
    }

    let config = args.config();
    log::info!("Data file {}, output {}", config.data.display(), config.output.display());

    match cellflow_pdf::run(&config) {
        Ok(report) => {
            let p = &report.pagination;
            println!(
                "{} records -> {} pages ({} groups, {} frame breaks, {} failed, {} empty) -> {}",
                report.records,
                report.pages,
                p.groups_placed,
                p.frame_breaks,
                p.failed_breaks,
                p.empty_groups,
                config.output.display(),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
