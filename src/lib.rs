use indicatif::*;

pub mod epidemic_model;
pub mod error;
pub mod misc_types;
pub mod stats_methods;
pub mod json_parsing;
pub mod replicates;
pub mod simulate;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn indication_bar(len: u64) -> ProgressBar
{
    // for indication on when it is finished
    let bar = ProgressBar::new(len);
    bar.set_style(ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise} - {eta_precise}] {wide_bar}"));
    bar
}
