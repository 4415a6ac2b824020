use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Configuration for the docx-report command line.
#[derive(Parser, Debug, Clone)]
#[command(name = "docx-report", version)]
#[command(about = "Merge report sections into Word templates and inspect templates")]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Export a report, merging into the template when one is given
    Export(ExportArgs),

    /// Print the style records extracted from a template as JSON
    Styles {
        /// Template document (.docx)
        #[arg(long, env = "REPORT_TEMPLATE")]
        template: PathBuf,
    },

    /// Print the heading outline of a template as JSON
    Outline {
        /// Template document (.docx)
        #[arg(long, env = "REPORT_TEMPLATE")]
        template: PathBuf,

        /// Print generated section records instead of the outline tree
        #[arg(long)]
        as_sections: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Template document (.docx); rendered without template when omitted
    #[arg(long, env = "REPORT_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// JSON array of section records
    #[arg(long)]
    pub sections: PathBuf,

    /// JSON object mapping section keys to HTML content
    #[arg(long)]
    pub contents: PathBuf,

    /// JSON array of saved style records
    #[arg(long)]
    pub styles: Option<PathBuf>,

    /// Report name, also used for the output file name
    #[arg(long, env = "REPORT_NAME")]
    pub name: String,

    /// First day of the report period (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the report period (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Output file, or directory to place `<name>.docx` in
    #[arg(long, short, default_value = ".", env = "REPORT_OUTPUT")]
    pub output: PathBuf,
}
