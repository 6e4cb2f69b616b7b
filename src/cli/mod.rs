pub mod report;
pub mod summarizer;

use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use report::{ReportMode, Reporter};
use summarizer::GeminiSummarizer;
use tracing::level_filters::LevelFilter;

use crate::{
    config::Config,
    daemon::storage::event_store::FileEventStore,
    utils::{
        clock::DefaultClock,
        logging::{enable_logging_or_warn, REPORT_PREFIX},
    },
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "daynote", version, long_about = None)]
#[command(about = "Turns a day of recorded window titles into a daily note", long_about = None)]
struct Args {
    #[arg(help = "Day to report on. Defaults to today. Examples are \"2025-03-15\", \"yesterday\", \"3 days ago\"")]
    date: Option<String>,
    #[arg(long, help = "Export the raw transcript instead of asking Gemini for a summary")]
    raw: bool,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of non-ISO dates. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    // The report doesn't need its log file, so an unwritable log dir is only a warning.
    enable_logging_or_warn(REPORT_PREFIX, &config.log_dir(), logging_level, args.log);

    let date = parse_target_date(args.date.as_deref(), args.date_style, Local::now())?;
    let mode = if args.raw {
        ReportMode::Raw
    } else {
        ReportMode::Summary
    };

    let store = FileEventStore::new(config.store_dir.clone(), Box::new(DefaultClock));
    let reporter = Reporter::new(
        store,
        GeminiSummarizer::new(&config),
        config.output_dir.clone(),
    );
    reporter.report(date, mode).await?;
    Ok(())
}

/// ISO dates are taken literally. Anything else goes through `chrono-english` relative to `now`.
fn parse_target_date(
    date: Option<&str>,
    date_style: DateStyle,
    now: DateTime<Local>,
) -> Result<NaiveDate> {
    let Some(date) = date.map(str::trim) else {
        return Ok(now.date_naive());
    };
    if let Ok(v) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Ok(v);
    }
    match parse_date_string(date, now, date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {date:?} {e}"),
            )
            .into()),
    }
}
