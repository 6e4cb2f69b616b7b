use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use crate::{
    daemon::storage::{entities::LoggedActivity, event_store::EventStore},
    error::Error,
    utils::time::{date_to_record_name, local_seconds},
};

use super::summarizer::Summarizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Write the transcript as is.
    Raw,
    /// Have the summarizer write a daily note.
    Summary,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Nothing was recorded for the date. No file is written.
    NoData,
    Written(PathBuf),
}

/// One line per event, `[timestamp] title`, in the order given.
pub fn render_transcript(events: &[LoggedActivity]) -> String {
    events
        .iter()
        .map(|v| {
            format!(
                "[{}] {}",
                v.timestamp.format(local_seconds::FORMAT),
                v.window_title
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn raw_artifact_name(date: NaiveDate) -> String {
    format!("{}_raw.txt", date_to_record_name(date))
}

pub fn summary_artifact_name(date: NaiveDate) -> String {
    format!("{}.md", date_to_record_name(date))
}

/// Produces the artifact for a single day. Any failure aborts the whole report, and files are
/// only written once their content is complete.
pub struct Reporter<S, M> {
    store: S,
    summarizer: M,
    output_dir: PathBuf,
}

impl<S: EventStore, M: Summarizer> Reporter<S, M> {
    pub fn new(store: S, summarizer: M, output_dir: PathBuf) -> Self {
        Self {
            store,
            summarizer,
            output_dir,
        }
    }

    pub async fn collect(&self, date: NaiveDate) -> Result<Vec<LoggedActivity>, Error> {
        self.store.query_by_date(date).await
    }

    pub async fn export_raw(&self, date: NaiveDate, transcript: &str) -> Result<PathBuf, Error> {
        self.write_artifact(&raw_artifact_name(date), transcript)
            .await
    }

    pub async fn summarize(&self, transcript: &str, date: NaiveDate) -> Result<String, Error> {
        self.summarizer.summarize(transcript, date).await
    }

    pub async fn write_summary(&self, date: NaiveDate, text: &str) -> Result<PathBuf, Error> {
        self.write_artifact(&summary_artifact_name(date), text)
            .await
    }

    async fn write_artifact(&self, name: &str, content: &str) -> Result<PathBuf, Error> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(Error::storage(&self.output_dir))?;
        let path = self.output_dir.join(name);
        tokio::fs::write(&path, content)
            .await
            .map_err(Error::storage(&path))?;
        Ok(path)
    }

    pub async fn report(&self, date: NaiveDate, mode: ReportMode) -> Result<ReportOutcome, Error> {
        println!("Fetching logs for {date}...");
        let events = self.collect(date).await?;

        if events.is_empty() {
            println!("No activity logs found for {date}.");
            return Ok(ReportOutcome::NoData);
        }
        info!("Found {} events for {date}", events.len());

        let transcript = render_transcript(&events);

        let path = match mode {
            ReportMode::Raw => {
                let path = self.export_raw(date, &transcript).await?;
                println!("Success! Raw logs exported to: {}", path.display());
                println!("You can now feed this file to any local LLM or other service.");
                path
            }
            ReportMode::Summary => {
                println!("Generating summary with Gemini...");
                let summary = self.summarize(&transcript, date).await?;
                let path = self.write_summary(date, &summary).await?;
                println!("Success! Daily note saved to: {}", path.display());
                path
            }
        };

        Ok(ReportOutcome::Written(path))
    }
}
