use std::{
    future::Future,
    io::{self, ErrorKind, SeekFrom},
    ops::Deref,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::{
    error::Error,
    utils::{
        clock::Clock,
        time::{date_to_record_name, truncate_to_seconds},
    },
};

use super::entities::{ActivityEvent, LoggedActivity};

const SEQUENCE_FILE: &str = "sequence";

/// Interface for abstracting storage of activity events.
pub trait EventStore {
    /// Makes sure the storage location exists. Safe to call on every start.
    fn initialize(&self) -> impl Future<Output = Result<(), Error>>;

    /// Files a new event under the current local day. The store picks the id and the timestamp.
    fn append(&self, window_title: &str) -> impl Future<Output = Result<ActivityEvent, Error>>;

    /// Every event filed under `date`, oldest first. A day without events is not an error.
    fn query_by_date(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<LoggedActivity>, Error>>;
}

impl<T: Deref> EventStore for T
where
    T::Target: EventStore,
{
    fn initialize(&self) -> impl Future<Output = Result<(), Error>> {
        self.deref().initialize()
    }

    fn append(&self, window_title: &str) -> impl Future<Output = Result<ActivityEvent, Error>> {
        self.deref().append(window_title)
    }

    fn query_by_date(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<LoggedActivity>, Error>> {
        self.deref().query_by_date(date)
    }
}

/// The main realization of [EventStore]. A directory with one JSON-lines file per day.
pub struct FileEventStore {
    record_dir: PathBuf,
    clock: Box<dyn Clock>,
}

impl FileEventStore {
    pub fn new(record_dir: PathBuf, clock: Box<dyn Clock>) -> Self {
        Self { record_dir, clock }
    }

    pub fn record_dir(&self) -> &Path {
        &self.record_dir
    }

    fn sequence_path(&self) -> PathBuf {
        self.record_dir.join(SEQUENCE_FILE)
    }

    fn partition_path(&self, date: NaiveDate) -> PathBuf {
        self.record_dir.join(date_to_record_name(date))
    }

    async fn open_sequence(&self) -> Result<File, io::Error> {
        File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.sequence_path())
            .await
    }

    async fn append_locked(
        &self,
        sequence: &mut File,
        window_title: &str,
    ) -> Result<ActivityEvent, Error> {
        let id = self.last_id(sequence).await? + 1;
        let timestamp = truncate_to_seconds(self.clock.now());
        let event = ActivityEvent {
            id,
            timestamp,
            date: timestamp.date(),
            window_title: window_title.into(),
        };

        // The id goes to disk first. A crash before the record is written leaves a gap in ids,
        // never a duplicate.
        let sequence_path = self.sequence_path();
        write_sequence(sequence, id)
            .await
            .map_err(Error::storage(&sequence_path))?;

        let partition_path = self.partition_path(event.date);
        append_line(&partition_path, &event)
            .await
            .map_err(Error::storage(&partition_path))?;

        Ok(event)
    }

    /// Last id handed out. Falls back to scanning partitions when the sequence file is empty or
    /// unreadable, so ids keep growing even if that file gets lost.
    async fn last_id(&self, sequence: &mut File) -> Result<u64, Error> {
        let mut content = String::new();
        sequence
            .rewind()
            .await
            .map_err(Error::storage(self.sequence_path()))?;
        sequence
            .read_to_string(&mut content)
            .await
            .map_err(Error::storage(self.sequence_path()))?;

        match content.trim() {
            "" => {}
            v => match v.parse::<u64>() {
                Ok(id) => return Ok(id),
                Err(e) => warn!("Sequence file contains {v:?} which is not an id: {e}"),
            },
        }

        self.scan_last_id()
            .await
            .map_err(Error::storage(&self.record_dir))
    }

    async fn scan_last_id(&self) -> Result<u64, io::Error> {
        let mut last = 0;
        let mut entries = tokio::fs::read_dir(&self.record_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(date) = name
                .to_str()
                .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
            else {
                continue;
            };
            for event in read_partition(&self.partition_path(date)).await? {
                last = last.max(event.id);
            }
        }
        debug!("Recovered last id {last} from partitions");
        Ok(last)
    }
}

impl EventStore for FileEventStore {
    async fn initialize(&self) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.record_dir)
            .await
            .map_err(Error::storage(&self.record_dir))?;
        self.open_sequence()
            .await
            .map_err(Error::storage(self.sequence_path()))?;
        Ok(())
    }

    async fn append(&self, window_title: &str) -> Result<ActivityEvent, Error> {
        let mut sequence = self
            .open_sequence()
            .await
            .map_err(Error::storage(self.sequence_path()))?;

        // Semi-safe acquire-release for a file
        sequence
            .lock_exclusive()
            .map_err(Error::storage(self.sequence_path()))?;
        let result = self.append_locked(&mut sequence, window_title).await;
        sequence
            .unlock_async()
            .await
            .map_err(Error::storage(self.sequence_path()))?;
        result
    }

    async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<LoggedActivity>, Error> {
        let path = self.partition_path(date);
        let mut events = match read_partition(&path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => vec![],
            Err(e) => return Err(Error::storage(&path)(e)),
        };

        events.retain(|v| v.date == date);
        // Appends arrive in id order, but a wall clock can move backwards.
        events.sort_by_key(|v| (v.timestamp, v.id));

        Ok(events.into_iter().map(LoggedActivity::from).collect())
    }
}

async fn write_sequence(sequence: &mut File, id: u64) -> Result<(), io::Error> {
    sequence.rewind().await?;
    sequence.set_len(0).await?;
    sequence.write_all(id.to_string().as_bytes()).await?;
    sequence.flush().await
}

async fn append_line(path: &Path, event: &ActivityEvent) -> Result<(), io::Error> {
    let mut line = serde_json::to_vec(event).map_err(io::Error::other)?;
    line.push(b'\n');

    let mut file = File::options()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .await?;
    file.lock_exclusive()?;
    let result = async {
        // Each record starts on its own line, even after a torn write.
        let mut buffer = Vec::with_capacity(line.len() + 1);
        if !ends_with_newline(&mut file).await? {
            buffer.push(b'\n');
        }
        buffer.extend_from_slice(&line);
        file.write_all(&buffer).await?;
        file.flush().await
    }
    .await;
    file.unlock_async().await?;
    result
}

/// True for an empty file too, since there is nothing to terminate.
async fn ends_with_newline(file: &mut File) -> Result<bool, io::Error> {
    if file.metadata().await?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

async fn read_partition(path: &Path) -> Result<Vec<ActivityEvent>, io::Error> {
    debug!("Extracting {path:?}");
    let file = File::open(path).await?;
    file.lock_shared()?;
    let mut reader = BufReader::new(file);
    let result = read_events(path, &mut reader).await;
    reader.into_inner().unlock_async().await?;
    result
}

/// Bad lines are skipped one at a time. Only a failing read aborts.
async fn read_events(
    path: &Path,
    reader: &mut BufReader<File>,
) -> Result<Vec<ActivityEvent>, io::Error> {
    let mut events = vec![];
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw).await? == 0 {
            break;
        }
        let Ok(line) = std::str::from_utf8(&raw) else {
            warn!("During parsing in path {path:?} found a line that is not UTF-8");
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ActivityEvent>(line) {
            Ok(v) => events.push(v),
            Err(e) => {
                // A write cut short by a power loss leaves half a line behind.
                warn!(
                    "During parsing in path {:?} found illegal json string {}:  {e}",
                    path, line
                )
            }
        }
    }
    Ok(events)
}
