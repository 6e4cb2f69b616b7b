use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace, warn};

use crate::{
    daemon::storage::event_store::EventStore, error::Error, utils::clock::Clock,
    window_api::WindowManager,
};

/// How a fresh observation relates to the last one.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Observation {
    /// Nothing usable was read. Resets the memory of the previous title.
    Blank,
    Unchanged,
    Changed,
}

/// An empty read in between two identical titles makes the second one count as a change again.
pub fn classify(last_seen: &str, title: &str) -> Observation {
    if title.trim().is_empty() {
        Observation::Blank
    } else if title == last_seen {
        Observation::Unchanged
    } else {
        Observation::Changed
    }
}

/// Samples the focused window on a fixed cadence and files every title change into the store.
pub struct Poller<S> {
    store: S,
    producer: Box<dyn WindowManager>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl<S: EventStore> Poller<S> {
    pub fn new(
        store: S,
        producer: Box<dyn WindowManager>,
        shutdown: CancellationToken,
        poll_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            store,
            producer,
            shutdown,
            poll_interval,
            time_provider,
        }
    }

    fn observe(&mut self) -> String {
        match self.producer.get_active_window_title() {
            Ok(title) => title,
            Err(e) => {
                warn!("{}", Error::WindowReadFailure(e));
                String::new()
            }
        }
    }

    /// One sampling step. `last_seen` only moves forward after the store accepted the title, so a
    /// failed append is retried on the next tick.
    pub async fn tick(&mut self, last_seen: &mut String) {
        let title = self.observe();
        match classify(last_seen, &title) {
            Observation::Blank => {
                trace!("No window title this tick");
                last_seen.clear();
            }
            Observation::Unchanged => trace!("Window unchanged"),
            Observation::Changed => match self.store.append(&title).await {
                Ok(event) => {
                    info!(id = event.id, "Logged: {}", event.window_title);
                    *last_seen = title;
                }
                Err(e) => error!("Failed to log {title:?}: {e}"),
            },
        }
    }

    /// Executes the polling loop until shutdown is requested. Shutdown is only observed between
    /// ticks.
    pub async fn run(mut self) {
        info!(
            "Logger started. Polling every {} seconds",
            self.poll_interval.as_secs()
        );
        let mut last_seen = String::new();
        let mut collection_point = self.time_provider.instant();
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            collection_point += self.poll_interval;

            self.tick(&mut last_seen).await;

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = self.time_provider.sleep_until(collection_point) => ()
            }
        }
        info!("Logger stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        collections::VecDeque,
        io,
        time::Duration,
    };

    use anyhow::anyhow;
    use chrono::NaiveDate;
    use tokio_util::sync::CancellationToken;

    use crate::{
        daemon::storage::{
            entities::{ActivityEvent, LoggedActivity},
            event_store::EventStore,
        },
        error::Error,
        utils::{clock::FixedClock, logging::TEST_LOGGING},
        window_api::MockWindowManager,
    };

    use super::{classify, Observation, Poller};

    /// Keeps titles in memory and can be told to refuse the next few appends.
    #[derive(Default)]
    struct MemoryStore {
        titles: RefCell<Vec<String>>,
        failures: Cell<usize>,
    }

    impl EventStore for MemoryStore {
        async fn initialize(&self) -> Result<(), Error> {
            Ok(())
        }

        async fn append(&self, window_title: &str) -> Result<ActivityEvent, Error> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(Error::StorageUnavailable {
                    path: "memory".into(),
                    source: io::Error::other("disk full"),
                });
            }
            self.titles.borrow_mut().push(window_title.to_string());
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok(ActivityEvent {
                id: self.titles.borrow().len() as u64,
                timestamp: date.and_hms_opt(0, 0, 0).unwrap(),
                date,
                window_title: window_title.into(),
            })
        }

        async fn query_by_date(&self, _date: NaiveDate) -> Result<Vec<LoggedActivity>, Error> {
            Ok(vec![])
        }
    }

    /// Window manager that replays `reads` and cancels `shutdown` once they run out.
    fn scripted_windows(
        reads: Vec<anyhow::Result<&'static str>>,
        shutdown: &CancellationToken,
    ) -> MockWindowManager {
        let mut reads = reads.into_iter().collect::<VecDeque<_>>();
        let shutdown = shutdown.clone();
        let mut manager = MockWindowManager::new();
        manager
            .expect_get_active_window_title()
            .returning(move || match reads.pop_front() {
                Some(read) => read.map(String::from),
                None => {
                    shutdown.cancel();
                    Ok(String::new())
                }
            });
        manager
    }

    fn poller<'a>(
        store: &'a MemoryStore,
        manager: MockWindowManager,
        shutdown: &CancellationToken,
    ) -> Poller<&'a MemoryStore> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Poller::new(
            store,
            Box::new(manager),
            shutdown.clone(),
            Duration::from_secs(60),
            Box::new(FixedClock(start)),
        )
    }

    /// Independent statement of the dedup law: one entry per maximal run of identical non-empty
    /// observations.
    fn expected_runs(observations: &[&str]) -> Vec<String> {
        let mut runs: Vec<String> = vec![];
        let mut previous: Option<&str> = None;
        for title in observations {
            let title = if title.trim().is_empty() { None } else { Some(*title) };
            if let Some(t) = title {
                if previous != Some(t) {
                    runs.push(t.to_string());
                }
            }
            previous = title;
        }
        runs
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("", ""), Observation::Blank);
        assert_eq!(classify("Editor", "   "), Observation::Blank);
        assert_eq!(classify("", "Editor"), Observation::Changed);
        assert_eq!(classify("Editor", "Browser"), Observation::Changed);
        assert_eq!(classify("Editor", "Editor"), Observation::Unchanged);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dedup_by_change() {
        *TEST_LOGGING;
        let cases: &[&[&str]] = &[
            &["Editor", "Editor", "Browser", "", "Browser"],
            &[],
            &["", " ", "\t"],
            &["a", "a", "a"],
            &["a", "b", "a", "b"],
            &["a", "", "a", "", "a"],
            &["a", "a", " ", "b", "b", "a"],
        ];

        for observations in cases {
            let store = MemoryStore::default();
            let shutdown = CancellationToken::new();
            let manager = scripted_windows(
                observations.iter().map(|v| Ok(*v)).collect(),
                &shutdown,
            );
            poller(&store, manager, &shutdown).run().await;

            assert_eq!(
                *store.titles.borrow(),
                expected_runs(observations),
                "observations {observations:?}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_failure_counts_as_blank() {
        let store = MemoryStore::default();
        let shutdown = CancellationToken::new();
        let manager = scripted_windows(
            vec![Ok("Editor"), Err(anyhow!("display went away")), Ok("Editor")],
            &shutdown,
        );
        poller(&store, manager, &shutdown).run().await;

        assert_eq!(*store.titles.borrow(), vec!["Editor", "Editor"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_append_is_retried() {
        let store = MemoryStore::default();
        store.failures.set(1);
        let shutdown = CancellationToken::new();
        let manager = scripted_windows(vec![Ok("Editor"), Ok("Editor"), Ok("Editor")], &shutdown);
        poller(&store, manager, &shutdown).run().await;

        assert_eq!(*store.titles.borrow(), vec!["Editor"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_before_first_tick_when_cancelled() {
        let store = MemoryStore::default();
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let mut manager = MockWindowManager::new();
        manager.expect_get_active_window_title().never();
        poller(&store, manager, &shutdown).run().await;

        assert!(store.titles.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_interval() {
        let store = MemoryStore::default();
        let shutdown = CancellationToken::new();
        let manager = scripted_windows(vec![Ok("a"), Ok("b"), Ok("c")], &shutdown);
        let started = tokio::time::Instant::now();
        poller(&store, manager, &shutdown).run().await;

        // Three observed ticks plus the one that ran out of reads.
        assert_eq!(started.elapsed(), Duration::from_secs(180));
    }
}
