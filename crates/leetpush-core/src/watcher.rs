//! Accepted-submission watcher.
//!
//! Two trigger sources, a fixed-interval poll and debounced page mutations,
//! feed a capacity-1 queue. A single worker takes triggers one at a time and
//! runs a detection cycle: acceptance check, language detection, extraction
//! with retries, then dispatch to the backend. Triggers that arrive while a
//! cycle is running are dropped.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant, MissedTickBehavior};

use crate::detect::detect_language;
use crate::extract::{extract_code, MIN_STRUCTURED_LEN};
use crate::message::{Dispatcher, Request, Response, SubmissionStatus};
use crate::models::{SubmissionEvent, SubmissionKey};
use crate::page::PageHost;
use crate::util::{sanitize, trimmed_len, unix_timestamp_millis};

/// Lower-cased fragments that only appear when our own sources were scraped
/// instead of the user's solution.
const OWN_SOURCE_MARKERS: &[&str] = &[
    "chrome.runtime",
    "content.js",
    "background.js",
    "leetpush",
    "extension context",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Minimum gap between two dispatches
    pub cooldown: Duration,
    /// Quiet period after the last mutation before a cycle is triggered
    pub debounce: Duration,
    pub poll_interval: Duration,
    /// Wait before the first extraction attempt
    pub settle_delay: Duration,
    /// Attempt `n` that fails waits `retry_step * n` before the next one
    pub retry_step: Duration,
    pub max_attempts: u32,
    pub recent_capacity: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(15_000),
            debounce: Duration::from_millis(500),
            poll_interval: Duration::from_millis(3_000),
            settle_delay: Duration::from_millis(500),
            retry_step: Duration::from_millis(300),
            max_attempts: 5,
            recent_capacity: 20,
        }
    }
}

/// Insertion-ordered set of handled keys; the oldest is evicted past capacity.
#[derive(Debug, Clone)]
pub struct RecentSubmissions {
    keys: VecDeque<SubmissionKey>,
    capacity: usize,
}

impl RecentSubmissions {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&mut self, key: SubmissionKey) {
        if self.contains(&key) {
            return;
        }
        self.keys.push_back(key);
        while self.keys.len() > self.capacity {
            self.keys.pop_front();
        }
    }

    pub fn contains(&self, key: &SubmissionKey) -> bool {
        self.keys.contains(key)
    }

    pub fn remove(&mut self, key: &SubmissionKey) -> bool {
        let before = self.keys.len();
        self.keys.retain(|existing| existing != key);
        self.keys.len() != before
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Detecting,
    Extracting { attempt: u32 },
    Dispatching,
}

/// Everything the watcher remembers between cycles.
#[derive(Debug, Clone)]
pub struct WatcherState {
    pub last_dispatch: Option<Instant>,
    pub last_key: Option<SubmissionKey>,
    pub recent: RecentSubmissions,
    pub phase: Phase,
    started_at: Instant,
    started_at_millis: i64,
}

impl WatcherState {
    pub fn new(recent_capacity: usize) -> Self {
        Self {
            last_dispatch: None,
            last_key: None,
            recent: RecentSubmissions::new(recent_capacity),
            phase: Phase::Idle,
            started_at: Instant::now(),
            started_at_millis: unix_timestamp_millis(),
        }
    }

    fn cooling_down(&self, now: Instant, cooldown: Duration) -> bool {
        self.last_dispatch
            .is_some_and(|last| now.saturating_duration_since(last) < cooldown)
    }

    fn already_handled(&self, key: &SubmissionKey) -> bool {
        self.last_key.as_ref() == Some(key) || self.recent.contains(key)
    }

    /// Unix milliseconds for `now`, advanced on the runtime clock.
    fn timestamp_millis(&self, now: Instant) -> i64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_millis();
        self.started_at_millis
            .saturating_add(i64::try_from(elapsed).unwrap_or(i64::MAX))
    }
}

/// How a detection cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The page context is gone; the watcher stops.
    Detached,
    CoolingDown,
    NoAcceptance,
    NotProblemPage,
    Duplicate,
    ExtractionFailed,
    /// Extracted text looked like our own sources.
    OwnSource,
    Dispatched,
    /// The backend received the submission but could not sync it.
    Rejected(String),
    /// The request never reached the backend.
    DispatchFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Poll,
    Mutation,
}

pub struct Watcher<H, D> {
    host: H,
    dispatcher: D,
    config: WatcherConfig,
    state: WatcherState,
}

impl<H: PageHost, D: Dispatcher> Watcher<H, D> {
    pub fn new(host: H, dispatcher: D, config: WatcherConfig) -> Self {
        Self {
            host,
            dispatcher,
            state: WatcherState::new(config.recent_capacity),
            config,
        }
    }

    pub const fn state(&self) -> &WatcherState {
        &self.state
    }

    /// Run until the host detaches.
    ///
    /// Every message on `mutations` is one page-mutation notification; the
    /// poll source keeps running when the mutation sender is dropped.
    pub async fn run(mut self, mutations: mpsc::Receiver<()>) {
        let (triggers, mut queue) = mpsc::channel::<Trigger>(1);
        let poll_interval = self.config.poll_interval;
        let debounce = self.config.debounce;

        let sources = async move {
            tokio::join!(
                poll(triggers.clone(), poll_interval),
                debounce_mutations(mutations, triggers, debounce)
            );
        };

        let worker = async {
            while let Some(trigger) = queue.recv().await {
                tracing::debug!(?trigger, "Starting detection cycle");
                let outcome = self.run_cycle().await;
                while queue.try_recv().is_ok() {}
                if outcome == CycleOutcome::Detached {
                    break;
                }
            }
        };

        tokio::select! {
            () = worker => tracing::info!("Page detached, watcher stopped"),
            () = sources => tracing::info!("Trigger sources closed, watcher stopped"),
        }
    }

    /// One detection-through-dispatch pass. Always leaves the watcher idle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let outcome = self.cycle().await;
        self.enter(Phase::Idle);
        tracing::debug!(?outcome, "Detection cycle finished");
        outcome
    }

    async fn cycle(&mut self) -> CycleOutcome {
        if !self.host.is_attached() {
            return CycleOutcome::Detached;
        }
        self.enter(Phase::Detecting);

        let now = Instant::now();
        if self.state.cooling_down(now, self.config.cooldown) {
            return CycleOutcome::CoolingDown;
        }

        let page = self.host.snapshot();
        if !page.shows_acceptance() {
            return CycleOutcome::NoAcceptance;
        }
        let Some(problem) = page.problem_identifier() else {
            return CycleOutcome::NotProblemPage;
        };
        let language = detect_language(&page);
        let key = SubmissionKey::new(&problem, &language, self.state.timestamp_millis(now));
        if self.state.already_handled(&key) {
            return CycleOutcome::Duplicate;
        }
        tracing::info!(problem = %problem, language = %language, "Accepted submission detected");

        let code = match self.extract_with_retries().await {
            Ok(code) => code,
            Err(outcome) => return outcome,
        };
        if contains_own_source(&code) {
            tracing::warn!(problem = %problem, "Extracted text looks like our own sources, skipping");
            return CycleOutcome::OwnSource;
        }

        match SubmissionEvent::new(problem, code, &language) {
            Ok(event) => self.dispatch(key, &event).await,
            Err(error) => {
                tracing::warn!(error = %error, "Discarding submission");
                CycleOutcome::ExtractionFailed
            }
        }
    }

    async fn extract_with_retries(&mut self) -> Result<String, CycleOutcome> {
        sleep(self.config.settle_delay).await;

        for attempt in 1..=self.config.max_attempts {
            self.enter(Phase::Extracting { attempt });
            if !self.host.is_attached() {
                return Err(CycleOutcome::Detached);
            }

            let code = extract_code(&self.host.snapshot());
            if trimmed_len(&code) > MIN_STRUCTURED_LEN {
                tracing::info!(attempt, chars = trimmed_len(&code), "Code extracted");
                return Ok(code);
            }

            if attempt < self.config.max_attempts {
                let delay = self.config.retry_step * attempt;
                tracing::debug!(attempt, ?delay, "Code not ready, retrying");
                sleep(delay).await;
            }
        }

        tracing::warn!(
            attempts = self.config.max_attempts,
            "Could not extract valid code"
        );
        Err(CycleOutcome::ExtractionFailed)
    }

    async fn dispatch(&mut self, key: SubmissionKey, event: &SubmissionEvent) -> CycleOutcome {
        self.enter(Phase::Dispatching);
        if !self.host.is_attached() {
            return CycleOutcome::Detached;
        }

        self.state.recent.insert(key.clone());
        self.state.last_dispatch = Some(Instant::now());
        self.state.last_key = Some(key.clone());

        match self.dispatcher.dispatch(Request::from(event)).await {
            Ok(Response::Submission(SubmissionStatus::Success)) => {
                tracing::info!(key = %key, "Submission synced");
                CycleOutcome::Dispatched
            }
            Ok(Response::Submission(SubmissionStatus::Error { error })) => {
                tracing::warn!(key = %key, error = %error, "Backend could not sync submission");
                CycleOutcome::Rejected(error)
            }
            Ok(Response::Connection(_)) => {
                tracing::warn!(key = %key, "Unexpected reply to submission");
                CycleOutcome::Rejected("unexpected reply".to_string())
            }
            Err(error) => {
                tracing::warn!(key = %key, error = %sanitize(&error), "Could not reach backend");
                self.state.recent.remove(&key);
                CycleOutcome::DispatchFailed
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        if self.state.phase != phase {
            tracing::debug!(from = ?self.state.phase, to = ?phase, "Watcher phase");
            self.state.phase = phase;
        }
    }
}

/// Whether `code` contains fragments of this tool's own sources.
pub fn contains_own_source(code: &str) -> bool {
    let lowered = code.to_lowercase();
    OWN_SOURCE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

async fn poll(triggers: mpsc::Sender<Trigger>, period: Duration) {
    let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        if let Err(mpsc::error::TrySendError::Closed(_)) = triggers.try_send(Trigger::Poll) {
            return;
        }
    }
}

async fn debounce_mutations(
    mut mutations: mpsc::Receiver<()>,
    triggers: mpsc::Sender<Trigger>,
    quiet: Duration,
) {
    while mutations.recv().await.is_some() {
        while let Ok(Some(())) = tokio::time::timeout(quiet, mutations.recv()).await {}
        match triggers.try_send(Trigger::Mutation) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("Cycle in flight, dropping mutation trigger");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => return,
        }
    }
    std::future::pending::<()>().await;
}
