use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{Article, WikiClient};
use crate::feed::{BatchResult, FeedConfig, FeedController, FeedPhase, FetchPlan, run_batch};
use crate::theme::ResolvedTheme;

pub enum AsyncResult {
    Batch { task_id: u64, result: BatchResult },
}

#[derive(Debug)]
pub struct TaskInfo {
    pub id: u64,
    pub description: String,
    pub started_at: Instant,
}

#[derive(Debug)]
pub struct LogEntry {
    pub message: String,
}

/// Debug panel state: task tracking and log messages.
#[derive(Debug, Default)]
pub struct DebugState {
    pub visible: bool,
    pub running_tasks: Vec<TaskInfo>,
    pub log: VecDeque<LogEntry>,
    next_task_id: u64,
}

impl DebugState {
    const MAX_LOG_ENTRIES: usize = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.log.push_back(LogEntry {
            message: msg.into(),
        });
        if self.log.len() > Self::MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
    }

    pub fn start_task(&mut self, description: impl Into<String>) -> u64 {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let desc = description.into();
        self.log(format!("Started: {}", desc));
        self.running_tasks.push(TaskInfo {
            id,
            description: desc,
            started_at: Instant::now(),
        });
        id
    }

    pub fn end_task(&mut self, id: u64, outcome: &str) {
        if let Some(pos) = self.running_tasks.iter().position(|t| t.id == id) {
            let task = self.running_tasks.remove(pos);
            let elapsed = task.started_at.elapsed();
            self.log(format!("{} {}: {:.2?}", task.description, outcome, elapsed));
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    NextArticle,
    PrevArticle,
    FirstArticle,
    LastArticle,
    OpenArticle,
    Retry,
    Reload,
    ToggleHelp,
    ToggleDebug,
    Quit,
}

pub struct App {
    pub feed: FeedController,
    pub client: WikiClient,
    pub language: String,
    pub selected_index: usize,
    pub should_quit: bool,
    pub show_help: bool,
    pub theme: ResolvedTheme,
    // Async task management
    pub result_tx: mpsc::Sender<AsyncResult>,
    pub result_rx: mpsc::Receiver<AsyncResult>,
    pub cancel: CancellationToken,
    pub loading_start: Option<Instant>,
    // Debug pane
    pub debug: DebugState,
}

impl App {
    pub fn new(
        client: WikiClient,
        config: FeedConfig,
        language: String,
        theme: ResolvedTheme,
    ) -> Self {
        let (result_tx, result_rx) = mpsc::channel(10);
        Self {
            feed: FeedController::new(config),
            client,
            language,
            selected_index: 0,
            should_quit: false,
            show_help: false,
            theme,
            result_tx,
            result_rx,
            cancel: CancellationToken::new(),
            loading_start: None,
            debug: DebugState::new(),
        }
    }

    pub fn articles(&self) -> &[Article] {
        self.feed.articles()
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.feed.articles().get(self.selected_index)
    }

    /// Kicks off the first batch (and with it the ranked list fetch).
    pub fn start(&mut self) {
        self.load_more();
    }

    pub fn should_show_spinner(&self) -> bool {
        const MIN_SPINNER_DURATION: Duration = Duration::from_millis(500);
        match self.loading_start {
            Some(start) => self.feed.is_fetching() || start.elapsed() < MIN_SPINNER_DURATION,
            None => false,
        }
    }

    pub fn handle_async_result(&mut self, result: AsyncResult) {
        match result {
            AsyncResult::Batch { task_id, result } => {
                let succeeded = result.outcome.is_ok();
                if !self.feed.complete(result) {
                    self.debug.end_task(task_id, "discarded (stale)");
                    return;
                }
                self.debug
                    .end_task(task_id, if succeeded { "completed" } else { "failed" });

                if let Some(err) = self.feed.last_error() {
                    self.debug.log(err.user_message());
                }
                match self.feed.phase() {
                    FeedPhase::Exhausted => self.debug.log("Reached the end of the ranking"),
                    FeedPhase::RateLimited => self.debug.log("Giving up on further fetches"),
                    FeedPhase::Idle | FeedPhase::Fetching => {}
                }
                // Failures wait for the user to scroll or retry.
                if succeeded {
                    self.check_sentinel();
                }
            }
        }
    }

    pub fn update(&mut self, msg: Message) {
        match msg {
            Message::NextArticle => {
                self.select_next();
                self.check_sentinel();
            }
            Message::PrevArticle => self.select_prev(),
            Message::FirstArticle => self.selected_index = 0,
            Message::LastArticle => {
                self.select_last();
                self.check_sentinel();
            }
            Message::OpenArticle => self.open_article(),
            Message::Retry => self.retry(),
            Message::Reload => self.reload(),
            Message::ToggleHelp => self.show_help = !self.show_help,
            Message::ToggleDebug => self.debug.toggle(),
            Message::Quit => self.quit(),
        }
    }

    fn select_next(&mut self) {
        let count = self.articles().len();
        if count > 0 && self.selected_index < count - 1 {
            self.selected_index += 1;
        }
    }

    fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    fn select_last(&mut self) {
        self.selected_index = self.articles().len().saturating_sub(1);
    }

    /// True when the last loaded article is on screen. With nothing loaded
    /// the loading placeholder is what's on screen, which counts too.
    pub fn sentinel_visible(&self) -> bool {
        self.selected_index + 1 >= self.articles().len()
    }

    fn check_sentinel(&mut self) {
        if self.sentinel_visible()
            && let Some(plan) = self.feed.notify_approaching_end()
        {
            self.spawn_batch(plan);
        }
    }

    fn load_more(&mut self) {
        if let Some(plan) = self.feed.load_more() {
            self.spawn_batch(plan);
        }
    }

    fn retry(&mut self) {
        if self.feed.last_error().is_some() {
            info!("manual retry");
            self.load_more();
        }
    }

    fn reload(&mut self) {
        info!("reloading feed");
        self.feed.reset();
        self.selected_index = 0;
        self.debug.log("Reloaded feed");
        self.load_more();
    }

    fn quit(&mut self) {
        self.cancel.cancel();
        self.should_quit = true;
    }

    fn open_article(&mut self) {
        if let Some(article) = self.selected_article() {
            let url = article.url(&self.language);
            if let Err(e) = open::that(&url) {
                self.debug.log(format!("Failed to open {url}: {e}"));
            }
        }
    }

    /// Runs one batch cycle on the runtime. The result comes back through
    /// `result_rx` unless the app has quit in the meantime.
    fn spawn_batch(&mut self, plan: FetchPlan) {
        let client = self.client.clone();
        let tx = self.result_tx.clone();
        let cancel = self.cancel.clone();
        let task_id = self.debug.start_task(plan.description());
        self.loading_start = Some(Instant::now());
        debug!(task_id, offset = plan.offset, "spawning batch");

        tokio::spawn(async move {
            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = run_batch(&client, plan) => result,
            };
            let _ = tx.send(AsyncResult::Batch { task_id, result }).await;
        });
    }
}
