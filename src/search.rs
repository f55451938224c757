use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use utoipa::{IntoParams, ToSchema};

/// Catalog filter state. The same type parses the catalog endpoint's query
/// string and renders one; empty values are omitted on both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogFilter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<i64>,
}

/// Query strings carry every value as text, so a cleared category picker
/// arrives as `category_id=`. Treat that the same as the parameter being
/// absent instead of failing to parse an integer.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl CatalogFilter {
    /// Render as a URL query string. An all-empty filter renders as "".
    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }
}

/// One edit coming from a filter UI.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEvent {
    /// A title keystroke; settles only after a quiet period.
    Title(String),
    /// A category pick; deliberate, takes effect at once.
    Category(Option<i64>),
}

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(400);

/// Folds a stream of filter edits into settled query strings.
///
/// A burst of title keystrokes produces a single output carrying the last
/// value, once input has been quiet for the window. Category picks emit
/// immediately, combined with the last settled title; a pending title keeps
/// its own timer running. Closing the input side drops any pending title
/// without emitting.
pub struct QuerySynchronizer {
    events: mpsc::UnboundedReceiver<FilterEvent>,
    output: mpsc::UnboundedSender<String>,
    window: Duration,
    filter: CatalogFilter,
    pending_title: Option<String>,
    deadline: Option<Instant>,
}

impl QuerySynchronizer {
    /// Start the fold on the runtime. Returns the edit handle and the stream
    /// of settled query strings; the task ends when the handle is dropped.
    pub fn spawn(
        window: Duration,
    ) -> (
        mpsc::UnboundedSender<FilterEvent>,
        mpsc::UnboundedReceiver<String>,
        JoinHandle<()>,
    ) {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (output, output_rx) = mpsc::unbounded_channel();
        let synchronizer = QuerySynchronizer {
            events,
            output,
            window,
            filter: CatalogFilter::default(),
            pending_title: None,
            deadline: None,
        };
        let task = tokio::spawn(synchronizer.run());
        (event_tx, output_rx, task)
    }

    async fn run(mut self) {
        loop {
            // select! evaluates the sleep expression even when the guard is
            // off, so give it a placeholder deadline in that case
            let deadline = self
                .deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400));
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(FilterEvent::Title(title)) => {
                        self.pending_title = Some(title);
                        self.deadline = Some(Instant::now() + self.window);
                    }
                    Some(FilterEvent::Category(category_id)) => {
                        self.filter.category_id = category_id;
                        self.emit();
                    }
                    None => break,
                },
                _ = sleep_until(deadline), if self.deadline.is_some() => {
                    if let Some(title) = self.pending_title.take() {
                        self.filter.title = title;
                    }
                    self.deadline = None;
                    self.emit();
                }
            }
        }
    }

    fn emit(&self) {
        // a closed output just ends the stream early
        let _ = self.output.send(self.filter.to_query_string());
    }
}
