//! Line-oriented view that prints every effect it receives.
//!
//! User input is driven programmatically: each call such as
//! [`ConsoleView::request_next_page`] is forwarded to every stream the
//! presenters have subscribed to.

use std::{
    io::{self, Write},
    sync::{Mutex, MutexGuard, PoisonError},
};

use tokio::sync::mpsc;

use crate::{
    domain::{draft::Draft, message::Message, post::Post},
    usecases::{
        contracts::{
            ComposeView, EventStream, FeedEffects, GatedFeedView, PagedFeedView, SourceError,
        },
        streams::receiver_stream,
    },
};

const VIEW_WRITE_FAILED: &str = "VIEW_WRITE_FAILED";

/// Single-line rendering of a feed item.
pub trait FeedLine {
    fn feed_line(&self) -> String;
}

impl FeedLine for Message {
    fn feed_line(&self) -> String {
        self.display_line()
    }
}

impl FeedLine for Post {
    fn feed_line(&self) -> String {
        self.display_line()
    }
}

#[derive(Default)]
struct Inputs {
    refreshes: Vec<mpsc::UnboundedSender<()>>,
    next_page_requests: Vec<mpsc::UnboundedSender<()>>,
    retries: Vec<mpsc::UnboundedSender<()>>,
    sends: Vec<mpsc::UnboundedSender<()>>,
    message_changes: Vec<mpsc::UnboundedSender<String>>,
}

pub struct ConsoleView {
    name: &'static str,
    out: Mutex<Box<dyn Write + Send>>,
    inputs: Mutex<Inputs>,
}

impl ConsoleView {
    pub fn new(name: &'static str, out: impl Write + Send + 'static) -> Self {
        Self {
            name,
            out: Mutex::new(Box::new(out)),
            inputs: Mutex::new(Inputs::default()),
        }
    }

    pub fn stdout(name: &'static str) -> Self {
        Self::new(name, io::stdout())
    }

    pub fn refresh(&self) {
        fan_out(&mut self.inputs().refreshes, ());
    }

    pub fn request_next_page(&self) {
        fan_out(&mut self.inputs().next_page_requests, ());
    }

    pub fn retry(&self) {
        fan_out(&mut self.inputs().retries, ());
    }

    pub fn type_text(&self, text: &str) {
        fan_out(&mut self.inputs().message_changes, text.to_owned());
    }

    pub fn send(&self) {
        fan_out(&mut self.inputs().sends, ());
    }

    fn inputs(&self) -> MutexGuard<'_, Inputs> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe<T: Send + 'static>(
        &self,
        pick: impl FnOnce(&mut Inputs) -> &mut Vec<mpsc::UnboundedSender<T>>,
    ) -> EventStream<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        pick(&mut self.inputs()).push(sender);
        receiver_stream(receiver)
    }

    fn print(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = writeln!(out, "[{}] {line}", self.name) {
            tracing::warn!(code = VIEW_WRITE_FAILED, view = self.name, error = %error, "failed to print effect");
        }
    }

    fn print_items<T: FeedLine>(&self, header: &str, items: &[T]) {
        self.print(header);
        for item in items {
            self.print(&format!("  {}", item.feed_line()));
        }
    }
}

/// Sends `value` to every live subscriber and forgets closed ones.
fn fan_out<T: Clone>(senders: &mut Vec<mpsc::UnboundedSender<T>>, value: T) {
    senders.retain(|sender| sender.send(value.clone()).is_ok());
}

impl<T> FeedEffects<T> for ConsoleView
where
    T: FeedLine + Send + 'static,
{
    fn show_items(&self, items: Vec<T>) {
        self.print_items(&format!("showing {} items", items.len()), &items);
    }

    fn add_new_item(&self, item: T) {
        self.print(&format!("new: {}", item.feed_line()));
    }

    fn add_page(&self, page: Vec<T>) {
        self.print_items(&format!("page of {} older items", page.len()), &page);
    }

    fn show_next_page_error(&self, error: SourceError) {
        self.print(&format!("older items failed: {error}"));
    }

    fn show_loading(&self) {
        self.print("loading...");
    }

    fn hide_loading(&self) {
        self.print("loading done");
    }

    fn show_loading_next_page(&self) {
        self.print("loading older items...");
    }

    fn hide_loading_next_page(&self) {
        self.print("older items done");
    }
}

impl<T> PagedFeedView<T> for ConsoleView
where
    T: FeedLine + Send + 'static,
{
    fn refreshes(&self) -> EventStream<()> {
        self.subscribe(|inputs| &mut inputs.refreshes)
    }

    fn next_page_requests(&self) -> EventStream<()> {
        self.subscribe(|inputs| &mut inputs.next_page_requests)
    }

    fn show_error(&self, error: SourceError) {
        self.print(&format!("error: {error}"));
    }
}

impl<T> GatedFeedView<T> for ConsoleView
where
    T: FeedLine + Send + 'static,
{
    fn next_page_requests(&self) -> EventStream<()> {
        self.subscribe(|inputs| &mut inputs.next_page_requests)
    }

    fn show_error_and_allow_to_retry(&self, error: SourceError) -> EventStream<()> {
        self.print(&format!("error: {error} (retry available)"));
        self.subscribe(|inputs| &mut inputs.retries)
    }
}

impl<D: Draft> ComposeView<D> for ConsoleView {
    fn sends(&self) -> EventStream<()> {
        self.subscribe(|inputs| &mut inputs.sends)
    }

    fn message_changes(&self) -> EventStream<String> {
        self.subscribe(|inputs| &mut inputs.message_changes)
    }

    fn show_draft(&self, draft: &D) {
        self.print(&format!("draft: {:?}", draft.text()));
    }

    fn enable_send(&self) {
        self.print("send enabled");
    }

    fn disable_send(&self) {
        self.print("send disabled");
    }
}
