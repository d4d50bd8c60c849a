use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chatfeed::{
    domain::{
        self,
        draft::{Draft, MessageToSend, PostToSend},
        message::Message,
        post::Post,
    },
    infra::{
        self,
        config::{AppConfig, FeedConfig},
        error::AppError,
        in_memory::{ChannelWriter, FailingFirst, InMemoryFeed, TickerSource},
    },
    ui::{self, ConsoleView},
    usecases::{
        self, bootstrap, cached_compose::CachedComposePresenter, draft_cache::DraftCache,
        gated_feed::GatedFeedPresenter, local_compose::LocalComposePresenter,
        paged_feed::PagedFeedPresenter, schedulers::Schedulers,
    },
};
use tokio::runtime::{Builder, Handle, Runtime};

use crate::cli::{Cli, Command};

const DEMO_FINISHED: &str = "DEMO_FINISHED";

pub fn run(cli: Cli) -> Result<()> {
    let context = bootstrap::bootstrap(cli.config.as_deref())?;

    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    let runtimes = Runtimes::build()?;
    let demo = Demo::new(
        context.config,
        runtimes.schedulers(),
        runtimes.work.handle().clone(),
        |name| Arc::new(ConsoleView::stdout(name)),
    );
    let command = cli.command_or_default();

    runtimes.main.block_on(demo.run(command))?;
    tracing::info!(code = DEMO_FINISHED, ?command, "demo finished");

    Ok(())
}

/// Presenter effects run on a single-threaded `main` runtime, fetches and
/// writes on a multi-threaded `work` runtime.
struct Runtimes {
    main: Runtime,
    work: Runtime,
}

impl Runtimes {
    fn build() -> Result<Self, AppError> {
        let main = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(AppError::Runtime)?;
        let work = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("chatfeed-work")
            .enable_all()
            .build()
            .map_err(AppError::Runtime)?;

        Ok(Self { main, work })
    }

    fn schedulers(&self) -> Schedulers {
        Schedulers::new(self.main.handle().clone(), self.work.handle().clone())
    }
}

struct Demo<F> {
    config: AppConfig,
    schedulers: Schedulers,
    work: Handle,
    make_view: F,
}

impl<F> Demo<F>
where
    F: Fn(&'static str) -> Arc<ConsoleView>,
{
    fn new(config: AppConfig, schedulers: Schedulers, work: Handle, make_view: F) -> Self {
        Self {
            config,
            schedulers,
            work,
            make_view,
        }
    }

    async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Messages => self.messages().await,
            Command::Posts => self.posts().await,
        }
        Ok(())
    }

    async fn messages(&self) {
        let feed_config = &self.config.feed;
        let history = message_history(feed_config.page_size * feed_config.page_count);
        let next_id = history.len() as i64 + 1;
        let feed = InMemoryFeed::new(history, feed_config.page_size, fetch_delay(feed_config));
        let live = TickerSource::new(live_interval(feed_config), feed_config.live_items, move |tick| {
            let id = next_id + tick as i64;
            Message {
                id,
                sender_name: "bob".to_owned(),
                text: format!("live message {id}"),
                timestamp_ms: id * 1000,
                is_outgoing: false,
            }
        });

        let presenter: PagedFeedPresenter<Message, ConsoleView> = PagedFeedPresenter::new(
            Arc::new(feed.first_page()),
            Arc::new(live),
            Arc::new(feed.pages()),
            self.schedulers.clone(),
        );
        let view = (self.make_view)("messages");
        presenter.attach(Arc::clone(&view));
        self.pause_for_fetch().await;

        for _ in 0..feed_config.page_count {
            view.request_next_page();
            self.pause_for_fetch().await;
        }
        view.refresh();
        self.pause_for_fetch().await;

        let cache = Arc::new(DraftCache::<MessageToSend>::new());
        let author = self.config.compose.author.clone();
        let writer = Arc::new(ChannelWriter::spawn(
            &self.work,
            "messages",
            move |draft: MessageToSend| {
                tracing::info!(author = %author, text = draft.text(), "message delivered");
            },
        ));
        let composers = ["compose", "compose-mirror"].map(|name| {
            let presenter: CachedComposePresenter<MessageToSend, ConsoleView> =
                CachedComposePresenter::new(cache.clone(), writer.clone(), self.schedulers.clone());
            let view = (self.make_view)(name);
            presenter.attach(Arc::clone(&view));
            (presenter, view)
        });
        let (_, typing) = &composers[0];

        for text in ["h", "hel", "hello"] {
            typing.type_text(text);
            self.pause_for_input().await;
        }
        typing.send();
        self.pause_for_input().await;

        for (presenter, view) in &composers {
            presenter.detach(view);
        }

        self.pause_for_live().await;
        presenter.detach(&view);
    }

    async fn posts(&self) {
        let feed_config = &self.config.feed;
        let author = self.config.compose.author.clone();
        let history = post_history(feed_config.page_size * feed_config.page_count);
        let next_id = history.len() as i64 + 1;
        let feed = InMemoryFeed::new(history, feed_config.page_size, fetch_delay(feed_config));
        let live = TickerSource::new(live_interval(feed_config), feed_config.live_items, move |tick| {
            let id = next_id + tick as i64;
            Post {
                id,
                author: "carol".to_owned(),
                body: format!("fresh post {id}"),
                timestamp_ms: id * 1000,
            }
        });

        let presenter: GatedFeedPresenter<Post, ConsoleView> = GatedFeedPresenter::new(
            Arc::new(FailingFirst::new(feed.first_page(), 1, "network unavailable")),
            Arc::new(live),
            Arc::new(feed.pages()),
            self.schedulers.clone(),
        );
        let view = (self.make_view)("posts");
        presenter.attach(Arc::clone(&view));
        self.pause_for_fetch().await;

        view.retry();
        self.pause_for_fetch().await;

        // One extra request runs into the end of the history.
        for _ in 0..=feed_config.page_count {
            view.request_next_page();
            self.pause_for_fetch().await;
        }
        tracing::info!(gate = ?presenter.gate(), "paging finished");

        let writer = Arc::new(ChannelWriter::spawn(&self.work, "posts", move |post: PostToSend| {
            tracing::info!(author = %author, body = post.text(), "post published");
        }));
        let composer: LocalComposePresenter<PostToSend, ConsoleView> =
            LocalComposePresenter::new(writer, self.schedulers.clone());
        let compose_view = (self.make_view)("compose");
        composer.attach(Arc::clone(&compose_view));

        compose_view.type_text("draft kept across reattach");
        self.pause_for_input().await;
        composer.detach(&compose_view);
        composer.attach(Arc::clone(&compose_view));
        self.pause_for_input().await;
        compose_view.send();
        self.pause_for_input().await;
        composer.detach(&compose_view);

        self.pause_for_live().await;
        presenter.detach(&view);
    }

    async fn pause_for_fetch(&self) {
        pause(fetch_delay(&self.config.feed) * 2).await;
    }

    async fn pause_for_input(&self) {
        pause(Duration::ZERO).await;
    }

    async fn pause_for_live(&self) {
        let ticks = self.config.feed.live_items as u32 + 1;
        pause(live_interval(&self.config.feed) * ticks).await;
    }
}

async fn pause(at_least: Duration) {
    tokio::time::sleep(at_least.max(Duration::from_millis(5))).await;
}

fn fetch_delay(config: &FeedConfig) -> Duration {
    Duration::from_millis(config.fetch_delay_ms)
}

fn live_interval(config: &FeedConfig) -> Duration {
    Duration::from_millis(config.live_interval_ms)
}

/// Builds `count` messages ordered newest first.
fn message_history(count: usize) -> Vec<Message> {
    (1..=count as i64)
        .rev()
        .map(|id| Message {
            id,
            sender_name: if id % 2 == 0 { "ann" } else { "bob" }.to_owned(),
            text: format!("message {id}"),
            timestamp_ms: id * 1000,
            is_outgoing: id % 2 == 0,
        })
        .collect()
}

/// Builds `count` posts ordered newest first.
fn post_history(count: usize) -> Vec<Post> {
    (1..=count as i64)
        .rev()
        .map(|id| Post {
            id,
            author: "dave".to_owned(),
            body: format!("post {id}"),
            timestamp_ms: id * 1000,
        })
        .collect()
}
