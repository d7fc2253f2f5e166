//! An interactive listing session.
//!
//! Lines starting with `:` are commands, any other line is search input.
//! Search input is debounced, so only settled terms are searched.
//! Listing requests run concurrently with reading input;
//! responses to requests that were superseded in the meantime are discarded.

use std::io::Write;
use std::pin::pin;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, bail};
use bpaf::Bpaf;
use futures::channel::mpsc;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, Stream, StreamExt};
use indoc::indoc;
use stockhub_sdk::models::catalogue::Category;
use stockhub_sdk::models::listing::{
    Applied,
    Listing,
    ListingRequest,
    LoadMore,
    fetch_listing,
};
use stockhub_sdk::models::sort::SortField;
use stockhub_sdk::providers::catalog::{ListingPage, ProductId};
use stockhub_sdk::stockhub::Stockhub;
use stockhub_sdk::utils::debounce::DebounceExt;
use stockhub_sdk::utils::query_cache::SharedError;
use tokio::io::AsyncBufReadExt;
use tracing::{debug, instrument};

use crate::utils::message;
use crate::utils::render::{self, Layout};

const HELP: &str = indoc! {"
    Type to search, an empty line clears the search.
    Commands:
      :more             load more products
      :sort <field>     sort by 'title' or 'price', again to reverse
      :category <slug>  only show products of a category
      :all              show products of all categories
      :retry            retry after a failure
      :open <id>        show a product
      :help             show this help
      :quit             leave
"};
const RETRY_HINT: &str = "Type ':retry' to try again.";
const MORE_HINT: &str = "type ':more' to load more";

/// Browse the inventory interactively
#[derive(Debug, Bpaf, Clone, Default)]
pub struct Browse {
    /// Start with products of this category
    #[bpaf(long, argument("slug"))]
    pub category: Option<String>,

    /// Show products as a grid of cards
    #[bpaf(long)]
    pub grid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Search(String),
    More,
    Sort(SortField),
    Category(String),
    All,
    Retry,
    Open(ProductId),
    Help,
    Quit,
}

impl FromStr for Line {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let Some(command) = line.trim().strip_prefix(':') else {
            return Ok(Line::Search(line.to_string()));
        };
        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, Some(argument.trim())),
            None => (command, None),
        };

        match (name, argument) {
            ("more", None) => Ok(Line::More),
            ("sort", Some(field)) => field.parse().map(Line::Sort).map_err(|e| e.to_string()),
            ("category", Some(slug)) => Ok(Line::Category(slug.to_string())),
            ("all", None) => Ok(Line::All),
            ("retry", None) => Ok(Line::Retry),
            ("open", Some(id)) => id
                .parse()
                .map(|id| Line::Open(ProductId(id)))
                .map_err(|_| format!("invalid product id '{id}'")),
            ("help", None) => Ok(Line::Help),
            ("quit" | "q", None) => Ok(Line::Quit),
            _ => Err(format!("unknown command ':{command}', type ':help' for help")),
        }
    }
}

/// Search input tagged with the filter epoch it was typed in.
///
/// The epoch changes whenever the filters are changed by a command,
/// so typing a term again after changing the category searches it again.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchInput {
    epoch: u64,
    term: String,
}

type PageResult = Result<Arc<ListingPage>, SharedError>;
type Fetch<'a> = LocalBoxFuture<'a, (ListingRequest, PageResult)>;

fn fetch<'a>(stockhub: &'a Stockhub, request: ListingRequest) -> Fetch<'a> {
    async move {
        let result = fetch_listing(&stockhub.catalog, &request).await;
        (request, result)
    }
    .boxed_local()
}

/// State of a running session.
struct Session<'a, W> {
    stockhub: &'a Stockhub,
    listing: Listing,
    layout: Layout,
    width: usize,
    in_flight: FuturesUnordered<Fetch<'a>>,
    epoch: u64,
    out: &'a mut W,
}

impl<'a, W: Write> Session<'a, W> {
    fn issue(&mut self, request: Option<ListingRequest>) -> Result<()> {
        match request {
            Some(request) => {
                debug!(?request, "issuing listing request");
                self.in_flight.push(fetch(self.stockhub, request));
                self.render()
            },
            None => self.say("Nothing changed."),
        }
    }

    fn render(&mut self) -> Result<()> {
        let rendered = render::listing(
            &self.listing,
            self.layout,
            self.width,
            RETRY_HINT,
            MORE_HINT,
        );
        write!(self.out, "{rendered}")?;
        Ok(())
    }

    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}")?;
        Ok(())
    }

    fn apply(
        &mut self,
        request: ListingRequest,
        result: PageResult,
    ) -> Result<()> {
        match self.listing.apply(&request, result) {
            Applied::Stale => {
                debug!(?request, "discarding response to superseded request");
                Ok(())
            },
            _ => self.render(),
        }
    }

    /// Handle a line of input, returns false if the session should end.
    async fn handle_line(
        &mut self,
        line: Line,
        searches: &mpsc::UnboundedSender<SearchInput>,
    ) -> Result<bool> {
        match line {
            Line::Search(term) => {
                let input = SearchInput {
                    epoch: self.epoch,
                    term,
                };
                if searches.unbounded_send(input).is_err() {
                    bail!("search input closed unexpectedly");
                }
            },
            Line::More => match self.listing.load_more() {
                LoadMore::Fetch(request) => self.issue(Some(request))?,
                LoadMore::Revealed => self.render()?,
                LoadMore::Unavailable => self.say("Nothing more to load.")?,
            },
            Line::Sort(field) => {
                self.listing.sort_by(field);
                self.render()?;
            },
            Line::Category(slug) => {
                self.epoch += 1;
                let request = self.listing.set_category(Some(slug));
                self.issue(request)?;
            },
            Line::All => {
                self.epoch += 1;
                let request = self.listing.set_category(None);
                self.issue(request)?;
            },
            Line::Retry => match self.listing.retry() {
                Some(request) => self.issue(Some(request))?,
                None => self.say("Nothing to retry.")?,
            },
            Line::Open(id) => {
                let rendered = match self.stockhub.product_detail(id).await {
                    Ok(detail) => render::product_detail(&detail, self.width),
                    Err(error) => render::error_panel(
                        "product",
                        &error,
                        &format!("Type ':open {id}' to try again."),
                    ),
                };
                write!(self.out, "{rendered}")?;
            },
            Line::Help => self.say(HELP)?,
            Line::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn search(&mut self, input: SearchInput) -> Result<()> {
        if input.epoch != self.epoch {
            debug!(term = input.term, "discarding search typed before the filters changed");
            return Ok(());
        }
        let request = self.listing.set_search(&input.term);
        match request {
            Some(request) => self.issue(Some(request)),
            None => Ok(()),
        }
    }
}

/// Run a session reading lines from `input` and writing to `out`,
/// until the input ends or `:quit` is entered.
pub async fn run_session<W: Write>(
    stockhub: &Stockhub,
    browse: &Browse,
    input: impl Stream<Item = String>,
    out: &mut W,
    width: usize,
) -> Result<()> {
    let categories = stockhub.catalog.categories().await;
    match categories {
        Ok(slugs) => {
            let categories = slugs
                .iter()
                .map(|slug| Category::from_slug(slug))
                .collect::<Vec<_>>();
            write!(out, "{}", render::categories(&categories))?;
        },
        Err(error) => write!(
            out,
            "{}",
            render::error_panel("categories", &error, "Filtering by category may not work.")
        )?,
    }

    let (search_tx, search_rx) = mpsc::unbounded::<SearchInput>();
    let mut search_tx = Some(search_tx);
    let mut searches = pin!(search_rx.debounce(stockhub.search_debounce));
    let mut input = pin!(input);

    let mut session = Session {
        stockhub,
        listing: stockhub.new_listing().with_category(browse.category.clone()),
        layout: if browse.grid {
            Layout::Grid
        } else {
            Layout::Table
        },
        width,
        in_flight: FuturesUnordered::new(),
        epoch: 0,
        out,
    };
    session.say(HELP)?;
    let request = session.listing.start();
    session.issue(Some(request))?;

    let mut input_done = false;
    let mut searches_done = false;
    loop {
        tokio::select! {
            biased;

            Some((request, result)) = session.in_flight.next(), if !session.in_flight.is_empty() => {
                session.apply(request, result)?;
            },
            search = searches.next(), if !searches_done => match search {
                Some(search) => session.search(search)?,
                None => searches_done = true,
            },
            line = input.next(), if !input_done => match line {
                Some(line) => match line.parse::<Line>() {
                    Ok(line) => {
                        let Some(sender) = search_tx.as_ref() else {
                            continue;
                        };
                        if !session.handle_line(line, sender).await? {
                            break;
                        }
                    },
                    Err(message) => session.say(&message)?,
                },
                None => {
                    debug!("input closed, finishing pending requests");
                    input_done = true;
                    // ends the debounced searches once the pending one is flushed
                    search_tx = None;
                },
            },
            else => break,
        }
    }

    Ok(())
}

impl Browse {
    #[instrument(name = "browse", skip_all)]
    pub async fn handle(self, stockhub: &Stockhub) -> Result<()> {
        message::info("Reading from stdin, type ':quit' or press Ctrl-D to leave.");
        let lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        let input = futures::stream::unfold(lines, |mut lines| async move {
            match lines.next_line().await {
                Ok(Some(line)) => Some((line, lines)),
                Ok(None) => None,
                Err(err) => {
                    debug!(%err, "failed to read input");
                    None
                },
            }
        });

        let mut stdout = std::io::stdout();
        run_session(stockhub, &self, input, &mut stdout, textwrap::termwidth()).await
    }
}
