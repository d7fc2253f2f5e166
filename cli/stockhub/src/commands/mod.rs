mod browse;
mod catalogue;
mod home;
mod inventory;
mod open;
mod product;

use std::fmt;

use anyhow::Result;
use bpaf::Bpaf;
use indoc::indoc;
use stockhub_sdk::stockhub::Stockhub;
use tracing::debug;

use crate::config::Config;
use crate::utils::init::init_catalog_client;
use crate::utils::message;

const STOCKHUB_DESCRIPTION: &str = indoc! {"
    Browse a remote product catalog from the terminal.
"};

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf)]
#[bpaf(
    options,
    descr(STOCKHUB_DESCRIPTION),
    version,
    footer("Run 'stockhub <command> --help' for help on a command.")
)]
pub struct StockhubCli(#[bpaf(external(stockhub_args))] pub StockhubArgs);

/// Main stockhub args parser
///
/// To parse the stockhub CLI, use [`StockhubCli`] instead using [`stockhub_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct StockhubArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands), optional)]
    command: Option<Commands>,
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

impl StockhubArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        if let Err(err) = config.ensure_config_dir() {
            message::warning(format!("{err:#}"));
        }

        let Some(command) = self.command else {
            print!("{}", home::landing_page());
            return Ok(());
        };

        match command {
            Commands::Help(help) => {
                help.handle();
                Ok(())
            },
            Commands::Inventory(args) => args.handle(&init_stockhub(&config)?).await,
            Commands::Product(args) => args.handle(&init_stockhub(&config)?).await,
            Commands::Catalogue(args) => args.handle(&init_stockhub(&config)?).await,
            Commands::Open(args) => args.handle(&init_stockhub(&config)?).await,
            Commands::Browse(args) => args.handle(&init_stockhub(&config)?).await,
        }
    }
}

/// Create the session context from the configuration
pub fn init_stockhub(config: &Config) -> Result<Stockhub> {
    let client = init_catalog_client(config)?;
    let mut stockhub = Stockhub::new(client, config.query.policy());
    stockhub.page_size = config.stockhub.page_size;
    stockhub.similar_limit = config.stockhub.similar_limit;
    stockhub.search_debounce = config.stockhub.search_debounce();
    debug!(
        page_size = stockhub.page_size,
        similar_limit = stockhub.similar_limit,
        "initialized stockhub"
    );
    Ok(stockhub)
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Prints help information
    #[bpaf(command, hide)]
    Help(#[bpaf(external(help))] Help),

    /// List, filter, search and sort products
    #[bpaf(command)]
    Inventory(#[bpaf(external(inventory::inventory))] inventory::Inventory),

    /// Show a product with its reviews and similar products
    #[bpaf(command)]
    Product(#[bpaf(external(product::show_product))] product::ShowProduct),

    /// List product categories
    #[bpaf(command)]
    Catalogue(#[bpaf(external(catalogue::catalogue))] catalogue::Catalogue),

    /// Open a view by its path
    #[bpaf(command)]
    Open(#[bpaf(external(open::open))] open::Open),

    /// Browse the inventory interactively
    #[bpaf(command)]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),
}

#[derive(Debug, Bpaf, Clone)]
struct Help {
    /// Command to show help for
    #[bpaf(positional("cmd"))]
    cmd: Option<String>,
}

/// Force `--help` output for `stockhub` with a given command
pub fn display_help(cmd: Option<String>) {
    let mut args = Vec::from_iter(cmd.as_deref());
    args.push("--help");

    match stockhub_cli().run_inner(&*args) {
        Ok(_) => unreachable!(),
        Err(bpaf::ParseFailure::Stdout(m, _)) => print!("{m:80}"),
        Err(bpaf::ParseFailure::Stderr(m)) => print!("{m:80}"),
        Err(bpaf::ParseFailure::Completion(c)) => print!("{c}"),
    }
}

impl Help {
    fn handle(self) {
        display_help(self.cmd);
    }
}
