//! `partybook` - CLI for the party booking service
//!
//! This binary runs the HTTP server and provides a command-line cart for
//! browsing packages and submitting booking requests.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use partybook::booking::{compose, BookingOutcome, BookingRequest, BookingService};
use partybook::cart::{format_dollars, Cart, NewCartItem};
use partybook::catalog::{self, PackageView};
use partybook::cli::{
    AddArgs, CartCommand, CheckoutArgs, Cli, Command, ConfigCommand, PackagesCommand,
    ServeCommand, UpdateArgs,
};
use partybook::ratelimit::SlidingWindowLimiter;
use partybook::{init_logging, server, CartStore, Config, Error, SmtpNotifier, SqliteCartStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // `config validate` reports load errors itself.
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        handle_validate(file.clone().or_else(|| cli.config.clone()));
        return Ok(());
    }

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    // Execute the command
    match cli.command {
        Command::Serve(cmd) => handle_serve(config, cmd).await,
        Command::Packages(cmd) => handle_packages(&cmd),
        Command::Cart(cmd) => handle_cart(&config, cmd).await,
        Command::Config(cmd) => handle_config(&config, &cmd),
    }
}

async fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind_addr = bind;
    }
    server::serve(&config).await?;
    Ok(())
}

fn handle_packages(cmd: &PackagesCommand) -> anyhow::Result<()> {
    if cmd.json {
        let views: Vec<PackageView> = catalog::packages().iter().map(PackageView::from).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    for package in catalog::packages() {
        let popular = if package.is_popular { "  [Most Popular]" } else { "" };
        println!("{}  {}  {}/hr{popular}", package.id, package.name, package.price_range());
        println!("    Includes: {}", package.includes.join(", "));
        for size in partybook::CateringSize::ALL {
            println!(
                "    {:<7} {:>2} guests  ${}/hr  {}",
                size.to_string(),
                size.guest_count(),
                package.hourly_rate(size),
                size.description()
            );
        }
        println!();
    }
    println!(
        "Entertainment add-on: ${} flat (included in packages marked with Entertainment)",
        catalog::ENTERTAINMENT_FEE
    );
    Ok(())
}

fn open_cart(config: &Config) -> anyhow::Result<Cart<SqliteCartStore>> {
    let store = SqliteCartStore::open(config.database_path(), config.cart.storage_key.clone())?;
    Ok(Cart::load(store))
}

async fn handle_cart(config: &Config, cmd: CartCommand) -> anyhow::Result<()> {
    let mut cart = open_cart(config)?;

    match cmd {
        CartCommand::List { json } => print_cart(&cart, json)?,
        CartCommand::Add(args) => handle_add(&mut cart, &args)?,
        CartCommand::Remove { id } => {
            if cart.remove_item(&id)? {
                println!("Removed {id}.");
            } else {
                println!("No item with id {id}.");
            }
        }
        CartCommand::Update(args) => handle_update(&mut cart, &args)?,
        CartCommand::Clear => {
            cart.clear()?;
            println!("Cart cleared.");
        }
        CartCommand::Checkout(args) => handle_checkout(config, &mut cart, &args).await?,
    }
    Ok(())
}

fn print_cart<S: CartStore>(cart: &Cart<S>, json: bool) -> anyhow::Result<()> {
    if json {
        let doc = serde_json::json!({
            "items": cart.items(),
            "total": cart.total(),
            "totalEstimate": cart.total_display(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    if cart.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }

    for item in cart.items() {
        let entertainment = if item.is_entertainment_add_on {
            " + Entertainment"
        } else {
            ""
        };
        println!(
            "{}  {} — {} ({} guests), {} hr(s) @ ${}/hr{entertainment}  {}",
            item.id,
            item.package_name,
            item.catering_size,
            item.guest_count,
            item.hours,
            item.hourly_rate,
            format_dollars(item.cost())
        );
    }
    println!();
    println!("Estimated Total: {}", cart.total_display());
    Ok(())
}

fn handle_add<S: CartStore>(cart: &mut Cart<S>, args: &AddArgs) -> anyhow::Result<()> {
    let package = catalog::find(&args.package).ok_or_else(|| Error::unknown_package(&args.package))?;
    let item = NewCartItem::from_package(package, args.size.into(), args.hours, args.entertainment);
    let ack = cart.add_item(item)?;
    println!("{} {}", ack.title, ack.description);
    println!("Item id: {}", ack.item_id);
    Ok(())
}

fn handle_update<S: CartStore>(cart: &mut Cart<S>, args: &UpdateArgs) -> anyhow::Result<()> {
    let Some(item) = cart.get(&args.id) else {
        println!("No item with id {}.", args.id);
        return Ok(());
    };
    let update = args.to_update(item)?;
    cart.update_item(&args.id, update)?;
    println!("Updated {}.", args.id);
    Ok(())
}

async fn handle_checkout<S: CartStore>(
    config: &Config,
    cart: &mut Cart<S>,
    args: &CheckoutArgs,
) -> anyhow::Result<()> {
    let request = BookingRequest::new(args.customer(), cart.items(), cart.total_display());
    partybook::booking::validate(&request.customer)?;

    if args.dry_run {
        let email = compose(&request);
        println!("Subject: {}", email.subject);
        println!("Reply-To: {}", email.reply_to);
        println!();
        println!("{}", email.text);
        return Ok(());
    }

    let notifier = SmtpNotifier::from_config(&config.mail)?;
    let limiter = SlidingWindowLimiter::new(config.rate_limit_window(), config.rate_limit.max_requests);
    let service = BookingService::new(Arc::new(limiter), Arc::new(notifier), config.delivery_timeout());

    match service.submit("cli", request).await {
        Ok(BookingOutcome::Delivered) => {
            cart.clear()?;
            println!("Booking request sent. We'll be in touch soon!");
            Ok(())
        }
        Ok(BookingOutcome::Discarded) => bail!("booking request was discarded"),
        Err(e) => Err(e.into()),
    }
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind_addr);
                if config.server.cors_origins.is_empty() {
                    println!("  CORS origins:       any");
                } else {
                    println!("  CORS origins:       {}", config.server.cors_origins.join(", "));
                }
                println!();
                println!("[Mail]");
                println!("  SMTP relay:         {}:{}", config.mail.smtp_host, config.mail.smtp_port);
                println!("  STARTTLS:           {}", config.mail.starttls);
                println!(
                    "  SMTP user:          {}",
                    config.mail.smtp_user.as_deref().unwrap_or("(none)")
                );
                println!("  From:               {}", config.mail.mail_from);
                println!("  To:                 {}", config.mail.mail_to);
                println!("  Timeout (secs):     {}", config.mail.timeout_secs);
                println!();
                println!("[Rate limit]");
                println!("  Window (secs):      {}", config.rate_limit.window_secs);
                println!("  Max requests:       {}", config.rate_limit.max_requests);
                println!("  Sweep (secs):       {}", config.rate_limit.sweep_interval_secs);
                println!();
                println!("[Cart]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Storage key:        {}", config.cart.storage_key);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            handle_validate(file.clone());
        }
    }
    Ok(())
}

fn handle_validate(file: Option<std::path::PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}
