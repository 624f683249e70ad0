use clap::{Parser, Subcommand};
use su_curries::{
    config::{LoggingConfig, PricingConfig, StorageConfig},
    context::AppContext,
};

mod cart;
mod catalog;
mod checkout;
mod orders;

#[derive(Debug, Parser)]
#[command(name = "su-curries", about = "SU Curries ordering CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    pricing: PricingConfig,

    #[command(flatten)]
    storage: StorageConfig,

    /// Email of the user to act as
    #[arg(short, long, env = "SU_USER", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Catalog(catalog::CatalogCommand),
    Cart(cart::CartCommand),
    Checkout(checkout::CheckoutArgs),
    Orders(orders::OrdersCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let ctx = AppContext::from_config(&self.pricing, &self.storage)
            .map_err(|error| format!("failed to start: {}", error_chain(&error)))?;

        if let Some(email) = &self.user {
            ctx.sign_in(email)
                .map_err(|error| format!("failed to sign in: {error}"))?;
        }

        match self.command {
            Commands::Catalog(command) => catalog::run(&ctx, command).await,
            Commands::Cart(command) => cart::run(&ctx, command).await,
            Commands::Checkout(args) => checkout::run(&ctx, args).await,
            Commands::Orders(command) => orders::run(&ctx, command).await,
        }
    }
}

/// Render an error with its sources, outermost first.
pub(crate) fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
