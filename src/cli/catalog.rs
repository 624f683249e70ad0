use std::io::{self, Write};

use clap::{Args, Subcommand};
use rusty_money::Money;
use su_curries::{context::AppContext, products::ProductCatalog};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// List the menu
    List {
        /// Only show vegetarian dishes
        #[arg(long)]
        vegetarian: bool,

        /// Only show one category
        #[arg(long)]
        category: Option<String>,
    },
}

pub(crate) async fn run(ctx: &AppContext, command: CatalogCommand) -> Result<(), String> {
    match command.command {
        CatalogSubcommand::List {
            vegetarian,
            category,
        } => list(ctx, vegetarian, category.as_deref()).await,
    }
}

async fn list(ctx: &AppContext, vegetarian: bool, category: Option<&str>) -> Result<(), String> {
    let products = ctx
        .catalog
        .list_products()
        .await
        .map_err(|error| format!("failed to list products: {error}"))?;

    let currency = ctx.orders.policy().currency();
    let mut builder = Builder::default();

    builder.push_record(["Id", "Name", "Category", "Spice", "Veg", "Price", "Stock"]);

    for product in products
        .iter()
        .filter(|product| !vegetarian || product.vegetarian)
        .filter(|product| category.is_none_or(|category| product.category == category))
    {
        builder.push_record([
            product.id.to_string(),
            product.name.clone(),
            product.category.clone(),
            product
                .spice_level
                .map_or_else(String::new, |level| "🌶".repeat(usize::from(level))),
            if product.vegetarian { "✓" } else { "" }.to_string(),
            Money::from_decimal(product.price, currency).to_string(),
            if product.in_stock {
                product
                    .stock_quantity
                    .map_or_else(|| "in stock".to_string(), |qty| qty.to_string())
            } else {
                "sold out".to_string()
            },
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(5..6), Alignment::right());

    writeln!(io::stdout().lock(), "{table}").map_err(|error| error.to_string())
}
