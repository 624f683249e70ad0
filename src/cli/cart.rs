use std::io;

use clap::{Args, Subcommand};
use su_curries::{
    cart::CartContext,
    context::AppContext,
    products::{ProductCatalog, ProductId},
    receipt,
};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart with totals
    Show,

    /// Add a product to the cart
    Add {
        /// Product id
        product: ProductId,

        /// Number of units to add
        #[arg(default_value_t = 1)]
        quantity: u32,
    },

    /// Remove a product from the cart
    Remove {
        /// Product id
        product: ProductId,
    },

    /// Set the quantity of a product already in the cart; zero or less removes it
    Update {
        /// Product id
        product: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Empty the cart
    Clear,
}

pub(crate) async fn run(ctx: &AppContext, command: CartCommand) -> Result<(), String> {
    let mut cart = ctx.cart();

    match command.command {
        CartSubcommand::Show => {}
        CartSubcommand::Add { product, quantity } => {
            let product = ctx
                .catalog
                .get_product(&product)
                .await
                .map_err(|error| error.to_string())?;

            cart.add_item(&product, quantity);
        }
        CartSubcommand::Remove { product } => cart.remove_item(&product),
        CartSubcommand::Update { product, quantity } => cart.update_quantity(&product, quantity),
        CartSubcommand::Clear => cart.clear_cart(),
    }

    show(ctx, &mut cart).await
}

pub(crate) async fn show(ctx: &AppContext, cart: &mut CartContext) -> Result<(), String> {
    let calculation = cart
        .calculate_cart(ctx.orders.as_ref())
        .await
        .map_err(|error| format!("failed to price cart: {error}"))?;

    receipt::write_cart(io::stdout().lock(), &calculation).map_err(|error| error.to_string())
}
