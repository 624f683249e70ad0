use std::io::{self, Write};

use clap::Args;
use su_curries::{
    context::AppContext,
    orders::{Address, CheckoutDetails, OrdersService, PaymentMethod},
    receipt,
};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Recipient first name; defaults to the signed-in user's
    #[arg(long)]
    first_name: Option<String>,

    /// Recipient last name; defaults to the signed-in user's
    #[arg(long)]
    last_name: Option<String>,

    /// Street address
    #[arg(long)]
    street: String,

    /// Town or city
    #[arg(long)]
    city: String,

    /// Postcode
    #[arg(long)]
    postcode: String,

    /// Country code
    #[arg(long, default_value = "GB")]
    country: String,

    /// Contact phone number
    #[arg(long)]
    phone: Option<String>,

    /// How the order is paid for
    #[arg(long, value_enum, default_value_t = PaymentMethod::Card)]
    payment: PaymentMethod,

    /// Delivery notes for the kitchen or driver
    #[arg(long)]
    notes: Option<String>,
}

pub(crate) async fn run(ctx: &AppContext, args: CheckoutArgs) -> Result<(), String> {
    let user = ctx
        .auth
        .user()
        .ok_or("sign in with --user <EMAIL> before checking out")?;

    let address = Address {
        first_name: args.first_name.unwrap_or_else(|| user.first_name.clone()),
        last_name: args.last_name.unwrap_or_else(|| user.last_name.clone()),
        street: args.street,
        city: args.city,
        postcode: args.postcode,
        country: args.country,
        phone: args.phone.or_else(|| user.phone.clone()),
    };

    let mut cart = ctx.cart();

    let order = ctx
        .orders
        .checkout(
            &mut cart,
            CheckoutDetails {
                shipping_address: address,
                billing_address: None,
                payment_method: args.payment,
                notes: args.notes,
            },
        )
        .await
        .map_err(|error| format!("checkout failed: {error}"))?;

    let mut out = io::stdout().lock();

    receipt::write_order(&mut out, &order).map_err(|error| error.to_string())?;

    writeln!(out, "Thanks {}, your order is on its way to the kitchen.", user.first_name)
        .map_err(|error| error.to_string())
}
