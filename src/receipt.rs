//! Receipt
//!
//! Terminal rendering of cart totals and orders.

use std::{fmt::Write as _, io};

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{orders::Order, pricing::CartCalculation};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The output could not be written.
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

/// Write a cart breakdown: one row per line, followed by the totals.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_cart(mut out: impl io::Write, cart: &CartCalculation) -> Result<(), ReceiptError> {
    if cart.is_empty() {
        writeln!(out, "\nYour cart is empty.\n")?;

        return Ok(());
    }

    let mut builder = Builder::default();
    let mut missing_rows = Vec::new();

    builder.push_record(["", "Item", "Qty", "Unit Price", "Line Total"]);

    for (idx, item) in cart.items.iter().enumerate() {
        let mut name = item.product.name.clone();

        if item.missing {
            missing_rows.push(idx + 1);
            _ = write!(name, " ({})", item.line.product_id);
        } else if !item.product.in_stock {
            _ = write!(name, " (out of stock)");
        }

        builder.push_record([
            format!("#{:<3}", idx + 1),
            name,
            item.line.quantity.to_string(),
            format_money(Money::from_decimal(item.product.price, cart.currency)),
            format_money(item.line_total),
        ]);
    }

    let mut table = builder.build();

    table.with(theme());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    for row in missing_rows {
        table.modify(Rows::one(row), Color::FG_RED);
    }

    writeln!(out, "\n{}", colorize_borders(&table.to_string()))?;

    let shipping = if cart.shipping_amount.is_zero() {
        "Free".to_string()
    } else {
        format_money(cart.shipping_amount)
    };

    let mut summary = vec![
        (" Subtotal:", format_money(cart.subtotal)),
        (" Tax:", format_money(cart.tax_amount)),
        (" Shipping:", shipping),
    ];

    if !cart.discount_amount.is_zero() {
        summary.push((" Discount:", format!("-{}", format_money(cart.discount_amount))));
    }

    summary.push((" \x1b[1mTotal:\x1b[0m", format_money(cart.total_amount)));

    write_summary(&mut out, &summary)
}

/// Write a single order with its items and totals.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_order(mut out: impl io::Write, order: &Order) -> Result<(), ReceiptError> {
    writeln!(
        out,
        "\n\x1b[1m{}\x1b[0m  {}  {}",
        order.order_number, order.status, order.created_at
    )?;

    writeln!(
        out,
        " Payment: {} ({})",
        order.payment_method, order.payment_status
    )?;

    let ship = &order.shipping_address;

    writeln!(
        out,
        " Deliver to: {} {}, {}, {} {}",
        ship.first_name, ship.last_name, ship.street, ship.city, ship.postcode
    )?;

    if let Some(notes) = &order.notes {
        writeln!(out, " Notes: {notes}")?;
    }

    let mut builder = Builder::default();

    builder.push_record(["Item", "Qty", "Unit Price", "Line Total"]);

    for item in &order.items {
        builder.push_record([
            item.product_name.clone(),
            item.quantity.to_string(),
            order_money(order, item.price),
            order_money(order, item.total_price),
        ]);
    }

    let mut table = builder.build();

    table.with(theme());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..4), Alignment::right());

    writeln!(out, "\n{}", colorize_borders(&table.to_string()))?;

    write_summary(
        &mut out,
        &[
            (" Subtotal:", order_money(order, order.subtotal)),
            (" Tax:", order_money(order, order.tax_amount)),
            (" Shipping:", order_money(order, order.shipping_amount)),
            (" Discount:", order_money(order, order.discount_amount)),
            (" \x1b[1mTotal:\x1b[0m", order_money(order, order.total_amount)),
        ],
    )
}

/// Write a one-row-per-order overview.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_orders(mut out: impl io::Write, orders: &[Order]) -> Result<(), ReceiptError> {
    if orders.is_empty() {
        writeln!(out, "\nNo orders.\n")?;

        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["Order", "Placed", "Customer", "Status", "Payment", "Items", "Total"]);

    for order in orders {
        builder.push_record([
            order.order_number.clone(),
            order.created_at.to_string(),
            order.user_id.to_string(),
            order.status.to_string(),
            order.payment_status.to_string(),
            order.item_count().to_string(),
            order_money(order, order.total_amount),
        ]);
    }

    let mut table = builder.build();

    table.with(theme());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(5..7), Alignment::right());

    writeln!(out, "\n{}\n", colorize_borders(&table.to_string()))?;

    Ok(())
}

/// Format an amount rounded to its currency's minor unit.
fn format_money(money: Money<'_, Currency>) -> String {
    let currency = money.currency();
    let amount = money
        .amount()
        .round_dp_with_strategy(currency.exponent, RoundingStrategy::MidpointAwayFromZero);

    Money::from_decimal(amount, currency).to_string()
}

/// Orders carry a currency code; unknown codes fall back to a plain suffix.
fn order_money(order: &Order, amount: Decimal) -> String {
    iso::find(&order.currency).map_or_else(
        || format!("{amount} {}", order.currency),
        |currency| format_money(Money::from_decimal(amount, currency)),
    )
}

fn theme() -> Theme {
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    theme
}

/// Dim the box-drawing characters of a rendered table.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            out.push_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            out.push_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        out.push_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Right-align labels and values into two columns.
fn write_summary(
    out: &mut impl io::Write,
    lines: &[(&str, String)],
) -> Result<(), ReceiptError> {
    let label_width = lines
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or(0);

    let value_width = lines
        .iter()
        .map(|(_, value)| visible_width(value))
        .max()
        .unwrap_or(0);

    for (label, value) in lines {
        let label_pad = label_width.saturating_sub(visible_width(label));
        let value_pad = value_width.saturating_sub(visible_width(value));

        writeln!(
            out,
            "{}{label}  {}{value}  ",
            " ".repeat(label_pad),
            " ".repeat(value_pad)
        )?;
    }

    writeln!(out)?;

    Ok(())
}
