use std::io;

use clap::{Args, Subcommand};
use su_curries::{
    context::AppContext,
    orders::{OrderId, OrderStatus, OrderUpdate, OrdersService},
    receipt,
};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List the signed-in user's orders, or every order with --all
    List {
        /// Include every customer's orders
        #[arg(long)]
        all: bool,

        /// Only show orders in this state
        #[arg(long, value_enum)]
        status: Option<OrderStatus>,
    },

    /// Show one order in full
    Show {
        /// Order id
        order_id: OrderId,
    },

    /// List orders out for delivery
    Deliveries,

    /// Move an order to a new status
    Status {
        /// Order id
        order_id: OrderId,

        /// New status
        #[arg(value_enum)]
        status: OrderStatus,
    },

    /// Mark an order as delivered
    Deliver {
        /// Order id
        order_id: OrderId,

        /// Delivery notes, replacing any existing notes
        #[arg(long)]
        notes: Option<String>,
    },
}

pub(crate) async fn run(ctx: &AppContext, command: OrdersCommand) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::List { all, status } => {
            let mut orders = if all {
                ctx.store.orders()
            } else {
                ctx.orders
                    .user_orders()
                    .await
                    .map_err(|error| format!("failed to list orders: {error}"))?
            };

            if let Some(status) = status {
                orders.retain(|order| order.status == status);
            }

            receipt::write_orders(io::stdout().lock(), &orders).map_err(|error| error.to_string())
        }
        OrdersSubcommand::Show { order_id } => show(ctx, order_id).await,
        OrdersSubcommand::Deliveries => {
            receipt::write_orders(io::stdout().lock(), &ctx.store.orders_for_delivery())
                .map_err(|error| error.to_string())
        }
        OrdersSubcommand::Status { order_id, status } => {
            let order = ctx
                .orders
                .update_order(
                    order_id,
                    OrderUpdate {
                        status: Some(status),
                        ..OrderUpdate::default()
                    },
                )
                .await
                .map_err(|error| format!("failed to update order {order_id}: {error}"))?;

            receipt::write_order(io::stdout().lock(), &order).map_err(|error| error.to_string())
        }
        OrdersSubcommand::Deliver { order_id, notes } => {
            if !ctx.store.mark_order_as_delivered(order_id, notes) {
                return Err(format!("order {order_id} not found"));
            }

            show(ctx, order_id).await
        }
    }
}

async fn show(ctx: &AppContext, order_id: OrderId) -> Result<(), String> {
    let order = ctx
        .orders
        .order(order_id)
        .await
        .map_err(|error| format!("failed to load order {order_id}: {error}"))?;

    receipt::write_order(io::stdout().lock(), &order).map_err(|error| error.to_string())
}
