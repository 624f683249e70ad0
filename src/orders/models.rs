//! Order Models

use std::fmt::{Display, Formatter, Result as FmtResult};

use clap::ValueEnum;
use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ids::TypedUuid, products::ProductId, users::UserId};

/// Order UUID
pub type OrderId = TypedUuid<Order>;

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, not yet picked up by the kitchen.
    Pending,

    /// Being prepared.
    Processing,

    /// Out for delivery.
    Shipped,

    /// Handed to the customer.
    Delivered,

    /// Abandoned before delivery.
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Awaiting payment.
    Pending,

    /// Paid in full.
    Paid,

    /// Payment was attempted and declined.
    Failed,

    /// Payment was returned to the customer.
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        })
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Card, charged at checkout.
    Card,

    /// Cash on delivery.
    Cash,

    /// `PayPal`, charged at checkout.
    Paypal,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Card => "card",
            Self::Cash => "cash",
            Self::Paypal => "paypal",
        })
    }
}

impl PaymentMethod {
    /// Payment state of a freshly placed order paid this way.
    #[must_use]
    pub fn initial_payment_status(self) -> PaymentStatus {
        match self {
            Self::Card | Self::Paypal => PaymentStatus::Paid,
            Self::Cash => PaymentStatus::Pending,
        }
    }
}

/// Postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Recipient first name.
    pub first_name: String,

    /// Recipient last name.
    pub last_name: String,

    /// Street line, including house number.
    pub street: String,

    /// Town or city.
    pub city: String,

    /// Postal code.
    pub postcode: String,

    /// Country code.
    pub country: String,

    /// Contact number for the driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Line of an order, frozen at the moment the order was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product the line was for.
    pub product_id: ProductId,

    /// Product name at checkout.
    pub product_name: String,

    /// Units ordered.
    pub quantity: u32,

    /// Unit price at checkout.
    pub price: Decimal,

    /// `price` times `quantity`.
    pub total_price: Decimal,
}

impl OrderItem {
    /// Snapshot a line, deriving `total_price` from unit price and quantity.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        price: Decimal,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            price,
            total_price: price * Decimal::from(quantity),
        }
    }
}

/// Order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order UUID.
    pub id: OrderId,

    /// Customer who placed the order.
    pub user_id: UserId,

    /// Human-readable sequential number, e.g. `SU-000042`.
    pub order_number: String,

    /// Fulfilment state.
    pub status: OrderStatus,

    /// Lines as they were at checkout.
    pub items: Vec<OrderItem>,

    /// Sum of item totals.
    pub subtotal: Decimal,

    /// Tax on the subtotal.
    pub tax_amount: Decimal,

    /// Delivery fee.
    pub shipping_amount: Decimal,

    /// Promotional discount.
    pub discount_amount: Decimal,

    /// Amount charged, rounded to the currency's minor unit.
    pub total_amount: Decimal,

    /// ISO 4217 code of every amount.
    pub currency: String,

    /// Delivery address.
    pub shipping_address: Address,

    /// Billing address, the delivery address unless one was given.
    pub billing_address: Address,

    /// How the order is paid for.
    pub payment_method: PaymentMethod,

    /// Payment state.
    pub payment_status: PaymentStatus,

    /// Free-text notes from the customer or driver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Time the order was placed.
    pub created_at: Timestamp,

    /// Time of the last change.
    pub updated_at: Timestamp,
}

impl Order {
    /// Total number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Merge `update` into this order and stamp `updated_at`.
    pub fn apply(&mut self, update: OrderUpdate, now: Timestamp) {
        let OrderUpdate {
            status,
            payment_status,
            shipping_address,
            billing_address,
            payment_method,
            notes,
        } = update;

        if let Some(status) = status {
            self.status = status;
        }

        if let Some(payment_status) = payment_status {
            self.payment_status = payment_status;
        }

        if let Some(address) = shipping_address {
            self.shipping_address = address;
        }

        if let Some(address) = billing_address {
            self.billing_address = address;
        }

        if let Some(method) = payment_method {
            self.payment_method = method;
        }

        if notes.is_some() {
            self.notes = notes;
        }

        self.updated_at = now;
    }
}

/// Partial update of an order. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct OrderUpdate {
    /// New fulfilment state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,

    /// New payment state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,

    /// Replacement delivery address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,

    /// Replacement billing address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,

    /// Replacement payment method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,

    /// Replacement notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderUpdate {
    /// Update that only changes the status.
    #[must_use]
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Check if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Details collected from the customer at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDetails {
    /// Where to deliver.
    pub shipping_address: Address,

    /// Billing address; the delivery address is used when absent.
    pub billing_address: Option<Address>,

    /// How the customer pays.
    pub payment_method: PaymentMethod,

    /// Notes for the kitchen or driver.
    pub notes: Option<String>,
}


#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::{test_support::order, *};

    #[test]
    fn order_item_total_is_price_times_quantity() {
        let item = OrderItem::new(ProductId::from("p2"), "Naan", 3, Decimal::new(2_25, 2));

        assert_eq!(item.total_price, Decimal::new(6_75, 2));
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut order = order("user-1", OrderStatus::Pending);
        let now = Timestamp::from_second(1_700_000_000).unwrap_or(Timestamp::UNIX_EPOCH);

        order.apply(
            OrderUpdate {
                status: Some(OrderStatus::Processing),
                notes: Some("ring the bell".to_string()),
                ..OrderUpdate::default()
            },
            now,
        );

        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.notes.as_deref(), Some("ring the bell"));
        assert_eq!(order.updated_at, now);
    }

    #[test]
    fn update_rejects_unknown_fields() {
        let result = serde_json::from_str::<OrderUpdate>(r#"{"status":"shipped","total":0}"#);

        assert!(result.is_err(), "unknown field should be rejected");
    }

    #[test]
    fn update_parses_camel_case_fields() -> TestResult {
        let update: OrderUpdate =
            serde_json::from_str(r#"{"paymentStatus":"refunded","status":"cancelled"}"#)?;

        assert_eq!(update.payment_status, Some(PaymentStatus::Refunded));
        assert_eq!(update.status, Some(OrderStatus::Cancelled));
        assert!(!update.is_empty());
        assert!(OrderUpdate::default().is_empty());

        Ok(())
    }

    #[test]
    fn card_orders_start_paid_cash_orders_pending() {
        assert_eq!(PaymentMethod::Card.initial_payment_status(), PaymentStatus::Paid);
        assert_eq!(PaymentMethod::Cash.initial_payment_status(), PaymentStatus::Pending);
    }
}
