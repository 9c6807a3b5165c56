//! Value objects for the order domain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderItemStatus;

/// Unique identifier for a line item within an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderItemId(Uuid);

impl OrderItemId {
    /// Creates a new random item ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an item ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Menu item identifier as assigned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuItemId(String);

impl MenuItemId {
    /// Creates a new menu item ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MenuItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MenuItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MenuItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for MenuItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Money amount in minor units (cents) to avoid floating point issues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new amount from minor units.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates a new amount from whole currency units.
    pub fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion.
    pub fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor-unit remainder.
    pub fn cents_part(&self) -> i64 {
        self.0.abs() % 100
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0 * quantity as i64)
    }

    /// Returns the larger of this amount and zero.
    pub fn clamp_non_negative(&self) -> Money {
        Money(self.0.max(0))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 < 0 {
            write!(f, "-{}.{:02}", self.major().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.major(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A modifier option chosen for a line item, e.g. "Large" or "Extra shot".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedModifier {
    pub group_id: String,
    pub group_name: String,
    pub option_id: String,
    pub option_name: String,
    /// Added to the unit price for every unit of the line.
    pub price_change: Money,
}

impl SelectedModifier {
    pub fn new(
        group_id: impl Into<String>,
        group_name: impl Into<String>,
        option_id: impl Into<String>,
        option_name: impl Into<String>,
        price_change: Money,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            group_name: group_name.into(),
            option_id: option_id.into(),
            option_name: option_name.into(),
            price_change,
        }
    }
}

/// A line item in an order.
///
/// `unit_price` is the catalog price at the moment the line was created and
/// never follows later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub status: OrderItemStatus,
    #[serde(default)]
    pub modifiers: Vec<SelectedModifier>,
}

impl OrderItem {
    /// Creates a new pending line item.
    pub fn new(
        menu_item_id: impl Into<MenuItemId>,
        name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            id: OrderItemId::new(),
            menu_item_id: menu_item_id.into(),
            name: name.into(),
            quantity,
            unit_price,
            status: OrderItemStatus::Pending,
            modifiers: Vec::new(),
        }
    }

    /// Adds modifiers, builder style.
    pub fn with_modifiers(mut self, modifiers: Vec<SelectedModifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Unit price plus every modifier's price change.
    pub fn unit_total(&self) -> Money {
        self.unit_price + self.modifiers.iter().map(|m| m.price_change).sum::<Money>()
    }

    /// Returns the total price for this line (quantity * unit total).
    pub fn line_total(&self) -> Money {
        self.unit_total().multiply(self.quantity)
    }
}

/// How an order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    EWallet,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::EWallet => "e_wallet",
        };
        write!(f, "{name}")
    }
}

/// Payment as entered at the order-entry terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    /// Amount tendered. Only meaningful for cash.
    pub amount_received: Option<Money>,
}

impl PaymentDetails {
    pub fn cash(amount_received: Money) -> Self {
        Self {
            method: PaymentMethod::Cash,
            amount_received: Some(amount_received),
        }
    }

    pub fn card() -> Self {
        Self {
            method: PaymentMethod::Card,
            amount_received: None,
        }
    }

    pub fn e_wallet() -> Self {
        Self {
            method: PaymentMethod::EWallet,
            amount_received: None,
        }
    }
}

/// Payment state stored on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payment {
    pub method: Option<PaymentMethod>,
    pub amount_received: Option<Money>,
    pub change_given: Option<Money>,
    pub is_paid: bool,
}

impl Payment {
    /// An unpaid order.
    pub fn unpaid() -> Self {
        Self::default()
    }

    /// Settles `details` against an order total.
    ///
    /// Change is only computed for cash with a positive amount received and
    /// a positive total, and never goes below zero.
    pub fn settle(details: PaymentDetails, total: Money) -> Self {
        let change_given = match (details.method, details.amount_received) {
            (PaymentMethod::Cash, Some(received))
                if received.is_positive() && total.is_positive() =>
            {
                Some((received - total).clamp_non_negative())
            }
            _ => None,
        };

        Self {
            method: Some(details.method),
            amount_received: details.amount_received,
            change_given,
            is_paid: true,
        }
    }
}

/// Internal daily order number, rendered `YYYYMMDD-NNNN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber {
    date: NaiveDate,
    sequence: u32,
}

impl OrderNumber {
    pub fn new(date: NaiveDate, sequence: u32) -> Self {
        Self { date, sequence }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:04}", self.date.format("%Y%m%d"), self.sequence)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date, sequence) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid order number: {s}"))?;
        let date = NaiveDate::parse_from_str(date, "%Y%m%d")
            .map_err(|e| format!("invalid order number date in {s}: {e}"))?;
        let sequence = sequence
            .parse()
            .map_err(|e| format!("invalid order number sequence in {s}: {e}"))?;
        Ok(Self { date, sequence })
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.to_string()
    }
}

/// Customer-facing token.
///
/// Issued tokens render as at least three digits; held unpaid orders carry
/// the `HELD` sentinel instead of consuming a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TokenNumber {
    Issued(u32),
    Held,
}

impl TokenNumber {
    pub const HELD: &'static str = "HELD";

    pub fn is_held(&self) -> bool {
        matches!(self, TokenNumber::Held)
    }
}

impl std::fmt::Display for TokenNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenNumber::Issued(n) => write!(f, "{n:03}"),
            TokenNumber::Held => write!(f, "{}", Self::HELD),
        }
    }
}

impl std::str::FromStr for TokenNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::HELD {
            return Ok(TokenNumber::Held);
        }
        s.parse()
            .map(TokenNumber::Issued)
            .map_err(|e| format!("invalid token {s}: {e}"))
    }
}

impl TryFrom<String> for TokenNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenNumber> for String {
    fn from(token: TokenNumber) -> Self {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_major() {
        let money = Money::from_major(150);
        assert_eq!(money.cents(), 15000);
        assert_eq!(money.major(), 150);
        assert_eq!(money.cents_part(), 0);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_money_sum() {
        let total: Money = [Money::from_major(1), Money::from_cents(50)].into_iter().sum();
        assert_eq!(total.cents(), 150);
    }

    #[test]
    fn test_line_total_includes_modifiers() {
        let item = OrderItem::new("latte", "Latte", 2, Money::from_major(150)).with_modifiers(vec![
            SelectedModifier::new("size", "Size", "large", "Large", Money::from_major(20)),
            SelectedModifier::new("shot", "Extra", "shot", "Extra shot", Money::from_major(30)),
        ]);

        assert_eq!(item.unit_total(), Money::from_major(200));
        assert_eq!(item.line_total(), Money::from_major(400));
    }

    #[test]
    fn test_cash_change_is_clamped() {
        let paid = Payment::settle(PaymentDetails::cash(Money::from_major(500)), Money::from_major(390));
        assert!(paid.is_paid);
        assert_eq!(paid.change_given, Some(Money::from_major(110)));

        let short = Payment::settle(PaymentDetails::cash(Money::from_major(300)), Money::from_major(390));
        assert_eq!(short.change_given, Some(Money::zero()));
    }

    #[test]
    fn test_no_change_for_card_or_empty_total() {
        let card = Payment::settle(PaymentDetails::card(), Money::from_major(390));
        assert_eq!(card.change_given, None);
        assert_eq!(card.method, Some(PaymentMethod::Card));

        let free = Payment::settle(PaymentDetails::cash(Money::from_major(10)), Money::zero());
        assert_eq!(free.change_given, None);
    }

    #[test]
    fn test_order_number_format_and_parse() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let number = OrderNumber::new(date, 7);
        assert_eq!(number.to_string(), "20240315-0007");

        let parsed: OrderNumber = "20240315-0007".parse().unwrap();
        assert_eq!(parsed, number);
        assert!("2024-03-15".parse::<OrderNumber>().is_err());
    }

    #[test]
    fn test_token_rendering() {
        assert_eq!(TokenNumber::Issued(1).to_string(), "001");
        assert_eq!(TokenNumber::Issued(42).to_string(), "042");
        assert_eq!(TokenNumber::Issued(1234).to_string(), "1234");
        assert_eq!(TokenNumber::Held.to_string(), "HELD");
        assert_eq!("HELD".parse::<TokenNumber>().unwrap(), TokenNumber::Held);
        assert_eq!("012".parse::<TokenNumber>().unwrap(), TokenNumber::Issued(12));
    }

    #[test]
    fn test_token_serializes_as_string() {
        let json = serde_json::to_string(&TokenNumber::Issued(3)).unwrap();
        assert_eq!(json, "\"003\"");
        let back: TokenNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TokenNumber::Issued(3));
    }

    #[test]
    fn test_order_item_serialization() {
        let item = OrderItem::new("latte", "Latte", 2, Money::from_cents(999));
        let json = serde_json::to_string(&item).unwrap();
        let deserialized: OrderItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, deserialized);
    }
}
