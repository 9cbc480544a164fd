use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use strum_macros::Display;

/// Default page size of [`Client::mytrades`](crate::api::Client::mytrades).
pub const DEFAULT_TRADES_LIMIT: u32 = 200;

/// Exchange market identifier.
///
/// The exchange reports ids as strings in some responses and numbers in others, so
/// they are kept in their textual form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MarketId(String);

/// Exchange order identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

macro_rules! textual_id {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value.to_string())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

textual_id!(MarketId);
textual_id!(OrderId);

impl MarketId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reads an id stored either as a JSON string or a JSON integer.
    pub(crate) fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl OrderId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display)]
pub enum OrderType {
    Buy,
    Sell,
}

#[derive(Serialize)]
pub(crate) struct MarketParams<'a> {
    pub marketid: &'a MarketId,
}

#[derive(Serialize)]
pub(crate) struct MyTradesParams<'a> {
    pub marketid: &'a MarketId,
    pub limit: u32,
}

#[derive(Serialize)]
pub(crate) struct DateRangeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startdate: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enddate: Option<NaiveDate>,
}

#[derive(Serialize)]
pub(crate) struct OrderParams<'a> {
    pub orderid: &'a OrderId,
}

#[derive(Serialize)]
pub(crate) struct CreateOrderParams<'a> {
    pub marketid: &'a MarketId,
    pub ordertype: OrderType,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Serialize)]
pub(crate) struct FeeParams {
    pub ordertype: OrderType,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Serialize)]
pub(crate) struct WithdrawalParams<'a> {
    pub address: &'a str,
    pub amount: Decimal,
}

/// Whether a `getmarkets` entry trades `primary` against `secondary`.
pub(crate) fn is_pair(market: &Value, primary: &str, secondary: &str) -> bool {
    market.get("primary_currency_code").and_then(Value::as_str) == Some(primary)
        && market.get("secondary_currency_code").and_then(Value::as_str) == Some(secondary)
}
