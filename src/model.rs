//! Wire records and the typed entity shapes behind them.

use crate::schema::EntityKind;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// A record as it travels over the wire: camelCase keys, JSON values.
pub type Record = serde_json::Map<String, Value>;

/// Primary key of every record. 0 means "not yet persisted".
pub const ID_KEY: &str = "id";

/// Identifier of a record, if present and integral.
pub fn record_id(record: &Record) -> Option<i64> {
    record.get(ID_KEY).and_then(Value::as_i64)
}

/// Date portion of an ISO date or date-time string ("2024-05-01T10:00:00" -> "2024-05-01").
pub fn date_only(s: &str) -> &str {
    s.split(['T', ' ']).next().unwrap_or(s)
}

/// Typed view of one entity kind, convertible to and from a wire record.
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn to_record(&self) -> Record {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Record::new(),
        }
    }

    fn from_record(record: &Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(record.clone()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub address: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub address: String,
}

/// A sale references three other records by id and carries their display names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub date_sold: String,
    pub customer_id: i64,
    #[serde(default)]
    pub customer: String,
    pub product_id: i64,
    #[serde(default)]
    pub product: String,
    pub store_id: i64,
    #[serde(default)]
    pub store: String,
}

impl Entity for Customer {
    const KIND: EntityKind = EntityKind::Customer;
}

impl Entity for Product {
    const KIND: EntityKind = EntityKind::Product;
}

impl Entity for Store {
    const KIND: EntityKind = EntityKind::Store;
}

impl Entity for Sale {
    const KIND: EntityKind = EntityKind::Sale;
}

/// One page of records as returned by `GET /api/{kind}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedDtos<T> {
    pub dtos: Vec<T>,
    pub total_count: i64,
}
