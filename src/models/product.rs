use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a catalog product
pub type ProductId = u64;

/// Product as served by the catalog API
///
/// Fields the store does not read are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "price")]
    pub price: Decimal,
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        price: Decimal,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: image.into(),
            extra: Map::new(),
        }
    }
}

/// JSON number codec for prices
///
/// Integers stay integers and fractional prices are written as floats, so a
/// price read from the catalog is written back in the same form.
mod price {
    use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
    use rust_decimal::Decimal;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        if price.scale() == 0 {
            if let Some(value) = price.to_i64() {
                return serializer.serialize_i64(value);
            }
        }
        match price.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => Err(serde::ser::Error::custom(format!(
                "price {} is not representable as a JSON number",
                price
            ))),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }

    struct PriceVisitor;

    impl<'de> Visitor<'de> for PriceVisitor {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a numeric price")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(value))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Decimal, E> {
            Decimal::from_f64(value)
                .ok_or_else(|| E::custom(format!("price {} is out of range", value)))
        }
    }
}

/// Stock snapshot for a single product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(default)]
    pub id: ProductId,
    pub amount: u32,
}

impl Stock {
    pub fn new(id: ProductId, amount: u32) -> Self {
        Self { id, amount }
    }

    /// Whether `requested` units can be served from this snapshot
    pub fn covers(&self, requested: u32) -> bool {
        requested <= self.amount
    }
}
