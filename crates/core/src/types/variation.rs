//! Product variations: the purchasable unit of a catalog product.
//!
//! JSON field names keep the catalog's historical casing (`SKU`,
//! `ColorTone`, `Per_m2`, ...) because storefront clients key on them.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::VariationId;

/// One sellable variation of a product (a given size, finish, thickness...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Variation {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<VariationId>,
    /// Stable public identifier, assigned when the product is saved.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uuid: Option<Uuid>,
    #[serde(rename = "SKU", default)]
    pub sku: Option<String>,
    #[serde(rename = "Thickness", default)]
    pub thickness: Option<String>,
    #[serde(rename = "Size", default)]
    pub size: Option<String>,
    #[serde(rename = "Finish", default)]
    pub finish: Option<String>,
    #[serde(rename = "PackSize", default)]
    pub pack_size: Option<Decimal>,
    #[serde(rename = "Pcs", default)]
    pub pcs: Option<i32>,
    #[serde(rename = "Stock", default)]
    pub stock: Option<i32>,
    #[serde(rename = "ColorTone", default)]
    pub color_tone: Option<String>,
    #[serde(rename = "Price", default)]
    pub price: Option<Decimal>,
    #[serde(rename = "Per_m2", default)]
    pub per_m2: Option<Decimal>,
}

impl Variation {
    /// Whether this variation is addressed by `reference`.
    #[must_use]
    pub fn is_referenced_by(&self, reference: &VariationRef) -> bool {
        match reference {
            VariationRef::Uuid(uuid) => self.uuid.as_ref() == Some(uuid),
            VariationRef::Id(id) => self.id.is_some_and(|own| own.as_i32() == *id),
        }
    }

    /// Price of one pack: `per_m2 * pack_size`, rounded to pence.
    ///
    /// Zero when either factor is missing or zero.
    #[must_use]
    pub fn pack_price(&self) -> Decimal {
        match (self.per_m2, self.pack_size) {
            (Some(per), Some(pack)) if !per.is_zero() && !pack.is_zero() => (per * pack).round_dp(2),
            _ => Decimal::ZERO,
        }
    }
}

/// A client-supplied reference to a variation.
///
/// Clients may send either the variation's UUID or its numeric row ID, as a
/// JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawVariationRef")]
#[serde(untagged)]
pub enum VariationRef {
    Uuid(Uuid),
    Id(i32),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVariationRef {
    Number(i64),
    Text(String),
}

impl TryFrom<RawVariationRef> for VariationRef {
    type Error = String;

    fn try_from(raw: RawVariationRef) -> Result<Self, Self::Error> {
        match raw {
            RawVariationRef::Number(n) => i32::try_from(n)
                .map(Self::Id)
                .map_err(|_| format!("variation id {n} is out of range")),
            RawVariationRef::Text(s) => s.parse(),
        }
    }
}

impl core::str::FromStr for VariationRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(uuid) = Uuid::parse_str(s) {
            return Ok(Self::Uuid(uuid));
        }
        s.parse::<i32>()
            .map(Self::Id)
            .map_err(|_| format!("'{s}' is neither a variation uuid nor an id"))
    }
}

impl fmt::Display for VariationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(uuid) => write!(f, "{uuid}"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_pack_price_rounds_to_pence() {
        let variation = Variation {
            per_m2: Some(d("34.99")),
            pack_size: Some(d("1.44")),
            ..Variation::default()
        };
        assert_eq!(variation.pack_price(), d("50.39"));
    }

    #[test]
    fn test_pack_price_zero_without_pack_size() {
        let variation = Variation {
            per_m2: Some(d("34.99")),
            ..Variation::default()
        };
        assert_eq!(variation.pack_price(), Decimal::ZERO);
    }

    #[test]
    fn test_variation_ref_accepts_number_and_strings() {
        let from_number: VariationRef = serde_json::from_str("12").unwrap();
        assert_eq!(from_number, VariationRef::Id(12));

        let from_string: VariationRef = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(from_string, VariationRef::Id(12));

        let uuid = Uuid::new_v4();
        let from_uuid: VariationRef = serde_json::from_str(&format!("\"{uuid}\"")).unwrap();
        assert_eq!(from_uuid, VariationRef::Uuid(uuid));

        assert!(serde_json::from_str::<VariationRef>("\"large\"").is_err());
    }

    #[test]
    fn test_is_referenced_by() {
        let uuid = Uuid::new_v4();
        let variation = Variation {
            id: Some(VariationId::new(3)),
            uuid: Some(uuid),
            ..Variation::default()
        };
        assert!(variation.is_referenced_by(&VariationRef::Uuid(uuid)));
        assert!(variation.is_referenced_by(&VariationRef::Id(3)));
        assert!(!variation.is_referenced_by(&VariationRef::Id(4)));
    }

    #[test]
    fn test_serializes_catalog_field_names() {
        let variation = Variation {
            sku: Some("SLATE-01".to_string()),
            color_tone: Some("Grey".to_string()),
            ..Variation::default()
        };
        let json = serde_json::to_value(&variation).unwrap();
        assert_eq!(json["SKU"], "SLATE-01");
        assert_eq!(json["ColorTone"], "Grey");
        assert!(json.get("uuid").is_none());
    }
}
