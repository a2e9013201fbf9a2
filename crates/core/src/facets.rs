//! Category facets: filter parsing, product filtering and filter counts.
//!
//! A category page offers seven filter dimensions. Each dimension's option
//! counts are computed against every *other* active filter, so selecting
//! "Grey" still shows how many "Beige" variations the rest of the filters
//! leave. Counts are per variation, not per product.

use rust_decimal::Decimal;
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::types::Variation;

/// Price buckets offered on category pages, as `(label, min, max)`.
///
/// Bucket membership is half-open (`min <= price < max`), while an active
/// price *filter* is inclusive on both ends.
pub const PRICE_BUCKETS: [(&str, i64, i64); 5] = [
    ("0-200", 0, 200),
    ("200-300", 200, 300),
    ("300-500", 300, 500),
    ("500-1000", 500, 1000),
    ("1000-2000", 1000, 2000),
];

/// Color tones that always appear in the counts, even at zero.
pub const COLOR_TONES: [&str; 15] = [
    "Beige", "Black", "Blue", "Bronze", "Brown", "Cream", "Golden", "Green", "Grey", "Mint",
    "Multi", "Red", "Silver", "White", "Yellow",
];

/// Thickness options that always appear in the counts, even at zero.
pub const THICKNESSES: [&str; 11] = [
    "THICKNESS 12-20MM",
    "THICKNESS 15-25MM",
    "THICKNESS 18MM",
    "THICKNESS 20MM",
    "THICKNESS 22MM",
    "THICKNESS 25-35MM",
    "THICKNESS 25-45MM",
    "THICKNESS 30-40MM",
    "THICKNESS 35-50MM",
    "THICKNESS 35-55MM",
    "THICKNESS 68MM",
];

/// Size options that always appear in the counts, even at zero.
pub const SIZES: [&str; 10] = [
    "SIZE 100X100",
    "SIZE 100X200",
    "SIZE 150X900",
    "SIZE 200X600",
    "SIZE 228X110",
    "SIZE 600X1200",
    "SIZE 600X150",
    "SIZE 600X600",
    "SIZE 600X900",
    "Mix Pack",
];

/// Errors from parsing filter query values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FacetError {
    #[error("price filter must look like 'min-max', got '{0}'")]
    MalformedPrice(String),
    #[error("price filter minimum exceeds maximum in '{0}'")]
    InvertedPrice(String),
    #[error("invalid {facet} filter '{value}'")]
    InvalidValue { facet: &'static str, value: String },
}

/// A filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Price,
    ColorTone,
    Finish,
    Thickness,
    Size,
    Pcs,
    PackSize,
}

/// An inclusive price range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    /// Parse `"min-max"`, e.g. `"200-300"`.
    ///
    /// # Errors
    ///
    /// Returns `FacetError` when the value is not two numbers separated by
    /// `-`, or when `min > max`.
    pub fn parse(raw: &str) -> Result<Self, FacetError> {
        let raw = raw.trim();
        let malformed = || FacetError::MalformedPrice(raw.to_string());

        let (min, max) = raw.split_once('-').ok_or_else(malformed)?;
        let min: Decimal = min.trim().parse().map_err(|_| malformed())?;
        let max: Decimal = max.trim().parse().map_err(|_| malformed())?;
        if min > max {
            return Err(FacetError::InvertedPrice(raw.to_string()));
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Active filters of a category page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetFilters {
    pub price: Option<PriceRange>,
    pub color_tone: Option<String>,
    pub finish: Option<String>,
    pub thickness: Option<String>,
    pub size: Option<String>,
    pub pcs: Option<i32>,
    pub pack_size: Option<Decimal>,
}

/// Raw filter values as they arrive in a query string.
#[derive(Debug, Clone, Default)]
pub struct RawFacetQuery<'a> {
    pub price: Option<&'a str>,
    pub color_tone: Option<&'a str>,
    pub finish: Option<&'a str>,
    pub thickness: Option<&'a str>,
    pub size: Option<&'a str>,
    pub pcs: Option<&'a str>,
    pub pack_size: Option<&'a str>,
}

/// Trim a raw value; blank values count as "no filter".
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl FacetFilters {
    /// Build filters from raw query values.
    ///
    /// # Errors
    ///
    /// Returns `FacetError` if the price range, piece count or pack size
    /// cannot be parsed.
    pub fn from_query(raw: &RawFacetQuery<'_>) -> Result<Self, FacetError> {
        let price = present(raw.price).map(PriceRange::parse).transpose()?;
        let pcs = present(raw.pcs)
            .map(|v| {
                v.parse::<i32>().map_err(|_| FacetError::InvalidValue {
                    facet: "pcs",
                    value: v.to_string(),
                })
            })
            .transpose()?;
        let pack_size = present(raw.pack_size)
            .map(|v| {
                v.parse::<Decimal>().map_err(|_| FacetError::InvalidValue {
                    facet: "packSize",
                    value: v.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            price,
            color_tone: present(raw.color_tone).map(String::from),
            finish: present(raw.finish).map(String::from),
            thickness: present(raw.thickness).map(String::from),
            size: present(raw.size).map(String::from),
            pcs,
            pack_size,
        })
    }

    /// Whether any filter is active.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.color_tone.is_none()
            && self.finish.is_none()
            && self.thickness.is_none()
            && self.size.is_none()
            && self.pcs.is_none()
            && self.pack_size.is_none()
    }

    /// Whether `variation` passes every active filter except `excluded`.
    #[must_use]
    pub fn matches(&self, variation: &Variation, excluded: Option<Facet>) -> bool {
        let active = |facet: Facet| excluded != Some(facet);

        if active(Facet::Price)
            && let Some(range) = &self.price
            && !variation.price.is_some_and(|p| range.contains(p))
        {
            return false;
        }

        let text_filters = [
            (Facet::ColorTone, &self.color_tone, &variation.color_tone),
            (Facet::Finish, &self.finish, &variation.finish),
            (Facet::Thickness, &self.thickness, &variation.thickness),
            (Facet::Size, &self.size, &variation.size),
        ];
        for (facet, wanted, actual) in text_filters {
            if active(facet) && wanted.is_some() && wanted != actual {
                return false;
            }
        }

        if active(Facet::Pcs) && self.pcs.is_some() && self.pcs != variation.pcs {
            return false;
        }
        if active(Facet::PackSize) && self.pack_size.is_some() && self.pack_size != variation.pack_size
        {
            return false;
        }

        true
    }
}

/// A product that owns a list of variations.
pub trait Faceted {
    fn variations(&self) -> &[Variation];

    fn retain_variations<F>(&mut self, keep: F)
    where
        F: FnMut(&Variation) -> bool;
}

/// Narrow each product to its matching variations, dropping products left
/// with none. Product order is preserved.
#[must_use]
pub fn filter_products<P>(products: &[P], filters: &FacetFilters) -> Vec<P>
where
    P: Faceted + Clone,
{
    products
        .iter()
        .filter(|product| {
            product
                .variations()
                .iter()
                .any(|v| filters.matches(v, None))
        })
        .map(|product| {
            let mut narrowed = product.clone();
            narrowed.retain_variations(|v| filters.matches(v, None));
            narrowed
        })
        .collect()
}

/// Counts per option label, in insertion order.
///
/// Predefined options keep their listed order; open-ended options appear in
/// the order they were first seen in the catalog. Serializes as a JSON
/// object with keys in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionCounts {
    entries: Vec<(String, u32)>,
}

impl OptionCounts {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// All `labels` present with a zero count.
    #[must_use]
    pub fn zeroed(labels: &[&str]) -> Self {
        Self {
            entries: labels.iter().map(|label| ((*label).to_string(), 0)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&u32> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, count)| count)
    }

    fn get_mut(&mut self, label: &str) -> Option<&mut u32> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == label)
            .map(|(_, count)| count)
    }

    #[must_use]
    pub fn contains_key(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Set the count of `label`, appending it if it is new.
    pub fn insert(&mut self, label: String, count: u32) {
        match self.get_mut(&label) {
            Some(existing) => *existing = count,
            None => self.entries.push((label, count)),
        }
    }

    /// Add one to `label`, appending it if it is new.
    pub fn bump(&mut self, label: &str) {
        match self.get_mut(label) {
            Some(count) => *count += 1,
            None => self.entries.push((label.to_string(), 1)),
        }
    }

    /// Add one to `label` only if it is already listed.
    pub fn bump_known(&mut self, label: Option<&str>) {
        if let Some(count) = label.and_then(|l| self.get_mut(l)) {
            *count += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.into_iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &u32> {
        self.entries.iter().map(|(_, count)| count)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a OptionCounts {
    type Item = (&'a String, &'a u32);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, u32)>,
        fn(&'a (String, u32)) -> (&'a String, &'a u32),
    >;

    fn into_iter(self) -> Self::IntoIter {
        let split: fn(&'a (String, u32)) -> (&'a String, &'a u32) = |(label, count)| (label, count);
        self.entries.iter().map(split)
    }
}

impl std::ops::Index<&str> for OptionCounts {
    type Output = u32;

    fn index(&self, label: &str) -> &u32 {
        self.get(label)
            .unwrap_or_else(|| panic!("no count for option '{label}'"))
    }
}

impl Serialize for OptionCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

/// Option counts per filter dimension, keyed by the option label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCounts {
    pub price: OptionCounts,
    pub color_tone: OptionCounts,
    pub finish: OptionCounts,
    pub thickness: OptionCounts,
    pub size: OptionCounts,
    pub pcs: OptionCounts,
    pub pack_size: OptionCounts,
}

/// Variations that pass every active filter except `facet`'s own.
fn visible_for<'a, P: Faceted>(
    products: &'a [P],
    filters: &'a FacetFilters,
    facet: Facet,
) -> impl Iterator<Item = &'a Variation> + 'a {
    products
        .iter()
        .flat_map(|product| product.variations().iter())
        .filter(move |v| filters.matches(v, Some(facet)))
}

impl Default for FilterCounts {
    fn default() -> Self {
        Self {
            price: OptionCounts::zeroed(&PRICE_BUCKETS.map(|(label, _, _)| label)),
            color_tone: OptionCounts::zeroed(&COLOR_TONES),
            finish: OptionCounts::new(),
            thickness: OptionCounts::zeroed(&THICKNESSES),
            size: OptionCounts::zeroed(&SIZES),
            pcs: OptionCounts::new(),
            pack_size: OptionCounts::new(),
        }
    }
}

impl FilterCounts {
    /// Compute counts for every dimension of a category's products.
    #[must_use]
    pub fn compute<P: Faceted>(products: &[P], filters: &FacetFilters) -> Self {
        let mut counts = Self::default();
        let visible = |facet| visible_for(products, filters, facet);

        for variation in visible(Facet::Price) {
            let Some(price) = variation.price else {
                continue;
            };
            for (label, min, max) in PRICE_BUCKETS {
                if Decimal::from(min) <= price && price < Decimal::from(max) {
                    counts.price.bump(label);
                }
            }
        }
        for variation in visible(Facet::ColorTone) {
            counts.color_tone.bump_known(variation.color_tone.as_deref());
        }
        for variation in visible(Facet::Finish) {
            if let Some(finish) = variation.finish.as_ref().filter(|f| !f.is_empty()) {
                counts.finish.bump(finish);
            }
        }
        for variation in visible(Facet::Thickness) {
            counts.thickness.bump_known(variation.thickness.as_deref());
        }
        for variation in visible(Facet::Size) {
            counts.size.bump_known(variation.size.as_deref());
        }
        for variation in visible(Facet::Pcs) {
            if let Some(pcs) = variation.pcs.filter(|p| *p != 0) {
                counts.pcs.bump(&pcs.to_string());
            }
        }
        for variation in visible(Facet::PackSize) {
            if let Some(pack) = variation.pack_size.filter(|p| !p.is_zero()) {
                counts.pack_size.bump(&pack.normalize().to_string());
            }
        }

        counts
    }
}

/// Shorthand for [`FilterCounts::compute`].
#[must_use]
pub fn compute_filter_counts<P: Faceted>(products: &[P], filters: &FacetFilters) -> FilterCounts {
    FilterCounts::compute(products, filters)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Product {
        name: &'static str,
        variations: Vec<Variation>,
    }

    impl Faceted for Product {
        fn variations(&self) -> &[Variation] {
            &self.variations
        }

        fn retain_variations<F>(&mut self, keep: F)
        where
            F: FnMut(&Variation) -> bool,
        {
            self.variations.retain(keep);
        }
    }

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn variation(price: &str, tone: &str, finish: &str, size: &str) -> Variation {
        Variation {
            price: Some(d(price)),
            color_tone: Some(tone.to_string()),
            finish: Some(finish.to_string()),
            size: Some(size.to_string()),
            thickness: Some("THICKNESS 20MM".to_string()),
            pcs: Some(12),
            pack_size: Some(d("1.44")),
            ..Variation::default()
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            Product {
                name: "Kandla Grey",
                variations: vec![
                    variation("150", "Grey", "Natural", "SIZE 600X600"),
                    variation("250", "Grey", "Honed", "SIZE 600X900"),
                ],
            },
            Product {
                name: "Raj Green",
                variations: vec![variation("320", "Green", "Natural", "SIZE 600X600")],
            },
            Product {
                name: "Mint Fossil",
                variations: vec![variation("1200", "Mint", "Tumbled", "Mix Pack")],
            },
        ]
    }

    #[test]
    fn test_price_range_parse() {
        assert_eq!(
            PriceRange::parse("200-300").unwrap(),
            PriceRange {
                min: d("200"),
                max: d("300")
            }
        );
        assert!(matches!(
            PriceRange::parse("cheap"),
            Err(FacetError::MalformedPrice(_))
        ));
        assert!(matches!(
            PriceRange::parse("300-200"),
            Err(FacetError::InvertedPrice(_))
        ));
    }

    #[test]
    fn test_from_query_trims_and_ignores_blank() {
        let raw = RawFacetQuery {
            color_tone: Some("  Grey "),
            finish: Some("   "),
            pcs: Some("12"),
            ..RawFacetQuery::default()
        };
        let filters = FacetFilters::from_query(&raw).unwrap();
        assert_eq!(filters.color_tone.as_deref(), Some("Grey"));
        assert_eq!(filters.finish, None);
        assert_eq!(filters.pcs, Some(12));
    }

    #[test]
    fn test_from_query_rejects_bad_pack_size() {
        let raw = RawFacetQuery {
            pack_size: Some("big"),
            ..RawFacetQuery::default()
        };
        assert!(matches!(
            FacetFilters::from_query(&raw),
            Err(FacetError::InvalidValue {
                facet: "packSize",
                ..
            })
        ));
    }

    #[test]
    fn test_price_filter_is_inclusive() {
        let filters = FacetFilters {
            price: Some(PriceRange::parse("150-250").unwrap()),
            ..FacetFilters::default()
        };
        let products = filter_products(&catalog(), &filters);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Kandla Grey");
        assert_eq!(products[0].variations.len(), 2);
    }

    #[test]
    fn test_unpriced_variation_fails_active_price_filter() {
        let products = vec![Product {
            name: "Sample",
            variations: vec![Variation::default()],
        }];
        let filters = FacetFilters {
            price: Some(PriceRange::parse("0-2000").unwrap()),
            ..FacetFilters::default()
        };
        assert!(filter_products(&products, &filters).is_empty());
    }

    #[test]
    fn test_filter_products_narrows_variations_and_drops_empty() {
        let filters = FacetFilters {
            finish: Some("Natural".to_string()),
            ..FacetFilters::default()
        };
        let products = filter_products(&catalog(), &filters);
        let names: Vec<_> = products.iter().map(|p| p.name).collect();
        assert_eq!(names, ["Kandla Grey", "Raj Green"]);
        assert_eq!(products[0].variations.len(), 1);
    }

    #[test]
    fn test_counts_without_filters() {
        let counts = FilterCounts::compute(&catalog(), &FacetFilters::default());
        assert_eq!(counts.price["0-200"], 1);
        assert_eq!(counts.price["200-300"], 1);
        assert_eq!(counts.price["300-500"], 1);
        assert_eq!(counts.price["500-1000"], 0);
        assert_eq!(counts.price["1000-2000"], 1);
        assert_eq!(counts.color_tone["Grey"], 2);
        assert_eq!(counts.color_tone["Beige"], 0);
        assert_eq!(counts.finish["Natural"], 2);
        assert_eq!(counts.size["Mix Pack"], 1);
        assert_eq!(counts.thickness["THICKNESS 20MM"], 4);
        assert_eq!(counts.pcs["12"], 4);
        assert_eq!(counts.pack_size["1.44"], 4);
    }

    #[test]
    fn test_active_filter_does_not_suppress_its_own_dimension() {
        let filters = FacetFilters {
            color_tone: Some("Grey".to_string()),
            ..FacetFilters::default()
        };
        let counts = FilterCounts::compute(&catalog(), &filters);

        // Color counts ignore the color filter itself.
        assert_eq!(counts.color_tone["Grey"], 2);
        assert_eq!(counts.color_tone["Green"], 1);
        assert_eq!(counts.color_tone["Mint"], 1);

        // Other dimensions respect it.
        assert_eq!(counts.finish.get("Tumbled"), None);
        assert_eq!(counts.finish["Honed"], 1);
        assert_eq!(counts.size["SIZE 600X600"], 1);
    }

    #[test]
    fn test_combined_filters_exclude_only_own_dimension() {
        let filters = FacetFilters {
            color_tone: Some("Grey".to_string()),
            finish: Some("Natural".to_string()),
            ..FacetFilters::default()
        };
        let counts = FilterCounts::compute(&catalog(), &filters);

        // Colors under finish=Natural only.
        assert_eq!(counts.color_tone["Grey"], 1);
        assert_eq!(counts.color_tone["Green"], 1);
        assert_eq!(counts.color_tone["Mint"], 0);

        // Finishes under colorTone=Grey only.
        assert_eq!(counts.finish["Natural"], 1);
        assert_eq!(counts.finish["Honed"], 1);

        // Prices under both.
        assert_eq!(counts.price["0-200"], 1);
        assert_eq!(counts.price["200-300"], 0);
    }

    #[test]
    fn test_unknown_predefined_values_are_not_counted() {
        let products = vec![Product {
            name: "Odd",
            variations: vec![Variation {
                color_tone: Some("Purple".to_string()),
                size: Some("NA".to_string()),
                ..Variation::default()
            }],
        }];
        let counts = FilterCounts::compute(&products, &FacetFilters::default());
        assert!(!counts.color_tone.contains_key("Purple"));
        assert!(!counts.size.contains_key("NA"));
        assert_eq!(counts.color_tone.len(), COLOR_TONES.len());
    }

    #[test]
    fn test_price_bucket_upper_bound_is_exclusive() {
        let products = vec![Product {
            name: "Edge",
            variations: vec![
                Variation {
                    price: Some(d("200")),
                    ..Variation::default()
                },
                Variation {
                    price: Some(d("2000")),
                    ..Variation::default()
                },
            ],
        }];
        let counts = FilterCounts::compute(&products, &FacetFilters::default());
        assert_eq!(counts.price["0-200"], 0);
        assert_eq!(counts.price["200-300"], 1);
        assert_eq!(counts.price.values().sum::<u32>(), 1);
    }

    #[test]
    fn test_counts_keep_defined_order() {
        let counts = FilterCounts::default();
        let prices: Vec<_> = counts.price.keys().collect();
        assert_eq!(prices, ["0-200", "200-300", "300-500", "500-1000", "1000-2000"]);

        let sizes: Vec<_> = counts.size.keys().collect();
        assert_eq!(sizes, SIZES);
        assert_eq!(sizes.last(), Some(&"Mix Pack"));

        let json = serde_json::to_string(&counts.price).unwrap();
        assert_eq!(
            json,
            r#"{"0-200":0,"200-300":0,"300-500":0,"500-1000":0,"1000-2000":0}"#
        );
    }

    #[test]
    fn test_open_ended_counts_keep_first_seen_order() {
        let counts = FilterCounts::compute(&catalog(), &FacetFilters::default());
        let finishes: Vec<_> = counts.finish.keys().collect();
        assert_eq!(finishes, ["Natural", "Honed", "Tumbled"]);
    }

    fn pack(pcs: i32, pack_size: &str) -> Variation {
        Variation {
            pcs: Some(pcs),
            pack_size: Some(d(pack_size)),
            ..Variation::default()
        }
    }

    #[test]
    fn test_pcs_filter_does_not_suppress_other_piece_counts() {
        let products = vec![Product {
            name: "Packs",
            variations: vec![pack(12, "1.44"), pack(24, "2.88"), pack(12, "2.88")],
        }];
        let filters = FacetFilters {
            pcs: Some(12),
            ..FacetFilters::default()
        };
        let counts = FilterCounts::compute(&products, &filters);

        assert_eq!(counts.pcs["12"], 2);
        assert_eq!(counts.pcs["24"], 1);
        // Pack sizes under pcs=12 only.
        assert_eq!(counts.pack_size["1.44"], 1);
        assert_eq!(counts.pack_size["2.88"], 1);
    }

    #[test]
    fn test_pack_size_filter_does_not_suppress_other_pack_sizes() {
        let products = vec![Product {
            name: "Packs",
            variations: vec![pack(12, "1.44"), pack(24, "2.88"), pack(12, "2.88")],
        }];
        let filters = FacetFilters {
            pack_size: Some(d("2.88")),
            ..FacetFilters::default()
        };
        let counts = FilterCounts::compute(&products, &filters);

        assert_eq!(counts.pack_size["1.44"], 1);
        assert_eq!(counts.pack_size["2.88"], 2);
        // Piece counts under packSize=2.88 only.
        assert_eq!(counts.pcs["12"], 1);
        assert_eq!(counts.pcs["24"], 1);
    }

    #[test]
    fn test_counts_serialize_with_client_keys() {
        let json = serde_json::to_value(FilterCounts::default()).unwrap();
        assert!(json.get("colorTone").is_some());
        assert!(json.get("packSize").is_some());
    }
}
