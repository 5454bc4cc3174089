use serde::Deserialize;
use serde::Serialize;

use crate::number::deserialize_lenient_f64;
use crate::number::deserialize_lenient_string;

/// A rental listing as served by the listing service. Scraped records carry
/// `"N/A"` placeholders and numbers encoded as strings, so every optional
/// field is parsed leniently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(
        default,
        alias = "_id",
        deserialize_with = "deserialize_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub beds: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub baths: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub sqft: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub property_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub building_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub bbl: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub url: Option<String>,
}

/// Envelope of `GET /properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyPage {
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// Query string of `GET /properties`. Unset filters are left out of the
/// request entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    pub skip: u32,
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borough: Option<String>,
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
            min_price: None,
            max_price: None,
            beds: None,
            borough: None,
        }
    }
}
