//! USDA FoodData Central search client.

use std::time::Duration;

use log::debug;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{Nutrition, NutritionLookup};
use crate::error::PlatescanError;

const SERVICE: &str = "USDA";

/// Connection settings for [`UsdaClient`].
#[derive(Clone, Debug)]
pub struct UsdaClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// FoodData Central data type filter.
    pub data_type: String,
    pub timeout: Duration,
}

impl Default for UsdaClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.nal.usda.gov/fdc/v1".to_string(),
            data_type: "Survey (FNDDS)".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Looks up the best-matching food and returns its nutrient table.
pub struct UsdaClient {
    config: UsdaClientConfig,
    agent: ureq::Agent,
}

impl UsdaClient {
    pub fn new(config: UsdaClientConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build();
        let agent: ureq::Agent = agent_config.into();
        Self { config, agent }
    }

    /// The search URL for `query`, asking for a single result.
    pub fn search_url(&self, query: &str) -> Result<Url, PlatescanError> {
        let mut url = Url::parse(&format!(
            "{}/foods/search",
            self.config.base_url.trim_end_matches('/')
        ))
        .map_err(|source| PlatescanError::InvalidConfig {
            message: format!("invalid USDA base URL: {source}"),
        })?;

        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("pageSize", "1")
            .append_pair("dataType", &self.config.data_type)
            .append_pair("api_key", &self.config.api_key);
        Ok(url)
    }
}

impl NutritionLookup for UsdaClient {
    fn lookup(&self, food: &str) -> Result<Option<Nutrition>, PlatescanError> {
        let url = self.search_url(food)?;
        debug!("USDA search for '{}'", food);

        let mut response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|source| PlatescanError::Http {
                service: SERVICE,
                message: source.to_string(),
            })?;
        let body: Value =
            response
                .body_mut()
                .read_json()
                .map_err(|source| PlatescanError::ApiResponse {
                    service: SERVICE,
                    message: source.to_string(),
                })?;

        parse_search_response(&body)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    foods: Vec<SearchFood>,
}

#[derive(Deserialize)]
struct SearchFood {
    #[serde(default, rename = "foodNutrients")]
    food_nutrients: Vec<FoodNutrient>,
}

#[derive(Deserialize)]
struct FoodNutrient {
    #[serde(rename = "nutrientName")]
    nutrient_name: String,
    #[serde(default)]
    value: Option<f64>,
}

/// Extracts the first food's nutrients from a search response.
///
/// An empty `foods` list is `Ok(None)`; a body without `foods` is an error.
pub fn parse_search_response(body: &Value) -> Result<Option<Nutrition>, PlatescanError> {
    let response = SearchResponse::deserialize(body).map_err(|source| {
        PlatescanError::ApiResponse {
            service: SERVICE,
            message: source.to_string(),
        }
    })?;

    Ok(response.foods.into_iter().next().map(|food| {
        food.food_nutrients
            .into_iter()
            .filter_map(|n| n.value.map(|v| (n.nutrient_name, v)))
            .collect()
    }))
}
