//! Fixed-table outfit catalog
//!
//! Preferences understood by [`StaticOutfitCatalog::recommend`]:
//! `exclude_types`, a list of categories (`"top"`, `"outerwear"`, ...) to leave out.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use super::OutfitCatalog;
use crate::Result;
use crate::models::{ClothingItem, OutfitType, WeatherCondition, WeatherObservation};

const EXCLUDE_TYPES: &str = "exclude_types";

/// Recommends every item whose comfort range covers the current temperature
pub struct StaticOutfitCatalog {
    items: Vec<ClothingItem>,
}

impl StaticOutfitCatalog {
    #[must_use]
    pub fn new(items: Vec<ClothingItem>) -> Self {
        Self { items }
    }

    /// Categories the catalog knows about
    #[must_use]
    pub fn categories(&self) -> &'static [OutfitType] {
        &OutfitType::ALL
    }

    /// Every item in `category`, regardless of weather
    #[must_use]
    pub fn items_in(&self, category: OutfitType) -> Vec<ClothingItem> {
        self.items
            .iter()
            .filter(|item| item.item_type == category)
            .cloned()
            .collect()
    }
}

/// Categories listed under `exclude_types`; unknown names are skipped
fn excluded_types(preferences: &HashMap<String, Value>) -> Vec<OutfitType> {
    preferences
        .get(EXCLUDE_TYPES)
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(|name| serde_json::from_value(name.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

impl Default for StaticOutfitCatalog {
    fn default() -> Self {
        Self::new(vec![
            ClothingItem {
                name: "T-shirt".to_string(),
                item_type: OutfitType::Top,
                description: "Comfortable cotton T-shirt".to_string(),
                suitable_temp_min: Some(15.0),
                suitable_temp_max: Some(30.0),
                weather_conditions: vec![WeatherCondition::Sunny, WeatherCondition::Cloudy],
            },
            ClothingItem {
                name: "Jeans".to_string(),
                item_type: OutfitType::Bottom,
                description: "Classic denim jeans".to_string(),
                suitable_temp_min: Some(10.0),
                suitable_temp_max: Some(25.0),
                weather_conditions: vec![WeatherCondition::Sunny, WeatherCondition::Cloudy],
            },
        ])
    }
}

#[async_trait]
impl OutfitCatalog for StaticOutfitCatalog {
    async fn recommend(
        &self,
        weather: &WeatherObservation,
        preferences: &HashMap<String, Value>,
    ) -> Result<Vec<ClothingItem>> {
        let excluded = excluded_types(preferences);
        let picks: Vec<ClothingItem> = self
            .items
            .iter()
            .filter(|item| !excluded.contains(&item.item_type))
            .filter(|item| item.suits_temperature(weather.temperature))
            .cloned()
            .collect();

        tracing::debug!(
            temperature = weather.temperature,
            count = picks.len(),
            "Selected outfit items"
        );
        Ok(picks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn names(items: &[ClothingItem]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    #[rstest]
    #[case(20.0, vec!["T-shirt", "Jeans"])]
    #[case(28.0, vec!["T-shirt"])]
    #[case(12.0, vec!["Jeans"])]
    #[case(-5.0, vec![])]
    #[tokio::test]
    async fn test_default_catalog_filters_by_temperature(
        #[case] temperature: f64,
        #[case] expected: Vec<&str>,
    ) {
        let mut weather = WeatherObservation::fallback(Utc::now());
        weather.temperature = temperature;

        let items = StaticOutfitCatalog::default()
            .recommend(&weather, &HashMap::new())
            .await
            .unwrap();

        assert_eq!(names(&items), expected);
    }

    #[tokio::test]
    async fn test_excluded_types_are_left_out() {
        let weather = WeatherObservation::fallback(Utc::now());
        let preferences = HashMap::from([(
            EXCLUDE_TYPES.to_string(),
            serde_json::json!(["bottom", "cape", 3]),
        )]);

        let items = StaticOutfitCatalog::default()
            .recommend(&weather, &preferences)
            .await
            .unwrap();

        assert_eq!(names(&items), vec!["T-shirt"]);
    }

    #[tokio::test]
    async fn test_malformed_exclusion_is_ignored() {
        let weather = WeatherObservation::fallback(Utc::now());
        let preferences = HashMap::from([(EXCLUDE_TYPES.to_string(), serde_json::json!("top"))]);

        let items = StaticOutfitCatalog::default()
            .recommend(&weather, &preferences)
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_items_by_category() {
        let catalog = StaticOutfitCatalog::default();

        assert_eq!(catalog.categories().len(), 5);
        assert_eq!(names(&catalog.items_in(OutfitType::Top)), vec!["T-shirt"]);
        assert_eq!(names(&catalog.items_in(OutfitType::Bottom)), vec!["Jeans"]);
        assert!(catalog.items_in(OutfitType::Footwear).is_empty());
    }
}
