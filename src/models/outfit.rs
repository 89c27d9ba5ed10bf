//! Clothing items offered by the outfit catalog

use serde::{Deserialize, Serialize};

use super::WeatherCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutfitType {
    Top,
    Bottom,
    Outerwear,
    Footwear,
    Accessory,
}

impl OutfitType {
    /// Every category, in display order
    pub const ALL: [OutfitType; 5] = [
        OutfitType::Top,
        OutfitType::Bottom,
        OutfitType::Outerwear,
        OutfitType::Footwear,
        OutfitType::Accessory,
    ];
}

/// A single garment and the conditions it suits
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClothingItem {
    pub name: String,
    pub item_type: OutfitType,
    pub description: String,
    /// Lowest comfortable temperature in Celsius
    pub suitable_temp_min: Option<f64>,
    /// Highest comfortable temperature in Celsius
    pub suitable_temp_max: Option<f64>,
    pub weather_conditions: Vec<WeatherCondition>,
}

impl ClothingItem {
    /// Whether `temperature` lies inside the item's comfort range.
    /// Missing bounds are open.
    #[must_use]
    pub fn suits_temperature(&self, temperature: f64) -> bool {
        self.suitable_temp_min.is_none_or(|min| temperature >= min)
            && self.suitable_temp_max.is_none_or(|max| temperature <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suits_temperature_bounds() {
        let item = ClothingItem {
            name: "Jeans".to_string(),
            item_type: OutfitType::Bottom,
            description: "Classic denim".to_string(),
            suitable_temp_min: Some(10.0),
            suitable_temp_max: Some(25.0),
            weather_conditions: vec![WeatherCondition::Sunny],
        };
        assert!(item.suits_temperature(10.0));
        assert!(item.suits_temperature(25.0));
        assert!(!item.suits_temperature(9.9));
        assert!(!item.suits_temperature(30.0));
    }

    #[test]
    fn test_open_bounds() {
        let item = ClothingItem {
            name: "Umbrella".to_string(),
            item_type: OutfitType::Accessory,
            description: "Compact umbrella".to_string(),
            suitable_temp_min: None,
            suitable_temp_max: None,
            weather_conditions: vec![WeatherCondition::Rainy],
        };
        assert!(item.suits_temperature(-20.0));
        assert!(item.suits_temperature(45.0));
    }
}
