//! AMap geocoding and route planning client

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;

use super::RoutingProvider;
use super::http::{build_client, get_json};
use crate::config::MapConfig;
use crate::models::{Location, RouteSummary, TransportMode};
use crate::{Result, TripcastError};

const PROVIDER: &str = "AMap";

/// Client for the AMap web service API
pub struct AMapClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    security_key: Option<String>,
    default_city: String,
}

impl AMapClient {
    pub fn new(config: &MapConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(
                PROVIDER,
                Duration::from_secs(config.timeout_seconds),
                config.max_retries,
            )?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            security_key: config.security_key.clone().filter(|key| !key.is_empty()),
            default_city: config.default_city.clone(),
        })
    }

    fn params(&self, extra: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let mut params = extra;
        params.push(("key", self.api_key.clone()));
        if let Some(jscode) = &self.security_key {
            params.push(("jscode", jscode.clone()));
        }
        params
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RoutingProvider for AMapClient {
    #[tracing::instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Location> {
        let params = self.params(vec![("address", address.to_string())]);
        let response: amap::GeocodeResponse =
            get_json(&self.client, PROVIDER, &self.endpoint("/v3/geocode/geo"), &params).await?;

        amap::check_status(response.status.as_deref(), response.info.as_deref())?;
        let location = response
            .geocodes
            .into_iter()
            .next()
            .ok_or_else(|| TripcastError::invalid_location(format!("no match for '{address}'")))?
            .into_location(address)?;

        tracing::debug!(name = %location.name, coordinates = %location.format_coordinates(), "Geocoded address");
        Ok(location)
    }

    #[tracing::instrument(skip(self, location), fields(coordinates = %location.lng_lat()))]
    async fn reverse_geocode(&self, location: &Location) -> Result<Location> {
        let params = self.params(vec![
            ("location", location.lng_lat()),
            ("radius", "1000".to_string()),
            ("extensions", "base".to_string()),
        ]);
        let response: amap::RegeoResponse =
            get_json(&self.client, PROVIDER, &self.endpoint("/v3/geocode/regeo"), &params).await?;

        let resolved = response.into_location(location)?;
        tracing::debug!(name = %resolved.name, city = ?resolved.city, "Reverse geocoded coordinates");
        Ok(resolved)
    }

    #[tracing::instrument(skip(self))]
    async fn search_places(&self, keywords: &str, city: Option<&str>) -> Result<Vec<Location>> {
        let mut extra = vec![
            ("keywords", keywords.to_string()),
            ("extensions", "base".to_string()),
        ];
        if let Some(city) = city {
            extra.push(("city", city.to_string()));
        }
        let response: amap::PlaceResponse = get_json(
            &self.client,
            PROVIDER,
            &self.endpoint("/v3/place/text"),
            &self.params(extra),
        )
        .await?;

        let places = response.into_locations(city)?;
        tracing::debug!(count = places.len(), "Found places");
        Ok(places)
    }

    #[tracing::instrument(skip(self, origin, destination), fields(origin = %origin.name, destination = %destination.name))]
    async fn plan_route(
        &self,
        origin: &Location,
        destination: &Location,
        mode: TransportMode,
    ) -> Result<RouteSummary> {
        let endpoints = vec![
            ("origin", origin.lng_lat()),
            ("destination", destination.lng_lat()),
        ];

        let path = match mode {
            TransportMode::Driving => {
                let mut extra = endpoints;
                extra.push(("extensions", "all".to_string()));
                let response: amap::RouteResponse = get_json(
                    &self.client,
                    PROVIDER,
                    &self.endpoint("/v3/direction/driving"),
                    &self.params(extra),
                )
                .await?;
                response.first_path()?
            }
            TransportMode::Walking => {
                let response: amap::RouteResponse = get_json(
                    &self.client,
                    PROVIDER,
                    &self.endpoint("/v3/direction/walking"),
                    &self.params(endpoints),
                )
                .await?;
                response.first_path()?
            }
            TransportMode::Cycling => {
                let response: amap::BicyclingResponse = get_json(
                    &self.client,
                    PROVIDER,
                    &self.endpoint("/v4/direction/bicycling"),
                    &self.params(endpoints),
                )
                .await?;
                response.first_path()?
            }
            TransportMode::Transit => {
                let city = origin.city.clone().unwrap_or_else(|| self.default_city.clone());
                let city_destination = destination.city.clone().unwrap_or_else(|| city.clone());
                let mut extra = endpoints;
                extra.push(("city", city));
                extra.push(("cityd", city_destination));
                extra.push(("extensions", "all".to_string()));
                let response: amap::TransitResponse = get_json(
                    &self.client,
                    PROVIDER,
                    &self.endpoint("/v3/direction/transit/integrated"),
                    &self.params(extra),
                )
                .await?;
                response.first_path()?
            }
        };

        let route = path.into_summary(origin.clone(), destination.clone(), mode);
        tracing::info!(
            mode = %mode,
            distance_km = route.distance_km(),
            minutes = route.duration,
            steps = route.steps.len(),
            "Planned route"
        );
        Ok(route)
    }
}

/// AMap wire format. Numbers arrive as strings and empty fields as `[]`.
mod amap {
    use serde::{Deserialize, Deserializer, de::DeserializeOwned};

    use super::PROVIDER;
    use crate::models::{Location, RouteStep, RouteSummary, TransportMode};
    use crate::providers::http::{lenient_number, lenient_text, whole};
    use crate::{Result, TripcastError};

    /// Decode `T` from an object, treating `[]`, strings and nulls as absent
    fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(value @ serde_json::Value::Object(_)) => {
                serde_json::from_value(value)
                    .map(Some)
                    .map_err(<D::Error as serde::de::Error>::custom)
            }
            _ => Ok(None),
        }
    }

    /// Parse AMap's `"lng,lat"` pair
    fn parse_lng_lat(text: &str) -> Option<(f64, f64)> {
        let (lng, lat) = text.split_once(',')?;
        Some((lng.trim().parse().ok()?, lat.trim().parse().ok()?))
    }

    pub fn check_status(status: Option<&str>, info: Option<&str>) -> Result<()> {
        if status == Some("1") {
            Ok(())
        } else {
            Err(TripcastError::provider(
                PROVIDER,
                format!("request failed: {}", info.unwrap_or("unknown error")),
            ))
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodeResponse {
        #[serde(default, deserialize_with = "lenient_text")]
        pub status: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub info: Option<String>,
        #[serde(default)]
        pub geocodes: Vec<Geocode>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geocode {
        #[serde(default, deserialize_with = "lenient_text")]
        pub formatted_address: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub city: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub province: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub location: Option<String>,
    }

    impl Geocode {
        pub fn into_location(self, address: &str) -> Result<Location> {
            let (longitude, latitude) = self
                .location
                .as_deref()
                .and_then(parse_lng_lat)
                .ok_or_else(|| {
                    TripcastError::invalid_location(format!("no usable coordinates for '{address}'"))
                })?;

            let name = self.formatted_address.unwrap_or_else(|| address.to_string());
            // municipalities such as Beijing report the city as `[]`
            Ok(match self.city.or(self.province) {
                Some(city) => Location::with_city(latitude, longitude, name, city),
                None => Location::new(latitude, longitude, name),
            })
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct RegeoResponse {
        #[serde(default, deserialize_with = "lenient_text")]
        pub status: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub info: Option<String>,
        #[serde(default, deserialize_with = "lenient_object")]
        pub regeocode: Option<Regeocode>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Regeocode {
        #[serde(default, deserialize_with = "lenient_text")]
        pub formatted_address: Option<String>,
        #[serde(default, rename = "addressComponent", deserialize_with = "lenient_object")]
        pub address_component: Option<AddressComponent>,
    }

    #[derive(Debug, Deserialize)]
    pub struct AddressComponent {
        #[serde(default, deserialize_with = "lenient_text")]
        pub city: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub province: Option<String>,
    }

    impl RegeoResponse {
        /// Name `at` after the address found there, keeping its coordinates
        pub fn into_location(self, at: &Location) -> Result<Location> {
            check_status(self.status.as_deref(), self.info.as_deref())?;
            let regeocode = self.regeocode.ok_or_else(|| {
                TripcastError::invalid_location(format!("no address found at {}", at.lng_lat()))
            })?;

            Ok(Location {
                latitude: at.latitude,
                longitude: at.longitude,
                name: regeocode.formatted_address.unwrap_or_else(|| at.name.clone()),
                city: regeocode
                    .address_component
                    .and_then(|component| component.city.or(component.province)),
            })
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct PlaceResponse {
        #[serde(default, deserialize_with = "lenient_text")]
        pub status: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub info: Option<String>,
        #[serde(default)]
        pub pois: Vec<Poi>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Poi {
        #[serde(default, deserialize_with = "lenient_text")]
        pub name: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub address: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub location: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub cityname: Option<String>,
    }

    impl PlaceResponse {
        /// Places with usable coordinates, in provider order
        pub fn into_locations(self, city: Option<&str>) -> Result<Vec<Location>> {
            check_status(self.status.as_deref(), self.info.as_deref())?;
            Ok(self
                .pois
                .into_iter()
                .filter_map(|poi| {
                    let (longitude, latitude) = poi.location.as_deref().and_then(parse_lng_lat)?;
                    let name = [poi.name, poi.address]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" ");
                    Some(Location {
                        latitude,
                        longitude,
                        name,
                        city: poi.cityname.or_else(|| city.map(str::to_string)),
                    })
                })
                .collect())
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct Step {
        #[serde(default, deserialize_with = "lenient_text")]
        pub instruction: Option<String>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub distance: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub duration: Option<f64>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub polyline: Option<String>,
    }

    impl From<Step> for RouteStep {
        fn from(step: Step) -> Self {
            RouteStep {
                instruction: step.instruction.unwrap_or_default(),
                distance: step.distance.unwrap_or(0.0),
                duration_seconds: whole(step.duration),
                polyline: step.polyline,
            }
        }
    }

    /// One candidate route, normalized across the endpoints
    #[derive(Debug, Deserialize)]
    pub struct Path {
        #[serde(default, deserialize_with = "lenient_number")]
        pub distance: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub duration: Option<f64>,
        #[serde(default)]
        pub steps: Vec<Step>,
    }

    impl Path {
        pub fn into_summary(
            self,
            origin: Location,
            destination: Location,
            mode: TransportMode,
        ) -> RouteSummary {
            let steps: Vec<RouteStep> = self.steps.into_iter().map(RouteStep::from).collect();
            let polyline = steps
                .iter()
                .filter_map(|step| step.polyline.as_deref())
                .collect::<Vec<_>>()
                .join(";");

            RouteSummary {
                origin,
                destination,
                transport_mode: mode,
                distance: self.distance.unwrap_or(0.0).max(0.0),
                duration: RouteSummary::minutes_from_seconds(whole(self.duration)),
                steps,
                polyline: (!polyline.is_empty()).then_some(polyline),
            }
        }
    }

    fn first<T>(paths: Vec<T>) -> Result<T> {
        paths
            .into_iter()
            .next()
            .ok_or_else(|| TripcastError::no_route("AMap returned no paths"))
    }

    /// Driving and walking share the v3 envelope
    #[derive(Debug, Deserialize)]
    pub struct RouteResponse {
        #[serde(default, deserialize_with = "lenient_text")]
        pub status: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub info: Option<String>,
        #[serde(default, deserialize_with = "lenient_object")]
        pub route: Option<PathList>,
    }

    #[derive(Debug, Deserialize)]
    pub struct PathList {
        #[serde(default)]
        pub paths: Vec<Path>,
    }

    impl RouteResponse {
        pub fn first_path(self) -> Result<Path> {
            check_status(self.status.as_deref(), self.info.as_deref())?;
            first(self.route.map(|route| route.paths).unwrap_or_default())
        }
    }

    /// Bicycling lives on v4 with its own envelope
    #[derive(Debug, Deserialize)]
    pub struct BicyclingResponse {
        #[serde(default, deserialize_with = "lenient_number")]
        pub errcode: Option<f64>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub errmsg: Option<String>,
        #[serde(default, deserialize_with = "lenient_object")]
        pub data: Option<PathList>,
    }

    impl BicyclingResponse {
        pub fn first_path(self) -> Result<Path> {
            match self.errcode {
                Some(code) if code.abs() < f64::EPSILON => {}
                None => {}
                Some(_) => {
                    return Err(TripcastError::provider(
                        PROVIDER,
                        format!("request failed: {}", self.errmsg.as_deref().unwrap_or("unknown error")),
                    ));
                }
            }
            first(self.data.map(|data| data.paths).unwrap_or_default())
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct TransitResponse {
        #[serde(default, deserialize_with = "lenient_text")]
        pub status: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub info: Option<String>,
        #[serde(default, deserialize_with = "lenient_object")]
        pub route: Option<TransitList>,
    }

    #[derive(Debug, Deserialize)]
    pub struct TransitList {
        #[serde(default)]
        pub transits: Vec<Transit>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Transit {
        #[serde(default, deserialize_with = "lenient_number")]
        pub distance: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub duration: Option<f64>,
        #[serde(default)]
        pub segments: Vec<Segment>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Segment {
        #[serde(default, deserialize_with = "lenient_object")]
        pub walking: Option<Walking>,
        #[serde(default, deserialize_with = "lenient_object")]
        pub bus: Option<Bus>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Walking {
        #[serde(default, deserialize_with = "lenient_number")]
        pub distance: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub duration: Option<f64>,
        #[serde(default)]
        pub steps: Vec<Step>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Bus {
        #[serde(default)]
        pub buslines: Vec<Busline>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Busline {
        #[serde(default, deserialize_with = "lenient_text")]
        pub name: Option<String>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub distance: Option<f64>,
        #[serde(default, deserialize_with = "lenient_number")]
        pub duration: Option<f64>,
        #[serde(default, deserialize_with = "lenient_text")]
        pub polyline: Option<String>,
    }

    impl From<Transit> for Path {
        /// Flatten transit segments into walk and ride steps
        fn from(transit: Transit) -> Self {
            let mut steps = Vec::new();
            for segment in transit.segments {
                if let Some(walking) = segment.walking {
                    let polyline = walking
                        .steps
                        .iter()
                        .filter_map(|step| step.polyline.as_deref())
                        .collect::<Vec<_>>()
                        .join(";");
                    steps.push(Step {
                        instruction: Some(format!("Walk {} m", whole(walking.distance))),
                        distance: walking.distance,
                        duration: walking.duration,
                        polyline: (!polyline.is_empty()).then_some(polyline),
                    });
                }
                if let Some(line) = segment.bus.and_then(|bus| bus.buslines.into_iter().next()) {
                    steps.push(Step {
                        instruction: Some(format!(
                            "Take {} for {} m",
                            line.name.as_deref().unwrap_or("the bus"),
                            whole(line.distance)
                        )),
                        distance: line.distance,
                        duration: line.duration,
                        polyline: line.polyline,
                    });
                }
            }

            Path {
                distance: transit.distance,
                duration: transit.duration,
                steps,
            }
        }
    }

    impl TransitResponse {
        pub fn first_path(self) -> Result<Path> {
            check_status(self.status.as_deref(), self.info.as_deref())?;
            first(self.route.map(|route| route.transits).unwrap_or_default()).map(Path::from)
        }
    }
}
