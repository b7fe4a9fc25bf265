use crate::constants::{
    ACTIVITIES, DEFAULT_BASE_API_URL, DEFAULT_DAYS_RANGE, DEFAULT_DISTANCE_KM,
    DEFAULT_LIMIT_PER_PAGE, DEFAULT_MAX_ITEMS,
};
use crate::error::{Result, ScraperError};
use serde::{Deserialize, Serialize};

/// Per-run input as the operator supplies it, camelCase on the wire.
/// Everything is optional at the serde level; `validate` enforces the
/// required fields so a partial JSON file and CLI flags can be merged first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryInput {
    pub province: String,
    pub city: String,
    pub activity: String,
    pub days_range: u32,
    pub max_items: usize,
    /// Search radius in kilometres. `distance` is the wire name the actor
    /// input used; `distanceKm` is accepted as an alias.
    #[serde(alias = "distanceKm")]
    pub distance: f64,
    pub limit_per_page: u32,
    pub base_api_url: String,
}

impl Default for QueryInput {
    fn default() -> Self {
        Self {
            province: String::new(),
            city: String::new(),
            activity: String::new(),
            days_range: DEFAULT_DAYS_RANGE,
            max_items: DEFAULT_MAX_ITEMS,
            distance: DEFAULT_DISTANCE_KM,
            limit_per_page: DEFAULT_LIMIT_PER_PAGE,
            base_api_url: DEFAULT_BASE_API_URL.to_string(),
        }
    }
}

/// The validated, immutable form of the input. `activity` is lowered to its
/// canonical key here; nothing downstream sees unvalidated values.
#[derive(Debug, Clone)]
pub struct HarvestQuery {
    pub province: String,
    pub city: String,
    pub activity: String,
    pub days_range: u32,
    pub max_items: usize,
    pub distance_km: f64,
    pub limit_per_page: u32,
    pub base_api_url: String,
}

impl QueryInput {
    /// Check the required fields and numeric bounds, and normalize the
    /// activity against the supported set. Fails before any network call.
    pub fn validate(&self) -> Result<HarvestQuery> {
        if self.province.trim().is_empty() {
            return Err(ScraperError::Validation("province is required".to_string()));
        }
        if self.city.trim().is_empty() {
            return Err(ScraperError::Validation("city is required".to_string()));
        }
        if self.activity.trim().is_empty() {
            return Err(ScraperError::Validation("activity is required".to_string()));
        }
        if self.days_range == 0 {
            return Err(ScraperError::Validation(
                "daysRange must be at least 1".to_string(),
            ));
        }
        if self.max_items == 0 {
            return Err(ScraperError::Validation(
                "maxItems must be at least 1".to_string(),
            ));
        }
        if self.limit_per_page == 0 {
            return Err(ScraperError::Validation(
                "limitPerPage must be at least 1".to_string(),
            ));
        }
        if !self.distance.is_finite() || self.distance < 0.0 {
            return Err(ScraperError::Validation(
                "distance must be a non-negative number of kilometres".to_string(),
            ));
        }

        let activity = self.activity.trim().to_lowercase();
        if !crate::constants::is_supported_activity(&activity) {
            return Err(ScraperError::Validation(format!(
                "activity must be one of: {}",
                ACTIVITIES.join(", ")
            )));
        }

        Ok(HarvestQuery {
            province: self.province.trim().to_string(),
            city: self.city.trim().to_string(),
            activity,
            days_range: self.days_range,
            max_items: self.max_items,
            distance_km: self.distance,
            limit_per_page: self.limit_per_page,
            base_api_url: self.base_api_url.clone(),
        })
    }
}
