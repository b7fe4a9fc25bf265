use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dates::parse_timestamp;

/// One accepted event in the canonical output schema. The full raw source
/// object rides along for downstream audit, which trades output size for
/// debuggability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Value,
    pub activity: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_timestamp: Option<String>,
    pub end_timestamp: Option<String>,
    pub start_local: Option<DateTime<Utc>>,
    pub end_local: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price: Value,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub image_url: Option<String>,
    pub host_name: Option<String>,
    pub raw: Value,
    pub scraped_at: DateTime<Utc>,
}

/// Map one raw API event into the output schema. Absent fields become null;
/// unparsable timestamps null out the parsed instants without erroring.
pub fn map_event(ev: &Value, activity_key: &str) -> EventRecord {
    let start_timestamp = str_field(ev, "start_timestamp");
    let end_timestamp = str_field(ev, "end_timestamp");
    let start_local = start_timestamp.as_deref().and_then(parse_timestamp);
    let end_local = end_timestamp.as_deref().and_then(parse_timestamp);

    EventRecord {
        id: ev.get("id").cloned().unwrap_or(Value::Null),
        activity: activity_key.to_string(),
        title: str_field(ev, "name"),
        description: str_field(ev, "description"),
        start_timestamp,
        end_timestamp,
        start_local,
        end_local,
        location: str_field(ev, "location"),
        latitude: finite_field(ev, "latitude"),
        longitude: finite_field(ev, "longitude"),
        price: ev.get("price").cloned().unwrap_or(Value::Null),
        status: str_field(ev, "status"),
        event_type: str_field(ev, "type"),
        image_url: str_field(ev, "image_url").or_else(|| str_field(ev, "og_image_url")),
        host_name: ev
            .get("host_info")
            .and_then(|host| host.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        raw: ev.clone(),
        scraped_at: Utc::now(),
    }
}

fn str_field(ev: &Value, key: &str) -> Option<String> {
    ev.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Coordinates pass through only as finite numbers; anything else is null.
fn finite_field(ev: &Value, key: &str) -> Option<f64> {
    ev.get(key).and_then(Value::as_f64).filter(|v| v.is_finite())
}
