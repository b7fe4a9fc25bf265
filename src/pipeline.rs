use metrics::{counter, histogram};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::dates::DateWindow;
use crate::error::{Result, ScraperError};
use crate::events_api::{EventsApi, PageRequest};
use crate::filter::{EventFilter, Verdict};
use crate::geocode::Geocoder;
use crate::input::QueryInput;
use crate::record::map_event;
use crate::response::{unpack, PageCursor};
use crate::storage::{Dataset, KeyValueStore};

/// Why the pagination loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// `maxItems` accepted records reached.
    CapReached,
    /// A page came back with no items: the natural end of the feed.
    EmptyPage,
    /// The response carried no usable continuation cursor.
    CursorExhausted,
    /// A page body failed JSON parsing; the raw text was archived.
    MalformedPage,
}

/// Result of one complete harvest run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub activity: String,
    pub pages_fetched: u32,
    pub total_accepted: usize,
    pub stop_reason: StopReason,
}

/// Drives the fetch → filter → map → sink loop against injected
/// collaborators. Owns no ambient state; every sink and client arrives
/// through the constructor.
pub struct Pipeline {
    api: Arc<dyn EventsApi>,
    geocoder: Arc<dyn Geocoder>,
    dataset: Arc<dyn Dataset>,
    key_value: Arc<dyn KeyValueStore>,
}

impl Pipeline {
    pub fn new(
        api: Arc<dyn EventsApi>,
        geocoder: Arc<dyn Geocoder>,
        dataset: Arc<dyn Dataset>,
        key_value: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            api,
            geocoder,
            dataset,
            key_value,
        }
    }

    /// Run one harvest. Accepted records stream to the dataset as a side
    /// effect; the returned result carries the aggregate counters. Fatal
    /// errors (validation, geocoding, non-2xx fetch) unwind the whole run.
    #[instrument(skip(self, input), fields(activity = %input.activity))]
    pub async fn run(&self, input: &QueryInput) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        // Snapshot the raw input first so a rejected run still leaves its
        // input on record.
        self.key_value
            .set_value("INPUT", &serde_json::to_value(input)?)
            .await?;

        let query = input.validate()?;
        let window = DateWindow::from_today(query.days_range);

        info!(
            "Starting harvest {} for '{}' near {}, {}",
            run_id, query.activity, query.city, query.province
        );
        println!(
            "🚀 Harvesting '{}' events near {}, {}",
            query.activity, query.city, query.province
        );
        counter!("kuyy_harvest_runs_total").increment(1);

        let center = self.geocoder.resolve(&query.city, &query.province).await?;
        debug!(
            "Geocoded {}, {} -> ({}, {})",
            query.city, query.province, center.lat, center.lon
        );

        let filter = EventFilter::new(&query.activity, window, center, query.distance_km);

        let mut total_accepted = 0usize;
        let mut pages_fetched = 0u32;
        let mut cursor: Option<PageCursor> = None;
        let mut accepted_ids: HashSet<String> = HashSet::new();

        let stop_reason = loop {
            pages_fetched += 1;

            let request = PageRequest {
                base_url: query.base_api_url.clone(),
                limit_per_page: query.limit_per_page,
                center,
                distance_km: query.distance_km,
                cursor: cursor.clone(),
            };
            let page = self.api.fetch_page(&request).await?;
            counter!("kuyy_pages_fetched_total").increment(1);

            if !(200..=299).contains(&page.status) {
                return Err(ScraperError::Fetch {
                    page: pages_fetched,
                    status: page.status,
                });
            }

            let body: Value = match serde_json::from_str(&page.body) {
                Ok(value) => value,
                Err(_) => {
                    // Unexpected but non-fatal: archive for inspection and
                    // treat as end of stream.
                    let key = format!("PAGE_{pages_fetched}_TEXT");
                    self.key_value.set_text(&key, &page.body).await?;
                    warn!(
                        "Page {} was not JSON; raw body archived under {}",
                        pages_fetched, key
                    );
                    break StopReason::MalformedPage;
                }
            };

            let normalized = unpack(&body);
            info!(
                "Page {}: {} items, cursor {}",
                pages_fetched,
                normalized.items.len(),
                if normalized.next_cursor.is_some() {
                    "present"
                } else {
                    "absent"
                }
            );
            counter!("kuyy_items_seen_total").increment(normalized.items.len() as u64);

            if normalized.items.is_empty() {
                break StopReason::EmptyPage;
            }

            let mut cap_hit = false;
            for ev in &normalized.items {
                match filter.evaluate(ev) {
                    Verdict::Reject(reason) => {
                        counter!("kuyy_items_rejected_total", "filter" => reason.label())
                            .increment(1);
                        continue;
                    }
                    Verdict::Accept => {}
                }

                // Offset pagination can re-serve boundary rows; accept each
                // id once per run. Items without an id are never deduped.
                if let Some(id) = item_id(ev) {
                    if !accepted_ids.insert(id) {
                        counter!("kuyy_duplicate_skips_total").increment(1);
                        continue;
                    }
                }

                let record = map_event(ev, &query.activity);
                self.dataset.push(serde_json::to_value(&record)?).await?;
                total_accepted += 1;
                counter!("kuyy_records_accepted_total").increment(1);

                if total_accepted >= query.max_items {
                    cap_hit = true;
                    break;
                }
            }

            if cap_hit {
                break StopReason::CapReached;
            }

            match normalized.next_cursor {
                Some(next) => cursor = Some(next),
                None => break StopReason::CursorExhausted,
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        histogram!("kuyy_harvest_duration_seconds").record(elapsed);

        info!(
            "Harvest {} finished: {} records over {} pages ({:?})",
            run_id, total_accepted, pages_fetched, stop_reason
        );
        println!(
            "✅ Harvest finished: {} records over {} pages",
            total_accepted, pages_fetched
        );

        Ok(PipelineResult {
            run_id,
            activity: query.activity.clone(),
            pages_fetched,
            total_accepted,
            stop_reason,
        })
    }
}

/// Identity used for within-run dedup. The feed serves both string and
/// numeric ids; anything else opts out.
fn item_id(ev: &Value) -> Option<String> {
    match ev.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_id_reads_strings_and_numbers() {
        assert_eq!(item_id(&json!({"id": "ev-1"})), Some("ev-1".to_string()));
        assert_eq!(item_id(&json!({"id": 42})), Some("42".to_string()));
    }

    #[test]
    fn item_id_skips_everything_else() {
        assert_eq!(item_id(&json!({})), None);
        assert_eq!(item_id(&json!({"id": null})), None);
        assert_eq!(item_id(&json!({"id": ""})), None);
        assert_eq!(item_id(&json!({"id": ["composite"]})), None);
    }
}
