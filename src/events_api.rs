use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;
use crate::geo::Coordinate;
use crate::response::PageCursor;

/// Everything one page fetch needs to know. The pipeline builds one of
/// these per iteration; the cursor is absent on the first page.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub base_url: String,
    pub limit_per_page: u32,
    pub center: Coordinate,
    pub distance_km: f64,
    pub cursor: Option<PageCursor>,
}

impl PageRequest {
    /// Query parameters in wire order. A parameter that would carry an empty
    /// value is omitted entirely; the upstream API reads an explicit empty
    /// value as a filter rather than its absence.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = vec![
            ("limit".to_string(), self.limit_per_page.to_string()),
            ("when".to_string(), "upcoming".to_string()),
            ("status".to_string(), "scheduled".to_string()),
            ("type".to_string(), "public,followers".to_string()),
            ("asc".to_string(), "true".to_string()),
            ("latitude".to_string(), self.center.lat.to_string()),
            ("longitude".to_string(), self.center.lon.to_string()),
            ("distance".to_string(), self.distance_km.to_string()),
            ("is_grouping".to_string(), "false".to_string()),
            ("sort_by_date".to_string(), "false".to_string()),
            ("ignore_limit".to_string(), "false".to_string()),
            ("hide_full".to_string(), "false".to_string()),
        ];

        if let Some(cursor) = &self.cursor {
            params.push(("offset_id".to_string(), cursor.offset_id_param()));
            params.push((
                "offset_timestamp".to_string(),
                cursor.offset_timestamp_param(),
            ));
        }

        params.retain(|(_, value)| !value.is_empty());
        params
    }
}

/// Raw result of one page fetch: the HTTP status plus the unparsed body.
/// JSON parsing stays with the caller because a non-JSON body is a soft
/// end-of-stream signal there, not a transport failure.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

/// Strategy seam for obtaining one page of the events feed.
#[async_trait]
pub trait EventsApi: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage>;
}

/// Live HTTP strategy over reqwest.
pub struct HttpEventsApi {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpEventsApi {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl EventsApi for HttpEventsApi {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage> {
        let response = self
            .client
            .get(&request.base_url)
            .query(&request.query_params())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(FetchedPage { status, body })
    }
}
