//! Google Calendar API v3 client
//!
//! `events.list` for the target day and `events.insert` for focus blocks.
//! The access token is consumed as-is; obtaining or refreshing it is left to
//! whatever put it in the environment or token file.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{CalendarError, CalendarEvent, CalendarService, CreatedEvent, EventRequest, decorate_summary};
use crate::config::CalendarConfig;

const PAGE_SIZE: &str = "250";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<GoogleEventRaw>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventRaw {
    #[serde(default)]
    summary: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertedEvent {
    id: String,
    #[serde(default)]
    html_link: String,
}

/// Google Calendar client bound to one calendar and timezone
pub struct GoogleCalendar {
    http: Client,
    base_url: String,
    calendar_id: String,
    token: String,
    tz: Tz,
}

impl GoogleCalendar {
    pub fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        debug!(calendar_id = %config.calendar_id, timezone = %config.timezone, "from_config: called");
        let token = config.access_token().map_err(|e| CalendarError::Config(e.to_string()))?;
        let tz = config.tz().map_err(|e| CalendarError::Config(e.to_string()))?;
        let http = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
            token,
            tz,
        })
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    fn events_url(&self) -> Result<Url, CalendarError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CalendarError::Config(format!("Invalid calendar base URL '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::Config(format!("Calendar base URL '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        Ok(url)
    }
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn list_events(&self, date: NaiveDate) -> Result<Vec<CalendarEvent>, CalendarError> {
        debug!(%date, "list_events: called");
        let (time_min, time_max) = day_window(date, self.tz)?;
        let (time_min, time_max) = (time_min.to_rfc3339(), time_max.to_rfc3339());
        let url = self.events_url()?;

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(url.clone()).bearer_auth(&self.token).query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", PAGE_SIZE),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = check_status(request.send().await?).await?;
            let page: EventListResponse = serde_json::from_str(&response.text().await?)?;
            debug!(items = page.items.len(), "list_events: page received");

            for raw in page.items {
                match parse_event(raw, self.tz) {
                    Ok(Some(event)) => events.push(event),
                    Ok(None) => {}
                    Err(e) => warn!("Skipping calendar event: {}", e),
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!("Read {} calendar events for {}", events.len(), date);
        Ok(events)
    }

    async fn create_event(&self, request: &EventRequest) -> Result<CreatedEvent, CalendarError> {
        debug!(summary = %request.summary, "create_event: called");
        let body = event_body(request, self.tz);

        let response = self
            .http
            .post(self.events_url()?)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let inserted: InsertedEvent = serde_json::from_str(&response.text().await?)?;

        Ok(CreatedEvent {
            id: inserted.id,
            html_link: inserted.html_link,
        })
    }
}

/// Map 401 to `AuthExpired` and any other non-2xx to `ApiError`
async fn check_status(response: Response) -> Result<Response, CalendarError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(CalendarError::AuthExpired);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        debug!(%status, "check_status: API error");
        return Err(CalendarError::ApiError {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

fn local_midnight(date: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).earliest()
}

/// Local midnight of `date` to local midnight of the next day
fn day_window(date: NaiveDate, tz: Tz) -> Result<(DateTime<Tz>, DateTime<Tz>), CalendarError> {
    let next = date
        .succ_opt()
        .ok_or_else(|| CalendarError::Config(format!("No day after {}", date)))?;
    let start = local_midnight(date, tz)
        .ok_or_else(|| CalendarError::Config(format!("No local midnight on {} in {}", date, tz)))?;
    let end = local_midnight(next, tz)
        .ok_or_else(|| CalendarError::Config(format!("No local midnight on {} in {}", next, tz)))?;
    Ok((start, end))
}

fn parse_when(when: &EventDateTime, tz: Tz) -> Result<(DateTime<Tz>, bool), String> {
    if let Some(date_time) = &when.date_time {
        let parsed = DateTime::parse_from_rfc3339(date_time).map_err(|e| format!("bad dateTime '{}': {}", date_time, e))?;
        return Ok((parsed.with_timezone(&tz), false));
    }
    if let Some(date) = &when.date {
        let day = date
            .parse::<NaiveDate>()
            .map_err(|e| format!("bad date '{}': {}", date, e))?;
        let midnight = local_midnight(day, tz).ok_or_else(|| format!("no local midnight on {}", day))?;
        return Ok((midnight, true));
    }
    Err("neither dateTime nor date set".to_string())
}

/// Cancelled events map to `None`
fn parse_event(raw: GoogleEventRaw, tz: Tz) -> Result<Option<CalendarEvent>, CalendarError> {
    if raw.status.as_deref() == Some("cancelled") {
        return Ok(None);
    }

    let summary = raw.summary.unwrap_or_else(|| "(no title)".to_string());
    let invalid = |reason: String| CalendarError::InvalidEvent {
        summary: summary.clone(),
        reason,
    };

    let start = raw.start.as_ref().ok_or_else(|| invalid("missing start".to_string()))?;
    let end = raw.end.as_ref().ok_or_else(|| invalid("missing end".to_string()))?;
    let (start, all_day) = parse_when(start, tz).map_err(invalid)?;
    let (end, _) = parse_when(end, tz).map_err(invalid)?;

    Ok(Some(CalendarEvent::new(summary, start, end, all_day)))
}

/// `events.insert` body
fn event_body(request: &EventRequest, tz: Tz) -> serde_json::Value {
    serde_json::json!({
        "summary": decorate_summary(&request.summary),
        "description": request.description,
        "start": {
            "dateTime": request.start.to_rfc3339(),
            "timeZone": tz.name(),
        },
        "end": {
            "dateTime": request.end.to_rfc3339(),
            "timeZone": tz.name(),
        },
        "reminders": {
            "useDefault": true,
        },
    })
}
