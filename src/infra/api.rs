//! Thin asynchronous client for the marketplace REST API.
//!
//! - Typed lookups for airports, currencies and airlines, cached per query.
//! - Multipart listing creation with the session's bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{
    Airline, Airport, Currency, GatewayError, ListingGateway, ListingId, ListingKind,
    ListingPayload, LookupError, LookupService,
};
use crate::infra::cache::{CacheStatus, CachedPayload, LookupCache};
use crate::util::{config::AppConfig, version::user_agent};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned {status}")]
    Status {
        status: StatusCode,
        messages: Vec<String>,
    },
    #[error("api error: {0}")]
    Api(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(err) => err.status(),
            _ => None,
        }
    }
}

impl From<ApiError> for GatewayError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Status { status, .. } if status == StatusCode::UNAUTHORIZED => {
                GatewayError::Unauthorized
            }
            ApiError::Status { messages, .. } if !messages.is_empty() => {
                GatewayError::Rejected(messages)
            }
            other if other.status() == Some(StatusCode::UNAUTHORIZED) => GatewayError::Unauthorized,
            other => GatewayError::Other(other.to_string()),
        }
    }
}

impl From<ApiError> for LookupError {
    fn from(error: ApiError) -> Self {
        LookupError(error.to_string())
    }
}

struct LookupCaches {
    airports: LookupCache<Vec<Airport>>,
    currencies: LookupCache<Vec<Currency>>,
    airlines: LookupCache<Option<Airline>>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
    cache: Arc<Mutex<LookupCaches>>,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(user_agent())
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            token: None,
            cache: Arc::new(Mutex::new(LookupCaches {
                airports: LookupCache::new(config.lookup_ttl),
                currencies: LookupCache::new(config.lookup_ttl),
                airlines: LookupCache::new(config.lookup_ttl),
            })),
        })
    }

    /// Client sharing this one's connection pool and cache, authenticated as `token`.
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            token,
            ..self.clone()
        }
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cache.lock().await;
        cache.airports.clear();
        cache.currencies.clear();
        cache.airlines.clear();
    }

    pub async fn search_airports(&self, query: &str) -> Result<Vec<Airport>, ApiError> {
        if let Some(hit) = self.cache.lock().await.airports.fresh(query) {
            return Ok(hit.data);
        }
        let mut url = self.url("airports/search")?;
        url.query_pairs_mut().append_pair("q", query.trim());

        match self.fetch_list::<Airport>(url).await {
            Ok(airports) => {
                tracing::debug!(query, count = airports.len(), "airport search");
                Ok(self.cache.lock().await.airports.store(query, airports).data)
            }
            Err(error) => self.stale_or(error, |c| c.airports.stale(query)).await,
        }
    }

    pub async fn search_currencies(&self, query: &str) -> Result<Vec<Currency>, ApiError> {
        if let Some(hit) = self.cache.lock().await.currencies.fresh(query) {
            return Ok(hit.data);
        }
        let mut url = self.url("currencies/search")?;
        url.query_pairs_mut().append_pair("q", query.trim());

        match self.fetch_list::<Currency>(url).await {
            Ok(currencies) => Ok(self.cache.lock().await.currencies.store(query, currencies).data),
            Err(error) => self.stale_or(error, |c| c.currencies.stale(query)).await,
        }
    }

    /// `Ok(None)` when the API knows no airline for this flight number.
    pub async fn airline_for_flight(&self, flight_number: &str) -> Result<Option<Airline>, ApiError> {
        if let Some(hit) = self.cache.lock().await.airlines.fresh(flight_number) {
            return Ok(hit.data);
        }
        let mut url = self.url("airlines/by-flight")?;
        url.query_pairs_mut().append_pair("flightNumber", flight_number);

        let response = self.authorized(self.http.get(url)).send().await?;
        let airline = if response.status() == StatusCode::NOT_FOUND {
            None
        } else {
            let body = check_status(response).await?.json::<serde_json::Value>().await?;
            parse_optional::<Airline>(body)
        };
        tracing::debug!(flight_number, found = airline.is_some(), "airline lookup");
        Ok(self.cache.lock().await.airlines.store(flight_number, airline).data)
    }

    pub async fn create_listing(&self, payload: ListingPayload) -> Result<ListingId, ApiError> {
        let path = match payload.kind {
            ListingKind::Travel => "travel-announces",
            ListingKind::Package => "package-announces",
        };
        let url = self.url(path)?;
        let form = build_form(&payload)?;

        tracing::info!(%url, kind = ?payload.kind, "creating listing");
        let response = self.authorized(self.http.post(url)).multipart(form).send().await?;
        let body = check_status(response).await?.json::<serde_json::Value>().await?;
        parse_created_id(body).ok_or_else(|| ApiError::Api("response missing listing id".into()))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch_list<T>(&self, url: Url) -> Result<Vec<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self.authorized(self.http.get(url)).send().await?;
        let body = check_status(response).await?.json::<serde_json::Value>().await?;
        parse_list(body)
    }

    async fn stale_or<T, F>(&self, error: ApiError, stale: F) -> Result<T, ApiError>
    where
        F: FnOnce(&LookupCaches) -> Option<CachedPayload<T>>,
    {
        let cache = self.cache.lock().await;
        match stale(&*cache) {
            Some(payload) if payload.status == CacheStatus::Stale => {
                tracing::warn!(%error, "lookup failed, serving stale results");
                Ok(payload.data)
            }
            _ => Err(error),
        }
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

#[async_trait]
impl LookupService for ApiClient {
    async fn search_airports(&self, query: &str) -> Result<Vec<Airport>, LookupError> {
        Ok(ApiClient::search_airports(self, query).await?)
    }

    async fn search_currencies(&self, query: &str) -> Result<Vec<Currency>, LookupError> {
        Ok(ApiClient::search_currencies(self, query).await?)
    }

    async fn airline_for_flight(&self, flight_number: &str) -> Result<Option<Airline>, LookupError> {
        Ok(ApiClient::airline_for_flight(self, flight_number).await?)
    }
}

#[async_trait]
impl ListingGateway for ApiClient {
    async fn create_listing(&self, payload: ListingPayload) -> Result<ListingId, GatewayError> {
        ApiClient::create_listing(self, payload)
            .await
            .map_err(GatewayError::from)
    }
}

fn build_form(payload: &ListingPayload) -> Result<multipart::Form, ApiError> {
    let mut form = multipart::Form::new();
    for (name, value) in payload.form_fields() {
        form = form.text(name, value);
    }
    for image in &payload.images {
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;
        form = form.part("images", part);
    }
    Ok(form)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let messages = parse_error_messages(&body);
    tracing::warn!(%status, ?messages, "api request rejected");
    Err(ApiError::Status { status, messages })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageField {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<MessageField>,
}

/// Messages from an error body shaped `{"message": "..."}` or `{"message": ["...", ...]}`.
fn parse_error_messages(body: &str) -> Vec<String> {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(MessageField::Many(messages)),
        }) => messages,
        Ok(ErrorBody {
            message: Some(MessageField::One(message)),
        }) if !message.is_empty() => vec![message],
        _ => Vec::new(),
    }
}

#[derive(Deserialize)]
struct DataWrapper<T> {
    data: T,
}

/// Lists come back either bare or wrapped in `{"data": [...]}`.
fn parse_list<T: DeserializeOwned>(value: serde_json::Value) -> Result<Vec<T>, ApiError> {
    if let Ok(entries) = serde_json::from_value::<Vec<T>>(value.clone()) {
        return Ok(entries);
    }
    serde_json::from_value::<DataWrapper<Vec<T>>>(value)
        .map(|wrapper| wrapper.data)
        .map_err(|err| ApiError::Api(format!("unexpected list payload: {err}")))
}

fn parse_optional<T: DeserializeOwned>(value: serde_json::Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    if let Ok(item) = serde_json::from_value::<T>(value.clone()) {
        return Some(item);
    }
    serde_json::from_value::<DataWrapper<Option<T>>>(value)
        .ok()
        .and_then(|wrapper| wrapper.data)
}

#[derive(Deserialize)]
struct CreatedDto {
    #[serde(deserialize_with = "string_from_json")]
    id: String,
}

fn parse_created_id(value: serde_json::Value) -> Option<ListingId> {
    parse_optional::<CreatedDto>(value).map(|created| ListingId(created.id))
}

fn string_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> serde::de::Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_messages_accept_both_shapes() {
        assert_eq!(
            parse_error_messages(r#"{"message":["weight must be positive","images required"]}"#),
            vec!["weight must be positive", "images required"]
        );
        assert_eq!(
            parse_error_messages(r#"{"statusCode":400,"message":"Bad flight"}"#),
            vec!["Bad flight"]
        );
        assert!(parse_error_messages("<html>oops</html>").is_empty());
    }

    #[test]
    fn status_errors_map_to_gateway_errors() {
        let unauthorized = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            messages: vec!["Unauthorized".into()],
        };
        assert_eq!(GatewayError::from(unauthorized), GatewayError::Unauthorized);

        let rejected = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            messages: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            GatewayError::from(rejected),
            GatewayError::Rejected(vec!["a".into(), "b".into()])
        );

        let bare = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            messages: vec![],
        };
        assert!(matches!(GatewayError::from(bare), GatewayError::Other(_)));
    }

    #[test]
    fn lists_may_be_wrapped() {
        let bare = json!([{ "id": 1, "code": "CDG", "name": "Charles de Gaulle" }]);
        let wrapped = json!({ "data": [{ "id": 2, "code": "EUR", "name": "Euro", "symbol": "€" }] });
        let airports: Vec<Airport> = parse_list(bare).unwrap();
        let currencies: Vec<Currency> = parse_list(wrapped).unwrap();
        assert_eq!(airports[0].code, "CDG");
        assert_eq!(currencies[0].symbol, "€");
        assert!(parse_list::<Airport>(json!({ "nope": true })).is_err());
    }

    #[test]
    fn created_id_accepts_numbers_and_strings() {
        assert_eq!(parse_created_id(json!({ "id": 17 })), Some(ListingId("17".into())));
        assert_eq!(
            parse_created_id(json!({ "data": { "id": "tr_9" } })),
            Some(ListingId("tr_9".into()))
        );
        assert_eq!(parse_created_id(json!({ "ok": true })), None);
    }

    #[test]
    fn airline_may_be_null() {
        assert_eq!(parse_optional::<Airline>(json!(null)), None);
        assert_eq!(parse_optional::<Airline>(json!({ "data": null })), None);
        let airline = parse_optional::<Airline>(json!({ "name": "Air France", "iataCode": null }));
        assert_eq!(airline.map(|a| a.name), Some("Air France".to_string()));
    }

    #[tokio::test]
    async fn token_is_scoped_to_the_derived_client() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let anonymous = ApiClient::new(&config).unwrap();
        let signed_in = anonymous.with_token(Some("abc".into()));
        assert!(anonymous.token.is_none());
        assert_eq!(signed_in.token.as_deref(), Some("abc"));
        assert_eq!(signed_in.url("airports/search").unwrap().path(), "/api/airports/search");
    }
}
