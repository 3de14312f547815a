use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt::Debug;

use crate::{error::FetchError, model::WeatherQuery};

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data";

#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    /// Issue one request and return the raw response body.
    async fn fetch_weather(&self, query: &WeatherQuery) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    /// Point the client at another host, e.g. a proxy or a test server.
    pub fn with_base_url(base_url: &str) -> Result<Self, FetchError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)?;

        Ok(Self { base_url, http: Client::new() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL; parameter order is lat, lon, units, appid.
    pub fn request_url(&self, query: &WeatherQuery) -> Result<Url, FetchError> {
        let lat = query.latitude.to_string();
        let lon = query.longitude.to_string();

        let url = Url::parse_with_params(
            &format!("{}/2.5/weather", self.base_url),
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", query.units.as_str()),
                ("appid", query.api_key.as_str()),
            ],
        )?;

        Ok(url)
    }
}

impl Default for OpenWeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    async fn fetch_weather(&self, query: &WeatherQuery) -> Result<String, FetchError> {
        let url = self.request_url(query)?;
        tracing::debug!(lat = query.latitude, lon = query.longitude, units = %query.units, "requesting current weather");

        let res = self.http.get(url).send().await?;

        let status = res.status();
        if !status.is_success() {
            // The status alone decides the outcome; the body is only for logs.
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %truncate_body(&body), "weather request failed");
            return Err(FetchError::Status { status: status.as_u16(), body });
        }

        let body = res.text().await?;
        tracing::info!(bytes = body.len(), "weather received");
        Ok(body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocationFix, Units};

    fn query() -> WeatherQuery {
        WeatherQuery::new(LocationFix::new(12.9, 77.6), Units::Metric, "KEY")
    }

    #[test]
    fn request_url_matches_openweather_layout() {
        let client = OpenWeatherClient::new();
        let url = client.request_url(&query()).expect("url should build");

        assert_eq!(
            url.as_str(),
            "http://api.openweathermap.org/data/2.5/weather?lat=12.9&lon=77.6&units=metric&appid=KEY"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OpenWeatherClient::with_base_url("http://localhost:8080/data/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/data");

        let url = client.request_url(&query()).unwrap();
        assert!(url.as_str().starts_with("http://localhost:8080/data/2.5/weather?"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = OpenWeatherClient::with_base_url("not a url").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);

        assert_eq!(truncate_body("short"), "short");
    }
}
