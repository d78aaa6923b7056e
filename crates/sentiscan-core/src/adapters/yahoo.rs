use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{MarketDataSource, SourceError};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::throttling::HostThrottle;
use crate::{MarketSnapshot, ProviderId, Symbol, TextDocument, UtcDateTime};

const QUERY1: &str = "https://query1.finance.yahoo.com";
const QUERY2: &str = "https://query2.finance.yahoo.com";
const REFERER: &str = "https://finance.yahoo.com/";
const NEWS_COUNT: usize = 10;
const MARKET_NEWS_QUERY: &str = "market news";

/// Session crumb required by the `quoteSummary` endpoint.
///
/// The crumb is bound to session cookies held by the transport's cookie jar,
/// so obtaining one means visiting the consent host first.
#[derive(Debug, Default)]
pub struct YahooCrumb {
    crumb: Mutex<Option<String>>,
}

impl YahooCrumb {
    /// Cached crumb, fetching one when none is held. Concurrent callers wait
    /// on the same refresh.
    pub async fn get(&self, adapter: &YahooAdapter) -> Result<String, SourceError> {
        let mut crumb = self.crumb.lock().await;
        if let Some(value) = crumb.as_ref() {
            return Ok(value.clone());
        }

        let fresh = Self::fetch(adapter).await?;
        *crumb = Some(fresh.clone());
        Ok(fresh)
    }

    pub async fn invalidate(&self) {
        *self.crumb.lock().await = None;
    }

    async fn fetch(adapter: &YahooAdapter) -> Result<String, SourceError> {
        let consent = HttpRequest::get("https://fc.yahoo.com").with_header("referer", REFERER);
        // Any status works here; the visit only seeds the cookie jar.
        adapter.send(consent).await?;

        for origin in [QUERY1, QUERY2] {
            let request = HttpRequest::get(format!("{origin}/v1/test/getcrumb"))
                .with_header("referer", REFERER);
            let response = adapter.send(request).await?;
            if response.status == 429 {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited while fetching crumb",
                ));
            }

            let body = response.body.trim();
            let plausible = response.is_success()
                && !body.is_empty()
                && body.len() < 100
                && !body.contains(char::is_whitespace)
                && !body.contains('<');
            if plausible {
                return Ok(body.to_owned());
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch yahoo crumb from all endpoints",
        ))
    }
}

/// Finance portal adapter: chart quotes, key statistics, search news, and the
/// trending list.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    throttle: Arc<HostThrottle>,
    circuit_breaker: Arc<CircuitBreaker>,
    crumb: Arc<YahooCrumb>,
    request_timeout: Duration,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            throttle: Arc::new(HostThrottle::disabled()),
            circuit_breaker: Arc::new(CircuitBreaker::for_provider(ProviderId::Yahoo)),
            crumb: Arc::new(YahooCrumb::default()),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_throttle(mut self, throttle: Arc<HostThrottle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Politeness gate, breaker, and transport. Server errors and 429s count
    /// against the breaker; any other status is returned for the caller to
    /// interpret.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SourceError> {
        self.circuit_breaker.check()?;

        let request = request.with_timeout(self.request_timeout);
        self.throttle.acquire(request.host()).await;

        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.record_failure();
            SourceError::from_transport(ProviderId::Yahoo, &error)
        })?;

        if response.status == 429 || response.status >= 500 {
            self.circuit_breaker.record_failure();
        } else {
            self.circuit_breaker.record_success();
        }
        Ok(response)
    }

    async fn get_json(&self, url: String) -> Result<String, SourceError> {
        let response = self
            .send(HttpRequest::get(url).with_header("referer", REFERER))
            .await?;
        if !response.is_success() {
            return Err(SourceError::from_status(ProviderId::Yahoo, response.status));
        }
        Ok(response.body)
    }

    async fn fetch_snapshot(
        &self,
        symbol: Symbol,
        extended: bool,
    ) -> Result<Option<MarketSnapshot>, SourceError> {
        let url = format!(
            "{QUERY1}/v8/finance/chart/{}?range=1d&interval=1d",
            urlencoding::encode(symbol.as_str())
        );
        let response = self
            .send(HttpRequest::get(url).with_header("referer", REFERER))
            .await?;

        // Unknown and delisted symbols come back as 404 with an error body.
        if response.status == 404 {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(SourceError::from_status(ProviderId::Yahoo, response.status));
        }

        let Some(snapshot) = parse_chart(&response.body, symbol.clone())? else {
            return Ok(None);
        };
        if !extended {
            return Ok(Some(snapshot));
        }

        let snapshot = match self.fetch_key_statistics(&symbol).await {
            Ok(stats) => snapshot.with_extended(stats.short_float, stats.avg_volume, stats.market_cap),
            Err(error) => {
                tracing::warn!(
                    symbol = %symbol,
                    error = %error,
                    "extended market data unavailable"
                );
                snapshot.with_extended_unavailable()
            }
        };
        Ok(Some(snapshot))
    }

    async fn fetch_key_statistics(&self, symbol: &Symbol) -> Result<KeyStatistics, SourceError> {
        let mut refreshed = false;
        loop {
            let crumb = self.crumb.get(self).await?;
            let url = format!(
                "{QUERY2}/v10/finance/quoteSummary/{}?modules=defaultKeyStatistics,summaryDetail,price&crumb={}",
                urlencoding::encode(symbol.as_str()),
                urlencoding::encode(&crumb)
            );
            let response = self
                .send(HttpRequest::get(url).with_header("referer", REFERER))
                .await?;

            // A stale crumb is rejected with 401; refresh once and retry.
            if response.status == 401 && !refreshed {
                self.crumb.invalidate().await;
                refreshed = true;
                continue;
            }
            if !response.is_success() {
                return Err(SourceError::from_status(ProviderId::Yahoo, response.status));
            }
            return parse_key_statistics(&response.body);
        }
    }

    async fn search_news(&self, query: &str) -> Result<Vec<TextDocument>, SourceError> {
        let url = format!(
            "{QUERY2}/v1/finance/search?q={}&quotesCount=0&newsCount={NEWS_COUNT}",
            urlencoding::encode(query)
        );
        let body = self.get_json(url).await?;
        parse_news(&body)
    }

    async fn fetch_trending(&self) -> Result<Vec<Symbol>, SourceError> {
        let body = self
            .get_json(format!("{QUERY1}/v1/finance/trending/US"))
            .await?;
        parse_trending(&body)
    }
}

impl MarketDataSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    fn snapshot<'a>(
        &'a self,
        symbol: Symbol,
        extended: bool,
    ) -> Pin<Box<dyn Future<Output = Result<Option<MarketSnapshot>, SourceError>> + Send + 'a>>
    {
        Box::pin(self.fetch_snapshot(symbol, extended))
    }

    fn headlines<'a>(
        &'a self,
        symbol: Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TextDocument>, SourceError>> + Send + 'a>> {
        Box::pin(async move { self.search_news(symbol.as_str()).await })
    }

    fn trending<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Symbol>, SourceError>> + Send + 'a>> {
        Box::pin(self.fetch_trending())
    }

    fn market_news<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TextDocument>, SourceError>> + Send + 'a>> {
        Box::pin(self.search_news(MARKET_NEWS_QUERY))
    }
}

fn parse_chart(body: &str, symbol: Symbol) -> Result<Option<MarketSnapshot>, SourceError> {
    let chart: ChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::invalid_response(format!("failed to parse yahoo chart: {e}")))?;

    let Some(meta) = chart
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .map(|result| result.meta)
    else {
        return Ok(None);
    };
    let Some(price) = meta.regular_market_price else {
        return Ok(None);
    };

    let previous_close = meta.chart_previous_close.or(meta.previous_close);
    let volume = meta
        .regular_market_volume
        .filter(|volume| volume.is_finite() && *volume >= 0.0)
        .map(|volume| volume as u64);

    MarketSnapshot::from_quote(symbol, price, previous_close, volume, meta.currency)
        .map(Some)
        .map_err(|e| SourceError::invalid_response(format!("yahoo chart rejected: {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct KeyStatistics {
    short_float: Option<f64>,
    avg_volume: Option<f64>,
    market_cap: Option<f64>,
}

fn parse_key_statistics(body: &str) -> Result<KeyStatistics, SourceError> {
    let summary: QuoteSummaryResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::invalid_response(format!("failed to parse yahoo quote summary: {e}"))
    })?;

    let result = summary
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::invalid_response("yahoo quote summary has no result"))?;

    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();
    let price = result.price.unwrap_or_default();

    Ok(KeyStatistics {
        short_float: RawValue::get(&stats.short_percent_of_float),
        avg_volume: RawValue::get(&detail.average_volume)
            .or_else(|| RawValue::get(&price.average_daily_volume_3_month)),
        market_cap: RawValue::get(&price.market_cap).or_else(|| RawValue::get(&detail.market_cap)),
    })
}

fn parse_news(body: &str) -> Result<Vec<TextDocument>, SourceError> {
    let search: SearchResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::invalid_response(format!("failed to parse yahoo search: {e}")))?;

    let mut items = search.news;
    items.sort_by(|a, b| {
        b.provider_publish_time
            .unwrap_or(0)
            .cmp(&a.provider_publish_time.unwrap_or(0))
    });

    Ok(items
        .into_iter()
        .map(|item| {
            let mut document = TextDocument::new(
                item.publisher.unwrap_or_else(|| String::from("Unknown")),
                item.title.unwrap_or_default(),
                item.link.unwrap_or_default(),
            );
            if let Some(published) = item
                .provider_publish_time
                .and_then(|seconds| UtcDateTime::from_unix_seconds(seconds as f64).ok())
            {
                document = document.with_published_at(published);
            }
            document
        })
        .collect())
}

fn parse_trending(body: &str) -> Result<Vec<Symbol>, SourceError> {
    let trending: TrendingResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::invalid_response(format!("failed to parse yahoo trending: {e}"))
    })?;

    Ok(trending
        .finance
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|result| result.quotes)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|quote| Symbol::parse(&quote.symbol).ok())
        .filter(|symbol| !symbol.is_crypto_or_forex())
        .collect())
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    currency: Option<String>,
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<f64>,
    #[serde(rename = "chartPreviousClose", default)]
    chart_previous_close: Option<f64>,
    #[serde(rename = "previousClose", default)]
    previous_close: Option<f64>,
    #[serde(rename = "regularMarketVolume", default)]
    regular_market_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryData,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryData {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    #[serde(rename = "summaryDetail", default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(rename = "defaultKeyStatistics", default)]
    default_key_statistics: Option<DefaultKeyStatistics>,
    #[serde(default)]
    price: Option<PriceModule>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "averageVolume", default)]
    average_volume: Option<RawValue>,
    #[serde(rename = "marketCap", default)]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultKeyStatistics {
    #[serde(rename = "shortPercentOfFloat", default)]
    short_percent_of_float: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceModule {
    #[serde(rename = "marketCap", default)]
    market_cap: Option<RawValue>,
    #[serde(rename = "averageDailyVolume3Month", default)]
    average_daily_volume_3_month: Option<RawValue>,
}

/// Numeric fields arrive wrapped as `{"raw": 0.21, "fmt": "21%"}`.
#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

impl RawValue {
    fn get(value: &Option<RawValue>) -> Option<f64> {
        value
            .as_ref()
            .and_then(|value| value.raw)
            .filter(|raw| raw.is_finite())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(rename = "providerPublishTime", default)]
    provider_publish_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    finance: TrendingFinance,
}

#[derive(Debug, Deserialize)]
struct TrendingFinance {
    #[serde(default)]
    result: Option<Vec<TrendingResult>>,
}

#[derive(Debug, Deserialize)]
struct TrendingResult {
    #[serde(default)]
    quotes: Vec<TrendingQuote>,
}

#[derive(Debug, Deserialize)]
struct TrendingQuote {
    symbol: String,
}
