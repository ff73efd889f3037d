//! Stock quote lookup tool.
//!
//! Fetches the latest close for a symbol from the Stooq CSV endpoint.
//! Network failures and unknown symbols are recoverable execution
//! failures — the oracle sees the error text and can adjust.

use async_trait::async_trait;
use stepline_core::error::ToolError;
use stepline_core::step::Observation;
use stepline_core::tool::Tool;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://stooq.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub struct QuoteLookupTool {
    base_url: String,
    client: reqwest::Client,
}

impl QuoteLookupTool {
    pub fn new() -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ToolError::ExecutionFailed {
                tool: "get_price".into(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.into(),
            client,
        })
    }

    /// Use a custom base URL (testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn failed(&self, reason: impl Into<String>) -> ToolError {
        ToolError::ExecutionFailed {
            tool: self.name().to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Tool for QuoteLookupTool {
    fn name(&self) -> &str {
        "get_price"
    }

    fn description(&self) -> &str {
        "Fetch the latest price for a stock ticker symbol (e.g. GOOG)."
    }

    fn params(&self) -> &[&str] {
        &["symbol"]
    }

    async fn invoke(&self, args: &[String]) -> Result<Observation, ToolError> {
        let symbol = args[0].trim();
        if symbol.is_empty() || !is_symbol(symbol) {
            return Err(ToolError::InvalidArgument {
                tool: self.name().to_string(),
                slot: "symbol".to_string(),
                reason: format!("'{symbol}' is not a ticker symbol"),
            });
        }

        // Stooq lists US tickers with a ".us" suffix.
        let url = format!(
            "{}/q/l/?s={}.us&f=sd2t2ohlcv&h&e=csv",
            self.base_url,
            symbol.to_ascii_lowercase()
        );
        debug!(%symbol, "Fetching quote");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.failed(format!("quote request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(self.failed(format!(
                "quote endpoint returned status {}",
                response.status().as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.failed(format!("failed to read quote body: {e}")))?;

        let price = parse_quote_csv(&body).map_err(|reason| self.failed(reason))?;
        Ok(Observation::Number(price))
    }
}

fn is_symbol(symbol: &str) -> bool {
    symbol.len() <= 12
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '^' || c == '-')
}

/// Parse the close column out of a one-row Stooq CSV response.
///
/// Header: `Symbol,Date,Time,Open,High,Low,Close,Volume`. Unknown symbols
/// come back with `N/D` fields.
fn parse_quote_csv(body: &str) -> Result<f64, String> {
    let mut lines = body.lines();
    let header = lines.next().ok_or("empty quote response")?;
    let close_idx = header
        .split(',')
        .position(|col| col.eq_ignore_ascii_case("close"))
        .ok_or("quote response has no Close column")?;

    let row = lines.next().ok_or("quote response has no data row")?;
    let field = row
        .split(',')
        .nth(close_idx)
        .ok_or("quote row is missing the Close field")?;

    if field == "N/D" {
        return Err("no data for symbol (unknown ticker?)".into());
    }
    field
        .parse::<f64>()
        .map_err(|_| format!("unparseable close price: '{field}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_close_price() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume\n\
                    GOOG.US,2025-06-02,22:00:07,171.0,174.1,170.4,173.45,21355000\n";
        assert_eq!(parse_quote_csv(body).unwrap(), 173.45);
    }

    #[test]
    fn unknown_symbol_reports_no_data() {
        let body = "Symbol,Date,Time,Open,High,Low,Close,Volume\n\
                    XXXX.US,N/D,N/D,N/D,N/D,N/D,N/D,N/D\n";
        assert!(parse_quote_csv(body).unwrap_err().contains("no data"));
    }

    #[test]
    fn malformed_body_is_error() {
        assert!(parse_quote_csv("").is_err());
        assert!(parse_quote_csv("not,a,quote\n").is_err());
    }

    #[test]
    fn symbol_validation() {
        assert!(is_symbol("GOOG"));
        assert!(is_symbol("BRK-B"));
        assert!(is_symbol("^SPX"));
        assert!(!is_symbol("GOOG; DROP TABLE"));
        assert!(!is_symbol("averylongsymbolname"));
    }

    #[tokio::test]
    async fn invalid_symbol_is_recoverable() {
        let tool = QuoteLookupTool::new().unwrap();
        let err = tool.invoke(&["not a symbol!".into()]).await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn tool_declares_single_slot() {
        let tool = QuoteLookupTool::new().unwrap();
        assert_eq!(tool.params(), &["symbol"]);
        assert_eq!(tool.summary().name, "get_price");
    }
}
