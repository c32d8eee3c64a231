//! HTTP client for the remote transaction-indexing service.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tessera_service::{AccountData, AuthResult, BroadcastAck, ServiceError, TxService};
use tessera_types::{
    Account, ChainType, ExchangeRate, ExchangeRates, ExchangeSetting, ExchangeSettings, FeeRates,
    HistoricalExchangeRates, TimeInterval,
};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::WalletError;

const API_KEY_HEADER: &str = "Api-Key";

/// Wraps `reqwest::Client` with the service base URLs and the API key.
#[derive(Clone)]
pub struct HttpTxService {
    http: reqwest::Client,
    base_url: String,
    api_root: String,
    api_key: String,
}

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    raw: &'a str,
}

/// One rate series as served by `/rates/history`.
#[derive(Deserialize)]
struct RateSeries {
    interval: TimeInterval,
    rates: Vec<ExchangeRate>,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    token: &'a str,
}

impl HttpTxService {
    pub fn new(config: &EngineConfig) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| WalletError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.tx_service_url.trim_end_matches('/').to_string(),
            api_root: config.api_root.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(format!("{}{path}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
    }

    fn post(&self, url: String) -> RequestBuilder {
        self.http.post(url).header(API_KEY_HEADER, &self.api_key)
    }

    async fn send(request: RequestBuilder) -> Result<Response, ServiceError> {
        request
            .send()
            .await
            .map_err(|e| ServiceError::transport(format!("request failed: {e}")))
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ServiceError> {
        let response = Self::send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from(status, response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::new(status.as_u16(), format!("invalid JSON response: {e}")))
    }
}

async fn error_from(status: StatusCode, response: Response) -> ServiceError {
    let body = response.text().await.unwrap_or_default();
    ServiceError::new(status.as_u16(), body)
}

#[async_trait]
impl TxService for HttpTxService {
    async fn fetch_account(&self, account: &Account) -> Result<AccountData, ServiceError> {
        let path = format!("/accounts/{}/{}/{}", account.chain, account.network, account.address);
        Self::json(self.get(&path)).await
    }

    async fn fetch_exchange_rates(&self) -> Result<ExchangeRates, ServiceError> {
        let rates: Vec<ExchangeRate> = Self::json(self.get("/rates")).await?;
        Ok(rates.into_iter().collect())
    }

    async fn fetch_exchange_settings(&self) -> Result<ExchangeSettings, ServiceError> {
        let settings: Vec<ExchangeSetting> = Self::json(self.get("/exchange/settings")).await?;
        Ok(settings.into_iter().collect())
    }

    async fn fetch_historical_exchange_rates(&self) -> Result<HistoricalExchangeRates, ServiceError> {
        let series: Vec<RateSeries> = Self::json(self.get("/rates/history")).await?;
        let mut history = HistoricalExchangeRates::new();
        for RateSeries { interval, rates } in series {
            for rate in rates {
                history.push(interval, rate);
            }
        }
        Ok(history)
    }

    async fn fetch_fee_rates(&self, chain: ChainType) -> Result<FeeRates, ServiceError> {
        Self::json(self.get(&format!("/fees/{chain}"))).await
    }

    /// A 4xx reply to a broadcast is the network refusing the transaction;
    /// anything else that is not a success leaves the outcome unknown.
    async fn broadcast(&self, chain: ChainType, raw_hex: &str) -> Result<BroadcastAck, ServiceError> {
        let request = self
            .post(format!("{}/broadcast/{chain}", self.base_url))
            .json(&BroadcastRequest { raw: raw_hex });
        let response = Self::send(request).await?;
        let status = response.status();
        if status.is_client_error() && status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN {
            let reason = response.text().await.unwrap_or_default();
            debug!(%chain, status = status.as_u16(), "broadcast refused");
            return Ok(BroadcastAck::rejected(reason));
        }
        if !status.is_success() {
            return Err(error_from(status, response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::new(status.as_u16(), format!("invalid JSON response: {e}")))
    }

    async fn authenticate(
        &self,
        token: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<AuthResult, ServiceError> {
        let mut request = self
            .post(format!("{}/auth", self.api_root))
            .json(&AuthRequest { token });
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        Self::json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let config = EngineConfig {
            tx_service_url: "https://tx.example.com/v1/".into(),
            api_root: "https://api.example.com/".into(),
            ..EngineConfig::default()
        };
        let service = HttpTxService::new(&config).unwrap();
        assert_eq!(service.base_url(), "https://tx.example.com/v1");
        assert_eq!(service.api_root, "https://api.example.com");
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let config = EngineConfig {
            tx_service_url: "http://127.0.0.1:1".into(),
            request_timeout_secs: 1,
            ..EngineConfig::default()
        };
        let service = HttpTxService::new(&config).unwrap();
        let err = service.fetch_exchange_rates().await.unwrap_err();
        assert_eq!(err.code, ServiceError::NO_RESPONSE);
    }
}
