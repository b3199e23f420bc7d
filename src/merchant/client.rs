//! SOAP-backed merchant client

use super::MerchantApi;
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::soap::{SoapClient, SoapClientConfig, SoapRequest, SoapValue};
use crate::types::JsonValue;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Client for the merchant web service
///
/// The session lives in a cookie held by the underlying transport, so one
/// instance must serve the whole run.
pub struct TradeTrackerClient {
    soap: SoapClient,
    customer_id: i64,
    passphrase: String,
    sandbox: bool,
    locale: Option<String>,
    demo: bool,
}

impl TradeTrackerClient {
    /// Open a connection using the connector configuration
    pub fn open(config: &TapConfig) -> Result<Self> {
        let customer_id = config
            .customer_id
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::invalid_value("customer_id", "must be a numeric ID"))?;

        let mut soap_config = SoapClientConfig::builder()
            .endpoint(config.endpoint())
            .timeout(config.timeout());
        if let Some(agent) = &config.user_agent {
            soap_config = soap_config.user_agent(agent.clone());
        }

        let soap = SoapClient::new(soap_config.build())?;
        info!("Opened connection to {}", config.endpoint());

        Ok(Self {
            soap,
            customer_id,
            passphrase: config.passphrase.clone(),
            sandbox: config.sandbox,
            locale: config.locale.clone(),
            demo: config.demo,
        })
    }

    /// Release the connection and its session
    pub fn close(self) {
        info!("Closed connection to {}", self.soap.config().endpoint);
    }

    async fn call_list(&self, request: SoapRequest) -> Result<Vec<JsonValue>> {
        let operation = request.operation.clone();
        let records = into_records(self.soap.call(&request).await?);
        debug!("{operation} returned {} records", records.len());
        Ok(records)
    }
}

impl std::fmt::Debug for TradeTrackerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeTrackerClient")
            .field("soap", &self.soap)
            .field("customer_id", &self.customer_id)
            .field("sandbox", &self.sandbox)
            .field("demo", &self.demo)
            .finish_non_exhaustive()
    }
}

/// Flatten a decoded result into a list of records
///
/// Arrays yield their items, `null` yields nothing and any other value is a
/// single record.
pub fn into_records(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items,
        JsonValue::Null => Vec::new(),
        other => vec![other],
    }
}

#[async_trait]
impl MerchantApi for TradeTrackerClient {
    async fn authenticate(&self) -> Result<()> {
        let request = SoapRequest::new("authenticate")
            .param("customerID", SoapValue::Int(self.customer_id))
            .param("passphrase", SoapValue::Str(self.passphrase.clone()))
            .param("sandbox", SoapValue::Bool(self.sandbox))
            .param("locale", SoapValue::opt_str(self.locale.as_deref()))
            .param("demo", SoapValue::Bool(self.demo));

        match self.soap.call(&request).await {
            Ok(_) => {
                info!("Authenticated customer {}", self.customer_id);
                Ok(())
            }
            Err(Error::SoapFault { code, message }) => {
                Err(Error::auth(format!("{message} ({code})")))
            }
            Err(e) => Err(e),
        }
    }

    async fn campaigns(&self) -> Result<Vec<JsonValue>> {
        self.call_list(SoapRequest::new("getCampaigns")).await
    }

    async fn affiliate_sites(&self, campaign_id: i64) -> Result<Vec<JsonValue>> {
        let request = SoapRequest::new("getAffiliateSites")
            .param("campaignID", SoapValue::Int(campaign_id))
            .param("options", SoapValue::empty_struct("AffiliateSiteFilter"));
        self.call_list(request).await
    }

    async fn campaign_report(
        &self,
        campaign_id: i64,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<JsonValue> {
        info!("Campaign {campaign_id} report: date_from={date_from} date_to={date_to}");

        let request = SoapRequest::new("getReportCampaign")
            .param("campaignID", SoapValue::Int(campaign_id))
            .param(
                "options",
                SoapValue::Struct {
                    type_name: "ReportCampaignFilter".to_string(),
                    fields: vec![
                        ("dateFrom".to_string(), SoapValue::Date(date_from)),
                        ("dateTo".to_string(), SoapValue::Date(date_to)),
                    ],
                },
            );
        self.soap.call(&request).await
    }
}
