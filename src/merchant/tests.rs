//! Tests for the merchant client

use super::*;
use crate::config::TapConfig;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns:ns1="https://ws.tradetracker.com/soap/merchant"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/">
  <SOAP-ENV:Body>{body}</SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#
    )
}

fn config_for(server: &MockServer) -> TapConfig {
    TapConfig::from_value(json!({
        "customer_id": "4711",
        "passphrase": "s3cret",
        "locale": "nl_NL",
        "endpoint_url": server.uri()
    }))
    .unwrap()
}

#[test]
fn test_into_records() {
    assert_eq!(into_records(json!([{"ID": 1}, {"ID": 2}])).len(), 2);
    assert_eq!(into_records(json!(null)), Vec::<serde_json::Value>::new());
    assert_eq!(into_records(json!({"ID": 1})), vec![json!({"ID": 1})]);
}

#[test]
fn test_open_rejects_non_numeric_customer_id() {
    let config = TapConfig::from_value(json!({
        "customer_id": "abc",
        "passphrase": "p"
    }))
    .unwrap();

    let err = TradeTrackerClient::open(&config).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "customer_id"));
}

#[tokio::test]
async fn test_authenticate_sends_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns1:authenticate>"))
        .and(body_string_contains(
            r#"<customerID xsi:type="xsd:int">4711</customerID>"#,
        ))
        .and(body_string_contains(
            r#"<passphrase xsi:type="xsd:string">s3cret</passphrase>"#,
        ))
        .and(body_string_contains(
            r#"<locale xsi:type="xsd:string">nl_NL</locale>"#,
        ))
        .and(body_string_contains(
            r#"<demo xsi:type="xsd:boolean">false</demo>"#,
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(envelope("<ns1:authenticateResponse/>")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = TradeTrackerClient::open(&config_for(&server)).unwrap();
    client.authenticate().await.unwrap();
    client.close();
}

#[tokio::test]
async fn test_authenticate_fault_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(envelope(
            "<SOAP-ENV:Fault><faultcode>SOAP-ENV:Client</faultcode>\
             <faultstring>Invalid passphrase</faultstring></SOAP-ENV:Fault>",
        )))
        .mount(&server)
        .await;

    let client = TradeTrackerClient::open(&config_for(&server)).unwrap();
    let err = client.authenticate().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
    assert!(err.to_string().contains("Invalid passphrase"));
}

#[tokio::test]
async fn test_campaign_report_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns1:getReportCampaign>"))
        .and(body_string_contains(
            r#"<campaignID xsi:type="xsd:int">42</campaignID>"#,
        ))
        .and(body_string_contains(
            r#"<dateFrom xsi:type="xsd:date">2024-01-06</dateFrom>"#,
        ))
        .and(body_string_contains(
            r#"<dateTo xsi:type="xsd:date">2024-01-06</dateTo>"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(
            r#"<ns1:getReportCampaignResponse>
                 <reportData xsi:type="ns1:ReportData">
                   <uniqueClickCount xsi:type="xsd:int">12</uniqueClickCount>
                   <CTR xsi:type="xsd:float">1.25</CTR>
                 </reportData>
               </ns1:getReportCampaignResponse>"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = TradeTrackerClient::open(&config_for(&server)).unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
    let report = client.campaign_report(42, day, day).await.unwrap();

    assert_eq!(report, json!({"uniqueClickCount": 12, "CTR": 1.25}));
}

#[tokio::test]
async fn test_affiliate_sites_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns1:getAffiliateSites>"))
        .and(body_string_contains(
            r#"<options xsi:type="ns1:AffiliateSiteFilter"></options>"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(
            r#"<ns1:getAffiliateSitesResponse>
                 <affiliateSites SOAP-ENC:arrayType="ns1:AffiliateSite[1]" xsi:type="ns1:AffiliateSiteArray">
                   <item xsi:type="ns1:AffiliateSite">
                     <ID xsi:type="xsd:int">900</ID>
                     <name xsi:type="xsd:string">Deals Blog</name>
                   </item>
                 </affiliateSites>
               </ns1:getAffiliateSitesResponse>"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = TradeTrackerClient::open(&config_for(&server)).unwrap();
    let sites = client.affiliate_sites(42).await.unwrap();

    assert_eq!(sites, vec![json!({"ID": 900, "name": "Deals Blog"})]);
}
