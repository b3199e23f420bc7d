//! Integration tests using a mock SOAP server
//!
//! Tests the full end-to-end flow: config → SOAP calls → Singer messages and state file

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tap_tradetracker::catalog::StreamCatalog;
use tap_tradetracker::config::TapConfig;
use tap_tradetracker::engine::{SyncEngine, SyncPlan, SyncSettings};
use tap_tradetracker::merchant::{MerchantApi, TradeTrackerClient};
use tap_tradetracker::output::JsonLinesWriter;
use tap_tradetracker::state::StateManager;
use tempfile::tempdir;
use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Mock Service
// ============================================================================

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

fn soap_ok(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "text/xml; charset=utf-8")
        .set_body_string(envelope(body))
}

async fn mount_service(server: &MockServer, report_calls: u64) {
    Mock::given(method("POST"))
        .and(header(
            "SOAPAction",
            "\"https://ws.tradetracker.com/soap/merchant/authenticate\"",
        ))
        .and(body_string_contains("<ns1:authenticate>"))
        .respond_with(soap_ok("<ns1:authenticateResponse/>"))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns1:getCampaigns>"))
        .respond_with(soap_ok(
            r#"<ns1:getCampaignsResponse>
                 <campaigns SOAP-ENC:arrayType="ns1:Campaign[2]" xsi:type="ns1:CampaignArray">
                   <item xsi:type="ns1:Campaign">
                     <ID xsi:type="xsd:int">11</ID>
                     <name xsi:type="xsd:string">Shoes</name>
                     <URL xsi:type="xsd:string">https://shoes.example</URL>
                   </item>
                   <item xsi:type="ns1:Campaign">
                     <ID xsi:type="xsd:int">12</ID>
                     <name xsi:type="xsd:string">Hats</name>
                     <URL xsi:type="xsd:string">https://hats.example</URL>
                   </item>
                 </campaigns>
               </ns1:getCampaignsResponse>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns1:getReportCampaign>"))
        .and(body_string_contains(
            r#"<campaignID xsi:type="xsd:int">11</campaignID>"#,
        ))
        .respond_with(soap_ok(
            r#"<ns1:getReportCampaignResponse>
                 <reportData xsi:type="ns1:ReportData">
                   <uniqueClickCount xsi:type="xsd:int">12</uniqueClickCount>
                   <CTR xsi:type="xsd:float">1.25</CTR>
                 </reportData>
               </ns1:getReportCampaignResponse>"#,
        ))
        .expect(report_calls)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns1:getReportCampaign>"))
        .and(body_string_contains(
            r#"<campaignID xsi:type="xsd:int">12</campaignID>"#,
        ))
        .respond_with(soap_ok(
            r#"<ns1:getReportCampaignResponse>
                 <reportData xsi:nil="true"/>
               </ns1:getReportCampaignResponse>"#,
        ))
        .expect(report_calls)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("<ns1:getAffiliateSites>"))
        .respond_with(soap_ok(
            r#"<ns1:getAffiliateSitesResponse>
                 <affiliateSites SOAP-ENC:arrayType="ns1:AffiliateSite[1]" xsi:type="ns1:AffiliateSiteArray">
                   <item xsi:type="ns1:AffiliateSite">
                     <ID xsi:type="xsd:int">900</ID>
                     <name xsi:type="xsd:string">Deals Blog</name>
                   </item>
                 </affiliateSites>
               </ns1:getAffiliateSitesResponse>"#,
        ))
        .expect(2)
        .mount(server)
        .await;
}

fn parse_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8(output.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn of_type<'a>(messages: &'a [Value], kind: &str) -> Vec<&'a Value> {
    messages.iter().filter(|m| m["type"] == kind).collect()
}

fn records_for<'a>(messages: &'a [Value], stream: &str) -> Vec<&'a Value> {
    of_type(messages, "RECORD")
        .into_iter()
        .filter(|m| m["stream"] == stream)
        .map(|m| &m["record"])
        .collect()
}

// ============================================================================
// Library Flow
// ============================================================================

#[tokio::test]
async fn test_sync_all_streams() {
    let server = MockServer::start().await;
    mount_service(&server, 4).await;

    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    let config = TapConfig::from_value(json!({
        "customer_id": 4711,
        "passphrase": "s3cret",
        "start_date": "2024-02-01",
        "endpoint_url": server.uri()
    }))
    .unwrap();
    let settings = SyncSettings::from_config(&config)
        .unwrap()
        .with_now(Utc.with_ymd_and_hms(2024, 2, 5, 0, 0, 0).unwrap());

    let catalog = StreamCatalog::builtin().unwrap();
    let selected: Vec<String> = catalog.names().into_iter().map(String::from).collect();
    let plan = SyncPlan::new(&catalog, &selected).unwrap();

    let client = TradeTrackerClient::open(&config).unwrap();
    client.authenticate().await.unwrap();

    let mut writer = JsonLinesWriter::new(Vec::new());
    let state = StateManager::from_file(&state_path).unwrap();
    let mut engine = SyncEngine::new(&client, &catalog, state, settings);
    let stats = engine.run(&plan, &mut writer).await.unwrap();
    client.close();

    let messages = parse_lines(&writer.into_inner());

    let schema_streams: Vec<&Value> = of_type(&messages, "SCHEMA")
        .into_iter()
        .map(|m| &m["stream"])
        .collect();
    assert_eq!(
        schema_streams,
        vec![
            &json!("campaigns"),
            &json!("campaign_report"),
            &json!("affiliate_sites")
        ]
    );

    let campaigns = records_for(&messages, "campaigns");
    assert_eq!(
        campaigns,
        vec![
            &json!({"id": 11, "name": "Shoes", "url": "https://shoes.example"}),
            &json!({"id": 12, "name": "Hats", "url": "https://hats.example"})
        ]
    );

    let reports = records_for(&messages, "campaign_report");
    assert_eq!(reports.len(), 4);
    assert_eq!(
        reports[0],
        &json!({
            "campaign_id": 11,
            "date": "2024-02-01",
            "unique_click_count": 12,
            "ctr": 1.25
        })
    );
    assert_eq!(reports[3]["date"], json!("2024-02-04"));

    let sites = records_for(&messages, "affiliate_sites");
    assert_eq!(sites.len(), 2);
    assert_eq!(
        sites[0],
        &json!({"id": 900, "name": "Deals Blog", "campaign_id": 11})
    );
    assert_eq!(sites[1]["campaign_id"], json!(12));

    // Start and finish markers plus one per report window
    assert_eq!(of_type(&messages, "STATE").len(), 2 + 8);
    assert_eq!(stats.records_synced, 8);

    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(&state_path).unwrap()).unwrap();
    assert_eq!(
        saved,
        json!({
            "bookmarks": {
                "campaign_report": {
                    "date(parent:11)": "2024-02-04T00:00:00Z",
                    "date(parent:12)": "2024-02-01T00:00:00Z"
                }
            }
        })
    );

    let last = messages.last().unwrap();
    assert_eq!(last["type"], json!("STATE"));
    assert_eq!(last["value"], saved);
}

// ============================================================================
// Binary Flow
// ============================================================================

fn write_config(dir: &std::path::Path, server: &MockServer, passphrase: &str) -> std::path::PathBuf {
    let path = dir.join("config.json");
    let config = json!({
        "customer_id": "4711",
        "passphrase": passphrase,
        "start_date": "2024-01-01T00:00:00Z",
        "endpoint_url": server.uri()
    });
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

#[tokio::test]
async fn test_binary_syncs_selected_child() {
    let server = MockServer::start().await;
    mount_service(&server, 0).await;

    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), &server, "s3cret");

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_tap-tradetracker"))
        .arg("sync")
        .arg("--streams")
        .arg("affiliate_sites")
        .arg("-C")
        .arg(&config_path)
        .output()
        .await
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let messages = parse_lines(&output.stdout);
    let types: Vec<&str> = messages
        .iter()
        .map(|m| m["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["SCHEMA", "STATE", "RECORD", "RECORD", "STATE"]);
    assert_eq!(messages[0]["stream"], json!("affiliate_sites"));
    assert!(records_for(&messages, "campaigns").is_empty());
}

#[tokio::test]
async fn test_binary_reports_auth_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(envelope(
            "<SOAP-ENV:Fault><faultcode>SOAP-ENV:Client</faultcode>\
             <faultstring>Invalid passphrase</faultstring></SOAP-ENV:Fault>",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), &server, "wrong");

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_tap-tradetracker"))
        .arg("check")
        .arg("-C")
        .arg(&config_path)
        .output()
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "stderr: {stderr}");
    assert!(stderr.contains("Invalid passphrase"), "stderr: {stderr}");
}
