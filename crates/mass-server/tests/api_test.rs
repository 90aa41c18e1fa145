//! Live API smoke tests.
//!
//! Run with: cargo test --test api_test -- --ignored
//! Requires a running MASS route server with the sample data.

use reqwest::Client;
use serde_json::Value;

fn base_url() -> String {
    std::env::var("MASS_TEST_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// The sample route is analysed and every advisory obeys the escalation law.
#[tokio::test]
#[ignore]
async fn test_analysis_of_sample_route() {
    let client = Client::new();
    let base = base_url();

    let resp = client.get(format!("{}/api/analysis", base)).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();

    let waypoint_count = body["route"]["waypointCount"].as_u64().unwrap();
    assert_eq!(body["waypoints"].as_array().unwrap().len() as u64, waypoint_count);

    for advisory in body["advisories"].as_array().unwrap() {
        if advisory["structuredData"]["inPeakWindow"] == true {
            assert_eq!(advisory["severity"], "high");
        }
        assert_eq!(advisory["relatedHotspots"].as_array().unwrap().len(), 1);
    }
}

/// Upload replaces the cached route and status reflects it.
#[tokio::test]
#[ignore]
async fn test_upload_and_status() {
    let client = Client::new();
    let base = base_url();

    let rtz = r#"<route version="1.1">
        <routeInfo routeName="Smoke Test"/>
        <waypoints>
            <waypoint id="1"><position lat="57.0" lon="11.0"/></waypoint>
            <waypoint id="2"><position lat="57.1" lon="11.1"/></waypoint>
        </waypoints>
    </route>"#;

    let resp = client
        .post(format!("{}/api/route/upload?filename=smoke.rtz", base))
        .body(rtz)
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let route: Value = resp.json().await.unwrap();
    assert_eq!(route["waypointCount"], 2);

    let status: Value = client
        .get(format!("{}/api/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["hasRouteData"], true);

    let resp = client
        .post(format!("{}/api/route/upload?filename=smoke.txt", base))
        .body(rtz)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

/// Dry-run push is reported by the bridge status endpoint.
#[tokio::test]
#[ignore]
async fn test_mcsse_dry_run_push() {
    let client = Client::new();
    let base = base_url();

    let resp = client.post(format!("{}/api/mcsse/push", base)).send().await.unwrap();
    assert!(resp.status().is_success());
    let outcome: Value = resp.json().await.unwrap();

    let status: Value = client
        .get(format!("{}/api/mcsse/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["lastPushStatus"], outcome["status"]);
}
