mod common;

use axum::extract::State;
use garagematch_api::routes::health::health_check;

use common::{StaticGeocoder, unreachable_state};

#[tokio::test]
async fn health_check_reports_unreachable_database() -> anyhow::Result<()> {
    let response = health_check(State(unreachable_state()?)).await;
    assert_eq!(response.0.message, "Health check");

    let data = serde_json::to_value(response.0.data.expect("health data"))?;
    assert_eq!(data["status"], "ok");
    assert_eq!(data["database"], "unavailable");
    Ok(())
}

#[tokio::test]
async fn health_check_reaches_configured_database() -> anyhow::Result<()> {
    let Some(state) = common::setup_state(StaticGeocoder::default()).await? else {
        return Ok(());
    };
    let data = serde_json::to_value(health_check(State(state)).await.0.data)?;
    assert_eq!(data["database"], "ok");
    Ok(())
}
