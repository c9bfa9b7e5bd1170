//! # Traced Init Test
//!
//! Runs one init with the process-wide subscriber from `prerender-telemetry`
//! installed, the way an embedding server starts up. Kept in its own test
//! binary because the global subscriber can be set only once.

mod common;

use common::Fixture;
use prerender_host::AppInstanceApi;
use prerender_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::test]
async fn test_init_under_installed_telemetry() {
    let config = TelemetryConfig {
        console_output: false,
        ..TelemetryConfig::default()
    }
    .with_log_level("prerender_host=debug");
    let guard = init_telemetry(config).unwrap();
    assert_eq!(guard.service_name(), "prerender");

    let fixture = Fixture::new(&["users/:id"]);
    let mut instance = fixture.instance("public/js/config.js");
    instance.init().await.unwrap();

    let html = instance.snapshot("users/1").unwrap().unwrap();
    assert!(html.contains("<main>users/1</main>"));
    assert!(!fixture.host.serializer().is_active());
}
