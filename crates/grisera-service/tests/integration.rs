//! Integration tests for grisera-service against a live Neo4j instance.
//!
//! Run with: cargo test --package grisera-service --test integration -- --ignored
//!
//! Skipped automatically if Neo4j is not available.

use grisera_core::{NodeId, PropertyValue};
use grisera_graph::{GraphClient, GraphConfig};
use grisera_service::timeseries::{SeriesType, SignalValue, TimeSeries};
use grisera_service::{Neo4jTimeSeriesStore, TimeSeriesService, TimeWindow};

const DATABASE: &str = "neo4j";

async fn connect_or_skip() -> Option<TimeSeriesService<Neo4jTimeSeriesStore>> {
    match GraphClient::connect(&GraphConfig::default()).await {
        Ok(client) => Some(TimeSeriesService::new(Neo4jTimeSeriesStore::new(
            client, DATABASE,
        ))),
        Err(e) => {
            eprintln!("Skipping integration test (Neo4j not available): {e}");
            None
        }
    }
}

#[tokio::test]
#[ignore = "requires live Neo4j"]
async fn test_epoch_series_round_trip() {
    let Some(service) = connect_or_skip().await else {
        return;
    };

    let id = NodeId(-4_242);
    let _ = service.delete(id).await;

    let series = TimeSeries {
        id,
        series_type: SeriesType::Epoch,
        signal_values: vec![
            SignalValue {
                timestamp: 20,
                end_timestamp: Some(25),
                value: PropertyValue::Float(0.5),
            },
            SignalValue {
                timestamp: 10,
                end_timestamp: Some(12),
                value: PropertyValue::from("blink"),
            },
        ],
    };

    let saved = service.save(&series).await.unwrap();
    let timestamps: Vec<i64> = saved.signal_values.iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![10, 20]);
    assert_eq!(saved.signal_values[0].end_timestamp, Some(12));

    assert!(service.save(&series).await.is_err());

    let window = TimeWindow {
        from: Some(15),
        to: None,
    };
    assert_eq!(service.get(id, window).await.unwrap().signal_values.len(), 1);

    service.delete(id).await.unwrap();
}
