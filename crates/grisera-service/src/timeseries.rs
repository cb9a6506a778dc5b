//! Time-series storage adapter.
//!
//! A logical series is flattened into one [`SignalRecord`] per signal value,
//! each tagged with the series id in its metadata. Reading groups the rows
//! back by that id and orders them by timestamp.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use grisera_core::{NodeId, PropertyValue};
use grisera_graph::{GraphClient, GraphError};
use neo4rs::{query, BoltList, BoltMap, BoltString, BoltType};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Label of the rows written by [`Neo4jTimeSeriesStore`].
pub const SIGNAL_LABEL: &str = "Signal Value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesType {
    /// Point samples: one timestamp per value.
    Timestamp,
    /// Interval samples: each value spans `timestamp..=end_timestamp`.
    Epoch,
}

impl SeriesType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "Timestamp",
            Self::Epoch => "Epoch",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Timestamp" => Some(Self::Timestamp),
            "Epoch" => Some(Self::Epoch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalValue {
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<i64>,
    pub value: PropertyValue,
}

/// One logical time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub series_type: SeriesType,
    pub signal_values: Vec<SignalValue>,
}

/// Grouping key attached to every stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub time_series_id: NodeId,
    pub series_type: SeriesType,
}

/// A single stored sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub metadata: SeriesMetadata,
    pub timestamp: i64,
    pub end_timestamp: Option<i64>,
    pub value: PropertyValue,
}

/// Inclusive bounds on `timestamp`. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl TimeWindow {
    pub const ALL: Self = Self {
        from: None,
        to: None,
    };

    pub fn contains(&self, timestamp: i64) -> bool {
        self.from.map_or(true, |from| timestamp >= from) && self.to.map_or(true, |to| timestamp <= to)
    }
}

/// Row-level storage for time-series samples.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Write every record. Returns the number written.
    async fn insert_many(&self, records: Vec<SignalRecord>) -> Result<usize>;

    /// All rows of one series whose timestamp falls inside `window`.
    async fn find(&self, time_series_id: NodeId, window: TimeWindow) -> Result<Vec<SignalRecord>>;

    /// Remove all rows of one series. Returns the number removed.
    async fn delete(&self, time_series_id: NodeId) -> Result<usize>;
}

/// Flatten a series into storable rows.
pub fn flatten(series: &TimeSeries) -> Vec<SignalRecord> {
    let metadata = SeriesMetadata {
        time_series_id: series.id,
        series_type: series.series_type,
    };
    series
        .signal_values
        .iter()
        .map(|signal| SignalRecord {
            metadata,
            timestamp: signal.timestamp,
            end_timestamp: signal.end_timestamp,
            value: signal.value.clone(),
        })
        .collect()
}

/// Group rows by series id and rebuild each series in timestamp order.
///
/// Rows sharing a timestamp keep their relative order.
pub fn reassemble(records: Vec<SignalRecord>) -> Vec<TimeSeries> {
    let mut groups: BTreeMap<NodeId, (SeriesType, Vec<SignalValue>)> = BTreeMap::new();
    for record in records {
        let entry = groups
            .entry(record.metadata.time_series_id)
            .or_insert_with(|| (record.metadata.series_type, Vec::new()));
        entry.1.push(SignalValue {
            timestamp: record.timestamp,
            end_timestamp: record.end_timestamp,
            value: record.value,
        });
    }

    groups
        .into_iter()
        .map(|(id, (series_type, mut signal_values))| {
            signal_values.sort_by_key(|s| s.timestamp);
            TimeSeries {
                id,
                series_type,
                signal_values,
            }
        })
        .collect()
}

/// Reject inputs that could not be read back consistently.
pub fn validate(series: &TimeSeries) -> Result<()> {
    if series.signal_values.is_empty() {
        return Err(ServiceError::Validation(
            "time series needs at least one signal value".to_string(),
        ));
    }
    for signal in &series.signal_values {
        match (series.series_type, signal.end_timestamp) {
            (SeriesType::Timestamp, Some(_)) => {
                return Err(ServiceError::Validation(format!(
                    "timestamp series value at {} must not carry end_timestamp",
                    signal.timestamp
                )))
            }
            (SeriesType::Epoch, None) => {
                return Err(ServiceError::Validation(format!(
                    "epoch series value at {} needs end_timestamp",
                    signal.timestamp
                )))
            }
            (SeriesType::Epoch, Some(end)) if end < signal.timestamp => {
                return Err(ServiceError::Validation(format!(
                    "epoch ends at {end} before it starts at {}",
                    signal.timestamp
                )))
            }
            _ => {}
        }
    }
    Ok(())
}

/// Save, read, and delete whole series on top of a [`TimeSeriesStore`].
pub struct TimeSeriesService<T> {
    store: T,
}

impl<T: TimeSeriesStore> TimeSeriesService<T> {
    pub fn new(store: T) -> Self {
        Self { store }
    }

    /// Validate and write a series, then read it back.
    ///
    /// An id that already holds signal values is rejected; delete the
    /// series first to replace it.
    pub async fn save(&self, series: &TimeSeries) -> Result<TimeSeries> {
        validate(series)?;
        if !self.store.find(series.id, TimeWindow::ALL).await?.is_empty() {
            return Err(ServiceError::Validation(format!(
                "time series {} already has signal values",
                series.id
            )));
        }
        let written = self.store.insert_many(flatten(series)).await?;
        tracing::info!(time_series_id = %series.id, written, "Time series saved");
        self.get(series.id, TimeWindow::ALL).await
    }

    /// Read one series, restricted to `window`.
    ///
    /// An id with no rows at all is not found; a known id whose rows all
    /// fall outside the window comes back with no signal values.
    pub async fn get(&self, id: NodeId, window: TimeWindow) -> Result<TimeSeries> {
        let rows = self.store.find(id, window).await?;
        if let Some(series) = reassemble(rows).into_iter().next() {
            return Ok(series);
        }

        let all = self.store.find(id, TimeWindow::ALL).await?;
        match all.first() {
            Some(row) => Ok(TimeSeries {
                id,
                series_type: row.metadata.series_type,
                signal_values: Vec::new(),
            }),
            None => Err(series_not_found(id)),
        }
    }

    /// Delete a series and return its content.
    pub async fn delete(&self, id: NodeId) -> Result<TimeSeries> {
        let snapshot = self.get(id, TimeWindow::ALL).await?;
        let removed = self.store.delete(id).await?;
        tracing::info!(time_series_id = %id, removed, "Time series deleted");
        Ok(snapshot)
    }
}

fn series_not_found(id: NodeId) -> ServiceError {
    ServiceError::NotFound {
        id: id.to_string(),
        message: "Time series not found".to_string(),
    }
}

// ── Stores ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryTimeSeriesStore {
    rows: Mutex<Vec<SignalRecord>>,
}

impl MemoryTimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, Vec<SignalRecord>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

#[async_trait]
impl TimeSeriesStore for MemoryTimeSeriesStore {
    async fn insert_many(&self, records: Vec<SignalRecord>) -> Result<usize> {
        let count = records.len();
        self.rows().extend(records);
        Ok(count)
    }

    async fn find(&self, time_series_id: NodeId, window: TimeWindow) -> Result<Vec<SignalRecord>> {
        Ok(self
            .rows()
            .iter()
            .filter(|r| r.metadata.time_series_id == time_series_id && window.contains(r.timestamp))
            .cloned()
            .collect())
    }

    async fn delete(&self, time_series_id: NodeId) -> Result<usize> {
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|r| r.metadata.time_series_id != time_series_id);
        Ok(before - rows.len())
    }
}

/// Stores each sample as a `Signal Value` node keyed by `time_series_id`.
pub struct Neo4jTimeSeriesStore {
    client: GraphClient,
    database: String,
}

impl Neo4jTimeSeriesStore {
    pub fn new(client: GraphClient, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }
}

#[async_trait]
impl TimeSeriesStore for Neo4jTimeSeriesStore {
    async fn insert_many(&self, records: Vec<SignalRecord>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let cypher = format!(
            "UNWIND $rows AS row
             CREATE (s:`{SIGNAL_LABEL}` {{
               time_series_id: row.time_series_id, series_type: row.series_type,
               timestamp: row.timestamp, end_timestamp: row.end_timestamp, value: row.value
             }})"
        );

        let q = query(&cypher).param("rows", BoltType::List(signal_rows(&records)));
        self.client.run_on(&self.database, q).await?;
        Ok(records.len())
    }

    async fn find(&self, time_series_id: NodeId, window: TimeWindow) -> Result<Vec<SignalRecord>> {
        let cypher = format!(
            "MATCH (s:`{SIGNAL_LABEL}` {{time_series_id: $id}})
             WHERE ($from IS NULL OR s.timestamp >= $from)
               AND ($to IS NULL OR s.timestamp <= $to)
             RETURN s.series_type AS series_type, s.timestamp AS timestamp,
                    s.end_timestamp AS end_timestamp, s.value AS value
             ORDER BY s.timestamp"
        );

        let q = query(&cypher)
            .param("id", time_series_id.0)
            .param("from", window.from)
            .param("to", window.to);

        let rows = self.client.query_rows_on(&self.database, q).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let series_type: String = row.get("series_type").unwrap_or_default();
            let series_type = SeriesType::parse(&series_type).ok_or_else(|| {
                GraphError::Serialization(format!("Unknown series type {series_type:?}"))
            })?;
            let timestamp: i64 = row
                .get("timestamp")
                .map_err(|e| GraphError::Serialization(format!("Failed to read timestamp: {e}")))?;
            let value: PropertyValue = row
                .get("value")
                .map_err(|e| GraphError::Serialization(format!("Failed to read value: {e}")))?;

            records.push(SignalRecord {
                metadata: SeriesMetadata {
                    time_series_id,
                    series_type,
                },
                timestamp,
                end_timestamp: row.get("end_timestamp").unwrap_or(None),
                value,
            });
        }
        Ok(records)
    }

    async fn delete(&self, time_series_id: NodeId) -> Result<usize> {
        let cypher = format!(
            "MATCH (s:`{SIGNAL_LABEL}` {{time_series_id: $id}})
             DELETE s
             RETURN count(s) AS cnt"
        );

        let q = query(&cypher).param("id", time_series_id.0);
        let removed = match self.client.query_one_on(&self.database, q).await? {
            Some(row) => row.get::<i64>("cnt").unwrap_or(0),
            None => 0,
        };
        Ok(removed as usize)
    }
}

/// One map per record, for a single `UNWIND` write.
fn signal_rows(records: &[SignalRecord]) -> BoltList {
    let mut rows = BoltList::new();
    for record in records {
        let mut row = BoltMap::new();
        row.put(
            BoltString::from("time_series_id"),
            BoltType::from(record.metadata.time_series_id.0),
        );
        row.put(
            BoltString::from("series_type"),
            BoltType::from(record.metadata.series_type.as_str()),
        );
        row.put(BoltString::from("timestamp"), BoltType::from(record.timestamp));
        if let Some(end) = record.end_timestamp {
            row.put(BoltString::from("end_timestamp"), BoltType::from(end));
        }
        let value = match &record.value {
            PropertyValue::Bool(b) => BoltType::from(*b),
            PropertyValue::Int(i) => BoltType::from(*i),
            PropertyValue::Float(f) => BoltType::from(*f),
            PropertyValue::String(s) => BoltType::from(s.as_str()),
        };
        row.put(BoltString::from("value"), value);
        rows.push(BoltType::Map(row));
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eeg_series(id: i64) -> TimeSeries {
        TimeSeries {
            id: NodeId(id),
            series_type: SeriesType::Timestamp,
            signal_values: vec![
                SignalValue {
                    timestamp: 30,
                    end_timestamp: None,
                    value: PropertyValue::Float(0.3),
                },
                SignalValue {
                    timestamp: 10,
                    end_timestamp: None,
                    value: PropertyValue::Float(0.1),
                },
                SignalValue {
                    timestamp: 20,
                    end_timestamp: None,
                    value: PropertyValue::Float(0.2),
                },
            ],
        }
    }

    #[test]
    fn test_reassemble_groups_by_metadata_and_sorts() {
        let mut rows = flatten(&eeg_series(1));
        rows.extend(flatten(&TimeSeries {
            id: NodeId(2),
            series_type: SeriesType::Epoch,
            signal_values: vec![SignalValue {
                timestamp: 5,
                end_timestamp: Some(9),
                value: PropertyValue::from("blink"),
            }],
        }));
        rows.swap(0, 3);

        let series = reassemble(rows);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].id, NodeId(1));
        let timestamps: Vec<i64> = series[0].signal_values.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![10, 20, 30]);
        assert_eq!(series[1].series_type, SeriesType::Epoch);
        assert_eq!(series[1].signal_values[0].end_timestamp, Some(9));
    }

    #[test]
    fn test_validate() {
        assert!(validate(&eeg_series(1)).is_ok());

        let mut empty = eeg_series(1);
        empty.signal_values.clear();
        assert!(matches!(validate(&empty), Err(ServiceError::Validation(_))));

        let mut stray_end = eeg_series(1);
        stray_end.signal_values[0].end_timestamp = Some(40);
        assert!(validate(&stray_end).is_err());

        let mut epoch = eeg_series(1);
        epoch.series_type = SeriesType::Epoch;
        assert!(validate(&epoch).is_err());

        for signal in &mut epoch.signal_values {
            signal.end_timestamp = Some(signal.timestamp + 5);
        }
        assert!(validate(&epoch).is_ok());

        epoch.signal_values[1].end_timestamp = Some(0);
        assert!(validate(&epoch).is_err());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = TimeWindow {
            from: Some(10),
            to: Some(20),
        };
        assert!(window.contains(10));
        assert!(window.contains(20));
        assert!(!window.contains(21));
        assert!(TimeWindow::ALL.contains(i64::MIN));
    }

    #[tokio::test]
    async fn test_save_and_get_in_timestamp_order() {
        let service = TimeSeriesService::new(MemoryTimeSeriesStore::new());
        let saved = service.save(&eeg_series(4)).await.unwrap();

        assert_eq!(saved.id, NodeId(4));
        let values: Vec<PropertyValue> =
            saved.signal_values.iter().map(|s| s.value.clone()).collect();
        assert_eq!(
            values,
            vec![
                PropertyValue::Float(0.1),
                PropertyValue::Float(0.2),
                PropertyValue::Float(0.3)
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_series_writes_nothing() {
        let store = MemoryTimeSeriesStore::new();
        let service = TimeSeriesService::new(store);
        let mut bad = eeg_series(1);
        bad.series_type = SeriesType::Epoch;

        assert!(service.save(&bad).await.is_err());
        assert!(service.store.is_empty());
    }

    #[tokio::test]
    async fn test_saving_same_series_twice_is_rejected() {
        let service = TimeSeriesService::new(MemoryTimeSeriesStore::new());
        service.save(&eeg_series(1)).await.unwrap();

        let err = service.save(&eeg_series(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.store.len(), 3);
    }

    #[tokio::test]
    async fn test_saving_other_type_under_taken_id_keeps_original() {
        let service = TimeSeriesService::new(MemoryTimeSeriesStore::new());
        service.save(&eeg_series(1)).await.unwrap();

        let epoch = TimeSeries {
            id: NodeId(1),
            series_type: SeriesType::Epoch,
            signal_values: vec![SignalValue {
                timestamp: 2,
                end_timestamp: Some(5),
                value: PropertyValue::from("blink"),
            }],
        };
        assert!(service.save(&epoch).await.is_err());

        let stored = service.get(NodeId(1), TimeWindow::ALL).await.unwrap();
        assert_eq!(stored.series_type, SeriesType::Timestamp);
        assert_eq!(stored.signal_values.len(), 3);
        assert!(validate(&stored).is_ok());
    }

    #[tokio::test]
    async fn test_save_after_delete_replaces_series() {
        let service = TimeSeriesService::new(MemoryTimeSeriesStore::new());
        service.save(&eeg_series(1)).await.unwrap();
        service.delete(NodeId(1)).await.unwrap();

        let mut shorter = eeg_series(1);
        shorter.signal_values.truncate(1);
        let saved = service.save(&shorter).await.unwrap();
        assert_eq!(saved.signal_values.len(), 1);
    }

    #[test]
    fn test_signal_rows_build_one_map_per_record() {
        let mut series = eeg_series(7);
        series.series_type = SeriesType::Epoch;
        series.signal_values[0].end_timestamp = Some(35);
        let rows = signal_rows(&flatten(&series));

        assert_eq!(rows.value.len(), 3);
        let BoltType::Map(first) = &rows.value[0] else {
            panic!("expected a map row");
        };
        assert_eq!(
            first.value.get(&BoltString::from("time_series_id")),
            Some(&BoltType::from(7_i64))
        );
        assert!(first.value.contains_key(&BoltString::from("end_timestamp")));

        let BoltType::Map(second) = &rows.value[1] else {
            panic!("expected a map row");
        };
        assert!(!second.value.contains_key(&BoltString::from("end_timestamp")));
    }

    #[tokio::test]
    async fn test_get_with_window() {
        let service = TimeSeriesService::new(MemoryTimeSeriesStore::new());
        service.save(&eeg_series(4)).await.unwrap();

        let window = TimeWindow {
            from: Some(15),
            to: None,
        };
        let series = service.get(NodeId(4), window).await.unwrap();
        assert_eq!(series.signal_values.len(), 2);

        let outside = TimeWindow {
            from: Some(100),
            to: None,
        };
        let series = service.get(NodeId(4), outside).await.unwrap();
        assert!(series.signal_values.is_empty());
        assert_eq!(series.series_type, SeriesType::Timestamp);
    }

    #[tokio::test]
    async fn test_get_unknown_series_is_not_found() {
        let service = TimeSeriesService::new(MemoryTimeSeriesStore::new());
        let err = service.get(NodeId(9), TimeWindow::ALL).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_removes_only_that_series() {
        let service = TimeSeriesService::new(MemoryTimeSeriesStore::new());
        service.save(&eeg_series(1)).await.unwrap();
        service.save(&eeg_series(2)).await.unwrap();

        let deleted = service.delete(NodeId(1)).await.unwrap();
        assert_eq!(deleted.signal_values.len(), 3);
        assert!(service.get(NodeId(1), TimeWindow::ALL).await.is_err());
        assert_eq!(service.store.len(), 3);
        assert!(service.delete(NodeId(1)).await.unwrap_err().is_not_found());
    }
}
