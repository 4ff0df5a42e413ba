use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Severity of a log record. Ordering follows severity, so
/// `Level::Info < Level::Warn < Level::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    /// The value written to the `logLevel` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type returned when parsing a level string.
#[derive(thiserror::Error, Debug)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

/// Per-process metadata attached to every record.
///
/// Captured once at logger construction and never overridable by
/// caller-supplied event data.
#[derive(Debug, Clone, Serialize)]
pub struct FixedFields {
    pub host: String,
    pub source: String,
    pub env: String,
    pub ver: String,
}

/// Build one log record as a JSON object.
///
/// **Parameters**
/// - `fixed`: per-process metadata captured at construction.
/// - `event_name`: short caller-supplied event identifier.
/// - `event_data`: free-form JSON object of extra fields. `Null` or any
///   non-object value is treated as an empty mapping.
/// - `level`: severity of the record.
///
/// **Returns**
/// - A JSON object holding the event data fields plus the seven
///   fixed-shape keys (`time`, `logLevel`, `eventName`, `host`, `source`,
///   `env`, `ver`). Fixed-shape keys are inserted last, so a colliding key
///   in `event_data` is always overwritten.
///
/// Pure apart from the timestamp: two calls with identical inputs differ
/// at most in sub-second `time` precision.
pub fn build_record(
    fixed: &FixedFields,
    event_name: &str,
    event_data: &Value,
    level: Level,
) -> Map<String, Value> {
    let mut record = Map::new();

    if let Some(extra) = event_data.as_object() {
        for (key, value) in extra {
            record.insert(key.clone(), value.clone());
        }
    }

    let time = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    record.insert("time".to_string(), Value::String(time));
    record.insert("logLevel".to_string(), Value::from(level.as_str()));
    record.insert("eventName".to_string(), Value::from(event_name));
    record.insert("host".to_string(), Value::from(fixed.host.as_str()));
    record.insert("source".to_string(), Value::from(fixed.source.as_str()));
    record.insert("env".to_string(), Value::from(fixed.env.as_str()));
    record.insert("ver".to_string(), Value::from(fixed.ver.as_str()));

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed() -> FixedFields {
        FixedFields {
            host: "box1".to_string(),
            source: "svc".to_string(),
            env: "staging".to_string(),
            ver: "1.2.3".to_string(),
        }
    }

    #[test]
    fn empty_event_data_yields_exactly_the_fixed_shape_keys() {
        let record = build_record(&fixed(), "started", &json!({}), Level::Info);

        let mut keys: Vec<&str> = record.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["env", "eventName", "host", "logLevel", "source", "time", "ver"]
        );
        assert_eq!(record["logLevel"], "info");
        assert_eq!(record["eventName"], "started");
    }

    #[test]
    fn null_event_data_is_treated_as_empty() {
        let record = build_record(&fixed(), "started", &Value::Null, Level::Warn);
        assert_eq!(record.len(), 7);
        assert_eq!(record["logLevel"], "warn");
    }

    #[test]
    fn event_data_fields_are_merged_in() {
        let record = build_record(
            &fixed(),
            "diskFull",
            &json!({"pct": 97, "mount": "/var"}),
            Level::Warn,
        );
        assert_eq!(record["pct"], 97);
        assert_eq!(record["mount"], "/var");
        assert_eq!(record["eventName"], "diskFull");
    }

    #[test]
    fn fixed_metadata_wins_on_key_collision() {
        let record = build_record(
            &fixed(),
            "spoof",
            &json!({
                "host": "evil",
                "source": "evil",
                "env": "evil",
                "ver": "evil",
                "time": "1970-01-01T00:00:00Z",
                "logLevel": "error",
                "eventName": "other",
            }),
            Level::Info,
        );

        assert_eq!(record["host"], "box1");
        assert_eq!(record["source"], "svc");
        assert_eq!(record["env"], "staging");
        assert_eq!(record["ver"], "1.2.3");
        assert_eq!(record["logLevel"], "info");
        assert_eq!(record["eventName"], "spoof");
        assert_ne!(record["time"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn deterministic_apart_from_time() {
        let data = json!({"a": 1});
        let mut first = build_record(&fixed(), "evt", &data, Level::Error);
        let mut second = build_record(&fixed(), "evt", &data, Level::Error);
        first.remove("time");
        second.remove("time");
        assert_eq!(first, second);
    }

    #[test]
    fn level_ordering_and_parsing() {
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warn);
        assert!("verbose".parse::<Level>().is_err());
    }
}
