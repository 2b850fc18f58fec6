//! Inbound wire messages.
//!
//! The collector pushes JSON envelopes of the form
//! `{"event": "status_update", "data": {...}}`. Payload keys keep the
//! collector's spelling (`CPU_Util`, `Disk_IO`, ...) through serde renames;
//! the Rust side uses snake_case fields.
//!
//! Every status-update field is optional. A missing field means "skip that
//! family this tick", not an error. A field that is present but does not
//! decode is treated the same way, so one bad reading never costs the other
//! families their tick.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Errors raised while decoding or reading wire messages.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown event `{0}`")]
    UnknownEvent(String),
    #[error("event `{0}` is missing its payload")]
    MissingPayload(&'static str),
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Payload pieces
// ---------------------------------------------------------------------------

/// Bytes of RAM and swap in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryReading {
    #[serde(rename = "RAM", alias = "ram")]
    pub ram: Option<f64>,
    #[serde(rename = "Swap", alias = "swap")]
    pub swap: Option<f64>,
}

/// Bytes sent and received, either per tick or cumulative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkReading {
    pub tx: Option<f64>,
    pub rx: Option<f64>,
}

/// Bytes read and written by one disk during the last tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskReading {
    pub read: Option<f64>,
    pub write: Option<f64>,
}

/// Capacity figures for one mount point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskUsage {
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCount {
    pub count: u64,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// First message of a session; sizes every window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInit {
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "Up_Time")]
    pub up_time_secs: f64,
    #[serde(rename = "CPU_Util")]
    pub cpu_util: Vec<Option<f64>>,
    #[serde(rename = "CPU_Temp")]
    pub cpu_temp: BTreeMap<String, Vec<Option<f64>>>,
    #[serde(rename = "Memory")]
    pub memory: Option<MemoryReading>,
    #[serde(rename = "Network_IO")]
    pub network_io: Option<NetworkReading>,
    #[serde(rename = "Total_Network_IO")]
    pub network_totals: Option<NetworkReading>,
    #[serde(rename = "Disk_IO")]
    pub disk_io: BTreeMap<String, DiskReading>,
    /// Keyed by mount point.
    #[serde(rename = "Disk_Usage")]
    pub disk_usage: BTreeMap<String, DiskUsage>,
    /// Mount point to device path, e.g. `/boot` -> `/dev/sda1`.
    #[serde(rename = "Mount_Points")]
    pub mount_points: BTreeMap<String, String>,
    #[serde(rename = "Meross_Power", alias = "Aux_Power")]
    pub aux_power: BTreeMap<String, Option<f64>>,
    #[serde(rename = "Refresh_Period")]
    pub sample_period_secs: Option<f64>,
}

/// One tick of telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusUpdate {
    #[serde(rename = "CPU_Util", skip_serializing_if = "Option::is_none")]
    pub cpu_util: Option<Vec<Option<f64>>>,
    #[serde(rename = "CPU_Temp", skip_serializing_if = "Option::is_none")]
    pub cpu_temp: Option<BTreeMap<String, Vec<Option<f64>>>>,
    #[serde(rename = "Memory", skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryReading>,
    #[serde(rename = "Network_IO", skip_serializing_if = "Option::is_none")]
    pub network_io: Option<NetworkReading>,
    #[serde(rename = "Disk_IO", skip_serializing_if = "Option::is_none")]
    pub disk_io: Option<BTreeMap<String, DiskReading>>,
    #[serde(
        rename = "Meross_Power",
        alias = "Aux_Power",
        skip_serializing_if = "Option::is_none"
    )]
    pub aux_power: Option<BTreeMap<String, Option<f64>>>,
    #[serde(rename = "Refresh_Period", skip_serializing_if = "Option::is_none")]
    pub sample_period_secs: Option<f64>,
}

impl StatusUpdate {
    /// Decode a payload field by field. Fields that fail to decode are
    /// dropped with a warning; only a non-object payload is an error.
    pub fn from_value(data: serde_json::Value) -> Result<Self, WireError> {
        let serde_json::Value::Object(mut map) = data else {
            return Ok(serde_json::from_value(data)?);
        };
        Ok(Self {
            cpu_util: take_field(&mut map, &["CPU_Util"]),
            cpu_temp: take_field(&mut map, &["CPU_Temp"]),
            memory: take_field(&mut map, &["Memory"]),
            network_io: take_field(&mut map, &["Network_IO"]),
            disk_io: take_field(&mut map, &["Disk_IO"]),
            aux_power: take_field(&mut map, &["Meross_Power", "Aux_Power"]),
            sample_period_secs: take_field(&mut map, &["Refresh_Period"]),
        })
    }
}

/// First of `keys` present and non-null in `map`, decoded as `T`.
fn take_field<T: DeserializeOwned>(
    map: &mut serde_json::Map<String, serde_json::Value>,
    keys: &[&str],
) -> Option<T> {
    let (key, value) = keys
        .iter()
        .find_map(|k| map.remove(*k).map(|v| (*k, v)))?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("status_update field {key} skipped: {e}");
            None
        }
    }
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Connect,
    SessionInit(Box<SessionInit>),
    StatusUpdate(Box<StatusUpdate>),
    ClientCount(ClientCount),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    data: serde_json::Value,
}

impl Message {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::SessionInit(_) => "status_init",
            Self::StatusUpdate(_) => "status_update",
            Self::ClientCount(_) => "client_count",
        }
    }

    /// Decode one envelope.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        let env: Envelope = serde_json::from_str(text)?;
        let data = env.data;
        match env.event.as_str() {
            "connect" => Ok(Self::Connect),
            "status_init" => {
                require(&data, "status_init")?;
                Ok(Self::SessionInit(Box::new(serde_json::from_value(data)?)))
            }
            "status_update" => {
                require(&data, "status_update")?;
                Ok(Self::StatusUpdate(Box::new(StatusUpdate::from_value(data)?)))
            }
            "client_count" => {
                require(&data, "client_count")?;
                Ok(Self::ClientCount(serde_json::from_value(data)?))
            }
            other => Err(WireError::UnknownEvent(other.to_string())),
        }
    }

    /// Encode as a single-line envelope.
    pub fn to_json(&self) -> Result<String, WireError> {
        let data = match self {
            Self::Connect => serde_json::Value::Null,
            Self::SessionInit(init) => serde_json::to_value(init)?,
            Self::StatusUpdate(update) => serde_json::to_value(update)?,
            Self::ClientCount(count) => serde_json::to_value(count)?,
        };
        let env = Envelope {
            event: self.event_name().to_string(),
            data,
        };
        Ok(serde_json::to_string(&env)?)
    }
}

fn require(data: &serde_json::Value, event: &'static str) -> Result<(), WireError> {
    if data.is_null() {
        Err(WireError::MissingPayload(event))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_status_init() {
        let text = r#"{"event":"status_init","data":{
            "Hostname":"box","Up_Time":3600,"CPU_Util":[1.0,2.5],
            "CPU_Temp":{"coretemp":[40,41,42]},
            "Disk_IO":{"sdb":{"read":0,"write":0},"sda":{"read":1,"write":2}},
            "Disk_Usage":{"/":{"total":100,"used":40,"free":60,"percent":40.0}},
            "Mount_Points":{"/":"/dev/sda1"},
            "Total_Network_IO":{"tx":10,"rx":20},
            "Refresh_Period":1}}"#;
        let Message::SessionInit(init) = Message::from_json(text).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(init.hostname, "box");
        assert_eq!(init.up_time_secs, 3600.0);
        assert_eq!(init.cpu_util, vec![Some(1.0), Some(2.5)]);
        assert_eq!(init.cpu_temp["coretemp"].len(), 3);
        assert_eq!(
            init.disk_io.keys().collect::<Vec<_>>(),
            vec!["sda", "sdb"],
            "disk map iterates sorted"
        );
        assert_eq!(init.disk_usage["/"].percent, 40.0);
        assert_eq!(init.mount_points["/"], "/dev/sda1");
        assert_eq!(init.network_totals.and_then(|n| n.rx), Some(20.0));
        assert_eq!(init.sample_period_secs, Some(1.0));
        assert!(init.aux_power.is_empty());
    }

    #[test]
    fn decode_partial_status_update() {
        let text = r#"{"event":"status_update","data":{"CPU_Util":[50,null]}}"#;
        let Message::StatusUpdate(u) = Message::from_json(text).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(u.cpu_util, Some(vec![Some(50.0), None]));
        assert!(u.disk_io.is_none());
        assert!(u.memory.is_none());
    }

    #[test]
    fn decode_memory_and_power() {
        let text = r#"{"event":"status_update","data":{
            "Memory":{"RAM":1024,"Swap":0},
            "Meross_Power":{"desk":12.5,"lamp":null}}}"#;
        let Message::StatusUpdate(u) = Message::from_json(text).unwrap() else {
            panic!("wrong variant");
        };
        let mem = u.memory.unwrap();
        assert_eq!(mem.ram, Some(1024.0));
        assert_eq!(mem.swap, Some(0.0));
        let power = u.aux_power.unwrap();
        assert_eq!(power["desk"], Some(12.5));
        assert_eq!(power["lamp"], None);
    }

    #[test]
    fn bad_field_skips_only_that_field() {
        let text = r#"{"event":"status_update","data":{
            "CPU_Util":[50,50],
            "Meross_Power":{"desk":"timeout"},
            "Memory":"n/a",
            "Refresh_Period":1}}"#;
        let Message::StatusUpdate(u) = Message::from_json(text).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(u.cpu_util, Some(vec![Some(50.0), Some(50.0)]));
        assert!(u.aux_power.is_none(), "undecodable power reading is dropped");
        assert!(u.memory.is_none());
        assert_eq!(u.sample_period_secs, Some(1.0));
    }

    #[test]
    fn aux_power_alias_and_null_fields() {
        let text = r#"{"event":"status_update","data":{"Aux_Power":{"desk":3},"Disk_IO":null}}"#;
        let Message::StatusUpdate(u) = Message::from_json(text).unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(u.aux_power.unwrap()["desk"], Some(3.0));
        assert!(u.disk_io.is_none());
    }

    #[test]
    fn non_object_update_is_an_error() {
        let err = Message::from_json(r#"{"event":"status_update","data":[1,2]}"#).unwrap_err();
        assert!(matches!(err, WireError::Json(_)));
    }

    #[test]
    fn decode_connect_and_client_count() {
        assert_eq!(
            Message::from_json(r#"{"event":"connect"}"#).unwrap(),
            Message::Connect
        );
        assert_eq!(
            Message::from_json(r#"{"event":"client_count","data":{"count":3}}"#).unwrap(),
            Message::ClientCount(ClientCount { count: 3 })
        );
    }

    #[test]
    fn unknown_event_is_reported() {
        let err = Message::from_json(r#"{"event":"reboot","data":{}}"#).unwrap_err();
        assert!(matches!(err, WireError::UnknownEvent(ref e) if e == "reboot"));
    }

    #[test]
    fn missing_payload_is_reported() {
        let err = Message::from_json(r#"{"event":"status_update"}"#).unwrap_err();
        assert!(matches!(err, WireError::MissingPayload("status_update")));
    }

    #[test]
    fn garbage_is_json_error() {
        let err = Message::from_json("not json").unwrap_err();
        assert!(matches!(err, WireError::Json(_)));
        assert!(err.to_string().starts_with("malformed message"));
    }

    #[test]
    fn encoded_update_uses_collector_keys() {
        let msg = Message::StatusUpdate(Box::new(StatusUpdate {
            cpu_util: Some(vec![Some(10.0)]),
            ..Default::default()
        }));
        let text = msg.to_json().unwrap();
        assert!(text.contains(r#""event":"status_update""#));
        assert!(text.contains(r#""CPU_Util":[10.0]"#));
        assert!(!text.contains("Disk_IO"));
        assert_eq!(Message::from_json(&text).unwrap(), msg);
    }
}
