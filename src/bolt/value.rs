//! Values exchanged with the database.
//!
//! `BoltValue` covers every shape the server can send back. Structures the
//! client does not understand are kept as `Structure` so decoding is total.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// String-keyed map of values.
pub type BoltMap = BTreeMap<String, BoltValue>;

/// Structure tags (PackStream signature bytes).
pub mod tag {
    pub const NODE: u8 = 0x4E;
    pub const RELATIONSHIP: u8 = 0x52;
    pub const UNBOUND_RELATIONSHIP: u8 = 0x72;
    pub const PATH: u8 = 0x50;
    pub const DATE: u8 = 0x44;
    pub const TIME: u8 = 0x54;
    pub const LOCAL_TIME: u8 = 0x74;
    pub const DATE_TIME: u8 = 0x49;
    pub const DATE_TIME_ZONE_ID: u8 = 0x69;
    pub const LEGACY_DATE_TIME: u8 = 0x46;
    pub const LEGACY_DATE_TIME_ZONE_ID: u8 = 0x66;
    pub const LOCAL_DATE_TIME: u8 = 0x64;
    pub const DURATION: u8 = 0x45;
    pub const POINT_2D: u8 = 0x58;
    pub const POINT_3D: u8 = 0x59;
}

/// A value received from or sent to the database.
#[derive(Debug, Clone, PartialEq)]
pub enum BoltValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<BoltValue>),
    Map(BoltMap),
    Node(Node),
    Relationship(Relationship),
    Path(Path),
    Date(NaiveDate),
    Time {
        time: NaiveTime,
        offset_seconds: i32,
    },
    LocalTime(NaiveTime),
    /// Wall-clock time in `offset_seconds` when known, UTC otherwise.
    DateTime {
        datetime: NaiveDateTime,
        offset_seconds: Option<i32>,
        zone_id: Option<String>,
    },
    LocalDateTime(NaiveDateTime),
    Duration {
        months: i64,
        days: i64,
        seconds: i64,
        nanoseconds: i64,
    },
    Point {
        srid: i64,
        x: f64,
        y: f64,
        z: Option<f64>,
    },
    Structure {
        tag: u8,
        fields: Vec<BoltValue>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: BoltMap,
    pub element_id: Option<String>,
}

/// A relationship. Inside a path the endpoints are resolved from the
/// path's node list.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: i64,
    pub start_id: i64,
    pub end_id: i64,
    pub rel_type: String,
    pub properties: BoltMap,
    pub element_id: Option<String>,
}

/// One hop of a path, in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: Node,
    pub relationship: Relationship,
    pub end: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub start: Node,
    pub segments: Vec<Segment>,
}

impl Path {
    pub fn end(&self) -> &Node {
        self.segments.last().map(|s| &s.end).unwrap_or(&self.start)
    }
}

impl BoltValue {
    /// Build a value from a decoded structure.
    ///
    /// Structures whose fields do not have the expected shape are kept
    /// verbatim instead of failing the whole record.
    pub fn from_structure(signature: u8, fields: Vec<BoltValue>) -> BoltValue {
        match decode_structure(signature, &fields) {
            Some(value) => value,
            None => BoltValue::Structure {
                tag: signature,
                fields,
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BoltValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            BoltValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BoltMap> {
        match self {
            BoltValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[BoltValue]> {
        match self {
            BoltValue::List(items) => Some(items),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            BoltValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

fn decode_structure(signature: u8, fields: &[BoltValue]) -> Option<BoltValue> {
    match (signature, fields) {
        (tag::NODE, [..]) => node(fields).map(BoltValue::Node),
        (tag::RELATIONSHIP, [..]) => relationship(fields).map(BoltValue::Relationship),
        (tag::PATH, [nodes, rels, indices]) => path(nodes, rels, indices).map(BoltValue::Path),
        (tag::DATE, [days]) => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
            let date = epoch.checked_add_signed(TimeDelta::try_days(days.as_int()?)?)?;
            Some(BoltValue::Date(date))
        }
        (tag::TIME, [nanos, offset]) => Some(BoltValue::Time {
            time: time_of_day(nanos.as_int()?)?,
            offset_seconds: i32::try_from(offset.as_int()?).ok()?,
        }),
        (tag::LOCAL_TIME, [nanos]) => Some(BoltValue::LocalTime(time_of_day(nanos.as_int()?)?)),
        (tag::LOCAL_DATE_TIME, [secs, nanos]) => Some(BoltValue::LocalDateTime(timestamp(
            secs.as_int()?,
            nanos.as_int()?,
        )?)),
        (tag::DATE_TIME, [secs, nanos, offset]) => {
            let offset = i32::try_from(offset.as_int()?).ok()?;
            let utc = timestamp(secs.as_int()?, nanos.as_int()?)?;
            let local = utc.checked_add_signed(TimeDelta::try_seconds(i64::from(offset))?)?;
            Some(BoltValue::DateTime {
                datetime: local,
                offset_seconds: Some(offset),
                zone_id: None,
            })
        }
        (tag::LEGACY_DATE_TIME, [secs, nanos, offset]) => Some(BoltValue::DateTime {
            datetime: timestamp(secs.as_int()?, nanos.as_int()?)?,
            offset_seconds: Some(i32::try_from(offset.as_int()?).ok()?),
            zone_id: None,
        }),
        (tag::DATE_TIME_ZONE_ID, [secs, nanos, zone])
        | (tag::LEGACY_DATE_TIME_ZONE_ID, [secs, nanos, zone]) => Some(BoltValue::DateTime {
            datetime: timestamp(secs.as_int()?, nanos.as_int()?)?,
            offset_seconds: None,
            zone_id: Some(zone.as_str()?.to_string()),
        }),
        (tag::DURATION, [months, days, secs, nanos]) => Some(BoltValue::Duration {
            months: months.as_int()?,
            days: days.as_int()?,
            seconds: secs.as_int()?,
            nanoseconds: nanos.as_int()?,
        }),
        (tag::POINT_2D, [srid, x, y]) => Some(BoltValue::Point {
            srid: srid.as_int()?,
            x: x.as_float()?,
            y: y.as_float()?,
            z: None,
        }),
        (tag::POINT_3D, [srid, x, y, z]) => Some(BoltValue::Point {
            srid: srid.as_int()?,
            x: x.as_float()?,
            y: y.as_float()?,
            z: Some(z.as_float()?),
        }),
        _ => None,
    }
}

fn time_of_day(nanos: i64) -> Option<NaiveTime> {
    let secs = u32::try_from(nanos.div_euclid(1_000_000_000)).ok()?;
    let frac = u32::try_from(nanos.rem_euclid(1_000_000_000)).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, frac)
}

fn timestamp(secs: i64, nanos: i64) -> Option<NaiveDateTime> {
    let nanos = u32::try_from(nanos).ok()?;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

fn string_list(value: &BoltValue) -> Option<Vec<String>> {
    value
        .as_list()?
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect()
}

fn optional_string(value: Option<&BoltValue>) -> Option<String> {
    value.and_then(BoltValue::as_str).map(String::from)
}

/// Node: id, labels, properties[, element_id]
fn node(fields: &[BoltValue]) -> Option<Node> {
    if !(3..=4).contains(&fields.len()) {
        return None;
    }
    Some(Node {
        id: fields[0].as_int()?,
        labels: string_list(&fields[1])?,
        properties: fields[2].as_map()?.clone(),
        element_id: optional_string(fields.get(3)),
    })
}

/// Relationship: id, start, end, type, properties[, element ids]
fn relationship(fields: &[BoltValue]) -> Option<Relationship> {
    if fields.len() != 5 && fields.len() != 8 {
        return None;
    }
    Some(Relationship {
        id: fields[0].as_int()?,
        start_id: fields[1].as_int()?,
        end_id: fields[2].as_int()?,
        rel_type: fields[3].as_str()?.to_string(),
        properties: fields[4].as_map()?.clone(),
        element_id: optional_string(fields.get(5)),
    })
}

/// Unbound relationship: id, type, properties[, element_id]
fn unbound_relationship(value: &BoltValue) -> Option<Relationship> {
    let fields = match value {
        BoltValue::Structure {
            tag: tag::UNBOUND_RELATIONSHIP,
            fields,
        } => fields,
        _ => return None,
    };
    if !(3..=4).contains(&fields.len()) {
        return None;
    }
    Some(Relationship {
        id: fields[0].as_int()?,
        start_id: -1,
        end_id: -1,
        rel_type: fields[1].as_str()?.to_string(),
        properties: fields[2].as_map()?.clone(),
        element_id: optional_string(fields.get(3)),
    })
}

/// Path: nodes, unbound relationships, alternating (rel, node) indices.
///
/// A positive relationship index means the hop follows the relationship's
/// direction; a negative one means it is traversed backwards.
fn path(nodes: &BoltValue, rels: &BoltValue, indices: &BoltValue) -> Option<Path> {
    let nodes: Vec<Node> = nodes
        .as_list()?
        .iter()
        .map(|n| match n {
            BoltValue::Node(node) => Some(node.clone()),
            _ => None,
        })
        .collect::<Option<_>>()?;
    let rels: Vec<Relationship> = rels
        .as_list()?
        .iter()
        .map(unbound_relationship)
        .collect::<Option<_>>()?;
    let indices: Vec<i64> = indices
        .as_list()?
        .iter()
        .map(BoltValue::as_int)
        .collect::<Option<_>>()?;

    if indices.len() % 2 != 0 {
        return None;
    }

    let start = nodes.first()?.clone();
    let mut prev = start.clone();
    let mut segments = Vec::with_capacity(indices.len() / 2);

    for pair in indices.chunks(2) {
        let rel_index = pair[0];
        let next = nodes.get(usize::try_from(pair[1]).ok()?)?.clone();
        let mut rel = if rel_index > 0 {
            rels.get(usize::try_from(rel_index - 1).ok()?)?.clone()
        } else if rel_index < 0 {
            rels.get(usize::try_from(-rel_index - 1).ok()?)?.clone()
        } else {
            return None;
        };
        if rel_index > 0 {
            rel.start_id = prev.id;
            rel.end_id = next.id;
        } else {
            rel.start_id = next.id;
            rel.end_id = prev.id;
        }
        segments.push(Segment {
            start: prev,
            relationship: rel,
            end: next.clone(),
        });
        prev = next;
    }

    Some(Path { start, segments })
}

impl From<&serde_json::Value> for BoltValue {
    /// Convert a JSON query parameter. Integral numbers that fit in an
    /// `i64` become integers; every other number is sent as a float.
    fn from(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => BoltValue::Null,
            Value::Bool(b) => BoltValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BoltValue::Integer(i),
                None => BoltValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => BoltValue::String(s.clone()),
            Value::Array(items) => BoltValue::List(items.iter().map(BoltValue::from).collect()),
            Value::Object(map) => BoltValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), BoltValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for BoltValue {
    fn from(value: &str) -> Self {
        BoltValue::String(value.to_string())
    }
}

impl From<i64> for BoltValue {
    fn from(value: i64) -> Self {
        BoltValue::Integer(value)
    }
}
