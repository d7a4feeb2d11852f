//! Component maps for temporal and spatial values.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde_json::{Map, Value};

use crate::bolt::BoltValue;
use crate::serializer::{float, integer};

pub(super) fn components(value: &BoltValue) -> Value {
    let mut out = Map::new();
    match value {
        BoltValue::Date(date) => put_date(&mut out, date),
        BoltValue::LocalTime(time) => put_time(&mut out, time),
        BoltValue::Time {
            time,
            offset_seconds,
        } => {
            put_time(&mut out, time);
            out.insert("timeZoneOffsetSeconds".into(), Value::from(*offset_seconds));
        }
        BoltValue::LocalDateTime(datetime) => {
            put_date(&mut out, &datetime.date());
            put_time(&mut out, &datetime.time());
        }
        BoltValue::DateTime {
            datetime,
            offset_seconds,
            zone_id,
        } => {
            put_date(&mut out, &datetime.date());
            put_time(&mut out, &datetime.time());
            out.insert(
                "timeZoneOffsetSeconds".into(),
                offset_seconds.map(Value::from).unwrap_or(Value::Null),
            );
            out.insert(
                "timeZoneId".into(),
                zone_id.clone().map(Value::String).unwrap_or(Value::Null),
            );
        }
        BoltValue::Duration {
            months,
            days,
            seconds,
            nanoseconds,
        } => {
            out.insert("months".into(), integer(*months));
            out.insert("days".into(), integer(*days));
            out.insert("seconds".into(), integer(*seconds));
            out.insert("nanoseconds".into(), integer(*nanoseconds));
        }
        BoltValue::Point { srid, x, y, z } => {
            out.insert("srid".into(), integer(*srid));
            out.insert("x".into(), float(*x));
            out.insert("y".into(), float(*y));
            if let Some(z) = z {
                out.insert("z".into(), float(*z));
            }
        }
        _ => return Value::Null,
    }
    Value::Object(out)
}

fn put_date(out: &mut Map<String, Value>, date: &NaiveDate) {
    out.insert("year".into(), Value::from(date.year()));
    out.insert("month".into(), Value::from(date.month()));
    out.insert("day".into(), Value::from(date.day()));
}

fn put_time(out: &mut Map<String, Value>, time: &NaiveTime) {
    out.insert("hour".into(), Value::from(time.hour()));
    out.insert("minute".into(), Value::from(time.minute()));
    out.insert("second".into(), Value::from(time.second()));
    out.insert("nanosecond".into(), Value::from(time.nanosecond()));
}
