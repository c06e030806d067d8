//! ISO-8601 local date-time encoding.
//!
//! Values are always written with seconds (`2023-07-28T10:00:00`), but the
//! minute-precision form (`2023-07-28T10:00`) is accepted on input.

use chrono::{NaiveDateTime, Timelike};

const WITH_SECONDS: &str = "%Y-%m-%dT%H:%M:%S%.f";
const WITHOUT_SECONDS: &str = "%Y-%m-%dT%H:%M";
const OUTPUT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) fn parse(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, WITH_SECONDS)
        .or_else(|_| NaiveDateTime::parse_from_str(s, WITHOUT_SECONDS))
}

pub(crate) fn format(dt: &NaiveDateTime) -> String {
    let base = dt.format(OUTPUT).to_string();
    let nanos = dt.nanosecond();
    if nanos == 0 {
        base
    } else {
        let frac = format!("{nanos:09}");
        format!("{base}.{}", frac.trim_end_matches('0'))
    }
}

pub(crate) mod optional {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&super::format(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            super::parse(&s)
                .map_err(|e| serde::de::Error::custom(format!("invalid date-time '{s}': {e}")))
        })
        .transpose()
    }
}
