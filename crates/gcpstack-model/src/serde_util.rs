//! Serde helpers for the wire conventions shared by both API families.

/// Integers encoded as JSON strings (`"generation": "1700000000000000000"`).
///
/// Deserialization accepts either a string or a bare JSON number, since
/// client libraries are inconsistent about which they send.
pub mod string_number {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        Str(String),
        Num(T),
    }

    /// Serialize a number as a string.
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    /// Deserialize a number from a string or a JSON number.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr + Deserialize<'de>,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        match Repr::<T>::deserialize(deserializer)? {
            Repr::Str(s) => s.trim().parse().map_err(de::Error::custom),
            Repr::Num(n) => Ok(n),
        }
    }
}

/// Optional integers encoded as JSON strings. Pair with
/// `skip_serializing_if = "Option::is_none"` and `default`.
pub mod option_string_number {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer, de};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr<T> {
        Str(String),
        Num(T),
    }

    /// Serialize an optional number as a string or `null`.
    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional number from a string, a JSON number or `null`.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: FromStr + Deserialize<'de>,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        match Option::<Repr<T>>::deserialize(deserializer)? {
            Some(Repr::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
            Some(Repr::Num(n)) => Ok(Some(n)),
            None => Ok(None),
        }
    }
}

/// RFC 3339 timestamps in UTC with millisecond precision and a `Z` suffix.
pub mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Format a timestamp the way the wire expects.
    #[must_use]
    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Serialize a timestamp.
    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    /// Deserialize a timestamp with any RFC 3339 offset, normalized to UTC.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
