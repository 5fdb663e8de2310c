//! Wire codecs.
//!
//! The API has its own conventions for enums, booleans and timestamps:
//!
//! - State enums travel as lowercase words separated by spaces (`no threats`).
//! - File sort enums travel as fixed tokens (`filename`, `file_state`).
//! - Any other enum travels as snake_case.
//! - Booleans are sent as `1`/`0` and come back as booleans, integers,
//!   floats or numeric strings.
//! - Timestamps are whole seconds since the unix epoch.
//!
//! Everything here is a pure function or an immutable value, so it can be
//! shared freely between concurrent requests.

use crate::config::PREVIEW_MAX_LENGTH;
use crate::error::CodecError;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Naming rule shared by a group of enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFamily {
    /// Lowercase words separated by single spaces.
    State,
    /// Explicit token table.
    FileSort,
    /// `ASC` / `DESC`.
    Direction,
    /// snake_case.
    Snake,
}

impl EnumFamily {
    /// Human readable family name, used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            EnumFamily::State => "state",
            EnumFamily::FileSort => "file sort",
            EnumFamily::Direction => "direction",
            EnumFamily::Snake => "enum",
        }
    }

    /// Convert a member name into the wire token for this family.
    pub fn encode(&self, name: &str) -> Result<String, CodecError> {
        match self {
            EnumFamily::State => Ok(state_to_api(name)),
            EnumFamily::FileSort => file_sort_to_api(name),
            EnumFamily::Direction => direction_to_api(name),
            EnumFamily::Snake => Ok(to_snake_case(name)),
        }
    }
}

/// `NoThreats` -> `no threats`.
pub fn state_to_api(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);

    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push(' ');
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// `FileName` -> `filename`, `FileState` -> `file_state`.
pub fn file_sort_to_api(name: &str) -> Result<String, CodecError> {
    match name {
        "FileName" => Ok("filename".into()),
        "FileState" => Ok("file_state".into()),
        _ => Err(CodecError::UnmappedEnum {
            family: EnumFamily::FileSort.label(),
            name: name.into(),
        }),
    }
}

/// `Ascending` -> `ASC`, `Descending` -> `DESC`.
pub fn direction_to_api(name: &str) -> Result<String, CodecError> {
    match name {
        "Ascending" => Ok("ASC".into()),
        "Descending" => Ok("DESC".into()),
        _ => Err(CodecError::UnmappedEnum {
            family: EnumFamily::Direction.label(),
            name: name.into(),
        }),
    }
}

/// `HasScreenshot` -> `has_screenshot`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);

    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push('_');
        }
        out.push(c);
    }

    out.to_lowercase()
}

/// An enum with a compile-time table of its members.
///
/// Implemented through `wire_enum!`, which also routes `Serialize` and
/// `Deserialize` through [`WireEnum::to_api`] and [`WireEnum::from_api`].
pub trait WireEnum: Sized + Copy + 'static {
    /// Naming rule for this enum.
    const FAMILY: EnumFamily;

    /// Every member together with its source name.
    const VARIANTS: &'static [(Self, &'static str)];

    /// Source name of this member, e.g. `NoThreats`.
    fn name(&self) -> &'static str;

    /// Wire token of this member.
    fn to_api(&self) -> Result<String, CodecError> {
        Self::FAMILY.encode(self.name())
    }

    /// Find the member whose wire token matches `token`, ignoring case.
    fn from_api(token: &str) -> Result<Self, CodecError> {
        for (variant, name) in Self::VARIANTS {
            if let Ok(candidate) = Self::FAMILY.encode(name) {
                if candidate.eq_ignore_ascii_case(token) {
                    return Ok(*variant);
                }
            }
        }

        Err(CodecError::UnknownToken {
            family: Self::FAMILY.label(),
            token: token.into(),
        })
    }
}

/// Serialize a [`WireEnum`] member as its wire token.
///
/// Usable as `#[serde(serialize_with = "netcraft::codec::serialize_wire")]`.
pub fn serialize_wire<E, S>(value: &E, serializer: S) -> Result<S::Ok, S::Error>
where
    E: WireEnum,
    S: Serializer,
{
    let token = value.to_api().map_err(ser::Error::custom)?;
    serializer.serialize_str(&token)
}

/// Deserialize a [`WireEnum`] member from its wire token.
pub fn deserialize_wire<'de, E, D>(deserializer: D) -> Result<E, D::Error>
where
    E: WireEnum,
    D: Deserializer<'de>,
{
    let token = String::deserialize(deserializer)?;
    E::from_api(&token).map_err(de::Error::custom)
}

/// Declare an enum whose serde representation is its wire token.
///
/// ```
/// netcraft::wire_enum! {
///     pub enum Verdict: Snake { LooksFine, NeedsReview }
/// }
///
/// use netcraft::WireEnum;
/// assert_eq!(Verdict::NeedsReview.to_api().unwrap(), "needs_review");
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $family:ident {
            $( $(#[$vmeta:meta])* $variant:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::codec::WireEnum for $name {
            const FAMILY: $crate::codec::EnumFamily = $crate::codec::EnumFamily::$family;

            const VARIANTS: &'static [(Self, &'static str)] =
                &[ $( ($name::$variant, stringify!($variant)) ),+ ];

            fn name(&self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant) ),+
                }
            }
        }

        impl $crate::__serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__serde::Serializer,
            {
                $crate::codec::serialize_wire(self, serializer)
            }
        }

        impl<'de> $crate::__serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: $crate::__serde::Deserializer<'de>,
            {
                $crate::codec::deserialize_wire(deserializer)
            }
        }
    };
}

/// Wire form of a boolean.
pub fn encode_bool(value: bool) -> u8 {
    u8::from(value)
}

/// Read a boolean from any of the shapes the API sends.
///
/// Numbers and numeric strings are true when non-zero.
pub fn decode_bool(token: &Value) -> Result<bool, CodecError> {
    match token {
        Value::Bool(value) => Ok(*value),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(|n| n != 0)
            .map_err(|_| CodecError::InvalidBool(format!("{text:?}"))),
        Value::Number(number) => {
            if let Some(n) = number.as_i64() {
                Ok(n != 0)
            } else if let Some(n) = number.as_u64() {
                Ok(n != 0)
            } else if let Some(n) = number.as_f64() {
                Ok(n != 0.0)
            } else {
                Err(CodecError::InvalidBool(number.to_string()))
            }
        }
        other => Err(CodecError::InvalidBool(other.to_string())),
    }
}

/// Wire form of a timestamp. Sub-second precision is dropped.
pub fn encode_unix_seconds(value: &DateTime<Utc>) -> i64 {
    value.timestamp()
}

/// Read a timestamp sent as whole seconds since the epoch.
pub fn decode_unix_seconds(token: &Value) -> Result<DateTime<Utc>, CodecError> {
    let seconds = match token {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| CodecError::InvalidTimestamp(number.to_string()))?,
        other => return Err(CodecError::InvalidTimestamp(other.to_string())),
    };

    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| CodecError::InvalidTimestamp(format!("{seconds} is out of range")))
}

/// `#[serde(with = "int_bool")]` for `bool` fields.
pub mod int_bool {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(super::encode_bool(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let token = Value::deserialize(deserializer)?;
        super::decode_bool(&token).map_err(de::Error::custom)
    }
}

/// `#[serde(with = "option_int_bool")]` for `Option<bool>` fields.
pub mod option_int_bool {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&super::encode_bool(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            Some(token) => super::decode_bool(&token).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// `#[serde(with = "unix_seconds")]` for `DateTime<Utc>` fields.
pub mod unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(super::encode_unix_seconds(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let token = Value::deserialize(deserializer)?;
        super::decode_unix_seconds(&token).map_err(de::Error::custom)
    }
}

/// `#[serde(with = "option_unix_seconds")]` for `Option<DateTime<Utc>>` fields.
pub mod option_unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_some(&super::encode_unix_seconds(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            Some(token) => super::decode_unix_seconds(&token)
                .map(Some)
                .map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

/// JSON body codec, handed to the transport when the client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec {
    omit_nulls: bool,
    preview_limit: usize,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self {
            omit_nulls: true,
            preview_limit: PREVIEW_MAX_LENGTH,
        }
    }
}

impl JsonCodec {
    /// Codec with the API's defaults: nulls omitted, 500 character previews.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of characters kept in body previews.
    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    /// Keep `null` object fields when encoding.
    pub fn keep_nulls(mut self) -> Self {
        self.omit_nulls = false;
        self
    }

    pub fn preview_limit(&self) -> usize {
        self.preview_limit
    }

    /// Serialize a request body.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, serde_json::Error> {
        let mut tree = serde_json::to_value(value)?;
        if self.omit_nulls {
            strip_nulls(&mut tree);
        }
        serde_json::to_vec(&tree)
    }

    /// Deserialize a response body.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// The first `preview_limit` characters of `text`.
    pub fn preview<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.preview_limit) {
            Some((end, _)) => &text[..end],
            None => text,
        }
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
