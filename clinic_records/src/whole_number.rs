//! Lenient decoding of integer fields
//!
//! The mongo shell writes every number as a BSON double, so
//! documents loaded by a shell script hold `1.0` where the records
//! store writes `1`. `WholeNumber` decodes Int32, Int64 and doubles
//! with no fractional part into the integer field, and still writes
//! plain integers.
//!

use std::fmt;

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};

pub struct WholeNumber;

struct WholeNumberVisitor;

impl<'de> Visitor<'de> for WholeNumberVisitor {
    type Value = i64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a whole number")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        i64::try_from(value).map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
        // 2^63 is exactly representable; anything at or above it overflows
        let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
        if value.fract() == 0.0 && in_range {
            Ok(value as i64)
        } else {
            Err(E::invalid_value(Unexpected::Float(value), &self))
        }
    }
}

impl SerializeAs<i64> for WholeNumber {
    fn serialize_as<S>(source: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(*source)
    }
}

impl SerializeAs<i32> for WholeNumber {
    fn serialize_as<S>(source: &i32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i32(*source)
    }
}

impl<'de> DeserializeAs<'de, i64> for WholeNumber {
    fn deserialize_as<D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(WholeNumberVisitor)
    }
}

impl<'de> DeserializeAs<'de, i32> for WholeNumber {
    fn deserialize_as<D>(deserializer: D) -> Result<i32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = deserializer.deserialize_any(WholeNumberVisitor)?;
        i32::try_from(value).map_err(|_| {
            de::Error::invalid_value(Unexpected::Signed(value), &"a 32-bit whole number")
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use bson::{doc, Bson};
    use serde::{Deserialize, Serialize};

    #[serde_with::serde_as]
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Reading {
        #[serde_as(as = "WholeNumber")]
        id: i64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        #[serde_as(as = "Option<WholeNumber>")]
        rate: Option<i32>,
    }

    #[test]
    fn doubles_with_no_fraction_are_accepted() {
        let reading: Reading = bson::from_document(doc! { "id": 1.0, "rate": 78.0 }).unwrap();
        assert_eq!(reading, Reading { id: 1, rate: Some(78) });
    }

    #[test]
    fn integers_of_either_width_are_accepted() {
        let reading: Reading =
            bson::from_document(doc! { "id": 5_i32, "rate": 60_i64 }).unwrap();
        assert_eq!(reading, Reading { id: 5, rate: Some(60) });
    }

    #[test]
    fn fractional_values_are_rejected() {
        assert!(bson::from_document::<Reading>(doc! { "id": 1.5 }).is_err());
        assert!(bson::from_document::<Reading>(doc! { "id": 1, "rate": 72.4 }).is_err());
    }

    #[test]
    fn values_too_wide_for_the_field_are_rejected() {
        assert!(bson::from_document::<Reading>(doc! { "id": 1, "rate": 5_000_000_000_i64 }).is_err());
    }

    #[test]
    fn missing_optional_field_decodes_to_none() {
        let reading: Reading = bson::from_document(doc! { "id": 3 }).unwrap();
        assert_eq!(reading.rate, None);
    }

    #[test]
    fn integers_are_written_back_as_integers() {
        let document = bson::to_document(&Reading { id: 2, rate: Some(70) }).unwrap();
        assert_eq!(document.get("id"), Some(&Bson::Int64(2)));
        assert_eq!(document.get("rate"), Some(&Bson::Int32(70)));
    }
}
