//! Serde helpers for integers that older documents wrote as floats or
//! strings (`"z_index": 3.0`, `"x": "12"`). Values are rounded to the
//! nearest pixel.

use serde::de::{self, Deserializer, Visitor};
use serde::Serializer;
use std::fmt;

struct IntVisitor;

impl Visitor<'_> for IntVisitor {
    type Value = i32;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer, a float or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i32, E> {
        Ok(v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i32, E> {
        Ok(v.min(i32::MAX as u64) as i32)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i32, E> {
        if v.is_finite() {
            Ok(v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
        } else {
            Err(E::custom("non-finite number"))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i32, E> {
        let v = v.trim();
        if let Ok(n) = v.parse::<i64>() {
            return self.visit_i64(n);
        }
        match v.parse::<f64>() {
            Ok(n) => self.visit_f64(n),
            Err(_) => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }
}

/// `i32` accepting any JSON number.
pub mod int {
    use super::*;

    pub fn serialize<S: Serializer>(v: &i32, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i32(*v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
        d.deserialize_any(IntVisitor)
    }
}

/// `Option<i32>` accepting any JSON number or null.
pub mod opt_int {
    use super::*;

    struct OptVisitor;

    impl<'de> Visitor<'de> for OptVisitor {
        type Value = Option<i32>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an optional number")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(IntVisitor).map(Some)
        }
    }

    pub fn serialize<S: Serializer>(v: &Option<i32>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(v) => s.serialize_some(v),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        d.deserialize_option(OptVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(with = "super::int")]
        z: i32,
        #[serde(default, with = "super::opt_int")]
        w: Option<i32>,
    }

    #[test]
    fn accepts_floats_and_ints() {
        let p: Sample = serde_json::from_str(r#"{"z": 3.0, "w": 12.6}"#).unwrap();
        assert_eq!(p.z, 3);
        assert_eq!(p.w, Some(13));

        let p: Sample = serde_json::from_str(r#"{"z": -4}"#).unwrap();
        assert_eq!(p.z, -4);
        assert_eq!(p.w, None);
    }

    #[test]
    fn accepts_numeric_strings() {
        let p: Sample = serde_json::from_str(r#"{"z": "10", "w": " 10.4 "}"#).unwrap();
        assert_eq!(p.z, 10);
        assert_eq!(p.w, Some(10));
    }

    #[test]
    fn rejects_other_strings() {
        assert!(serde_json::from_str::<Sample>(r#"{"z": "high"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"z": "NaN"}"#).is_err());
    }
}
