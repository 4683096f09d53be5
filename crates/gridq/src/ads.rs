// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ads: the ordered attribute records exchanged with collectors and
//! schedds.
//!
//! An [`Ad`] is an insertion-ordered mapping from attribute name to
//! typed value. The client never builds ad contents field by field;
//! it copies, filters, and projects ads received from a query. Every
//! ad handed back to a caller is an independent copy with no aliasing
//! of server-side or connection state.

use serde::de::{MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AdValue {
    /// The attribute is present but has no defined value.
    Undefined,
    /// Boolean constant.
    Bool(bool),
    /// Integer constant.
    Integer(i64),
    /// Floating-point constant.
    Real(f64),
    /// String constant.
    String(String),
    /// An unevaluated expression, kept as text.
    Expr(String),
}

impl AdValue {
    /// The string payload, if this value is a string constant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AdValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for AdValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AdValue::Undefined => serializer.serialize_unit(),
            AdValue::Bool(b) => serializer.serialize_bool(*b),
            AdValue::Integer(n) => serializer.serialize_i64(*n),
            AdValue::Real(x) => serializer.serialize_f64(*x),
            AdValue::String(s) => serializer.serialize_str(s),
            AdValue::Expr(e) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("expr", e)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for AdValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = AdValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an ad attribute value")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<AdValue, E> {
                Ok(AdValue::Undefined)
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<AdValue, E> {
                Ok(AdValue::Undefined)
            }

            fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<AdValue, E> {
                Ok(AdValue::Bool(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<AdValue, E> {
                Ok(AdValue::Integer(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<AdValue, E> {
                i64::try_from(v)
                    .map(AdValue::Integer)
                    .map_err(|_| E::custom("integer attribute out of range"))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<AdValue, E> {
                Ok(AdValue::Real(v))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<AdValue, E> {
                Ok(AdValue::String(v.to_string()))
            }

            fn visit_string<E: serde::de::Error>(self, v: String) -> Result<AdValue, E> {
                Ok(AdValue::String(v))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<AdValue, A::Error> {
                let mut expr: Option<String> = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "expr" {
                        expr = Some(map.next_value()?);
                    } else {
                        let _: serde::de::IgnoredAny = map.next_value()?;
                    }
                }
                expr.map(AdValue::Expr)
                    .ok_or_else(|| serde::de::Error::custom("expected an \"expr\" entry"))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

/// An insertion-ordered attribute record.
///
/// Attribute order is part of the contract: query results preserve the
/// server stream order of both ads and attributes, and serialization
/// keeps it across the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ad {
    attrs: Vec<(String, AdValue)>,
}

impl Ad {
    /// Create an empty ad.
    pub fn new() -> Self {
        Ad { attrs: Vec::new() }
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// True if the ad has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Look up an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&AdValue> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value)
    }

    /// Look up an attribute and return its string payload.
    ///
    /// `None` if the attribute is absent or not a string constant.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AdValue::as_str)
    }

    /// Insert or replace an attribute.
    ///
    /// Replacing keeps the attribute's original position; a new
    /// attribute is appended.
    pub fn insert(&mut self, name: impl Into<String>, value: AdValue) {
        let name = name.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(attr, _)| *attr == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    /// Iterate attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AdValue)> {
        self.attrs.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Copy of this ad reduced to the projected attributes.
    ///
    /// An empty projection returns the full ad. Projected names absent
    /// from the ad are skipped; attribute order follows the ad, not
    /// the projection.
    pub fn project(&self, projection: &Projection) -> Ad {
        if projection.is_empty() {
            return self.clone();
        }
        Ad {
            attrs: self
                .attrs
                .iter()
                .filter(|(name, _)| projection.contains(name))
                .cloned()
                .collect(),
        }
    }
}

impl Serialize for Ad {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attrs.len()))?;
        for (name, value) in &self.attrs {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Ad {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AdVisitor;

        impl<'de> Visitor<'de> for AdVisitor {
            type Value = Ad;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an attribute map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Ad, A::Error> {
                let mut ad = Ad::new();
                while let Some((name, value)) = map.next_entry::<String, AdValue>()? {
                    // Duplicate names keep the last value, first slot.
                    ad.insert(name, value);
                }
                Ok(ad)
            }
        }

        deserializer.deserialize_map(AdVisitor)
    }
}

/// An ordered set of attribute names to project a query onto.
///
/// Empty means no projection: the server returns its default attribute
/// set. Unknown names are ignored by the server, never an error, and
/// this client mandates no server-side minimal defaults beyond the
/// projected set itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    names: Vec<String>,
}

impl Projection {
    /// The empty projection (return everything).
    pub fn all() -> Self {
        Projection::default()
    }

    /// Projection onto the given attribute names, order preserved.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// True if no projection was requested.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The projected names in request order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True if `name` is part of the projected set.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}
