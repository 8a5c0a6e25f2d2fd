use std::collections::BTreeMap;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{PointCloudError, Result};

/// A parameter value tagged with its stored type.
///
/// Serialized externally tagged, e.g. `{"usize": 4}` or `{"f64": 1e-9}`,
/// so a value read back from configuration keeps the exact type it was written with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    Usize(usize),
    F32(f32),
    F64(f64),
    String(String),
}

impl ParamValue {
    /// Name of the stored type
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => bool::KIND,
            ParamValue::I32(_) => i32::KIND,
            ParamValue::I64(_) => i64::KIND,
            ParamValue::U32(_) => u32::KIND,
            ParamValue::Usize(_) => usize::KIND,
            ParamValue::F32(_) => f32::KIND,
            ParamValue::F64(_) => f64::KIND,
            ParamValue::String(_) => String::KIND,
        }
    }
}

/// Types that can be stored in and read back from [`Params`].
pub trait Param: Sized {
    const KIND: &'static str;

    fn into_value(self) -> ParamValue;

    /// `None` when `value` holds another type. No numeric conversion is attempted.
    fn from_value(value: &ParamValue) -> Option<Self>;
}

macro_rules! impl_param {
    ($t:ty, $variant:ident, $kind:literal) => {
        impl Param for $t {
            const KIND: &'static str = $kind;

            fn into_value(self) -> ParamValue {
                ParamValue::$variant(self)
            }

            fn from_value(value: &ParamValue) -> Option<Self> {
                match value {
                    ParamValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$t> for ParamValue {
            fn from(v: $t) -> Self {
                v.into_value()
            }
        }
    };
}

impl_param!(bool, Bool, "bool");
impl_param!(i32, I32, "i32");
impl_param!(i64, I64, "i64");
impl_param!(u32, U32, "u32");
impl_param!(usize, Usize, "usize");
impl_param!(f32, F32, "f32");
impl_param!(f64, F64, "f64");
impl_param!(String, String, "string");

/// Name-ordered dictionary of algorithm parameters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Stores `value` under `name`, returning the value it replaced.
    pub fn set<T: Param>(&mut self, name: impl Into<String>, value: T) -> Option<ParamValue> {
        self.values.insert(name.into(), value.into_value())
    }

    pub fn with<T: Param>(mut self, name: impl Into<String>, value: T) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.values.remove(name)
    }

    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn get<T: Param>(&self, name: &str) -> Result<T> {
        match self.values.get(name) {
            Some(value) => cast(name, value),
            None => Err(PointCloudError::MissingParameter(name.to_string())),
        }
    }

    pub fn get_or<T: Param>(&self, name: &str, default: T) -> Result<T> {
        match self.values.get(name) {
            Some(value) => cast(name, value),
            None => {
                trace!("parameter `{}` not set, using default", name);
                Ok(default)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn cast<T: Param>(name: &str, value: &ParamValue) -> Result<T> {
    T::from_value(value).ok_or_else(|| PointCloudError::TypeMismatch {
        name: name.to_string(),
        stored: value.kind(),
        requested: T::KIND,
    })
}
