//! Call arguments and their binding to named parameters.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments of a single call, as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallArgs {
    #[serde(default)]
    pub positional: Vec<Value>,
    #[serde(default)]
    pub keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positional values only
    pub fn positional(values: Vec<Value>) -> Self {
        Self {
            positional: values,
            keyword: BTreeMap::new(),
        }
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Insert an implicit leading argument (receiver or class)
    pub fn prepend(mut self, value: Value) -> Self {
        self.positional.insert(0, value);
        self
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Calling convention of a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Plain function, no implicit argument
    Function,
    /// Instance method; the first parameter is the receiver
    Method,
    /// Class method; the first parameter is the class attribute object
    ClassMethod,
    /// Static method, no implicit argument
    Static,
}

impl CallKind {
    /// Whether the first declared parameter is filled implicitly
    pub fn has_implicit_first(&self) -> bool {
        matches!(self, CallKind::Method | CallKind::ClassMethod)
    }
}

/// Declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }
}

/// Name, calling convention and parameter list of a callable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub kind: CallKind,
    pub params: Vec<Param>,
}

impl Signature {
    pub fn new<I, S>(name: impl Into<String>, kind: CallKind, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            params: params.into_iter().map(Param::required).collect(),
        }
    }

    /// Give an existing parameter a default value.
    /// Unknown names are ignored.
    pub fn with_default(mut self, param: &str, value: impl Into<Value>) -> Self {
        if let Some(p) = self.params.iter_mut().find(|p| p.name == param) {
            p.default = Some(value.into());
        }
        self
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Map caller arguments onto declared parameters
    pub fn bind(&self, args: &CallArgs) -> Result<BoundArgs> {
        if args.positional.len() > self.params.len() {
            bail!(
                "{}() takes {} positional arguments but {} were given",
                self.name,
                self.params.len(),
                args.positional.len()
            );
        }

        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];
        for (slot, value) in slots.iter_mut().zip(&args.positional) {
            *slot = Some(value.clone());
        }

        for (key, value) in &args.keyword {
            let Some(idx) = self.params.iter().position(|p| &p.name == key) else {
                bail!(
                    "{}() got an unexpected keyword argument '{}'",
                    self.name,
                    key
                );
            };
            if slots[idx].is_some() {
                bail!("{}() got multiple values for argument '{}'", self.name, key);
            }
            slots[idx] = Some(value.clone());
        }

        let mut values = Vec::with_capacity(self.params.len());
        for (param, slot) in self.params.iter().zip(slots) {
            match slot.or_else(|| param.default.clone()) {
                Some(v) => values.push(v),
                None => bail!(
                    "{}() missing required argument '{}'",
                    self.name,
                    param.name
                ),
            }
        }

        Ok(BoundArgs {
            names: self.params.iter().map(|p| p.name.clone()).collect(),
            values,
            raw: args.clone(),
        })
    }
}

/// Lookup key for a bound argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKey<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for ArgKey<'a> {
    fn from(name: &'a str) -> Self {
        ArgKey::Name(name)
    }
}

impl<'a> From<&'a String> for ArgKey<'a> {
    fn from(name: &'a String) -> Self {
        ArgKey::Name(name.as_str())
    }
}

impl From<usize> for ArgKey<'_> {
    fn from(index: usize) -> Self {
        ArgKey::Index(index)
    }
}

/// Snapshot of one call's arguments, keyed by parameter name and position
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgs {
    names: Vec<String>,
    values: Vec<Value>,
    raw: CallArgs,
}

impl BoundArgs {
    /// Look up an argument by parameter name or parameter position,
    /// however the caller supplied it
    pub fn get<'k>(&self, key: impl Into<ArgKey<'k>>) -> Option<&Value> {
        match key.into() {
            ArgKey::Name(name) => self
                .names
                .iter()
                .position(|n| n == name)
                .map(|i| &self.values[i]),
            ArgKey::Index(i) => self.values.get(i),
        }
    }

    /// String argument, if present and a string
    pub fn str<'k>(&self, key: impl Into<ArgKey<'k>>) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Arguments as the caller passed them
    pub fn raw(&self) -> &CallArgs {
        &self.raw
    }

    /// (name, value) pairs in parameter order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(&self.values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render as a JSON object keyed by parameter name
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn concat_sig() -> Signature {
        Signature::new("concat", CallKind::Function, ["posarg", "kwarg"])
    }

    #[test]
    fn test_bind_mixed_positional_and_keyword() {
        let args = CallArgs::new().arg("foo").kwarg("kwarg", "bar");
        let bound = concat_sig().bind(&args).unwrap();

        assert_eq!(bound.get("posarg"), Some(&json!("foo")));
        assert_eq!(bound.get("kwarg"), Some(&json!("bar")));
        assert_eq!(bound.get(0_usize), Some(&json!("foo")));
        assert_eq!(bound.get(1_usize), Some(&json!("bar")));
    }

    #[test]
    fn test_bind_same_snapshot_for_any_call_style() {
        let sig = concat_sig();
        let positional = sig
            .bind(&CallArgs::positional(vec![json!("a"), json!("b")]))
            .unwrap();
        let keyword = sig
            .bind(&CallArgs::new().kwarg("kwarg", "b").kwarg("posarg", "a"))
            .unwrap();

        assert_eq!(positional.to_json(), keyword.to_json());
        assert_ne!(positional.raw(), keyword.raw());
    }

    #[test]
    fn test_bind_uses_defaults() {
        let sig = Signature::new("repeat", CallKind::Function, ["text", "times"])
            .with_default("times", 2);
        let bound = sig.bind(&CallArgs::new().arg("ab")).unwrap();
        assert_eq!(bound.get("times"), Some(&json!(2)));
    }

    #[test]
    fn test_bind_too_many_positional() {
        let err = concat_sig()
            .bind(&CallArgs::positional(vec![json!(1), json!(2), json!(3)]))
            .unwrap_err();
        assert!(err.to_string().contains("takes 2 positional arguments but 3"));
    }

    #[test]
    fn test_bind_unknown_keyword() {
        let err = concat_sig()
            .bind(&CallArgs::new().arg("a").kwarg("nope", 1))
            .unwrap_err();
        assert!(err.to_string().contains("unexpected keyword argument 'nope'"));
    }

    #[test]
    fn test_bind_duplicate_value() {
        let err = concat_sig()
            .bind(&CallArgs::new().arg("a").arg("b").kwarg("posarg", "c"))
            .unwrap_err();
        assert!(err.to_string().contains("multiple values for argument 'posarg'"));
    }

    #[test]
    fn test_bind_missing_required() {
        let err = concat_sig().bind(&CallArgs::new().arg("a")).unwrap_err();
        assert!(err.to_string().contains("missing required argument 'kwarg'"));
    }

    #[test]
    fn test_missing_lookups_return_none() {
        let bound = concat_sig()
            .bind(&CallArgs::new().arg("a").arg("b"))
            .unwrap();
        assert!(bound.get("other").is_none());
        assert!(bound.get(5_usize).is_none());
        assert_eq!(bound.str("posarg"), Some("a"));
    }
}
