//! Parsing `--op` arguments into registry lookups.
//!
//! Syntax: `name` or `name:key=value,key=value`, e.g. `blur:radius=4`.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use framelab_effects::{ParamValue, ParamValues};

/// One requested operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OpSpec {
    pub name: String,
    pub params: ParamValues,
}

impl OpSpec {
    /// Text recorded in the history log.
    pub fn describe(&self) -> String {
        if self.params.is_empty() {
            return self.name.clone();
        }
        let mut pairs: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| match v {
                ParamValue::Float(f) => format!("{k}={f}"),
                ParamValue::Int(i) => format!("{k}={i}"),
            })
            .collect();
        pairs.sort();
        format!("{} ({})", self.name, pairs.join(", "))
    }
}

impl FromStr for OpSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, rest) = match s.split_once(':') {
            Some((name, rest)) => (name, Some(rest)),
            None => (s, None),
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("operation name is empty in '{s}'");
        }

        let mut params = ParamValues::new();
        for pair in rest.into_iter().flat_map(|r| r.split(',')).filter(|p| !p.trim().is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("expected key=value, got '{pair}'"))?;
            params.insert(key.trim().to_string(), parse_value(value.trim())?);
        }

        Ok(Self {
            name: name.to_string(),
            params,
        })
    }
}

fn parse_value(raw: &str) -> Result<ParamValue> {
    if let Ok(i) = raw.parse::<i32>() {
        return Ok(ParamValue::Int(i));
    }
    raw.parse::<f32>()
        .map(ParamValue::Float)
        .with_context(|| format!("'{raw}' is not a number"))
}
