//! Raw WHERE fragments with named placeholders
//!
//! `Terms` keeps the `terms` + `params` mini-language: a boolean SQL fragment
//! such as `creci = :c AND id != :id` plus values for each `:name`. The
//! fragment text is trusted input and is inserted verbatim, so it must never
//! be assembled from request data. Values are always bound: every `:name`
//! becomes a positional `$n` parameter.

use crate::errors::ModelError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Terms {
    fragment: String,
    params: Vec<(String, Value)>,
}

impl Terms {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            params: Vec::new(),
        }
    }

    /// Fragment plus a query-string encoded parameter list (`k=v&k2=v2`).
    ///
    /// Decoded values are strings; when a key repeats, the last one wins.
    pub fn with_params(fragment: impl Into<String>, params: &str) -> Result<Self, ModelError> {
        let decoded: Vec<(String, String)> = serde_urlencoded::from_str(params)?;
        let terms = decoded
            .into_iter()
            .fold(Self::new(fragment), |terms, (name, value)| terms.bind(name, value));
        Ok(terms)
    }

    /// Bind a typed value to `:name`, replacing any earlier value
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Rewrite `:name` placeholders to `$n`, appending the bound values.
    ///
    /// Quoted literals and identifiers are copied untouched and `::` casts are
    /// preserved. Numbering continues from `values.len()`.
    pub(crate) fn lower(&self, values: &mut Vec<Value>) -> Result<String, ModelError> {
        let chars: Vec<char> = self.fragment.chars().collect();
        let mut sql = String::with_capacity(self.fragment.len() + 8);
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '\'' | '"' => {
                    let end = chars[i + 1..]
                        .iter()
                        .position(|&next| next == c)
                        .map(|offset| i + 1 + offset)
                        .unwrap_or(chars.len() - 1);
                    sql.extend(&chars[i..=end]);
                    i = end + 1;
                }
                ':' if chars.get(i + 1) == Some(&':') => {
                    sql.push_str("::");
                    i += 2;
                }
                ':' if chars
                    .get(i + 1)
                    .is_some_and(|next| next.is_ascii_alphabetic() || *next == '_') =>
                {
                    let start = i + 1;
                    let end = chars[start..]
                        .iter()
                        .position(|next| !(next.is_ascii_alphanumeric() || *next == '_'))
                        .map(|offset| start + offset)
                        .unwrap_or(chars.len());
                    let name: String = chars[start..end].iter().collect();
                    let value = self
                        .param(&name)
                        .ok_or_else(|| ModelError::MissingParameter(name.clone()))?;
                    values.push(value.clone());
                    sql.push('$');
                    sql.push_str(&values.len().to_string());
                    i = end;
                }
                _ => {
                    sql.push(c);
                    i += 1;
                }
            }
        }

        Ok(sql)
    }
}
