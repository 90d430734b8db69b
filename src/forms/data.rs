// src/forms/data.rs

use std::collections::HashMap;

use serde::Deserialize;
use utoipa::ToSchema;

// Um valor submetido. O frontend normalmente manda strings, mas aceitamos
// números e booleanos do JSON e os tratamos como texto.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    List(Vec<FieldValue>),
    Null,
}

impl FieldValue {
    // Campo repetido: vale o último valor submetido
    fn last(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Flag(b) => Some(b.to_string()),
            FieldValue::List(values) => values.last().and_then(FieldValue::last),
            FieldValue::Null => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Dados crus de uma submissão: nome do campo -> valor(es).
///
/// Os form sets usam nomes com prefixo (`products-0-order_estimate`),
/// ver [`FormData::row`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[schema(value_type = Object)]
pub struct FormData(HashMap<String, FieldValue>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Valor sem espaços nas pontas. Vazio conta como ausente.
    pub fn text(&self, name: &str) -> Option<String> {
        self.0
            .get(name)
            .and_then(FieldValue::last)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.text(name).is_some()
    }

    /// Extrai a linha `i` de um form set: `prefix-i-campo` vira `campo`.
    pub fn row(&self, prefix: &str, index: usize) -> FormData {
        let row_prefix = format!("{prefix}-{index}-");
        let fields = self
            .0
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&row_prefix)
                    .map(|field| (field.to_string(), value.clone()))
            })
            .collect();
        FormData(fields)
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FormData(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
