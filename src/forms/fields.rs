// src/forms/fields.rs

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::data::FormData;
use super::errors::FormError;

// =========================================================================
//  PARSERS (texto submetido -> valor tipado)
// =========================================================================

/// Campo obrigatório ausente vira `Required`; opcional ausente vira `None`.
pub fn require<T>(value: Option<T>, required: bool) -> Result<Option<T>, FormError> {
    match value {
        None if required => Err(FormError::Required),
        other => Ok(other),
    }
}

pub fn parse_text(data: &FormData, name: &str, required: bool) -> Result<Option<String>, FormError> {
    require(data.text(name), required)
}

pub fn parse_decimal(data: &FormData, name: &str, required: bool) -> Result<Option<Decimal>, FormError> {
    let value = match data.text(name) {
        Some(raw) => Some(
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .map_err(|_| FormError::InvalidNumber)?,
        ),
        None => None,
    };
    require(value, required)
}

// Checkbox: ausente ou "falso" = false. Nunca falha.
pub fn parse_bool(data: &FormData, name: &str) -> bool {
    match data.text(name) {
        None => false,
        Some(raw) => !matches!(raw.to_ascii_lowercase().as_str(), "false" | "0" | "off"),
    }
}

/// Valor de um enum com representação textual fixa (ex.: "Won").
pub fn parse_choice<T: FromStr>(data: &FormData, name: &str, required: bool) -> Result<Option<T>, FormError> {
    let value = match data.text(name) {
        Some(raw) => Some(raw.parse::<T>().map_err(|_| FormError::InvalidChoice)?),
        None => None,
    };
    require(value, required)
}

/// Referência (FK) que precisa estar entre as opções carregadas.
pub fn parse_reference(
    data: &FormData,
    name: &str,
    required: bool,
    is_allowed: impl Fn(Uuid) -> bool,
) -> Result<Option<Uuid>, FormError> {
    let value = match data.text(name) {
        Some(raw) => {
            let id = Uuid::parse_str(&raw).map_err(|_| FormError::InvalidChoice)?;
            if !is_allowed(id) {
                return Err(FormError::InvalidChoice);
            }
            Some(id)
        }
        None => None,
    };
    require(value, required)
}

// =========================================================================
//  DESCRITORES (o que o frontend precisa para desenhar o formulário)
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Widget {
    Select,
    TextInput,
    Textarea,
    NumberInput,
    Checkbox,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl ToString, label: impl Into<String>) -> Self {
        Self { value: value.to_string(), label: label.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub widget: Widget,
    pub required: bool,
    pub visible: bool,
    pub emphasized: bool,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: &str, widget: Widget) -> Self {
        Self {
            name: name.to_string(),
            label: pretty_name(name),
            widget,
            required: false,
            visible: true,
            emphasized: false,
            read_only: false,
            choices: Vec::new(),
            placeholder: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn emphasized(mut self, emphasized: bool) -> Self {
        self.emphasized = emphasized;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

// "contract_outcome" -> "Contract outcome"
pub fn pretty_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
