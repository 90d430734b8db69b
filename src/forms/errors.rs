// src/forms/errors.rs

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

// Tipos de erro de formulário. A mensagem (Display) é o que volta para o usuário.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Location not detected. Allow location access and wait for the map.")]
    MissingLocation,

    #[error("Invalid coordinates received. Please refresh and try again.")]
    InvalidCoordinate,

    #[error("This field is required.")]
    Required,

    #[error("Select a valid choice. That choice is not one of the available choices.")]
    InvalidChoice,

    #[error("Enter a number.")]
    InvalidNumber,

    // Mensagens vindas do `validator` (tamanho de texto etc.)
    #[error("{0}")]
    Invalid(String),

    #[error("ManagementForm data is missing or has been tampered with")]
    ManagementFormMissing,

    #[error("Please submit at most {0} forms.")]
    TooManyForms(usize),
}

/// Erros de um formulário: por campo e gerais (non-field).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<FormError>>,
    non_field: Vec<FormError>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, error: FormError) {
        self.fields.entry(field.to_string()).or_default().push(error);
    }

    pub fn add_non_field(&mut self, error: FormError) {
        self.non_field.push(error);
    }

    /// Guarda o erro (se houver) e devolve o valor limpo.
    pub fn collect<T>(&mut self, field: &str, result: Result<T, FormError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.add(field, error);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn field(&self, name: &str) -> &[FormError] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[FormError] {
        &self.non_field
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn error_count(&self) -> usize {
        self.fields.values().map(Vec::len).sum::<usize>() + self.non_field.len()
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }

    pub fn to_report(&self) -> FormErrorReport {
        FormErrorReport {
            details: self
                .fields
                .iter()
                .map(|(field, errors)| {
                    (field.clone(), errors.iter().map(ToString::to_string).collect())
                })
                .collect(),
            non_field_errors: self.non_field.iter().map(ToString::to_string).collect(),
        }
    }
}

// Converte os erros do `validator` usando a mensagem declarada no atributo.
impl From<validator::ValidationErrors> for FormErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                form_errors.add(&field, FormError::Invalid(message));
            }
        }
        form_errors
    }
}

/// Erros de um form set: gerais e por linha (índice da linha submetida).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSetErrors {
    non_form: Vec<FormError>,
    rows: BTreeMap<usize, FormErrors>,
}

impl FormSetErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_non_form(&mut self, error: FormError) {
        self.non_form.push(error);
    }

    pub fn add_row(&mut self, index: usize, errors: FormErrors) {
        if !errors.is_empty() {
            self.rows.insert(index, errors);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.non_form.is_empty() && self.rows.is_empty()
    }

    pub fn non_form(&self) -> &[FormError] {
        &self.non_form
    }

    pub fn row(&self, index: usize) -> Option<&FormErrors> {
        self.rows.get(&index)
    }

    pub fn rows_with_errors(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.keys().copied()
    }

    pub fn to_report(&self) -> FormSetErrorReport {
        FormSetErrorReport {
            non_form_errors: self.non_form.iter().map(ToString::to_string).collect(),
            rows: self
                .rows
                .iter()
                .map(|(index, errors)| (*index, errors.to_report()))
                .collect(),
        }
    }
}

/// Tudo que deu errado numa submissão (visita + linhas de produto).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionErrors {
    pub form: FormErrors,
    pub products: FormSetErrors,
}

impl SubmissionErrors {
    /// Junta o resultado da visita com o das linhas: ou os dois valores, ou todos os erros.
    pub fn combine<A, B>(
        form: Result<A, FormErrors>,
        products: Result<B, FormSetErrors>,
    ) -> Result<(A, B), SubmissionErrors> {
        match (form, products) {
            (Ok(form), Ok(products)) => Ok((form, products)),
            (form, products) => Err(SubmissionErrors {
                form: form.err().unwrap_or_default(),
                products: products.err().unwrap_or_default(),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.form.is_empty() && self.products.is_empty()
    }

    /// Nomes dos campos com erro, para log (linhas aparecem como "products-<i>").
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.form.field_names().map(str::to_string).collect();
        if !self.form.non_field().is_empty() {
            names.push("__all__".to_string());
        }
        if !self.products.non_form().is_empty() {
            names.push("products".to_string());
        }
        names.extend(self.products.rows_with_errors().map(|i| format!("products-{i}")));
        names
    }

    pub fn to_report(&self) -> SubmissionErrorReport {
        let form = self.form.to_report();
        SubmissionErrorReport {
            details: form.details,
            non_field_errors: form.non_field_errors,
            products: self.products.to_report(),
        }
    }
}

// --- Formato JSON devolvido ao cliente ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormErrorReport {
    pub details: BTreeMap<String, Vec<String>>,
    pub non_field_errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSetErrorReport {
    pub non_form_errors: Vec<String>,
    pub rows: BTreeMap<usize, FormErrorReport>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionErrorReport {
    pub details: BTreeMap<String, Vec<String>>,
    pub non_field_errors: Vec<String>,
    pub products: FormSetErrorReport,
}
