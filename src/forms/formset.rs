// src/forms/formset.rs
//
// Grupo repetível de sub-formulários (linhas) com adicionar/remover.
// Formato plano da submissão:
//   <prefix>-TOTAL_FORMS, <prefix>-INITIAL_FORMS
//   <prefix>-<i>-<campo>, <prefix>-<i>-id (linhas existentes), <prefix>-<i>-DELETE

use uuid::Uuid;

use super::data::FormData;
use super::errors::{FormError, FormErrors, FormSetErrors};
use super::fields::parse_bool;

pub const MAX_FORMS: usize = 1000;

/// Um formulário de linha. Cada linha é validada de forma independente.
pub trait RowForm {
    type Output;

    /// Campos que a linha aceita (usado para detectar linhas extras vazias).
    fn fields(&self) -> &'static [&'static str];

    fn clean_row(&self, row: &FormData) -> Result<Self::Output, FormErrors>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRow<T> {
    pub index: usize,
    /// `Some` para linhas que já existem no banco
    pub id: Option<Uuid>,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedFormSet<T> {
    pub rows: Vec<CleanedRow<T>>,
    /// Linhas existentes marcadas para exclusão
    pub deleted: Vec<Uuid>,
}

impl<T> CleanedFormSet<T> {
    pub fn new_rows(&self) -> impl Iterator<Item = &CleanedRow<T>> {
        self.rows.iter().filter(|row| row.id.is_none())
    }

    pub fn existing_rows(&self) -> impl Iterator<Item = &CleanedRow<T>> {
        self.rows.iter().filter(|row| row.id.is_some())
    }
}

pub struct FormSet<'a, F: RowForm> {
    prefix: &'a str,
    form: F,
    // ids das linhas que realmente pertencem ao registro pai
    existing: &'a [Uuid],
}

impl<'a, F: RowForm> FormSet<'a, F> {
    pub fn new(prefix: &'a str, form: F, existing: &'a [Uuid]) -> Self {
        Self { prefix, form, existing }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    fn management_count(&self, data: &FormData, name: &str) -> Option<usize> {
        data.text(&format!("{}-{}", self.prefix, name))
            .and_then(|raw| raw.parse::<usize>().ok())
    }

    pub fn clean(&self, data: &FormData) -> Result<CleanedFormSet<F::Output>, FormSetErrors> {
        let mut errors = FormSetErrors::new();

        let (Some(total), Some(initial)) = (
            self.management_count(data, "TOTAL_FORMS"),
            self.management_count(data, "INITIAL_FORMS"),
        ) else {
            errors.add_non_form(FormError::ManagementFormMissing);
            return Err(errors);
        };

        if total > MAX_FORMS {
            errors.add_non_form(FormError::TooManyForms(MAX_FORMS));
            return Err(errors);
        }
        let initial = initial.min(total);

        let mut cleaned = CleanedFormSet { rows: Vec::new(), deleted: Vec::new() };

        for index in 0..total {
            let row = data.row(self.prefix, index);
            let is_initial = index < initial;
            let marked_for_delete = parse_bool(&row, "DELETE");

            // Linha extra sem nada preenchido: o usuário só não usou
            if !is_initial && !self.form.fields().iter().any(|f| row.contains(f)) {
                continue;
            }

            let mut row_errors = FormErrors::new();
            let id = if is_initial {
                row_errors.collect("id", self.existing_id(&row))
            } else {
                None
            };

            if marked_for_delete {
                // Linha nova removida no cliente simplesmente some
                if let Some(id) = id {
                    cleaned.deleted.push(id);
                }
                errors.add_row(index, row_errors);
                continue;
            }

            match self.form.clean_row(&row) {
                Ok(value) if row_errors.is_empty() => cleaned.rows.push(CleanedRow { index, id, value }),
                Ok(_) => {}
                Err(form_errors) => merge(&mut row_errors, form_errors),
            }
            errors.add_row(index, row_errors);
        }

        if errors.is_empty() { Ok(cleaned) } else { Err(errors) }
    }

    fn existing_id(&self, row: &FormData) -> Result<Uuid, FormError> {
        row.text("id")
            .and_then(|raw| Uuid::parse_str(&raw).ok())
            .filter(|id| self.existing.contains(id))
            .ok_or(FormError::InvalidChoice)
    }
}

fn merge(into: &mut FormErrors, other: FormErrors) {
    for field in other.field_names() {
        for error in other.field(field) {
            into.add(field, error.clone());
        }
    }
    for error in other.non_field() {
        into.add_non_field(error.clone());
    }
}
