// src/forms.rs
//
// Validação dos formulários de visita. Tudo aqui é síncrono e sem I/O:
// os diretórios (empresas, contatos, produtos) chegam já carregados.

pub mod data;
pub mod errors;
pub mod fields;
pub mod formset;
pub mod location;
pub mod new_visit;
pub mod product;
pub mod rules;
pub mod update_visit;

pub use data::{FieldValue, FormData};
pub use errors::{FormError, FormErrors, FormSetErrors, SubmissionErrors};
pub use fields::{Choice, FieldDescriptor, Widget};
pub use formset::{CleanedFormSet, CleanedRow, FormSet, RowForm};
pub use location::{normalize_coordinate, Coordinate};
pub use new_visit::{selected_company_id, ContactChoices, NewVisitForm, NewVisitInput};
pub use product::{
    NewProductInterest, ProductInterestUpdate, ProductInterestedForm, UpdateProductInterestedForm, PRODUCTS_PREFIX,
};
pub use rules::{field_rules, FieldRule, FieldRules, FormRole};
pub use update_visit::{UpdateVisitForm, VisitUpdateInput};
