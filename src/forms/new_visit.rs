// src/forms/new_visit.rs
//
// Etapa 1: nova visita (cliente + contato + local + assunto).

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::data::FormData;
use super::errors::FormErrors;
use super::fields::{parse_reference, parse_text, Choice, FieldDescriptor, Widget};
use super::location::{clean_location, Coordinate};
use crate::models::visit::{Customer, CustomerContact, Visit};

pub const SELECT_COMPANY_FIRST: &str = "Select company first";
pub const SELECT_CONTACT: &str = "Select contact";

/// Empresa cujo contatos devem ser oferecidos.
/// A submissão manda; sem ela, vale a empresa do registro já existente.
/// Um id inválido na submissão é ignorado (não cai para o registro).
pub fn selected_company_id(data: &FormData, instance: Option<&Visit>) -> Option<Uuid> {
    match data.text("company_name") {
        Some(raw) => Uuid::parse_str(&raw).ok(),
        None => instance.map(|visit| visit.company_id),
    }
}

/// Opções do select de contato, já filtradas pela empresa.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactChoices {
    pub company_id: Option<Uuid>,
    pub placeholder: String,
    pub contacts: Vec<CustomerContact>,
}

impl ContactChoices {
    /// `directory` pode vir com contatos de outras empresas; filtramos aqui.
    pub fn for_company(company_id: Option<Uuid>, directory: &[CustomerContact]) -> Self {
        let Some(company_id) = company_id else {
            return Self {
                company_id: None,
                placeholder: SELECT_COMPANY_FIRST.to_string(),
                contacts: Vec::new(),
            };
        };

        let mut contacts: Vec<CustomerContact> = directory
            .iter()
            .filter(|c| c.customer_id == company_id)
            .cloned()
            .collect();
        contacts.sort_by(|a, b| a.contact_name.cmp(&b.contact_name));

        Self {
            company_id: Some(company_id),
            placeholder: SELECT_CONTACT.to_string(),
            contacts,
        }
    }

    pub fn find(&self, id: Uuid) -> Option<&CustomerContact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn to_choices(&self) -> Vec<Choice> {
        self.contacts
            .iter()
            .map(|c| Choice::new(c.id, c.contact_name.clone()))
            .collect()
    }
}

pub fn company_choices(companies: &[Customer]) -> Vec<Choice> {
    let mut sorted: Vec<&Customer> = companies.iter().collect();
    sorted.sort_by(|a, b| a.company_name.cmp(&b.company_name));
    sorted
        .into_iter()
        .map(|c| Choice::new(c.id, c.company_name.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVisitInput {
    pub company_id: Uuid,
    pub contact_id: Uuid,
    // Derivados do contato escolhido; o que o cliente mandou é ignorado
    pub contact_number: Option<String>,
    pub designation: Option<String>,
    pub latitude: Coordinate,
    pub longitude: Coordinate,
    pub item_discussed: Option<String>,
}

pub struct NewVisitForm<'a> {
    companies: &'a [Customer],
    contacts: ContactChoices,
}

impl<'a> NewVisitForm<'a> {
    pub fn new(companies: &'a [Customer], contacts: ContactChoices) -> Self {
        Self { companies, contacts }
    }

    pub fn contacts(&self) -> &ContactChoices {
        &self.contacts
    }

    pub fn describe(&self) -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("company_name", Widget::Select)
                .required(true)
                .choices(company_choices(self.companies))
                .placeholder("---------"),
            FieldDescriptor::new("contact_person", Widget::Select)
                .required(true)
                .choices(self.contacts.to_choices())
                .placeholder(self.contacts.placeholder.clone()),
            FieldDescriptor::new("contact_number", Widget::TextInput).read_only(),
            FieldDescriptor::new("designation", Widget::TextInput).read_only(),
            FieldDescriptor::new("latitude", Widget::Hidden).required(true).visible(false),
            FieldDescriptor::new("longitude", Widget::Hidden).required(true).visible(false),
            FieldDescriptor::new("item_discussed", Widget::Textarea),
        ]
    }

    pub fn clean(&self, data: &FormData) -> Result<NewVisitInput, FormErrors> {
        let mut errors = FormErrors::new();

        let company_id = errors
            .collect(
                "company_name",
                parse_reference(data, "company_name", true, |id| {
                    self.companies.iter().any(|c| c.id == id)
                }),
            )
            .flatten();

        // As opções de contato já vêm filtradas pela empresa submetida
        let contact = errors
            .collect(
                "contact_person",
                parse_reference(data, "contact_person", true, |id| self.contacts.find(id).is_some()),
            )
            .flatten()
            .and_then(|id| self.contacts.find(id));

        let item_discussed = errors.collect("item_discussed", parse_text(data, "item_discussed", false)).flatten();

        let location = match clean_location(
            data.text("latitude").as_deref(),
            data.text("longitude").as_deref(),
        ) {
            Ok(location) => Some(location),
            Err(error) => {
                errors.add_non_field(error);
                None
            }
        };

        match (company_id, contact, location) {
            (Some(company_id), Some(contact), Some((latitude, longitude))) if errors.is_empty() => {
                Ok(NewVisitInput {
                    company_id,
                    contact_id: contact.id,
                    contact_number: contact.contact_number.clone(),
                    designation: contact.designation.clone(),
                    latitude,
                    longitude,
                    item_discussed,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::errors::FormError;
    use assert_matches::assert_matches;

    struct Directory {
        companies: Vec<Customer>,
        contacts: Vec<CustomerContact>,
    }

    fn contact(customer_id: Uuid, name: &str) -> CustomerContact {
        CustomerContact {
            id: Uuid::new_v4(),
            customer_id,
            contact_name: name.to_string(),
            contact_number: Some(format!("+91 {name}")),
            designation: Some("Buyer".to_string()),
        }
    }

    fn directory() -> Directory {
        let acme = Customer { id: Uuid::new_v4(), company_name: "Acme".into() };
        let globex = Customer { id: Uuid::new_v4(), company_name: "Globex".into() };
        let contacts = vec![
            contact(acme.id, "Zoe"),
            contact(globex.id, "Hank"),
            contact(acme.id, "Amit"),
        ];
        Directory { companies: vec![globex, acme], contacts }
    }

    fn submission(contact: &CustomerContact) -> FormData {
        let mut data = FormData::new();
        data.insert("company_name", contact.customer_id.to_string());
        data.insert("contact_person", contact.id.to_string());
        data.insert("latitude", "12.1234565");
        data.insert("longitude", "77.1234564");
        data.insert("item_discussed", "Annual maintenance contract");
        data
    }

    fn stored_visit(contact: &CustomerContact) -> Visit {
        Visit {
            id: Uuid::new_v4(),
            company_id: contact.customer_id,
            contact_id: contact.id,
            contact_number: contact.contact_number.clone(),
            designation: contact.designation.clone(),
            latitude: rust_decimal::Decimal::new(19_076_090, 6),
            longitude: rust_decimal::Decimal::new(72_877_426, 6),
            item_discussed: None,
            meeting_stage: crate::models::visit::MeetingStage::New,
            status: None,
            tag: None,
            client_budget: None,
            is_order_final: false,
            contract_outcome: None,
            contract_amount: None,
            reason_lost: None,
            is_payment_collected: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn form_for<'a>(dir: &'a Directory, data: &FormData) -> NewVisitForm<'a> {
        let contacts = ContactChoices::for_company(selected_company_id(data, None), &dir.contacts);
        NewVisitForm::new(&dir.companies, contacts)
    }

    #[test]
    fn contacts_are_filtered_by_company_and_sorted() {
        let dir = directory();
        let acme = dir.companies.iter().find(|c| c.company_name == "Acme").unwrap();

        let choices = ContactChoices::for_company(Some(acme.id), &dir.contacts);
        let names: Vec<_> = choices.contacts.iter().map(|c| c.contact_name.as_str()).collect();
        assert_eq!(names, vec!["Amit", "Zoe"]);
        assert_eq!(choices.placeholder, SELECT_CONTACT);
    }

    #[test]
    fn no_company_means_no_contacts() {
        let dir = directory();
        let choices = ContactChoices::for_company(None, &dir.contacts);
        assert!(choices.contacts.is_empty());
        assert_eq!(choices.placeholder, SELECT_COMPANY_FIRST);
    }

    #[test]
    fn selected_company_prefers_submission_over_instance() {
        let submitted = Uuid::new_v4();
        let mut data = FormData::new();
        assert_eq!(selected_company_id(&data, None), None);

        data.insert("company_name", submitted.to_string());
        assert_eq!(selected_company_id(&data, None), Some(submitted));

        data.insert("company_name", "not-a-uuid");
        assert_eq!(selected_company_id(&data, None), None);
    }

    #[test]
    fn existing_visit_preselects_its_company() {
        let dir = directory();
        let visit = stored_visit(&dir.contacts[0]);

        let company = selected_company_id(&FormData::new(), Some(&visit));
        assert_eq!(company, Some(visit.company_id));

        let choices = ContactChoices::for_company(company, &dir.contacts);
        let names: Vec<_> = choices.contacts.iter().map(|c| c.contact_name.as_str()).collect();
        assert_eq!(names, vec!["Amit", "Zoe"]);
        assert_eq!(choices.placeholder, SELECT_CONTACT);
    }

    #[test]
    fn submitted_company_overrides_the_existing_visit() {
        let dir = directory();
        let visit = stored_visit(&dir.contacts[0]);
        let globex = dir.contacts[1].customer_id;

        let mut data = FormData::new();
        data.insert("company_name", globex.to_string());
        assert_eq!(selected_company_id(&data, Some(&visit)), Some(globex));

        // espaços em branco contam como ausente: volta para o registro
        data.insert("company_name", "   ");
        assert_eq!(selected_company_id(&data, Some(&visit)), Some(visit.company_id));
    }

    #[test]
    fn invalid_submitted_company_does_not_fall_back_to_the_visit() {
        let dir = directory();
        let visit = stored_visit(&dir.contacts[0]);

        let mut data = FormData::new();
        data.insert("company_name", "not-a-uuid");
        let company = selected_company_id(&data, Some(&visit));
        assert_eq!(company, None);

        let choices = ContactChoices::for_company(company, &dir.contacts);
        assert!(choices.contacts.is_empty());
        assert_eq!(choices.placeholder, SELECT_COMPANY_FIRST);
    }

    #[test]
    fn valid_submission_is_normalized() {
        let dir = directory();
        let chosen = &dir.contacts[0];
        let data = submission(chosen);

        let input = form_for(&dir, &data).clean(&data).unwrap();
        assert_eq!(input.company_id, chosen.customer_id);
        assert_eq!(input.contact_id, chosen.id);
        assert_eq!(input.latitude.to_string(), "12.123457");
        assert_eq!(input.longitude.to_string(), "77.123456");
        assert_eq!(input.item_discussed.as_deref(), Some("Annual maintenance contract"));
    }

    #[test]
    fn derived_fields_come_from_the_contact_not_the_client() {
        let dir = directory();
        let chosen = &dir.contacts[0];
        let mut data = submission(chosen);
        data.insert("contact_number", "000-forged");
        data.insert("designation", "CEO");

        let input = form_for(&dir, &data).clean(&data).unwrap();
        assert_eq!(input.contact_number, chosen.contact_number);
        assert_eq!(input.designation, chosen.designation);
    }

    #[test]
    fn missing_coordinate_is_a_form_level_error() {
        let dir = directory();
        let mut data = submission(&dir.contacts[0]);
        data.insert("longitude", "");

        let errors = form_for(&dir, &data).clean(&data).unwrap_err();
        assert_eq!(errors.non_field(), &[FormError::MissingLocation]);
        assert_eq!(errors.error_count(), 1);
    }

    #[test]
    fn unparseable_coordinate_is_distinct_from_missing() {
        let dir = directory();
        let mut data = submission(&dir.contacts[0]);
        data.insert("latitude", "twelve");

        let errors = form_for(&dir, &data).clean(&data).unwrap_err();
        assert_eq!(errors.non_field(), &[FormError::InvalidCoordinate]);
    }

    #[test]
    fn contact_from_another_company_is_invalid() {
        let dir = directory();
        let acme_contact = &dir.contacts[0];
        let globex_contact = &dir.contacts[1];
        let mut data = submission(acme_contact);
        data.insert("contact_person", globex_contact.id.to_string());

        let errors = form_for(&dir, &data).clean(&data).unwrap_err();
        assert_eq!(errors.field("contact_person"), &[FormError::InvalidChoice]);
    }

    #[test]
    fn empty_submission_reports_every_problem() {
        let dir = directory();
        let data = FormData::new();

        let errors = form_for(&dir, &data).clean(&data).unwrap_err();
        assert_eq!(errors.field("company_name"), &[FormError::Required]);
        assert_eq!(errors.field("contact_person"), &[FormError::Required]);
        assert_matches!(errors.non_field(), [FormError::MissingLocation]);
    }

    #[test]
    fn describe_marks_derived_fields_read_only() {
        let dir = directory();
        let form = form_for(&dir, &FormData::new());
        let fields = form.describe();

        let read_only: Vec<_> = fields.iter().filter(|f| f.read_only).map(|f| f.name.as_str()).collect();
        assert_eq!(read_only, vec!["contact_number", "designation"]);

        let contact = fields.iter().find(|f| f.name == "contact_person").unwrap();
        assert!(contact.choices.is_empty());
        assert_eq!(contact.placeholder.as_deref(), Some(SELECT_COMPANY_FIRST));

        let companies = fields.iter().find(|f| f.name == "company_name").unwrap();
        let labels: Vec<_> = companies.choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Acme", "Globex"]);
    }
}
