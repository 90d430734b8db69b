// src/forms/update_visit.rs
//
// Atualização da visita conforme o estágio.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use super::data::FormData;
use super::errors::FormErrors;
use super::fields::{
    parse_bool, parse_choice, parse_decimal, parse_reference, parse_text, Choice, FieldDescriptor, Widget,
};
use super::location::{normalize_coordinate, Coordinate};
use super::new_visit::{company_choices, ContactChoices};
use super::rules::{field_rules, FieldRules, FormRole};
use crate::models::visit::{ContractOutcome, Customer, MeetingStage, Visit};

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct VisitUpdateInput {
    pub company_id: Uuid,
    pub contact_id: Uuid,
    pub contact_number: Option<String>,
    pub designation: Option<String>,
    // `None` = mantém o que está gravado
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
    pub item_discussed: Option<String>,
    pub meeting_stage: MeetingStage,
    #[validate(length(max = 50, message = "Ensure this value has at most 50 characters."))]
    pub status: Option<String>,
    #[validate(length(max = 50, message = "Ensure this value has at most 50 characters."))]
    pub tag: Option<String>,
    pub client_budget: Option<Decimal>,
    pub is_order_final: bool,
    pub contract_outcome: Option<ContractOutcome>,
    pub contract_amount: Option<Decimal>,
    #[validate(length(max = 1000, message = "Ensure this value has at most 1000 characters."))]
    pub reason_lost: Option<String>,
    pub is_payment_collected: bool,
}

pub struct UpdateVisitForm<'a> {
    instance: &'a Visit,
    companies: &'a [Customer],
    contacts: ContactChoices,
    rules: FieldRules,
}

impl<'a> UpdateVisitForm<'a> {
    /// As regras olham o resultado GRAVADO em `instance`, não o submetido.
    pub fn new(
        instance: &'a Visit,
        stage: Option<MeetingStage>,
        companies: &'a [Customer],
        contacts: ContactChoices,
    ) -> Self {
        Self {
            instance,
            companies,
            contacts,
            rules: field_rules(stage, instance.contract_outcome, FormRole::VisitUpdate),
        }
    }

    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    pub fn describe(&self) -> Vec<FieldDescriptor> {
        let stage_choices: Vec<Choice> = MeetingStage::ALL
            .iter()
            .map(|s| Choice::new(s, s.as_str()))
            .collect();
        let outcome_choices: Vec<Choice> = ContractOutcome::ALL
            .iter()
            .map(|o| Choice::new(o, o.as_str()))
            .collect();

        let ruled = |name: &str, widget: Widget| {
            let rule = self.rules.get(name);
            FieldDescriptor::new(name, widget)
                .required(rule.required)
                .visible(rule.visible)
                .emphasized(rule.emphasized)
        };

        let mut outcome = ruled("contract_outcome", Widget::Select).choices(outcome_choices);
        if !outcome.required {
            outcome = outcome.placeholder("---------");
        }

        vec![
            FieldDescriptor::new("company_name", Widget::Select)
                .required(true)
                .choices(company_choices(self.companies)),
            FieldDescriptor::new("contact_person", Widget::Select)
                .required(true)
                .choices(self.contacts.to_choices())
                .placeholder(self.contacts.placeholder.clone()),
            FieldDescriptor::new("contact_number", Widget::TextInput).read_only(),
            FieldDescriptor::new("designation", Widget::TextInput).read_only(),
            FieldDescriptor::new("latitude", Widget::Hidden).visible(false),
            FieldDescriptor::new("longitude", Widget::Hidden).visible(false),
            FieldDescriptor::new("meeting_stage", Widget::Select)
                .required(true)
                .choices(stage_choices),
            FieldDescriptor::new("status", Widget::TextInput),
            FieldDescriptor::new("tag", Widget::TextInput),
            FieldDescriptor::new("item_discussed", Widget::Textarea),
            FieldDescriptor::new("client_budget", Widget::NumberInput),
            ruled("is_order_final", Widget::Checkbox),
            outcome,
            ruled("contract_amount", Widget::NumberInput),
            ruled("reason_lost", Widget::Textarea),
            ruled("is_payment_collected", Widget::Checkbox),
        ]
    }

    fn coordinate(&self, data: &FormData, name: &str, errors: &mut FormErrors) -> Option<Coordinate> {
        let raw = data.text(name)?;
        errors.collect(name, normalize_coordinate(&raw))
    }

    pub fn clean(&self, data: &FormData) -> Result<VisitUpdateInput, FormErrors> {
        let mut errors = FormErrors::new();

        let company_id = errors
            .collect(
                "company_name",
                parse_reference(data, "company_name", true, |id| {
                    self.companies.iter().any(|c| c.id == id)
                }),
            )
            .flatten();
        let contact = errors
            .collect(
                "contact_person",
                parse_reference(data, "contact_person", true, |id| self.contacts.find(id).is_some()),
            )
            .flatten()
            .and_then(|id| self.contacts.find(id));

        let latitude = self.coordinate(data, "latitude", &mut errors);
        let longitude = self.coordinate(data, "longitude", &mut errors);

        let meeting_stage = errors
            .collect("meeting_stage", parse_choice::<MeetingStage>(data, "meeting_stage", true))
            .flatten();
        let status = errors.collect("status", parse_text(data, "status", false)).flatten();
        let tag = errors.collect("tag", parse_text(data, "tag", false)).flatten();
        let item_discussed = errors.collect("item_discussed", parse_text(data, "item_discussed", false)).flatten();
        let client_budget = errors.collect("client_budget", parse_decimal(data, "client_budget", false)).flatten();

        let is_order_final = parse_bool(data, "is_order_final");
        let contract_outcome = errors
            .collect(
                "contract_outcome",
                parse_choice::<ContractOutcome>(data, "contract_outcome", self.rules.is_required("contract_outcome")),
            )
            .flatten();
        let contract_amount = errors
            .collect(
                "contract_amount",
                parse_decimal(data, "contract_amount", self.rules.is_required("contract_amount")),
            )
            .flatten();
        let reason_lost = errors
            .collect("reason_lost", parse_text(data, "reason_lost", self.rules.is_required("reason_lost")))
            .flatten();
        let is_payment_collected = parse_bool(data, "is_payment_collected");

        let (Some(company_id), Some(contact), Some(meeting_stage)) = (company_id, contact, meeting_stage) else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        let input = VisitUpdateInput {
            company_id,
            contact_id: contact.id,
            contact_number: contact.contact_number.clone(),
            designation: contact.designation.clone(),
            latitude,
            longitude,
            item_discussed,
            meeting_stage,
            status,
            tag,
            client_budget,
            is_order_final,
            contract_outcome,
            contract_amount,
            reason_lost,
            is_payment_collected,
        };

        input.validate().map_err(FormErrors::from)?;
        Ok(input)
    }

    /// Resultado a ser usado pelas linhas de produto nesta requisição:
    /// o que foi submetido (se válido), senão o gravado.
    pub fn effective_outcome(&self, data: &FormData) -> Option<ContractOutcome> {
        parse_choice::<ContractOutcome>(data, "contract_outcome", false)
            .ok()
            .flatten()
            .or(self.instance.contract_outcome)
    }
}
