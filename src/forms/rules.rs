// src/forms/rules.rs
//
// Obrigatoriedade e visibilidade dos campos que dependem do estágio da visita.
// Função pura: (estágio, resultado, papel) -> regras. Avaliada uma vez por validação.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::visit::{ContractOutcome, MeetingStage};

// Campos da visita controlados pelo estágio
pub const VISIT_STAGE_FIELDS: [&str; 5] = [
    "is_order_final",
    "contract_outcome",
    "contract_amount",
    "reason_lost",
    "is_payment_collected",
];

// Campos numéricos de cada linha de produto
pub const PRODUCT_STAGE_FIELDS: [&str; 3] = ["order_estimate", "final_order_amount", "payment_collected"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRole {
    /// Atualização da visita. O resultado é o que já está GRAVADO no registro.
    VisitUpdate,
    /// Atualização das linhas de produto. O resultado é o escolhido nesta requisição.
    ProductUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldRule {
    pub required: bool,
    pub visible: bool,
    /// Campo opcional que o cliente deve destacar (ex.: valor do contrato de uma visita ganha).
    pub emphasized: bool,
}

impl FieldRule {
    pub const OPTIONAL: FieldRule = FieldRule { required: false, visible: true, emphasized: false };
    pub const EMPHASIZED: FieldRule = FieldRule { required: false, visible: true, emphasized: true };
    pub const REQUIRED: FieldRule = FieldRule { required: true, visible: true, emphasized: false };
    pub const SUPPRESSED: FieldRule = FieldRule { required: false, visible: false, emphasized: false };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRules(BTreeMap<&'static str, FieldRule>);

impl FieldRules {
    fn baseline(fields: &[&'static str]) -> Self {
        FieldRules(fields.iter().map(|f| (*f, FieldRule::OPTIONAL)).collect())
    }

    fn set(&mut self, field: &'static str, rule: FieldRule) {
        self.0.insert(field, rule);
    }

    /// Campos fora da tabela seguem o padrão: opcional e visível.
    pub fn get(&self, field: &str) -> FieldRule {
        self.0.get(field).copied().unwrap_or(FieldRule::OPTIONAL)
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.get(field).required
    }

    pub fn is_visible(&self, field: &str) -> bool {
        self.get(field).visible
    }

    pub fn is_emphasized(&self, field: &str) -> bool {
        self.get(field).emphasized
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FieldRule)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// Valor de `stage` vindo de fora do formulário. Texto desconhecido = nenhuma regra.
pub fn parse_stage(raw: Option<&str>) -> Option<MeetingStage> {
    raw.and_then(|s| s.trim().parse().ok())
}

pub fn parse_outcome(raw: Option<&str>) -> Option<ContractOutcome> {
    raw.and_then(|s| s.trim().parse().ok())
}

pub fn field_rules(
    stage: Option<MeetingStage>,
    outcome: Option<ContractOutcome>,
    role: FormRole,
) -> FieldRules {
    match role {
        FormRole::VisitUpdate => visit_rules(stage, outcome),
        FormRole::ProductUpdate => product_rules(stage, outcome),
    }
}

fn visit_rules(stage: Option<MeetingStage>, stored_outcome: Option<ContractOutcome>) -> FieldRules {
    let mut rules = FieldRules::baseline(&VISIT_STAGE_FIELDS);

    // "Proposal or Negotiation" e "Payment Followup" não apertam nada além do padrão
    if stage == Some(MeetingStage::Closing) {
        rules.set("contract_outcome", FieldRule::REQUIRED);

        // Os demais continuam visíveis e opcionais; o resultado gravado só escolhe o destaque
        match stored_outcome {
            Some(ContractOutcome::Won) => {
                rules.set("contract_amount", FieldRule::EMPHASIZED);
                rules.set("is_payment_collected", FieldRule::EMPHASIZED);
            }
            Some(ContractOutcome::Lost) => {
                rules.set("reason_lost", FieldRule::EMPHASIZED);
            }
            None => {}
        }
    }

    rules
}

fn product_rules(stage: Option<MeetingStage>, outcome: Option<ContractOutcome>) -> FieldRules {
    let mut rules = FieldRules::baseline(&PRODUCT_STAGE_FIELDS);

    match (stage, outcome) {
        (Some(MeetingStage::ProposalOrNegotiation), _) => {
            rules.set("order_estimate", FieldRule::REQUIRED);
        }
        // payment_collected continua um campo numérico normal; quem esconde é o cliente
        (Some(MeetingStage::Closing), Some(ContractOutcome::Won)) => {
            rules.set("final_order_amount", FieldRule::REQUIRED);
        }
        (Some(MeetingStage::Closing), Some(ContractOutcome::Lost)) => {
            rules.set("final_order_amount", FieldRule::SUPPRESSED);
            rules.set("payment_collected", FieldRule::SUPPRESSED);
        }
        (Some(MeetingStage::PaymentFollowup), _) => {
            rules.set("payment_collected", FieldRule::REQUIRED);
        }
        _ => {}
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_fields(rules: &FieldRules) -> Vec<&'static str> {
        rules.iter().filter(|(_, r)| r.required).map(|(f, _)| f).collect()
    }

    fn hidden_fields(rules: &FieldRules) -> Vec<&'static str> {
        rules.iter().filter(|(_, r)| !r.visible).map(|(f, _)| f).collect()
    }

    #[test]
    fn unknown_or_missing_stage_leaves_everything_optional() {
        for role in [FormRole::VisitUpdate, FormRole::ProductUpdate] {
            for stage in [None, Some(MeetingStage::New)] {
                let rules = field_rules(stage, Some(ContractOutcome::Won), role);
                assert!(required_fields(&rules).is_empty());
                assert!(hidden_fields(&rules).is_empty());
            }
        }
        assert_eq!(parse_stage(Some("Something else")), None);
        assert_eq!(parse_stage(None), None);
        assert_eq!(parse_stage(Some(" Closing ")), Some(MeetingStage::Closing));
    }

    #[test]
    fn visit_proposal_has_no_extra_requirements() {
        let rules = field_rules(Some(MeetingStage::ProposalOrNegotiation), None, FormRole::VisitUpdate);
        assert!(required_fields(&rules).is_empty());
        assert!(rules.is_visible("is_order_final"));
    }

    #[test]
    fn visit_closing_requires_outcome() {
        let rules = field_rules(Some(MeetingStage::Closing), None, FormRole::VisitUpdate);
        assert_eq!(required_fields(&rules), vec!["contract_outcome"]);
        assert!(hidden_fields(&rules).is_empty());
    }

    #[test]
    fn visit_closing_keeps_outcome_fields_visible_whatever_is_stored() {
        for stored in [None, Some(ContractOutcome::Won), Some(ContractOutcome::Lost)] {
            let rules = field_rules(Some(MeetingStage::Closing), stored, FormRole::VisitUpdate);
            assert!(hidden_fields(&rules).is_empty(), "{stored:?}");
            for field in ["contract_amount", "is_payment_collected", "reason_lost"] {
                assert!(!rules.is_required(field), "{field} em {stored:?}");
            }
        }
    }

    #[test]
    fn visit_closing_emphasizes_fields_for_the_stored_outcome() {
        let won = field_rules(Some(MeetingStage::Closing), Some(ContractOutcome::Won), FormRole::VisitUpdate);
        assert!(won.is_emphasized("contract_amount"));
        assert!(won.is_emphasized("is_payment_collected"));
        assert!(!won.is_emphasized("reason_lost"));

        let lost = field_rules(Some(MeetingStage::Closing), Some(ContractOutcome::Lost), FormRole::VisitUpdate);
        assert!(lost.is_emphasized("reason_lost"));
        assert!(!lost.is_emphasized("contract_amount"));

        let undecided = field_rules(Some(MeetingStage::Closing), None, FormRole::VisitUpdate);
        assert!(undecided.iter().all(|(_, rule)| !rule.emphasized));
    }

    #[test]
    fn visit_payment_followup_keeps_flag_optional() {
        let rules = field_rules(Some(MeetingStage::PaymentFollowup), None, FormRole::VisitUpdate);
        assert!(!rules.is_required("is_payment_collected"));
        assert!(rules.is_visible("is_payment_collected"));
    }

    #[test]
    fn product_rules_per_stage() {
        let proposal = field_rules(Some(MeetingStage::ProposalOrNegotiation), None, FormRole::ProductUpdate);
        assert_eq!(required_fields(&proposal), vec!["order_estimate"]);

        let won = field_rules(Some(MeetingStage::Closing), Some(ContractOutcome::Won), FormRole::ProductUpdate);
        assert_eq!(required_fields(&won), vec!["final_order_amount"]);
        assert!(won.is_visible("payment_collected"));

        let lost = field_rules(Some(MeetingStage::Closing), Some(ContractOutcome::Lost), FormRole::ProductUpdate);
        assert!(required_fields(&lost).is_empty());
        assert_eq!(hidden_fields(&lost), vec!["final_order_amount", "payment_collected"]);

        let closing_undecided = field_rules(Some(MeetingStage::Closing), None, FormRole::ProductUpdate);
        assert!(required_fields(&closing_undecided).is_empty());

        let followup = field_rules(Some(MeetingStage::PaymentFollowup), None, FormRole::ProductUpdate);
        assert_eq!(required_fields(&followup), vec!["payment_collected"]);
    }
}
