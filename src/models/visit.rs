// src/models/visit.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE meeting_stage do banco.
// Os valores textuais são exatamente os que o frontend manda no parâmetro `stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "meeting_stage")]
pub enum MeetingStage {
    #[serde(rename = "New")]
    #[sqlx(rename = "New")]
    New,
    #[serde(rename = "Proposal or Negotiation")]
    #[sqlx(rename = "Proposal or Negotiation")]
    ProposalOrNegotiation,
    #[serde(rename = "Closing")]
    #[sqlx(rename = "Closing")]
    Closing,
    #[serde(rename = "Payment Followup")]
    #[sqlx(rename = "Payment Followup")]
    PaymentFollowup,
}

impl MeetingStage {
    pub const ALL: [MeetingStage; 4] = [
        MeetingStage::New,
        MeetingStage::ProposalOrNegotiation,
        MeetingStage::Closing,
        MeetingStage::PaymentFollowup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStage::New => "New",
            MeetingStage::ProposalOrNegotiation => "Proposal or Negotiation",
            MeetingStage::Closing => "Closing",
            MeetingStage::PaymentFollowup => "Payment Followup",
        }
    }
}

impl fmt::Display for MeetingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStage {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeetingStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or(())
    }
}

// Resultado final do estágio "Closing"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contract_outcome")]
pub enum ContractOutcome {
    Won,
    Lost,
}

impl ContractOutcome {
    pub const ALL: [ContractOutcome; 2] = [ContractOutcome::Won, ContractOutcome::Lost];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractOutcome::Won => "Won",
            ContractOutcome::Lost => "Lost",
        }
    }
}

impl fmt::Display for ContractOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractOutcome {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Won" => Ok(ContractOutcome::Won),
            "Lost" => Ok(ContractOutcome::Lost),
            _ => Err(()),
        }
    }
}

// --- DIRETÓRIOS (consultados para montar os selects) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(example = "Acme Industrial Ltd")]
    pub company_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "Maria Silva")]
    pub contact_name: String,
    #[schema(example = "+91 98765 43210")]
    pub contact_number: Option<String>,
    #[schema(example = "Purchase Manager")]
    pub designation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Hydraulic Pump X200")]
    pub name: String,
}

// --- VISITA (O Dado) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: Uuid,
    pub company_id: Uuid,
    pub contact_id: Uuid,

    // Copiados do contato no momento da gravação (somente leitura no formulário)
    pub contact_number: Option<String>,
    pub designation: Option<String>,

    // Sempre com 6 casas decimais; serializado como string para não perder zeros
    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "12.123457")]
    pub latitude: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    #[schema(value_type = String, example = "77.594566")]
    pub longitude: Decimal,

    pub item_discussed: Option<String>,
    pub meeting_stage: MeetingStage,
    pub status: Option<String>,
    pub tag: Option<String>,
    #[schema(example = "250000.00")]
    pub client_budget: Option<Decimal>,
    pub is_order_final: bool,
    pub contract_outcome: Option<ContractOutcome>,
    pub contract_amount: Option<Decimal>,
    pub reason_lost: Option<String>,
    pub is_payment_collected: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInterested {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub product_id: Uuid,
    pub order_estimate: Option<Decimal>,
    pub final_order_amount: Option<Decimal>,
    pub payment_collected: Option<Decimal>,
}

// Visita com as linhas de produto (resposta do GET)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitDetail {
    #[serde(flatten)]
    pub visit: Visit,
    pub company_name: String,
    pub contact_name: String,
    pub products: Vec<ProductInterested>,
}
