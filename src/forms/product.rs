// src/forms/product.rs

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::data::FormData;
use super::errors::FormErrors;
use super::fields::{parse_decimal, parse_reference, Choice, FieldDescriptor, Widget};
use super::formset::RowForm;
use super::rules::{field_rules, FieldRules, FormRole, PRODUCT_STAGE_FIELDS};
use crate::models::visit::{ContractOutcome, MeetingStage, Product, ProductInterested};

pub const PRODUCTS_PREFIX: &str = "products";

fn product_choices(products: &[Product]) -> Vec<Choice> {
    let mut sorted: Vec<&Product> = products.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted.into_iter().map(|p| Choice::new(p.id, p.name.clone())).collect()
}

fn product_field(products: &[Product]) -> FieldDescriptor {
    FieldDescriptor::new("product_interested", Widget::Select)
        .required(true)
        .choices(product_choices(products))
        .placeholder("---------")
}

// =========================================================================
//  CRIAÇÃO (etapa 2: só o produto, sem valores)
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProductInterest {
    pub product_id: Uuid,
}

pub struct ProductInterestedForm<'a> {
    products: &'a [Product],
}

impl<'a> ProductInterestedForm<'a> {
    pub fn new(products: &'a [Product]) -> Self {
        Self { products }
    }

    pub fn describe(&self) -> Vec<FieldDescriptor> {
        vec![product_field(self.products)]
    }
}

impl RowForm for ProductInterestedForm<'_> {
    type Output = NewProductInterest;

    fn fields(&self) -> &'static [&'static str] {
        &["product_interested"]
    }

    fn clean_row(&self, row: &FormData) -> Result<NewProductInterest, FormErrors> {
        let mut errors = FormErrors::new();
        let product_id = errors
            .collect(
                "product_interested",
                parse_reference(row, "product_interested", true, |id| {
                    self.products.iter().any(|p| p.id == id)
                }),
            )
            .flatten();

        match product_id {
            Some(product_id) if errors.is_empty() => Ok(NewProductInterest { product_id }),
            _ => Err(errors),
        }
    }
}

// =========================================================================
//  ATUALIZAÇÃO (valores dependem do estágio e do resultado)
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductInterestUpdate {
    pub product_id: Uuid,
    pub order_estimate: Option<Decimal>,
    pub final_order_amount: Option<Decimal>,
    pub payment_collected: Option<Decimal>,
    /// Campos ocultos nesta etapa. Numa linha existente ficam com o valor gravado.
    pub kept: Vec<&'static str>,
}

impl ProductInterestUpdate {
    /// Linha existente: campos ocultos voltam ao valor gravado em vez de virar NULL.
    pub fn keeping_stored(mut self, stored: &ProductInterested) -> Self {
        for field in &self.kept {
            match *field {
                "order_estimate" => self.order_estimate = stored.order_estimate,
                "final_order_amount" => self.final_order_amount = stored.final_order_amount,
                "payment_collected" => self.payment_collected = stored.payment_collected,
                _ => {}
            }
        }
        self
    }
}

pub struct UpdateProductInterestedForm<'a> {
    products: &'a [Product],
    rules: FieldRules,
}

impl<'a> UpdateProductInterestedForm<'a> {
    /// `outcome` é o resultado escolhido na requisição atual (não o gravado).
    pub fn new(
        products: &'a [Product],
        stage: Option<MeetingStage>,
        outcome: Option<ContractOutcome>,
    ) -> Self {
        Self {
            products,
            rules: field_rules(stage, outcome, FormRole::ProductUpdate),
        }
    }

    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    pub fn describe(&self) -> Vec<FieldDescriptor> {
        let mut fields = vec![product_field(self.products)];
        for name in PRODUCT_STAGE_FIELDS {
            let rule = self.rules.get(name);
            let widget = if rule.visible { Widget::NumberInput } else { Widget::Hidden };
            fields.push(
                FieldDescriptor::new(name, widget)
                    .required(rule.required)
                    .visible(rule.visible),
            );
        }
        fields
    }

    // Campo suprimido não é coletado, mesmo que o cliente mande algo
    fn amount(&self, row: &FormData, name: &str, errors: &mut FormErrors) -> Option<Decimal> {
        let rule = self.rules.get(name);
        if !rule.visible {
            return None;
        }
        errors.collect(name, parse_decimal(row, name, rule.required)).flatten()
    }
}

impl RowForm for UpdateProductInterestedForm<'_> {
    type Output = ProductInterestUpdate;

    fn fields(&self) -> &'static [&'static str] {
        &["product_interested", "order_estimate", "final_order_amount", "payment_collected"]
    }

    fn clean_row(&self, row: &FormData) -> Result<ProductInterestUpdate, FormErrors> {
        let mut errors = FormErrors::new();

        let product_id = errors
            .collect(
                "product_interested",
                parse_reference(row, "product_interested", true, |id| {
                    self.products.iter().any(|p| p.id == id)
                }),
            )
            .flatten();
        let order_estimate = self.amount(row, "order_estimate", &mut errors);
        let final_order_amount = self.amount(row, "final_order_amount", &mut errors);
        let payment_collected = self.amount(row, "payment_collected", &mut errors);

        let kept = PRODUCT_STAGE_FIELDS
            .into_iter()
            .filter(|name| !self.rules.is_visible(name))
            .collect();

        match product_id {
            Some(product_id) if errors.is_empty() => Ok(ProductInterestUpdate {
                product_id,
                order_estimate,
                final_order_amount,
                payment_collected,
                kept,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::errors::FormError;
    use std::str::FromStr;

    fn catalogue() -> Vec<Product> {
        vec![
            Product { id: Uuid::new_v4(), name: "Valve".into() },
            Product { id: Uuid::new_v4(), name: "Pump".into() },
        ]
    }

    fn row(product: &Product, pairs: &[(&str, &str)]) -> FormData {
        let mut data: FormData = pairs.iter().copied().collect();
        data.insert("product_interested", product.id.to_string());
        data
    }

    #[test]
    fn creation_row_requires_a_known_product() {
        let products = catalogue();
        let form = ProductInterestedForm::new(&products);

        assert_eq!(
            form.clean_row(&row(&products[0], &[])).unwrap(),
            NewProductInterest { product_id: products[0].id }
        );

        let errors = form.clean_row(&FormData::new()).unwrap_err();
        assert_eq!(errors.field("product_interested"), &[FormError::Required]);

        let mut unknown = FormData::new();
        unknown.insert("product_interested", Uuid::new_v4().to_string());
        let errors = form.clean_row(&unknown).unwrap_err();
        assert_eq!(errors.field("product_interested"), &[FormError::InvalidChoice]);
    }

    #[test]
    fn product_choices_are_sorted_by_name() {
        let products = catalogue();
        let fields = ProductInterestedForm::new(&products).describe();
        let labels: Vec<_> = fields[0].choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Pump", "Valve"]);
    }

    #[test]
    fn proposal_requires_order_estimate() {
        let products = catalogue();
        let form = UpdateProductInterestedForm::new(&products, Some(MeetingStage::ProposalOrNegotiation), None);

        let errors = form.clean_row(&row(&products[0], &[])).unwrap_err();
        assert_eq!(errors.field("order_estimate"), &[FormError::Required]);

        let cleaned = form.clean_row(&row(&products[0], &[("order_estimate", "1200")])).unwrap();
        assert_eq!(cleaned.order_estimate, Some(Decimal::from(1200)));
    }

    #[test]
    fn closing_won_requires_final_amount() {
        let products = catalogue();
        let form = UpdateProductInterestedForm::new(
            &products,
            Some(MeetingStage::Closing),
            Some(ContractOutcome::Won),
        );

        let errors = form.clean_row(&row(&products[0], &[])).unwrap_err();
        assert_eq!(errors.field("final_order_amount"), &[FormError::Required]);
        assert_eq!(errors.error_count(), 1);

        let cleaned = form
            .clean_row(&row(&products[0], &[("final_order_amount", "999.99"), ("payment_collected", "100")]))
            .unwrap();
        assert_eq!(cleaned.final_order_amount, Some(Decimal::from_str("999.99").unwrap()));
        // continua coletado: quem esconde é o cliente
        assert_eq!(cleaned.payment_collected, Some(Decimal::from(100)));
    }

    #[test]
    fn closing_lost_suppresses_amounts() {
        let products = catalogue();
        let form = UpdateProductInterestedForm::new(
            &products,
            Some(MeetingStage::Closing),
            Some(ContractOutcome::Lost),
        );

        let cleaned = form
            .clean_row(&row(&products[0], &[("final_order_amount", "5"), ("payment_collected", "junk")]))
            .unwrap();
        assert_eq!(cleaned.final_order_amount, None);
        assert_eq!(cleaned.payment_collected, None);
        assert_eq!(cleaned.kept, vec!["final_order_amount", "payment_collected"]);

        let described = form.describe();
        let hidden: Vec<_> = described.iter().filter(|f| !f.visible).map(|f| f.name.as_str()).collect();
        assert_eq!(hidden, vec!["final_order_amount", "payment_collected"]);
        assert!(described.iter().filter(|f| !f.visible).all(|f| f.widget == Widget::Hidden && !f.required));
    }

    #[test]
    fn closing_lost_keeps_stored_amounts_of_existing_rows() {
        let products = catalogue();
        let form = UpdateProductInterestedForm::new(
            &products,
            Some(MeetingStage::Closing),
            Some(ContractOutcome::Lost),
        );
        let stored = ProductInterested {
            id: Uuid::new_v4(),
            visit_id: Uuid::new_v4(),
            product_id: products[0].id,
            order_estimate: Some(Decimal::from(4000)),
            final_order_amount: Some(Decimal::from(5000)),
            payment_collected: Some(Decimal::from(1200)),
        };

        let cleaned = form
            .clean_row(&row(&products[1], &[("order_estimate", "4500"), ("final_order_amount", "1")]))
            .unwrap()
            .keeping_stored(&stored);

        assert_eq!(cleaned.product_id, products[1].id);
        assert_eq!(cleaned.order_estimate, Some(Decimal::from(4500)));
        assert_eq!(cleaned.final_order_amount, Some(Decimal::from(5000)));
        assert_eq!(cleaned.payment_collected, Some(Decimal::from(1200)));
    }

    #[test]
    fn visible_fields_overwrite_stored_values() {
        let products = catalogue();
        let form = UpdateProductInterestedForm::new(
            &products,
            Some(MeetingStage::Closing),
            Some(ContractOutcome::Won),
        );
        let stored = ProductInterested {
            id: Uuid::new_v4(),
            visit_id: Uuid::new_v4(),
            product_id: products[0].id,
            order_estimate: Some(Decimal::from(4000)),
            final_order_amount: Some(Decimal::from(5000)),
            payment_collected: Some(Decimal::from(1200)),
        };

        let cleaned = form
            .clean_row(&row(&products[0], &[("final_order_amount", "5100")]))
            .unwrap()
            .keeping_stored(&stored);

        assert!(cleaned.kept.is_empty());
        // campo visível deixado em branco é limpo de propósito
        assert_eq!(cleaned.order_estimate, None);
        assert_eq!(cleaned.final_order_amount, Some(Decimal::from(5100)));
        assert_eq!(cleaned.payment_collected, None);
    }

    #[test]
    fn payment_followup_requires_payment_collected() {
        let products = catalogue();
        let form = UpdateProductInterestedForm::new(&products, Some(MeetingStage::PaymentFollowup), None);

        let errors = form.clean_row(&row(&products[1], &[])).unwrap_err();
        assert_eq!(errors.field("payment_collected"), &[FormError::Required]);

        let cleaned = form.clean_row(&row(&products[1], &[("payment_collected", "450.00")])).unwrap();
        assert_eq!(cleaned.payment_collected, Some(Decimal::from_str("450.00").unwrap()));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let products = catalogue();
        let form = UpdateProductInterestedForm::new(&products, None, None);
        let errors = form.clean_row(&row(&products[0], &[("order_estimate", "lots")])).unwrap_err();
        assert_eq!(errors.field("order_estimate"), &[FormError::InvalidNumber]);
    }
}
