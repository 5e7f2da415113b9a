//! Catalogue of mirrored vendor entities
//!
//! Each kind owns one [`EntitySchema`]. Schemas are grouped by the vendor
//! service that serves them.

mod books;
mod crm;
mod desk;
mod inventory;

use serde::{Deserialize, Serialize};
use suitelink_domain::{impl_text_enum_conversions, Result};

use super::schema::EntitySchema;

/// Vendor service serving inventory documents
pub const SERVICE_INVENTORY: &str = "inventory";
/// Vendor service serving accounting documents
pub const SERVICE_BOOKS: &str = "books";
/// Vendor service serving CRM modules
pub const SERVICE_CRM: &str = "crm";
/// Vendor service serving support desk modules
pub const SERVICE_DESK: &str = "desk";

/// Every entity kind the mirror knows how to map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Item,
    CompositeItem,
    Contact,
    ContactPerson,
    SalesOrder,
    SalesOrderLineItem,
    Invoice,
    PurchaseOrder,
    Bill,
    CustomerPayment,
    CreditNote,
    Estimate,
    Warehouse,
    CrmLead,
    CrmContact,
    CrmAccount,
    CrmDeal,
    DeskTicket,
    DeskContact,
    DeskAccount,
}

impl_text_enum_conversions!(EntityKind {
    Item => "item",
    CompositeItem => "composite_item",
    Contact => "contact",
    ContactPerson => "contact_person",
    SalesOrder => "sales_order",
    SalesOrderLineItem => "sales_order_line_item",
    Invoice => "invoice",
    PurchaseOrder => "purchase_order",
    Bill => "bill",
    CustomerPayment => "customer_payment",
    CreditNote => "credit_note",
    Estimate => "estimate",
    Warehouse => "warehouse",
    CrmLead => "crm_lead",
    CrmContact => "crm_contact",
    CrmAccount => "crm_account",
    CrmDeal => "crm_deal",
    DeskTicket => "desk_ticket",
    DeskContact => "desk_contact",
    DeskAccount => "desk_account",
});

impl EntityKind {
    pub const ALL: [Self; 20] = [
        Self::Item,
        Self::CompositeItem,
        Self::Contact,
        Self::ContactPerson,
        Self::SalesOrder,
        Self::SalesOrderLineItem,
        Self::Invoice,
        Self::PurchaseOrder,
        Self::Bill,
        Self::CustomerPayment,
        Self::CreditNote,
        Self::Estimate,
        Self::Warehouse,
        Self::CrmLead,
        Self::CrmContact,
        Self::CrmAccount,
        Self::CrmDeal,
        Self::DeskTicket,
        Self::DeskContact,
        Self::DeskAccount,
    ];

    /// Vendor service name used to resolve the base URL
    pub const fn service(self) -> &'static str {
        match self {
            Self::Item
            | Self::CompositeItem
            | Self::SalesOrder
            | Self::SalesOrderLineItem
            | Self::PurchaseOrder
            | Self::Warehouse => SERVICE_INVENTORY,
            Self::Contact
            | Self::ContactPerson
            | Self::Invoice
            | Self::Bill
            | Self::CustomerPayment
            | Self::CreditNote
            | Self::Estimate => SERVICE_BOOKS,
            Self::CrmLead | Self::CrmContact | Self::CrmAccount | Self::CrmDeal => SERVICE_CRM,
            Self::DeskTicket | Self::DeskContact | Self::DeskAccount => SERVICE_DESK,
        }
    }

    /// Mirror table synced rows of this kind are stored in.
    ///
    /// Items and sales orders land in the typed tables read by the reorder
    /// job (a sales order brings its line items along); every other kind is
    /// kept as a keyed JSON document.
    pub const fn mirror_table(self) -> &'static str {
        match self {
            Self::Item => "items",
            Self::SalesOrder => "sales_orders",
            _ => "mirror_records",
        }
    }

    /// Schema for this kind
    ///
    /// # Errors
    /// Returns `SuiteLinkError::Internal` if the schema violates the builder
    /// invariants.
    pub fn schema(self) -> Result<EntitySchema> {
        let schema = match self {
            Self::Item => inventory::item(),
            Self::CompositeItem => inventory::composite_item(),
            Self::SalesOrder => inventory::sales_order(),
            Self::SalesOrderLineItem => inventory::sales_order_line_item(),
            Self::PurchaseOrder => inventory::purchase_order(),
            Self::Warehouse => inventory::warehouse(),
            Self::Contact => books::contact(),
            Self::ContactPerson => books::contact_person(),
            Self::Invoice => books::invoice(),
            Self::Bill => books::bill(),
            Self::CustomerPayment => books::customer_payment(),
            Self::CreditNote => books::credit_note(),
            Self::Estimate => books::estimate(),
            Self::CrmLead => crm::lead(),
            Self::CrmContact => crm::contact(),
            Self::CrmAccount => crm::account(),
            Self::CrmDeal => crm::deal(),
            Self::DeskTicket => desk::ticket(),
            Self::DeskContact => desk::contact(),
            Self::DeskAccount => desk::account(),
        };
        Ok(schema?)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn every_kind_builds_a_schema() {
        for kind in EntityKind::ALL {
            let schema = kind.schema().unwrap_or_else(|e| panic!("{kind}: {e}"));
            assert!(schema.primary_field().1.required, "{kind}");
            assert!(!schema.endpoint().is_empty(), "{kind}");
        }
    }

    #[test]
    fn names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(EntityKind::from_str("spaceship").is_err());
    }

    #[test]
    fn services_partition_the_catalogue() {
        let crm = EntityKind::ALL.iter().filter(|k| k.service() == SERVICE_CRM).count();
        let desk = EntityKind::ALL.iter().filter(|k| k.service() == SERVICE_DESK).count();
        assert_eq!(crm, 4);
        assert_eq!(desk, 3);
        assert_eq!(EntityKind::Item.service(), SERVICE_INVENTORY);
        assert_eq!(EntityKind::Invoice.service(), SERVICE_BOOKS);
    }

    #[test]
    fn item_schema_matches_item_table() {
        let schema = EntityKind::Item.schema().unwrap();
        let (name, rule) = schema.primary_field();
        assert_eq!(name, "item_id");
        assert_eq!(rule.target, "zoho_item_id");
        for column in ["sku", "name", "rate", "status", "stock_on_hand", "reorder_level"] {
            assert!(schema.rules().any(|(_, r)| r.target == column), "{column}");
        }
        assert_eq!(EntityKind::Item.mirror_table(), "items");
        assert_eq!(EntityKind::SalesOrder.mirror_table(), "sales_orders");
        assert_eq!(EntityKind::Contact.mirror_table(), "mirror_records");
    }
}
