use crate::mapping::schema::{EntitySchema, SchemaError};
use crate::mapping::transforms::{
    email, id_string, lowercase, to_date, to_number, to_timestamp, trimmed_string,
};

pub(super) fn contact() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("contact")
        .primary("contact_id", "zoho_contact_id", id_string)
        .required_with("contact_name", "name", trimmed_string)
        .with("company_name", "company_name", trimmed_string)
        .with("contact_type", "contact_type", lowercase)
        .with("email", "email", email)
        .with("phone", "phone", trimmed_string)
        .with("status", "status", lowercase)
        .with("outstanding_receivable_amount", "outstanding_receivable", to_number)
        .with("created_time", "zoho_created_at", to_timestamp)
        .with("last_modified_time", "zoho_updated_at", to_timestamp)
        .ignore("custom_fields")
        .build()
}

pub(super) fn contact_person() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("contact_person")
        .primary("contact_person_id", "zoho_contact_person_id", id_string)
        .with("contact_id", "zoho_contact_id", id_string)
        .with("first_name", "first_name", trimmed_string)
        .required_with("last_name", "last_name", trimmed_string)
        .with("email", "email", email)
        .with("phone", "phone", trimmed_string)
        .with("is_primary_contact", "is_primary", crate::mapping::transforms::to_boolean)
        .endpoint("contacts/contactpersons")
        .build()
}

pub(super) fn invoice() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("invoice")
        .primary("invoice_id", "zoho_invoice_id", id_string)
        .with("invoice_number", "invoice_number", trimmed_string)
        .with("customer_id", "zoho_customer_id", id_string)
        .with("customer_name", "customer_name", trimmed_string)
        .required_with("date", "date", to_date)
        .with("due_date", "due_date", to_date)
        .with("status", "status", lowercase)
        .with("total", "total", to_number)
        .with("balance", "balance", to_number)
        .ignore("line_items")
        .build()
}

pub(super) fn bill() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("bill")
        .primary("bill_id", "zoho_bill_id", id_string)
        .with("bill_number", "bill_number", trimmed_string)
        .with("vendor_id", "zoho_vendor_id", id_string)
        .with("vendor_name", "vendor_name", trimmed_string)
        .required_with("date", "date", to_date)
        .with("due_date", "due_date", to_date)
        .with("status", "status", lowercase)
        .with("total", "total", to_number)
        .with("balance", "balance", to_number)
        .build()
}

pub(super) fn customer_payment() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("customerpayment")
        .single_key("payment")
        .primary("payment_id", "zoho_payment_id", id_string)
        .with("payment_number", "payment_number", trimmed_string)
        .with("customer_id", "zoho_customer_id", id_string)
        .with("customer_name", "customer_name", trimmed_string)
        .required_with("date", "date", to_date)
        .required_with("amount", "amount", to_number)
        .with("payment_mode", "payment_mode", lowercase)
        .with("reference_number", "reference_number", trimmed_string)
        .build()
}

pub(super) fn credit_note() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("creditnote")
        .primary("creditnote_id", "zoho_creditnote_id", id_string)
        .with("creditnote_number", "creditnote_number", trimmed_string)
        .with("customer_id", "zoho_customer_id", id_string)
        .required_with("date", "date", to_date)
        .with("status", "status", lowercase)
        .with("total", "total", to_number)
        .with("balance", "balance", to_number)
        .build()
}

pub(super) fn estimate() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("estimate")
        .primary("estimate_id", "zoho_estimate_id", id_string)
        .with("estimate_number", "estimate_number", trimmed_string)
        .with("customer_id", "zoho_customer_id", id_string)
        .with("customer_name", "customer_name", trimmed_string)
        .required_with("date", "date", to_date)
        .with("expiry_date", "expiry_date", to_date)
        .with("status", "status", lowercase)
        .with("total", "total", to_number)
        .build()
}
