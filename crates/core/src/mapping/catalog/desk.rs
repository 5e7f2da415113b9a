use crate::mapping::schema::{EntitySchema, SchemaError};
use crate::mapping::transforms::{
    email, id_string, lowercase, to_boolean, to_timestamp, trimmed_string,
};

pub(super) fn ticket() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("ticket")
        .list_key("data")
        .single_key("data")
        .primary("id", "zoho_desk_id", id_string)
        .with("ticketNumber", "ticket_number", trimmed_string)
        .required_with("subject", "subject", trimmed_string)
        .with("status", "status", lowercase)
        .with("priority", "priority", lowercase)
        .with("channel", "channel", lowercase)
        .with("contactId", "contact_id", id_string)
        .with("email", "email", email)
        .with("createdTime", "zoho_created_at", to_timestamp)
        .with("dueDate", "due_at", to_timestamp)
        .ignore("webUrl")
        .endpoint("tickets")
        .build()
}

pub(super) fn contact() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("contact")
        .list_key("data")
        .single_key("data")
        .primary("id", "zoho_desk_id", id_string)
        .with("firstName", "first_name", trimmed_string)
        .required_with("lastName", "last_name", trimmed_string)
        .with("email", "email", email)
        .with("phone", "phone", trimmed_string)
        .with("accountId", "account_id", id_string)
        .with("isDeleted", "is_deleted", to_boolean)
        .ignore("webUrl")
        .endpoint("contacts")
        .build()
}

pub(super) fn account() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("account")
        .list_key("data")
        .single_key("data")
        .primary("id", "zoho_desk_id", id_string)
        .required_with("accountName", "name", trimmed_string)
        .with("website", "website", trimmed_string)
        .with("email", "email", email)
        .with("createdTime", "zoho_created_at", to_timestamp)
        .ignore("webUrl")
        .endpoint("accounts")
        .build()
}
