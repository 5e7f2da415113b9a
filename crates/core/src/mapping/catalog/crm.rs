//! CRM modules answer under a generic `data` array and use capitalized
//! field names.

use crate::mapping::schema::{EntitySchema, EntitySchemaBuilder, SchemaError};
use crate::mapping::transforms::{
    email, id_string, lowercase, nested_id, nested_name, to_date, to_number, to_timestamp,
    trimmed_string,
};

fn module(entity: &'static str, endpoint: &str) -> EntitySchemaBuilder {
    EntitySchema::builder(entity)
        .list_key("data")
        .single_key("data")
        .endpoint(endpoint)
        .primary("id", "zoho_crm_id", id_string)
        .with("Owner", "owner_name", nested_name)
        .with("Created_Time", "zoho_created_at", to_timestamp)
        .with("Modified_Time", "zoho_updated_at", to_timestamp)
        .ignore("$approval")
        .ignore("$editable")
}

pub(super) fn lead() -> Result<EntitySchema, SchemaError> {
    module("lead", "Leads")
        .with("First_Name", "first_name", trimmed_string)
        .required_with("Last_Name", "last_name", trimmed_string)
        .with("Email", "email", email)
        .with("Company", "company", trimmed_string)
        .with("Lead_Status", "status", lowercase)
        .with("Lead_Source", "source", trimmed_string)
        .build()
}

pub(super) fn contact() -> Result<EntitySchema, SchemaError> {
    module("contact", "Contacts")
        .with("First_Name", "first_name", trimmed_string)
        .required_with("Last_Name", "last_name", trimmed_string)
        .with("Email", "email", email)
        .with("Phone", "phone", trimmed_string)
        .with("Account_Name", "account_id", nested_id)
        .build()
}

pub(super) fn account() -> Result<EntitySchema, SchemaError> {
    module("account", "Accounts")
        .required_with("Account_Name", "name", trimmed_string)
        .with("Website", "website", trimmed_string)
        .with("Industry", "industry", trimmed_string)
        .with("Annual_Revenue", "annual_revenue", to_number)
        .build()
}

pub(super) fn deal() -> Result<EntitySchema, SchemaError> {
    module("deal", "Deals")
        .required_with("Deal_Name", "name", trimmed_string)
        .with("Stage", "stage", lowercase)
        .with("Amount", "amount", to_number)
        .with("Closing_Date", "closing_date", to_date)
        .with("Account_Name", "account_id", nested_id)
        .build()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mapping::EntityMapper;

    #[test]
    fn crm_records_come_from_data_array() {
        let mapper = EntityMapper::new(lead().unwrap());
        let response = json!({
            "data": [{
                "id": "5725767000000411001",
                "Last_Name": "Okafor",
                "Email": "CHI@example.org",
                "Owner": {"id": "1", "name": "Sam Lee"},
                "$approval": {"delegate": false}
            }],
            "info": {"more_records": false}
        });
        let rows = mapper.extract_from_response(&response);
        let row = mapper.transform_to_db_record(&rows[0]);
        assert_eq!(row["zoho_crm_id"], "5725767000000411001");
        assert_eq!(row["email"], "chi@example.org");
        assert_eq!(row["owner_name"], "Sam Lee");
        assert!(mapper.validate_record(&row).is_valid());
    }
}
