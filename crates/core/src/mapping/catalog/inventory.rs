use crate::mapping::schema::{EntitySchema, SchemaError};
use crate::mapping::transforms::{
    id_string, lowercase, status, to_date, to_integer, to_number, to_timestamp, trimmed_string,
};

/// Columns of the `items` table
pub(super) fn item() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("item")
        .primary("item_id", "zoho_item_id", id_string)
        .with("sku", "sku", trimmed_string)
        .required_with("name", "name", trimmed_string)
        .with("description", "description", trimmed_string)
        .with("rate", "rate", to_number)
        .with("purchase_rate", "purchase_rate", to_number)
        .with("unit", "unit", trimmed_string)
        .with("status", "status", status)
        .with("item_type", "item_type", lowercase)
        .with("product_type", "product_type", lowercase)
        .with("stock_on_hand", "stock_on_hand", to_number)
        .with("reorder_level", "reorder_level", to_integer)
        .with("created_time", "zoho_created_at", to_timestamp)
        .with("last_modified_time", "zoho_updated_at", to_timestamp)
        .ignore("image_name")
        .ignore("image_type")
        .ignore("available_stock")
        .ignore("actual_available_stock")
        .build()
}

pub(super) fn composite_item() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("composite_item")
        .primary("composite_item_id", "zoho_composite_item_id", id_string)
        .with("sku", "sku", trimmed_string)
        .required_with("name", "name", trimmed_string)
        .with("rate", "rate", to_number)
        .with("status", "status", status)
        .with("stock_on_hand", "stock_on_hand", to_number)
        .ignore("mapped_items")
        .endpoint("compositeitems")
        .build()
}

pub(super) fn sales_order() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("salesorder")
        .primary("salesorder_id", "zoho_salesorder_id", id_string)
        .with("salesorder_number", "salesorder_number", trimmed_string)
        .with("customer_id", "zoho_customer_id", id_string)
        .with("customer_name", "customer_name", trimmed_string)
        .required_with("date", "date", to_date)
        .with("status", "status", lowercase)
        .with("total", "total", to_number)
        .with("reference_number", "reference_number", trimmed_string)
        .with("created_time", "zoho_created_at", to_timestamp)
        .with("last_modified_time", "zoho_updated_at", to_timestamp)
        .ignore("line_items")
        .build()
}

/// Line items are listed inside their sales order
pub(super) fn sales_order_line_item() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("line_item")
        .primary("line_item_id", "zoho_line_item_id", id_string)
        .with("item_id", "item_id", id_string)
        .with("sku", "sku", trimmed_string)
        .with("name", "name", trimmed_string)
        .with("description", "description", trimmed_string)
        .with("rate", "rate", to_number)
        .required_with("quantity", "quantity", to_number)
        .with("item_total", "item_total", to_number)
        .with("unit", "unit", trimmed_string)
        .ignore("item_order")
        .endpoint("salesorders")
        .build()
}

pub(super) fn purchase_order() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("purchaseorder")
        .primary("purchaseorder_id", "zoho_purchaseorder_id", id_string)
        .with("purchaseorder_number", "purchaseorder_number", trimmed_string)
        .with("vendor_id", "zoho_vendor_id", id_string)
        .with("vendor_name", "vendor_name", trimmed_string)
        .required_with("date", "date", to_date)
        .with("delivery_date", "delivery_date", to_date)
        .with("status", "status", lowercase)
        .with("total", "total", to_number)
        .ignore("line_items")
        .build()
}

pub(super) fn warehouse() -> Result<EntitySchema, SchemaError> {
    EntitySchema::builder("warehouse")
        .primary("warehouse_id", "zoho_warehouse_id", id_string)
        .required_with("warehouse_name", "name", trimmed_string)
        .with("email", "email", lowercase)
        .with("status", "status", status)
        .with("is_primary", "is_primary", crate::mapping::transforms::to_boolean)
        .build()
}
