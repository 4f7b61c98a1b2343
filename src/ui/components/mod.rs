pub mod lookup_fields;
pub mod pricing_summary;
pub mod toast;
