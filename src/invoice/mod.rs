mod edit;
mod normalize;
mod record;
mod sample;
mod totals;
mod validate;

pub use edit::{add_item, parse_number, remove_item, set_field, update_item, ItemUpdate};
pub use normalize::{
    coerce_number, format_date, normalize, normalize_on, repair_date, DEFAULT_DUE_DAYS,
};
pub use record::{InvoiceRecord, LineItem, ProcessingStatus, ValidationError};
pub use sample::sample_invoice;
pub use totals::{first_non_finite, recompute, recompute_in_place, tax_on};
pub use validate::{is_valid_email, parse_calendar_date, validate};
