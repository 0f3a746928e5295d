pub mod client;
pub mod granite_block;
pub mod invoice;
pub mod invoice_line_item;
pub mod user;
