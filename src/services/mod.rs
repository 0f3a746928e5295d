pub mod blocks;
pub mod clients;
pub mod invoices;
pub mod reports;
