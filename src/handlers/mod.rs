pub mod auth;
pub mod blocks;
pub mod clients;
pub mod common;
pub mod health;
pub mod invoices;
pub mod reports;
pub mod users;
