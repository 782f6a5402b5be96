//! Order analytics for the e-commerce dashboard
//!
//! Load the order table once with [`loader::Dataset`], restrict it to a date
//! range with [`filter::filter_by_date`], then derive the summary tables in
//! [`aggregate`] or all of them at once with [`report::DashboardReport`].

pub mod aggregate;
pub mod api;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod report;
