//! Property test modules

mod device_list_tests;
mod listing_tests;
mod shell_quote_tests;
