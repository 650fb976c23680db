pub mod ambient_pool;
pub mod builder;
pub mod knockout;
pub mod level_book;
pub mod store;
pub mod swap;
pub mod tick_census;

#[cfg(test)]
mod proptest_properties;
