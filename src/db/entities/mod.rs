//! SeaORM entities for the marketplace tables.
//!
//! Each entity lives in its own module.

pub mod accumulative_discount;
pub mod one_time_discount;
pub mod order;
pub mod product;
pub mod role;
pub mod user;
pub mod user_role;
