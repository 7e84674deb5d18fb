//! sea-orm entities for the storefront schema created by [`crate::migrator`].

pub mod cart;
pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;
pub mod user_behavior;
