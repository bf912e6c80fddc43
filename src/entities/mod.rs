//! SeaORM entity definitions for the storefront data model.

pub mod cart;
pub mod category;
pub mod order;
pub mod order_item;
pub mod product;
pub mod site_setting;
pub mod user;

pub use cart::Entity as Cart;
pub use category::Entity as Category;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use product::Entity as Product;
pub use site_setting::Entity as SiteSetting;
pub use user::Entity as User;
