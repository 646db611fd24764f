pub mod addon_products;
pub mod addons;
pub mod categories;
pub mod products;
pub mod users;

pub use addon_products::Entity as AddonProducts;
pub use addons::Entity as Addons;
pub use categories::Entity as Categories;
pub use products::Entity as Products;
pub use users::Entity as Users;
