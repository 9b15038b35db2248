pub mod cart_lines;
pub mod carts;
pub mod currencies;
pub mod customers;
pub mod orders;
pub mod products;
pub mod shop_settings;
pub mod sync_records;
pub mod taxes;

pub use cart_lines::Entity as CartLines;
pub use carts::Entity as Carts;
pub use currencies::Entity as Currencies;
pub use customers::Entity as Customers;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use shop_settings::Entity as ShopSettings;
pub use sync_records::Entity as SyncRecords;
pub use taxes::Entity as Taxes;
