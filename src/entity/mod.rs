pub mod farmers;
pub mod messages;
pub mod orders;
pub mod products;
pub mod users;

pub use farmers::Entity as Farmers;
pub use messages::Entity as Messages;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use users::Entity as Users;
