pub use super::microposts::Entity as Microposts;
pub use super::users::Entity as Users;
