pub use super::accounts::Entity as Accounts;
pub use super::icon_links::Entity as IconLinks;
