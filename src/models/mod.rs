pub mod menu;
pub mod user;

pub use menu::{MenuCategory, MenuItem, MenuMap, MenuRow, SubItem};
pub use user::{CurrentUser, Level, User, UserStatus};
