mod handler;

pub use handler::{level_menus, load_menu};
