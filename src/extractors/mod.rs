pub mod current_user;
pub mod page;

pub use current_user::CurrentUser;
pub use page::Page;
