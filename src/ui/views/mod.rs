mod browser;
mod detail;
mod login;
mod product_list;
mod user_list;

pub use detail::{ProductDetailView, UserDetailView};
pub use login::LoginView;
pub use product_list::ProductListView;
pub use user_list::UserListView;
