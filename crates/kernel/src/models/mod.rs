//! Data models.

pub mod blog;
pub mod fields;
pub mod site;
pub mod user;

pub use blog::{AuthorRef, Blog, BlogView, CreateBlog, UpdateBlog};
pub use fields::{StringOrList, to_string_list};
pub use site::{CreateSite, Site, UpdateSite};
pub use user::{AuthUser, LoginUser, RegisterUser, User};
