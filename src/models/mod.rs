mod consumer;
mod license;
mod product;
mod user;

pub use consumer::*;
pub use license::*;
pub use product::*;
pub use user::*;
