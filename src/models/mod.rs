//! Podio entity types.

mod app;
mod embed;
mod file;
mod flow;
mod item;
mod member;
mod organization;
mod space;
mod widget;

pub use app::*;
pub use embed::*;
pub use file::*;
pub use flow::*;
pub use item::*;
pub use member::*;
pub use organization::*;
pub use space::*;
pub use widget::*;
