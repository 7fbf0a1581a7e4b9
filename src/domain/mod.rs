pub mod category;
pub mod style;

pub use category::{Category, Pass};
pub use style::{FontStyle, StyleResolver, StyleTable, TokenStyle};
