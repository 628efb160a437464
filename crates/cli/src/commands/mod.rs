pub mod parse;
pub mod parsers;
pub mod project;
pub mod query;
pub mod util;
pub mod view;

pub use parse::*;
pub use parsers::*;
pub use project::*;
pub use query::*;
pub use util::*;
pub use view::*;
