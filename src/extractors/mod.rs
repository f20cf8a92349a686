pub mod json;
pub mod path;
pub mod query;

pub use json::AppJson;
pub use path::AppPath;
pub use query::AppQuery;
