pub mod scraping_handlers;
pub mod system_handlers;

pub use scraping_handlers::*;
pub use system_handlers::*;
