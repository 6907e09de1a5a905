pub mod browser;
pub mod document;
pub mod extractor;
pub mod retry;
pub mod traits;
pub mod types;

pub use browser::ChromeSession;
pub use document::ResultsDocument;
pub use extractor::{extract_rooms, parse_price, Extractor, ExtractorSettings};
pub use retry::RetryPolicy;
pub use traits::{DocumentQuery, PageDriver, ReserveControl};
pub use types::SearchRequest;
