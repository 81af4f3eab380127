pub mod parser;
pub mod scraper;
pub mod types;
pub mod utils;

pub use parser::{ParseError, parse_course_listing};
pub use scraper::{ScraperConfig, ScraperError, WebScraper};
pub use types::{CourseRecord, Field, SENTINEL, Units};

pub const BASE_URL: &str = "https://apps.ualberta.ca/catalogue/course";
pub const CATALOGUE_HOST: &str = "https://apps.ualberta.ca";
