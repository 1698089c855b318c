pub mod export;
pub mod fetch;

pub use export::{read_matrix, ReportBundle, ReportWriter};
pub use fetch::{
    load_raw_projects, paginate, PageSource, ReporterClient, SearchCriteria, SearchPage,
    DEFAULT_MAX_REQUESTS,
};
