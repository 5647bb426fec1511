//! Service layer
//!
//! Business logic shared by the REST handlers and tests. Services are
//! stateless; all session state lives in `AppState`.

pub mod chart_service;
pub mod data_service;
pub mod export_service;
pub mod selection_service;

pub use chart_service::ChartService;
pub use data_service::DataService;
pub use export_service::ExportService;
pub use selection_service::SelectionService;
