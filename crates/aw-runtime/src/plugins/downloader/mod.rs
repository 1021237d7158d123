mod awql;
mod noop;
mod table;

pub use awql::{AwqlDownloaderParams, AwqlReportDownloader};
pub use noop::NoOpAlertReportDownloader;
pub use table::{ColumnMapping, TableDownloaderParams, TableQuery, TableReportDownloader};
