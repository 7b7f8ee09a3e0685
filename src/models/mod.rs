// Domain models: appliance payloads and typed report rows

mod definition;
mod job;
mod rows;
mod site;

pub use definition::{DataDef, Direction, Filter, ReportDefinition, Source, TimeWindow, TopBy};
pub use job::{DataDefHandle, DataMeta, DataPayload, JobState, ReportInstance, StatusPayload};
pub use rows::{NO_DATA_UPLINK, UplinkSample, UplinkSummary, decode_rows};
pub use site::{Site, SiteRef, SiteSearch};
