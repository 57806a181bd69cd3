pub mod audit_event;
pub mod parameter;
pub mod photo;
pub mod product;
pub mod record;
pub mod report;
pub mod user;

pub use audit_event::AuditEvent;
pub use parameter::Parameter;
pub use photo::Photo;
pub use product::Product;
pub use record::{ControlReading, QualityRecord, RecordDetail};
pub use user::User;
