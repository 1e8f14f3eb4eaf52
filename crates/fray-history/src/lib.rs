pub mod parser;
pub mod reader;
pub mod recorder;

pub use fray_core::operation::HistoryEntry;
pub use parser::RecordParser;
pub use reader::read_events;
pub use recorder::Recorder;
