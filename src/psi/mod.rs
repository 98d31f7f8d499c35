pub mod section;
pub mod pat;
pub mod pmt;

pub use section::{SectionCollector, SectionReader};
pub use pat::{parse_pat, PatSection};
pub use pmt::{parse_pmt, PmtSection, StreamInfo};
