mod entries;
mod porcelain;
mod record;
mod udiff;

pub use entries::parse_entries;
#[allow(unused_imports)]
pub use porcelain::{parse_porcelain, parse_porcelain_with, BlameHeader, HeaderCache};
#[allow(unused_imports)]
pub use record::{BlameRecord, BlameTime};
#[allow(unused_imports)]
pub use udiff::{scan, DiffEvent, DiffScanner};
