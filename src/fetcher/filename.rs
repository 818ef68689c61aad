//! Date extraction from published filenames
//!
//! Published files are named `<PREFIX>_<YYYYMMDD>.<ext>`, e.g. `TC_20231006.txt`.
//! An index that carries no publication answers with a filename lacking that
//! date part.

use crate::TradeDate;

/// Extract the embedded date: the text after the first `_` up to the next `.`
pub fn extract_date(filename: &str) -> Option<TradeDate> {
    let (_, rest) = filename.split_once('_')?;
    let candidate = rest.split('.').next()?;
    candidate.parse().ok()
}
