use std::fs::File;
use std::path::Path;

use log::info;

use crate::data::bar::Bar;
use crate::error::Result;

/// Reads bars from a headered CSV file with `open`, `close`, `high` and `low`
/// columns. Other columns are ignored.
pub fn load_bars<P: AsRef<Path>>(path: P) -> Result<Vec<Bar>> {
    let file = File::open(&path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let bar: Bar = record?;
        bars.push(bar);
    }

    info!("loaded {} bars from {}", bars.len(), path.as_ref().display());
    Ok(bars)
}
