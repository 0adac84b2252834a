//! In-memory trade sequence with a durable CSV append log.

use crate::error::LedgerResult;
use parking_lot::Mutex;
use pulse_core::TradeRecord;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HEADER: [&str; 6] = ["symbol", "qty", "side", "price", "time", "portfolio_balance"];

/// Append-only trade ledger.
///
/// Insertion order is fill order and is never reordered. Appends happen
/// under one exclusive lock so the in-memory sequence and the log file
/// stay consistent and no fill is ever appended twice.
pub struct TradeLedger {
    inner: Mutex<Inner>,
    log_path: PathBuf,
}

struct Inner {
    trades: Vec<TradeRecord>,
}

impl TradeLedger {
    /// Open the ledger. The log file is created (with its header) on the
    /// first append, not here; existing files keep their rows and header.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        let log_path = log_path.into();
        info!(path = %log_path.display(), "Trade ledger opened");
        Self {
            inner: Mutex::new(Inner { trades: Vec::new() }),
            log_path,
        }
    }

    /// Append a completed trade.
    ///
    /// The durable CSV row is written before the in-memory append returns,
    /// so a caller holding the returned `Ok` knows the trade is on disk.
    /// On a file error the in-memory sequence still grows and the error is
    /// surfaced to the caller.
    pub fn record(&self, trade: TradeRecord) -> LedgerResult<()> {
        let mut inner = self.inner.lock();
        let result = append_row(&self.log_path, &trade);
        debug!(
            symbol = %trade.symbol,
            side = %trade.side,
            price = %trade.price,
            "Trade recorded"
        );
        inner.trades.push(trade);
        result
    }

    /// All trades in fill order. Re-enumerable without side effects.
    pub fn all_trades(&self) -> Vec<TradeRecord> {
        self.inner.lock().trades.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().trades.is_empty()
    }
}

/// Append one CSV row, writing the header first iff the file is new.
fn append_row(path: &Path, trade: &TradeRecord) -> LedgerResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_exists = path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if !file_exists {
        writer.write_record(HEADER)?;
    }

    writer.write_record([
        trade.symbol.as_str(),
        &trade.qty.to_string(),
        &trade.side.to_string(),
        &trade.price.to_string(),
        &trade.time.to_rfc3339(),
        &trade
            .portfolio_balance
            .map(|b| b.to_string())
            .unwrap_or_default(),
    ])?;
    writer.flush()?;
    Ok(())
}
