// SeizeAlert - NVS Event Log
//
// Durable event log in the default NVS partition: a fixed ring of raw
// `LogRecord` slots plus a write cursor, so the log survives reboots and
// never outgrows its flash budget.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_sys::EspError;

use seizealert::reporter::{EventLog, LogError};
use seizealert::LogRecord;

const NAMESPACE: &str = "seizealert";
const CURSOR_KEY: &str = "cursor";
pub const SLOTS: u32 = 64;

pub struct NvsEventLog {
    nvs: EspNvs<NvsDefault>,
    cursor: u32,
}

impl NvsEventLog {
    pub fn open(partition: EspDefaultNvsPartition) -> anyhow::Result<Self> {
        let nvs = EspNvs::new(partition, NAMESPACE, true)?;
        let cursor = nvs.get_u32(CURSOR_KEY)?.unwrap_or(0);
        log::info!("Event log opened, {} records written so far", cursor);
        Ok(Self { nvs, cursor })
    }

    /// Most recent records, oldest first.
    pub fn recent(&self) -> Vec<LogRecord> {
        let count = self.cursor.min(SLOTS);
        let mut out = Vec::with_capacity(count as usize);
        let mut buf = [0u8; LogRecord::ENCODED_LEN];
        for n in (self.cursor - count)..self.cursor {
            if let Ok(Some(raw)) = self.nvs.get_raw(&slot_key(n), &mut buf) {
                out.extend(LogRecord::from_bytes(raw));
            }
        }
        out
    }
}

fn slot_key(n: u32) -> String {
    format!("ev{}", n % SLOTS)
}

fn storage_error(e: EspError) -> LogError {
    match e.code() as u32 {
        esp_idf_sys::ESP_ERR_NVS_NOT_ENOUGH_SPACE => LogError::Full,
        esp_idf_sys::ESP_ERR_NVS_NOT_FOUND => LogError::NotFound,
        esp_idf_sys::ESP_ERR_NVS_INVALID_NAME | esp_idf_sys::ESP_ERR_NVS_INVALID_LENGTH => LogError::InvalidParams,
        esp_idf_sys::ESP_ERR_NVS_INVALID_HANDLE => LogError::Closed,
        _ => LogError::Storage(e.to_string()),
    }
}

impl EventLog for NvsEventLog {
    fn append(&mut self, record: LogRecord) -> Result<(), LogError> {
        self.nvs
            .set_raw(&slot_key(self.cursor), &record.to_bytes())
            .map_err(storage_error)?;
        self.cursor = self.cursor.wrapping_add(1);
        self.nvs
            .set_u32(CURSOR_KEY, self.cursor)
            .map_err(storage_error)
    }
}
