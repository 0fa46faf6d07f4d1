use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Latest snapshot of water-quality measurements, exactly as returned under
/// `data.me.pool.latestReading`.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reading(Map<String, Value>);

impl Reading {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

// Response envelope for the latest reading query
#[derive(Debug, Deserialize)]
pub(crate) struct ReadingResponse {
    pub data: ReadingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadingData {
    pub me: Me,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Me {
    pub pool: Pool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Pool {
    pub latest_reading: Reading,
}
