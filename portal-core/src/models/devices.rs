// Device catalog (pumps + CGMs) as delivered by the devices endpoint.

use serde::{Deserialize, Serialize};

use super::values::FormValues;

pub const DEVICE_ID_DEXCOM_G6: &str = "d25c3f1b-a2e8-44e2-b3a3-fd07806fc245";
pub const DEVICE_ID_PALMTREE: &str = "6678c377-928c-49b3-84c1-19e2dafaff8d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub manufacturers: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Device {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            manufacturers: Vec::new(),
            model: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCatalog {
    #[serde(default)]
    pub pumps: Vec<Device>,
    #[serde(default)]
    pub cgms: Vec<Device>,
}

impl DeviceCatalog {
    pub fn pump(&self, id: &str) -> Option<&Device> {
        self.pumps.iter().find(|d| d.id == id)
    }

    pub fn cgm(&self, id: &str) -> Option<&Device> {
        self.cgms.iter().find(|d| d.id == id)
    }

    /// The pump currently selected in the prescription form, if it is in the catalog.
    pub fn selected_pump(&self, values: &FormValues) -> Option<&Device> {
        values
            .get_str("initialSettings.pumpId")
            .and_then(|id| self.pump(id))
    }
}
