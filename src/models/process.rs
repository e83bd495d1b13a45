use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub cpu_pct: f32,
    pub mem_pct: f32,
    pub memory_bytes: u64,
    pub memory_display: String,
}

impl ProcessEntry {
    pub fn metric_value(&self, by: SortKey) -> f32 {
        match by {
            SortKey::Cpu => self.cpu_pct,
            SortKey::Mem => self.mem_pct,
        }
    }
}

impl Default for ProcessEntry {
    fn default() -> Self {
        Self {
            pid: 0,
            name: String::new(),
            cpu_pct: 0.0,
            mem_pct: 0.0,
            memory_bytes: 0,
            memory_display: String::from("0 B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Cpu,
    Mem,
}
