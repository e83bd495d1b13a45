use image::Rgba;

use crate::models::Metric;

pub(crate) struct Colours {
    pub background: Rgba<u8>,
    pub grid: Rgba<u8>,
    pub border: Rgba<u8>,
    pub cpu: Rgba<u8>,
    pub mem: Rgba<u8>,
    pub disk: Rgba<u8>,
}

impl Default for Colours {
    fn default() -> Self {
        Self {
            background: Rgba([0, 0, 0, 255]),
            grid: Rgba([60, 60, 60, 255]),
            border: Rgba([100, 100, 100, 255]),
            cpu: Rgba([87, 174, 36, 255]),  // Vibrant green
            mem: Rgba([52, 101, 164, 255]), // Royal blue
            disk: Rgba([204, 0, 0, 255]),   // Crimson
        }
    }
}

impl Colours {
    pub fn metric(&self, metric: Metric) -> Rgba<u8> {
        match metric {
            Metric::Cpu => self.cpu,
            Metric::Mem => self.mem,
            Metric::Disk => self.disk,
        }
    }
}
