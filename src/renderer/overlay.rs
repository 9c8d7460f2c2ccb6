// renderer/overlay.rs
use crate::error::RenderError;
use crate::window::Window;

use super::context::GpuContext;
use super::fps::FpsHistory;

const SPARKLINE_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARKLINE_SAMPLES: usize = 16;

/// What an overlay is told about the renderer that owns it.
#[derive(Debug, Clone)]
pub struct OverlayInit<'a> {
    pub title: &'a str,
    pub framebuffer_size: (u32, u32),
    pub fps_history_capacity: usize,
}

/// Drawn over the finished scene once per frame, just before the swap.
/// Resources it holds are released when it is dropped.
pub trait Overlay {
    fn render(&mut self, ctx: &GpuContext, window: &dyn Window, fps: &FpsHistory);
}

/// Reports frame rate statistics in the window title and the log.
pub struct StatsOverlay {
    title: String,
    reported_samples: u64,
}

impl StatsOverlay {
    pub fn new(init: &OverlayInit<'_>) -> Self {
        Self {
            title: init.title.to_owned(),
            reported_samples: 0,
        }
    }

    pub fn create(init: &OverlayInit<'_>) -> Result<Box<dyn Overlay>, RenderError> {
        Ok(Box::new(Self::new(init)))
    }
}

impl Overlay for StatsOverlay {
    fn render(&mut self, _ctx: &GpuContext, window: &dyn Window, fps: &FpsHistory) {
        if fps.total_count() == self.reported_samples {
            return;
        }
        self.reported_samples = fps.total_count();

        window.set_title(&stats_title(&self.title, fps));
        log::debug!("fps {}", sparkline(fps, SPARKLINE_SAMPLES));
    }
}

/// `"<title> | <latest> fps (peak <highest>)"`, or the bare title before
/// the first sample.
pub fn stats_title(title: &str, fps: &FpsHistory) -> String {
    match fps.latest() {
        Some(latest) => format!("{title} | {latest} fps (peak {})", fps.highest()),
        None => title.to_owned(),
    }
}

/// The newest `count` samples, oldest first, scaled against the peak.
pub fn sparkline(fps: &FpsHistory, count: usize) -> String {
    let samples = fps.samples();
    let skip = samples.len().saturating_sub(count);
    let highest = fps.highest().max(1) as f32;

    samples
        .iter()
        .skip(skip)
        .map(|&value| {
            let level = (value as f32 / highest * (SPARKLINE_BARS.len() - 1) as f32).round();
            SPARKLINE_BARS[(level as usize).min(SPARKLINE_BARS.len() - 1)]
        })
        .collect()
}
