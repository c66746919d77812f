use std::time::{Duration, Instant};
use winit::window::Window;

/// Frame cadence and the fps readout in the window title.
pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_fps_time: Instant,
    frame_count: u32,
    frame_dt: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_frame_time: None,
            last_fps_time: Instant::now(),
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            base_title,
        }
    }

    /// Records a frame. Every half second the title is refreshed with the
    /// frame rate and `status`.
    pub fn update(&mut self, window: Option<&Window>, now: Instant, status: &str) {
        let dt_duration = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_millis(16),
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().max(0.0);

        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_fps_time);
        if elapsed.as_secs_f32() >= 0.5 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            if let Some(window) = window {
                window.set_title(&self.title(fps, status));
            }
            self.frame_count = 0;
            self.last_fps_time = now;
        }
    }

    fn title(&self, fps: f32, status: &str) -> String {
        format!(
            "{} - {:.1} fps ({:.1} ms) - {}",
            self.base_title,
            fps,
            self.frame_dt * 1000.0,
            status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_dt_tracks_wall_clock() {
        let mut timing = FrameTiming::new("Stillpoint".to_string());
        let start = Instant::now();
        timing.update(None, start, "");
        assert!((timing.frame_dt - 0.016).abs() < 1e-6);
        timing.update(None, start + Duration::from_millis(40), "");
        assert!((timing.frame_dt - 0.040).abs() < 1e-4);
    }

    #[test]
    fn title_carries_cadence_and_status() {
        let mut timing = FrameTiming::new("Stillpoint".to_string());
        let start = Instant::now();
        timing.update(None, start, "");
        timing.update(None, start + Duration::from_millis(20), "");
        assert_eq!(
            timing.title(59.96, "Move | Tree"),
            "Stillpoint - 60.0 fps (20.0 ms) - Move | Tree"
        );
    }
}
