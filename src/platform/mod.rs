//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time/seeds
//! - Input mapping (keys, pointer positions)
//! - FPS measurement

use glam::Vec2;

/// Host-level commands produced by keyboard/pointer input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Dodge,
    Duck,
    Pause,
    /// Start from a menu, or restart after GAME_OVER
    Start,
    StartDemo,
}

/// Map a `KeyboardEvent.key` value to an action
pub fn map_key(key: &str) -> Option<InputAction> {
    match key {
        " " | "ArrowUp" | "w" | "W" => Some(InputAction::Dodge),
        "ArrowDown" | "s" | "S" => Some(InputAction::Duck),
        "Escape" | "p" | "P" => Some(InputAction::Pause),
        "Enter" => Some(InputAction::Start),
        "d" | "D" => Some(InputAction::StartDemo),
        _ => None,
    }
}

/// Pointer position in canvas pixels -> [0,1] screen coordinates
pub fn normalize_pointer(x: f32, y: f32, width: f32, height: f32) -> Option<Vec2> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        (x / width).clamp(0.0, 1.0),
        (y / height).clamp(0.0, 1.0),
    ))
}

/// Pointer in the lower part of the screen ducks, anywhere else dodges
pub fn pointer_action(pos: Vec2) -> InputAction {
    if pos.y > 0.66 {
        InputAction::Duck
    } else {
        InputAction::Dodge
    }
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// RNG seed from the wall clock
pub fn clock_seed() -> u64 {
    now_ms() as u64
}

const FPS_WINDOW: usize = 60;

/// Rolling FPS over the last 60 frames
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frame_times: [f64; FPS_WINDOW],
    frame_index: usize,
    fps: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            fps: 0,
        }
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `time` (ms) and return the current FPS
    pub fn record(&mut self, time: f64) -> u32 {
        self.frame_times[self.frame_index] = time;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;

        // Oldest sample is the slot we will overwrite next
        let oldest_time = self.frame_times[self.frame_index];
        if oldest_time > 0.0 {
            let elapsed = time - oldest_time;
            if elapsed > 0.0 {
                self.fps = ((FPS_WINDOW - 1) as f64 * 1000.0 / elapsed).round() as u32;
            }
        }
        self.fps
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}
