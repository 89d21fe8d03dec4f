use std::time::Instant;

const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_MS: u128 = 80;

pub fn spinner_frame(start: Option<Instant>) -> &'static str {
    let elapsed = start.map_or(0, |s| s.elapsed().as_millis());
    FRAMES[(elapsed / FRAME_MS) as usize % FRAMES.len()]
}
