//! Edge fade envelope
//!
//! A hard start or stop at a non-zero sample value is heard as a click. Every
//! generated buffer gets a linear ramp up over its first frames and a matching
//! ramp down over its last frames; the interior is left untouched.

/// Longest fade applied at either edge, in seconds
pub const FADE_SECONDS: f32 = 0.02;

/// Number of frames faded at each edge of a buffer of `frame_count` frames.
///
/// `min(FADE_SECONDS, frame_count / 4)`, but never less than one frame for a
/// non-empty buffer so both edge samples always land on exactly zero.
pub fn fade_frames(frame_count: usize, sample_rate: u32) -> usize {
    if frame_count == 0 {
        return 0;
    }
    let max_fade = (FADE_SECONDS as f64 * sample_rate as f64).round() as usize;
    max_fade.min(frame_count / 4).max(1)
}

/// Apply the linear fade-in / fade-out in place
pub fn apply_edge_fade(samples: &mut [f32], sample_rate: u32) {
    let len = samples.len();
    let fade = fade_frames(len, sample_rate);
    if fade == 0 {
        return;
    }

    for i in 0..fade {
        let gain = i as f32 / fade as f32;
        samples[i] *= gain;
        samples[len - 1 - i] *= gain;
    }
}
