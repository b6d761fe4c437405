//! List command - print every effect and track with its length

use gamer_audio::{MusicTrackId, SoundEffect};

pub fn execute() {
    println!("Sound effects:");
    for effect in SoundEffect::ALL {
        println!(
            "  {:<16} {:>2} tones  {:.2}s",
            effect.name(),
            effect.tones().len(),
            effect.duration_sec()
        );
    }

    println!();
    println!("Music tracks:");
    for track in MusicTrackId::ALL {
        println!(
            "  {:<16} {:>2} notes  {:.2}s per loop",
            track.name(),
            gamer_audio::music::melody(track).len(),
            track.loop_duration().as_secs_f32()
        );
    }
}
