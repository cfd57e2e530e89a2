#![no_main]

use libfuzzer_sys::fuzz_target;
use onerep::model::{PhaseSettings, TimerPhase};
use onerep::phase::PhaseTimer;

fuzz_target!(|data: &[u8]| {
    let Some((head, ops)) = data.split_first_chunk::<6>() else {
        return;
    };
    let mut settings = PhaseSettings::default();
    for (phase, seconds) in TimerPhase::ALL
        .iter()
        .filter(|p| **p != TimerPhase::Complete)
        .zip(head)
    {
        settings.set_duration(*phase, u32::from(*seconds % 8));
    }

    let mut timer = PhaseTimer::new(settings);
    timer.set_negative_only(head[0] & 0x80 != 0);
    for op in ops {
        match op % 7 {
            0 => {
                timer.start(TimerPhase::Prep);
            }
            1 | 2 => {
                timer.tick();
            }
            3 => {
                timer.pause();
            }
            4 => {
                timer.resume();
            }
            5 => {
                timer.skip();
            }
            _ => timer.reset_phase(),
        }
        assert!(timer.remaining() <= timer.phase_duration());
        if timer.is_negative_only() {
            assert!(!matches!(
                timer.phase(),
                TimerPhase::Concentric | TimerPhase::FinalEccentric
            ));
        }
        let progress = timer.progress();
        assert!((0.0..=1.0).contains(&progress));
    }
});
