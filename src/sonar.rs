use crate::audio::AudioEngine;
use crate::settings::SonarSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
}

/// Oscillator parameters for the continuous proximity tone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToneParams {
    pub frequency: f32,
    pub gain: f32,
    pub waveform: Waveform,
}

/// Map opponent distance and closing speed to tone parameters.
///
/// Below the solid threshold the normal falloff is ignored entirely: the
/// alarm pitch rises linearly as the gap shrinks, whether the opponent is
/// closing or opening. Otherwise the sign of the closing speed selects a
/// branch with its own range, volume and base pitch, and volume falls off
/// quadratically with distance.
pub fn tone_params(distance: f32, closing_speed: f32, cfg: &SonarSettings) -> ToneParams {
    if distance < cfg.solid_distance {
        let proximity = 1.0 - (distance / cfg.solid_distance).clamp(0.0, 1.0);
        return ToneParams {
            frequency: cfg.solid_base_pitch + proximity * cfg.solid_pitch_range,
            gain: cfg.closing.volume.max(cfg.opening.volume) * cfg.master_volume,
            waveform: Waveform::Square,
        };
    }

    let branch = if closing_speed > 0.0 {
        &cfg.closing
    } else {
        &cfg.opening
    };
    let falloff = (1.0 - distance / branch.max_distance).max(0.0);
    let gain = falloff * falloff * branch.volume * cfg.master_volume;
    let frequency = if cfg.pitch_mod_enabled {
        branch.base_pitch + falloff * falloff * cfg.pitch_mod_range
    } else {
        branch.base_pitch
    };
    ToneParams {
        frequency,
        gain,
        waveform: Waveform::Sine,
    }
}

/// Continuous-tone lifecycle. The tone exists only between `start` and
/// `stop`; `update` is a no-op outside that window.
pub struct Sonar {
    active: bool,
}

impl Sonar {
    pub fn new() -> Self {
        Self { active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self, audio: &AudioEngine) {
        self.active = true;
        audio.sonar_on();
    }

    pub fn stop(&mut self, audio: &AudioEngine) {
        self.active = false;
        audio.sonar_off();
    }

    pub fn update(
        &self,
        distance: f32,
        closing_speed: f32,
        cfg: &SonarSettings,
        audio: &AudioEngine,
    ) {
        if !self.active {
            return;
        }
        audio.set_sonar(tone_params(distance, closing_speed, cfg), cfg.smoothing_tau);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SonarSettings {
        SonarSettings::default()
    }

    #[test]
    fn volume_is_zero_at_and_beyond_branch_max_distance() {
        let cfg = cfg();
        let closing = tone_params(cfg.closing.max_distance, 1.0, &cfg);
        assert_eq!(closing.gain, 0.0);
        let opening = tone_params(cfg.opening.max_distance + 10.0, -1.0, &cfg);
        assert_eq!(opening.gain, 0.0);
    }

    #[test]
    fn volume_approaches_branch_volume_times_master_at_zero_distance() {
        let mut cfg = cfg();
        cfg.solid_distance = 0.0; // disable the alarm override for this check
        let closing = tone_params(0.0, 1.0, &cfg);
        assert!((closing.gain - cfg.closing.volume * cfg.master_volume).abs() < 1e-6);
        let opening = tone_params(0.0, -1.0, &cfg);
        assert!((opening.gain - cfg.opening.volume * cfg.master_volume).abs() < 1e-6);
    }

    #[test]
    fn falloff_is_quadratic() {
        let mut cfg = cfg();
        cfg.solid_distance = 0.0;
        let half = tone_params(cfg.closing.max_distance * 0.5, 1.0, &cfg);
        let full = tone_params(0.0, 1.0, &cfg);
        assert!((half.gain - full.gain * 0.25).abs() < 1e-6);
    }

    #[test]
    fn closing_speed_sign_selects_the_branch() {
        let cfg = cfg();
        let closing = tone_params(20.0, 2.5, &cfg);
        let opening = tone_params(20.0, -2.5, &cfg);
        assert_ne!(closing, opening);
        assert!(closing.frequency >= cfg.closing.base_pitch);
        assert!(opening.frequency >= cfg.opening.base_pitch);
        assert!(opening.frequency < cfg.closing.base_pitch);
    }

    #[test]
    fn pitch_modulation_can_be_disabled() {
        let mut cfg = cfg();
        cfg.pitch_mod_enabled = false;
        let near = tone_params(cfg.solid_distance + 0.5, 1.0, &cfg);
        assert_eq!(near.frequency, cfg.closing.base_pitch);
    }

    #[test]
    fn solid_override_activates_strictly_below_the_threshold() {
        let cfg = cfg();
        let at = tone_params(cfg.solid_distance, 1.0, &cfg);
        assert_eq!(at.waveform, Waveform::Sine);
        let below = tone_params(cfg.solid_distance - 0.01, -1.0, &cfg);
        assert_eq!(below.waveform, Waveform::Square);
    }

    #[test]
    fn solid_pitch_rises_monotonically_toward_zero_distance() {
        let cfg = cfg();
        let far = tone_params(cfg.solid_distance * 0.75, 1.0, &cfg);
        let mid = tone_params(cfg.solid_distance * 0.4, 1.0, &cfg);
        let touch = tone_params(0.0, -1.0, &cfg);
        assert!(far.frequency < mid.frequency);
        assert!(mid.frequency < touch.frequency);
        assert!((touch.frequency - (cfg.solid_base_pitch + cfg.solid_pitch_range)).abs() < 1e-4);
    }

    #[test]
    fn inactive_sonar_ignores_updates() {
        let audio = AudioEngine::disabled();
        let sonar = Sonar::new();
        // Must not panic or flip anything on; just a no-op.
        sonar.update(10.0, 1.0, &cfg(), &audio);
        assert!(!sonar.is_active());
    }
}
