use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::sonar::{ToneParams, Waveform};

/// One-shot synthesized sound, mixed on the audio thread until finished.
pub trait Voice: Send {
    /// Next mono sample, called at the device sample rate.
    fn next_sample(&mut self, sample_rate: f32) -> f32;
    fn finished(&self) -> bool;
}

/// Parameter mailbox for the continuous sonar tone. The game thread writes
/// targets, the audio callback smooths toward them per sample.
struct SonarShared {
    active: AtomicBool,
    frequency_bits: AtomicU32,
    gain_bits: AtomicU32,
    waveform: AtomicU8,
    tau_bits: AtomicU32,
}

impl SonarShared {
    fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            frequency_bits: AtomicU32::new(220.0f32.to_bits()),
            gain_bits: AtomicU32::new(0),
            waveform: AtomicU8::new(0),
            tau_bits: AtomicU32::new(0.02f32.to_bits()),
        }
    }
}

fn waveform_code(waveform: Waveform) -> u8 {
    match waveform {
        Waveform::Sine => 0,
        Waveform::Square => 1,
        Waveform::Triangle => 2,
    }
}

fn waveform_sample(code: u8, phase: f32) -> f32 {
    match code {
        1 => {
            // Square runs hot; pull it down to sit with the sine.
            if phase < 0.5 {
                0.35
            } else {
                -0.35
            }
        }
        2 => 4.0 * (phase - 0.5).abs() - 1.0,
        _ => (phase * std::f32::consts::TAU).sin(),
    }
}

/// Output mixer: one persistent sonar oscillator plus fire-and-forget cue
/// voices. A missing or unsupported output device soft-disables the whole
/// engine; every call becomes a no-op and gameplay never notices.
pub struct AudioEngine {
    enabled: bool,
    _stream: Option<cpal::Stream>,
    sonar: Arc<SonarShared>,
    cues: Arc<Mutex<Vec<Box<dyn Voice>>>>,
}

impl AudioEngine {
    pub fn new() -> Self {
        let sonar = Arc::new(SonarShared::new());
        let cues: Arc<Mutex<Vec<Box<dyn Voice>>>> = Arc::new(Mutex::new(Vec::new()));
        match Self::build_stream(Arc::clone(&sonar), Arc::clone(&cues)) {
            Ok(stream) => Self {
                enabled: true,
                _stream: Some(stream),
                sonar,
                cues,
            },
            Err(err) => {
                eprintln!("[QUARRY] audio disabled: {err}");
                Self {
                    enabled: false,
                    _stream: None,
                    sonar,
                    cues,
                }
            }
        }
    }

    /// Engine that never touches a device. Used by headless runs and tests.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            _stream: None,
            sonar: Arc::new(SonarShared::new()),
            cues: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn build_stream(
        sonar: Arc<SonarShared>,
        cues: Arc<Mutex<Vec<Box<dyn Voice>>>>,
    ) -> Result<cpal::Stream, String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "no output device".to_string())?;
        let config = device
            .default_output_config()
            .map_err(|e| format!("no output config: {e}"))?;
        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(format!(
                "unsupported sample format {:?}",
                config.sample_format()
            ));
        }
        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let mut phase = 0.0f32;
        let mut frequency = f32::from_bits(sonar.frequency_bits.load(Ordering::Relaxed));
        let mut gain = 0.0f32;

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let target_freq = f32::from_bits(sonar.frequency_bits.load(Ordering::Relaxed));
                    let target_gain = if sonar.active.load(Ordering::Relaxed) {
                        f32::from_bits(sonar.gain_bits.load(Ordering::Relaxed))
                    } else {
                        0.0
                    };
                    let tau = f32::from_bits(sonar.tau_bits.load(Ordering::Relaxed)).max(1e-3);
                    let alpha = 1.0 - (-1.0 / (tau * sample_rate)).exp();
                    let wave = sonar.waveform.load(Ordering::Relaxed);

                    let mut voices = match cues.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };

                    for frame in data.chunks_mut(channels) {
                        frequency += (target_freq - frequency) * alpha;
                        gain += (target_gain - gain) * alpha;
                        phase = (phase + frequency / sample_rate).fract();

                        let mut mixed = waveform_sample(wave, phase) * gain;
                        for voice in voices.iter_mut() {
                            mixed += voice.next_sample(sample_rate);
                        }
                        let sample = mixed.clamp(-1.0, 1.0);
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                    voices.retain(|voice| !voice.finished());
                },
                |err| eprintln!("[QUARRY] audio stream error: {err}"),
                None,
            )
            .map_err(|e| format!("stream build failed: {e}"))?;
        stream.play().map_err(|e| format!("stream start failed: {e}"))?;
        Ok(stream)
    }

    /// Queue a one-shot cue. Never interrupts the continuous tone.
    pub fn play(&self, voice: Box<dyn Voice>) {
        if !self.enabled {
            return;
        }
        if let Ok(mut cues) = self.cues.lock() {
            cues.push(voice);
        }
    }

    pub fn sonar_on(&self) {
        self.sonar.active.store(true, Ordering::Relaxed);
    }

    pub fn sonar_off(&self) {
        self.sonar.active.store(false, Ordering::Relaxed);
    }

    pub fn set_sonar(&self, params: ToneParams, smoothing_tau: f32) {
        self.sonar
            .frequency_bits
            .store(params.frequency.to_bits(), Ordering::Relaxed);
        self.sonar
            .gain_bits
            .store(params.gain.to_bits(), Ordering::Relaxed);
        self.sonar
            .waveform
            .store(waveform_code(params.waveform), Ordering::Relaxed);
        self.sonar
            .tau_bits
            .store(smoothing_tau.to_bits(), Ordering::Relaxed);
    }
}

/// Fixed-pitch beep with a linear fade-out.
pub struct Beep {
    frequency: f32,
    gain: f32,
    duration: f32,
    remaining: f32,
    phase: f32,
}

impl Beep {
    pub fn new(frequency: f32, duration: f32, gain: f32) -> Self {
        Self {
            frequency,
            gain,
            duration,
            remaining: duration,
            phase: 0.0,
        }
    }
}

impl Voice for Beep {
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if self.finished() {
            return 0.0;
        }
        self.phase = (self.phase + self.frequency / sample_rate).fract();
        let envelope = (self.remaining / self.duration).clamp(0.0, 1.0);
        self.remaining -= 1.0 / sample_rate;
        (self.phase * std::f32::consts::TAU).sin() * self.gain * envelope
    }

    fn finished(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// Linear pitch sweep, rising or falling, with a fade-out.
pub struct Sweep {
    from: f32,
    to: f32,
    gain: f32,
    duration: f32,
    t: f32,
    phase: f32,
}

impl Sweep {
    pub fn new(from: f32, to: f32, duration: f32, gain: f32) -> Self {
        Self {
            from,
            to,
            gain,
            duration,
            t: 0.0,
            phase: 0.0,
        }
    }
}

impl Voice for Sweep {
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if self.finished() {
            return 0.0;
        }
        let progress = (self.t / self.duration).clamp(0.0, 1.0);
        let frequency = self.from + (self.to - self.from) * progress;
        self.phase = (self.phase + frequency / sample_rate).fract();
        self.t += 1.0 / sample_rate;
        let envelope = 1.0 - progress;
        (self.phase * std::f32::consts::TAU).sin() * self.gain * envelope
    }

    fn finished(&self) -> bool {
        self.t >= self.duration
    }
}

// Cue palette.

pub fn countdown_beep() -> Box<dyn Voice> {
    Box::new(Beep::new(660.0, 0.12, 0.5))
}

pub fn go_signal() -> Box<dyn Voice> {
    Box::new(Sweep::new(440.0, 880.0, 0.3, 0.6))
}

pub fn alert_chirp() -> Box<dyn Voice> {
    Box::new(Sweep::new(700.0, 1150.0, 0.15, 0.45))
}

pub fn lost_contact() -> Box<dyn Voice> {
    Box::new(Sweep::new(620.0, 240.0, 0.5, 0.4))
}

pub fn contact_bonk() -> Box<dyn Voice> {
    Box::new(Sweep::new(220.0, 55.0, 0.25, 0.9))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beep_fades_and_finishes_after_its_duration() {
        let mut beep = Beep::new(440.0, 0.01, 0.5);
        let sample_rate = 48_000.0;
        let mut peak = 0.0f32;
        let mut samples = 0;
        while !beep.finished() {
            peak = peak.max(beep.next_sample(sample_rate).abs());
            samples += 1;
            assert!(samples < 48_000, "beep never finished");
        }
        assert!(peak <= 0.5 + 1e-4);
        assert!((samples as f32 - 0.01 * sample_rate).abs() <= 2.0);
    }

    #[test]
    fn sweep_moves_pitch_toward_its_target() {
        let mut sweep = Sweep::new(600.0, 200.0, 0.01, 1.0);
        let sample_rate = 48_000.0;
        while !sweep.finished() {
            sweep.next_sample(sample_rate);
        }
        assert!(sweep.finished());
        assert_eq!(sweep.next_sample(sample_rate), 0.0);
    }

    #[test]
    fn disabled_engine_swallows_everything() {
        let engine = AudioEngine::disabled();
        assert!(!engine.is_enabled());
        engine.play(countdown_beep());
        engine.sonar_on();
        engine.set_sonar(
            ToneParams {
                frequency: 300.0,
                gain: 0.5,
                waveform: Waveform::Sine,
            },
            0.02,
        );
        engine.sonar_off();
        assert!(engine.cues.lock().unwrap().is_empty());
    }

    #[test]
    fn waveforms_stay_within_unit_range() {
        for code in 0..3u8 {
            for i in 0..100 {
                let phase = i as f32 / 100.0;
                let s = waveform_sample(code, phase);
                assert!(s.abs() <= 1.0 + 1e-6);
            }
        }
    }
}
