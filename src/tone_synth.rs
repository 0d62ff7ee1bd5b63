//! Sine tone rendering for the guided-timer cues.
//!
//! Each tone starts silent, ramps linearly to [`PEAK_GAIN`] over
//! [`ATTACK_SECONDS`], then decays exponentially to [`FLOOR_GAIN`] at the end of
//! its duration, which keeps the tone free of clicks at both edges.

pub const PEAK_GAIN: f32 = 0.3;
pub const FLOOR_GAIN: f32 = 0.01;
pub const ATTACK_SECONDS: f32 = 0.05;

const BITS_PER_SAMPLE: u16 = 16;
const WAVE_FORMAT_PCM: u16 = 1;
const CHANNELS: u16 = 1;

/// A sine tone placed `offset_seconds` after the start of its cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub duration_seconds: f32,
    pub offset_seconds: f32,
}

impl Tone {
    pub const fn new(frequency_hz: f32, duration_seconds: f32, offset_seconds: f32) -> Self {
        Self {
            frequency_hz,
            duration_seconds,
            offset_seconds,
        }
    }

    pub fn end_seconds(&self) -> f32 {
        self.offset_seconds + self.duration_seconds
    }
}

/// Gain of a tone `t` seconds after it starts.
pub fn envelope(t: f32, duration_seconds: f32) -> f32 {
    if t < 0.0 || t > duration_seconds {
        return 0.0;
    }
    if t <= ATTACK_SECONDS {
        return PEAK_GAIN * (t / ATTACK_SECONDS);
    }
    let decay_span = duration_seconds - ATTACK_SECONDS;
    if decay_span <= 0.0 {
        return PEAK_GAIN;
    }
    let position = (t - ATTACK_SECONDS) / decay_span;
    PEAK_GAIN * (FLOOR_GAIN / PEAK_GAIN).powf(position)
}

/// Mixes the tones into one mono buffer covering the longest tone.
pub fn render_tones(tones: &[Tone], sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let total_seconds = tones
        .iter()
        .map(Tone::end_seconds)
        .fold(0.0_f32, f32::max);
    let total_samples = (total_seconds * rate).ceil() as usize;
    let mut buffer = vec![0.0_f32; total_samples];

    for tone in tones {
        let first = (tone.offset_seconds * rate).round() as usize;
        let length = (tone.duration_seconds * rate).round() as usize;
        let angular = std::f32::consts::TAU * tone.frequency_hz;
        for (n, sample) in buffer.iter_mut().skip(first).take(length).enumerate() {
            let t = n as f32 / rate;
            *sample += envelope(t, tone.duration_seconds) * (angular * t).sin();
        }
    }

    for sample in &mut buffer {
        *sample = sample.clamp(-1.0, 1.0);
    }
    buffer
}

/// Encodes mono samples as a 16-bit PCM WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * u32::from(block_align);
    let data_len = (samples.len() * usize::from(block_align)) as u32;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{encode_wav, envelope, render_tones, Tone, ATTACK_SECONDS, FLOOR_GAIN, PEAK_GAIN};

    #[test]
    fn envelope_shape() {
        assert_eq!(envelope(0.0, 1.0), 0.0);
        assert!((envelope(ATTACK_SECONDS, 1.0) - PEAK_GAIN).abs() < 1e-6);
        assert!((envelope(1.0, 1.0) - FLOOR_GAIN).abs() < 1e-4);
        assert_eq!(envelope(1.2, 1.0), 0.0);
        assert!(envelope(0.5, 1.0) < PEAK_GAIN);
        assert!(envelope(0.5, 1.0) > FLOOR_GAIN);
    }

    #[test]
    fn render_covers_offset_tones() {
        let tones = [Tone::new(528.0, 1.0, 0.0), Tone::new(660.0, 0.8, 0.2)];
        let buffer = render_tones(&tones, 8_000);
        assert!((8_000..=8_001).contains(&buffer.len()));
        assert!(buffer.iter().all(|sample| (-1.0..=1.0).contains(sample)));
        assert_eq!(buffer[0], 0.0);
        assert!(buffer.iter().any(|sample| sample.abs() > 0.1));
    }

    #[test]
    fn empty_cue_renders_nothing() {
        assert!(render_tones(&[], 44_100).is_empty());
    }

    #[test]
    fn wav_header_describes_pcm_mono() {
        let bytes = encode_wav(&[0.0, 0.5, -0.5], 44_100);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(u16::from_le_bytes([bytes[20], bytes[21]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 1);
        assert_eq!(
            u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
            44_100
        );
        assert_eq!(
            u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]),
            6
        );
        assert_eq!(bytes.len(), 44 + 6);
    }
}
