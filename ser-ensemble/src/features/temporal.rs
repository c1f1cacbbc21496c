//! Frame-wise time-domain features

use super::stft::{frame_count, HOP_LENGTH, N_FFT};

/// Analysis frame length for time-domain features
pub const FRAME_LENGTH: usize = N_FFT;

/// Samples this close to zero count as zero when looking for sign changes
const ZERO_THRESHOLD: f32 = 1e-10;

/// Fraction of sign changes per frame (edge-padded, centred frames).
pub fn zero_crossing_rate(samples: &[f32]) -> Vec<f32> {
    let first = samples.first().copied().unwrap_or(0.0);
    let last = samples.last().copied().unwrap_or(0.0);
    let padded = pad_centred(samples, first, last);

    let negative: Vec<bool> = padded
        .iter()
        .map(|&x| {
            let x = if x.abs() <= ZERO_THRESHOLD { 0.0 } else { x };
            x.is_sign_negative()
        })
        .collect();

    (0..frame_count(samples.len(), HOP_LENGTH))
        .map(|t| {
            let frame = &negative[t * HOP_LENGTH..t * HOP_LENGTH + FRAME_LENGTH];
            let crossings = frame.windows(2).filter(|w| w[0] != w[1]).count();
            crossings as f32 / FRAME_LENGTH as f32
        })
        .collect()
}

/// Root-mean-square energy per frame (zero-padded, centred frames).
pub fn rms(samples: &[f32]) -> Vec<f32> {
    let padded = pad_centred(samples, 0.0, 0.0);

    (0..frame_count(samples.len(), HOP_LENGTH))
        .map(|t| {
            let frame = &padded[t * HOP_LENGTH..t * HOP_LENGTH + FRAME_LENGTH];
            let power: f64 = frame.iter().map(|&x| (x as f64) * (x as f64)).sum();
            (power / FRAME_LENGTH as f64).sqrt() as f32
        })
        .collect()
}

fn pad_centred(samples: &[f32], left: f32, right: f32) -> Vec<f32> {
    let pad = FRAME_LENGTH / 2;
    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
    padded.extend(std::iter::repeat(left).take(pad));
    padded.extend_from_slice(samples);
    padded.extend(std::iter::repeat(right).take(pad));
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zcr_of_alternating_signal() {
        let samples: Vec<f32> = (0..8192).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let zcr = zero_crossing_rate(&samples);
        assert_eq!(zcr.len(), frame_count(samples.len(), HOP_LENGTH));
        // interior frames change sign on every step
        let mid = zcr[zcr.len() / 2];
        assert!((mid - (FRAME_LENGTH - 1) as f32 / FRAME_LENGTH as f32).abs() < 1e-6);
    }

    #[test]
    fn test_zcr_ignores_tiny_values() {
        let samples: Vec<f32> = (0..4096).map(|i| if i % 2 == 0 { 1e-12 } else { -1e-12 }).collect();
        assert!(zero_crossing_rate(&samples).iter().all(|&z| z == 0.0));
    }

    #[test]
    fn test_rms_of_constant() {
        let samples = vec![0.5f32; 10_000];
        let energy = rms(&samples);
        // frames fully inside the signal
        assert!((energy[energy.len() / 2] - 0.5).abs() < 1e-6);
        // first frame is half padding
        assert!((energy[0] - (0.125f32).sqrt()).abs() < 1e-3);
    }

    #[test]
    fn test_silence() {
        let samples = vec![0.0f32; 3000];
        assert!(rms(&samples).iter().all(|&r| r == 0.0));
        assert!(zero_crossing_rate(&samples).iter().all(|&z| z == 0.0));
    }
}
