//! WAV boundary: decode into [`AudioBuffer`], encode results back out
//!
//! The core itself never touches the filesystem; hosts call these helpers
//! around [`crate::process`]. Decoding rejects files above a hard sample
//! cap before allocating. Encoding does not clip; hosts wanting clamped
//! output post-process first.

use std::path::Path;

use crate::buffer::AudioBuffer;
use crate::error::{RestoreError, RestoreResult};

/// Decode cap: total samples across all channels.
pub const MAX_DECODE_SAMPLES: usize = 500_000_000;

/// Decode a WAV file into an interleaved float buffer.
pub fn decode_wav<P: AsRef<Path>>(path: P) -> RestoreResult<AudioBuffer> {
    let reader =
        hound::WavReader::open(path).map_err(|e| RestoreError::Read(e.to_string()))?;

    let spec = reader.spec();
    let total = reader.len() as usize;
    if total > MAX_DECODE_SAMPLES {
        return Err(RestoreError::InputTooLarge {
            samples: total,
            limit: MAX_DECODE_SAMPLES,
        });
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .collect::<Result<Vec<i32>, _>>()
                .map_err(|e| RestoreError::Read(e.to_string()))?
                .into_iter()
                .map(|s| s as f32 / max_val)
                .collect()
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| RestoreError::Read(e.to_string()))?,
    };

    AudioBuffer::new(samples, spec.channels as usize, spec.sample_rate)
}

/// Encode a buffer to WAV at the given bit depth (16, 24 or 32-bit float).
pub fn encode_wav<P: AsRef<Path>>(
    path: P,
    buffer: &AudioBuffer,
    bit_depth: u16,
) -> RestoreResult<()> {
    if !matches!(bit_depth, 16 | 24 | 32) {
        return Err(RestoreError::InvalidInput(format!(
            "unsupported bit depth: {}",
            bit_depth
        )));
    }

    let spec = hound::WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            hound::SampleFormat::Float
        } else {
            hound::SampleFormat::Int
        },
    };

    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| RestoreError::Write(e.to_string()))?;

    match bit_depth {
        16 => {
            for &sample in buffer.samples() {
                let s = (sample.clamp(-1.0, 1.0) * 32_767.0) as i16;
                writer
                    .write_sample(s)
                    .map_err(|e| RestoreError::Write(e.to_string()))?;
            }
        }
        24 => {
            for &sample in buffer.samples() {
                let s = (sample.clamp(-1.0, 1.0) * 8_388_607.0) as i32;
                writer
                    .write_sample(s)
                    .map_err(|e| RestoreError::Write(e.to_string()))?;
            }
        }
        _ => {
            for &sample in buffer.samples() {
                writer
                    .write_sample(sample)
                    .map_err(|e| RestoreError::Write(e.to_string()))?;
            }
        }
    }

    writer
        .finalize()
        .map_err(|e| RestoreError::Write(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_round_trip() {
        let dir = std::env::temp_dir().join("wax_restore_io_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("round_trip.wav");

        let samples: Vec<f32> = (0..4_410)
            .map(|i| {
                let t = i as f32 / 44_100.0;
                (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
            })
            .collect();
        let buffer = AudioBuffer::new(samples, 1, 44_100).unwrap();

        encode_wav(&path, &buffer, 32).unwrap();
        let decoded = decode_wav(&path).unwrap();

        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.sample_rate(), 44_100);
        assert_eq!(decoded.samples().len(), buffer.samples().len());
        for (a, b) in buffer.samples().iter().zip(decoded.samples()) {
            assert!((a - b).abs() < 1e-7);
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_16_bit_encode_quantizes() {
        let dir = std::env::temp_dir().join("wax_restore_io_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sixteen.wav");

        let buffer = AudioBuffer::new(vec![0.5, -0.5, 0.25, -0.25], 2, 48_000).unwrap();
        encode_wav(&path, &buffer, 16).unwrap();
        let decoded = decode_wav(&path).unwrap();

        assert_eq!(decoded.channels(), 2);
        for (a, b) in buffer.samples().iter().zip(decoded.samples()) {
            assert!((a - b).abs() < 1e-3);
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_rejects_unsupported_bit_depth() {
        let buffer = AudioBuffer::new(vec![0.0; 4], 1, 48_000).unwrap();
        let path = std::env::temp_dir().join("wax_restore_bad_depth.wav");
        assert!(encode_wav(&path, &buffer, 8).is_err());
    }
}
