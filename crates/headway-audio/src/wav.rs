//! WAV container encoding for captured waveforms.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use headway_core::error::{HeadwayError, Result};
use headway_core::types::Waveform;

/// Encode a waveform as a standard PCM WAV byte buffer:
/// 1 channel, 16-bit samples, the waveform's sample rate.
pub fn encode_wav(waveform: &Waveform) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)
        .map_err(|e| HeadwayError::Audio(format!("WAV encoding failed: {e}")))?;
    for &sample in &waveform.samples {
        writer
            .write_sample(sample)
            .map_err(|e| HeadwayError::Audio(format!("WAV encoding failed: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| HeadwayError::Audio(format!("WAV encoding failed: {e}")))?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(samples: Vec<i16>) -> Waveform {
        Waveform {
            samples,
            sample_rate: 16_000,
        }
    }

    #[test]
    fn test_wav_header_shape() {
        let bytes = encode_wav(&wave(vec![0, 1, -1, 100])).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // Mono at offset 22, sample rate at offset 24 (little-endian).
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 1);
        assert_eq!(
            u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
            16_000
        );
        // 16 bits per sample at offset 34.
        assert_eq!(u16::from_le_bytes([bytes[34], bytes[35]]), 16);
    }

    #[test]
    fn test_wav_data_length_matches_samples() {
        let bytes = encode_wav(&wave(vec![7i16; 250])).unwrap();
        // 44-byte canonical header + 2 bytes per sample.
        assert_eq!(bytes.len(), 44 + 250 * 2);
    }

    #[test]
    fn test_wav_round_trips_samples() {
        let samples = vec![0i16, 32_767, -32_768, 1234, -4321];
        let bytes = encode_wav(&wave(samples.clone())).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().channels, 1);
        let decoded: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_empty_waveform_encodes() {
        let bytes = encode_wav(&wave(Vec::new())).unwrap();
        assert_eq!(bytes.len(), 44);
    }
}
