//! Audio probing using symphonia.

use std::io::Cursor;

use bytes::Bytes;
use reverie_core::{Error, Result};
use symphonia::core::{
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    formats::FormatOptions,
    io::{MediaSourceStream, MediaSourceStreamOptions},
    meta::MetadataOptions,
    probe::Hint,
    units::{Time, TimeBase},
};
use tracing::debug;

/// What a probe learned about a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedAudio {
    /// Length in milliseconds.
    pub duration_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Check that `data` is decodable audio and measure its length.
///
/// `extension_hint` is a file extension or MIME type used to short-circuit
/// format detection.
pub fn probe_audio(data: Bytes, extension_hint: Option<&str>) -> Result<ProbedAudio> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension_hint.and_then(hint_extension) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::LoadFailed(format!("Unrecognised audio format: {e}")))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::LoadFailed("No audio tracks found".to_string()))?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params.sample_rate.unwrap_or(48000);
    let channels = params.channels.map_or(2, |c| c.count() as u16);

    // Fail now rather than at play time if the codec is unsupported.
    symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| Error::LoadFailed(format!("Unsupported codec: {e}")))?;

    let time_base = params
        .time_base
        .unwrap_or_else(|| TimeBase::new(1, sample_rate));

    let frames = if let Some(n_frames) = params.n_frames {
        n_frames
    } else {
        // No frame count in the container header: walk the packets.
        let mut total = 0u64;
        loop {
            match format.next_packet() {
                Ok(packet) if packet.track_id() == track_id => total += packet.dur(),
                Ok(_) => {}
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    return Err(Error::LoadFailed(format!("Failed to read packet: {e}")));
                }
            }
        }
        total
    };

    let duration_ms = time_to_millis(time_base.calc_time(frames));
    debug!(
        "Probed audio: {} ms, {} Hz, {} channels",
        duration_ms, sample_rate, channels
    );

    Ok(ProbedAudio {
        duration_ms,
        sample_rate,
        channels,
    })
}

fn time_to_millis(time: Time) -> u64 {
    time.seconds * 1000 + (time.frac * 1000.0).round() as u64
}

/// Map a MIME type or extension to the extension symphonia expects.
fn hint_extension(hint: &str) -> Option<&'static str> {
    let hint = hint.to_ascii_lowercase();
    if hint.contains("webm") || hint.contains("opus") {
        Some("webm")
    } else if hint.contains("mp4") || hint.contains("m4a") || hint.contains("aac") {
        Some("m4a")
    } else if hint.contains("mp3") || hint.contains("mpeg") {
        Some("mp3")
    } else if hint.contains("ogg") || hint.contains("vorbis") {
        Some("ogg")
    } else if hint.contains("flac") {
        Some("flac")
    } else if hint.contains("wav") {
        Some("wav")
    } else if hint.contains("caf") {
        Some("caf")
    } else {
        None
    }
}

/// Write a mono 16-bit PCM WAV of `millis` of silence at 8 kHz.
#[cfg(test)]
pub(crate) fn silent_wav(millis: u32) -> Vec<u8> {
    const RATE: u32 = 8000;
    let data_len = RATE * millis / 1000 * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&RATE.to_le_bytes());
    out.extend_from_slice(&(RATE * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}
