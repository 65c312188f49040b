use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded audio as mono 16-bit PCM.
#[derive(Debug)]
pub struct DecodedAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    /// Length of the whole stream, which may exceed what was decoded.
    pub duration_secs: f64,
}

/// Decode at most `max_secs` seconds of an audio file to mono PCM.
///
/// Channels are averaged per frame as packets arrive, so memory stays
/// proportional to `max_secs` rather than to the file length. The sample
/// rate is left as the file's own.
pub fn decode_mono(path: &Path, max_secs: u32) -> Result<DecodedAudio> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Failed to probe audio format")?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .context("No default audio track found")?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .context("Audio track has no sample rate")?;
    #[allow(clippy::cast_precision_loss)]
    let stream_secs = codec_params
        .n_frames
        .map(|frames| frames as f64 / f64::from(sample_rate));

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let max_samples = usize::try_from(u64::from(sample_rate) * u64::from(max_secs)).unwrap_or(usize::MAX);
    let mut samples: Vec<i16> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<i16>> = None;

    while samples.len() < max_samples {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e).context("Failed to read packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let audio_buf = match decoder.decode(&packet) {
            Ok(buf) => buf,
            // Corrupt frames are skipped.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Failed to decode packet"),
        };

        let spec = *audio_buf.spec();
        let channels = spec.channels.count().max(1);
        let buf = sample_buf.get_or_insert_with(|| {
            SampleBuffer::<i16>::new(audio_buf.capacity() as u64, spec)
        });
        buf.copy_interleaved_ref(audio_buf);

        samples.extend(buf.samples().chunks(channels).map(downmix));
    }
    samples.truncate(max_samples);

    #[allow(clippy::cast_precision_loss)]
    let decoded_secs = samples.len() as f64 / f64::from(sample_rate);

    Ok(DecodedAudio {
        samples,
        sample_rate,
        duration_secs: stream_secs.unwrap_or(decoded_secs),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn downmix(frame: &[i16]) -> i16 {
    let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
    (sum / frame.len() as i32) as i16
}
