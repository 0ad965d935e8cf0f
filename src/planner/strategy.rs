//! Encoder argument builders
//!
//! Video and audio clips get separate builders. Both share the helpers below
//! for trimming, output, tracks and filters so the two stay consistent.

use std::path::Path;

use crate::domain::model::*;
use crate::utils::time::format_seconds;

/// Everything one encode invocation needs
#[derive(Debug, Clone)]
pub struct EncodeInput<'a> {
    /// File or URL the encoder reads
    pub source: &'a str,
    pub start: f64,
    pub end: f64,
    /// Subtitle delay to apply to the selected subtitles
    pub sub_delay: f64,
    pub playback: &'a PlaybackState,
    pub options: &'a ClipperOptions,
    pub output: &'a Path,
}

/// Build the encode command for `clip_type`
pub fn encode_spec(encoder: &str, clip_type: ClipType, input: &EncodeInput<'_>) -> ProcessSpec {
    match clip_type {
        ClipType::Video => video_args(encoder, input),
        ClipType::Audio => audio_args(encoder, input),
    }
}

/// Video clip: video, selected audio and optionally burned-in subtitles
pub fn video_args(encoder: &str, input: &EncodeInput<'_>) -> ProcessSpec {
    let options = input.options;
    let playback = input.playback;

    let mut spec = base_args(encoder, input)
        .arg(format!("--ovc={}", options.video_codec))
        .args(bitrate_arg("ovcopts", &options.video_bitrate))
        .arg(track_arg("vid", playback.video_track))
        .arg(track_arg("aid", playback.audio_track));

    spec = spec.args(filter_args(playback.crop, options.height));
    spec = spec.args(subtitle_args(input));
    finish_args(spec, input)
}

/// Audio-only clip
pub fn audio_args(encoder: &str, input: &EncodeInput<'_>) -> ProcessSpec {
    let options = input.options;
    let spec = base_args(encoder, input)
        .arg("--vid=no")
        .arg("--sid=no")
        .arg(track_arg("aid", input.playback.audio_track))
        .arg(format!("--oac={}", options.audio_codec))
        .args(bitrate_arg("oacopts", &options.audio_bitrate));
    finish_args(spec, input)
}

/// Source, trim bounds and output file
fn base_args(encoder: &str, input: &EncodeInput<'_>) -> ProcessSpec {
    ProcessSpec::new(encoder)
        .arg(input.source)
        .args(trim_args(input.start, input.end))
        .arg(format!("--o={}", input.output.display()))
}

/// Playback adjustments and user-supplied extras, always last
fn finish_args(spec: ProcessSpec, input: &EncodeInput<'_>) -> ProcessSpec {
    spec.args(volume_args(input.playback))
        .args(input.options.extra_arg_list())
}

/// `--start` and `--end` with millisecond precision
pub fn trim_args(start: f64, end: f64) -> [String; 2] {
    [
        format!("--start={}", format_seconds(start)),
        format!("--end={}", format_seconds(end)),
    ]
}

fn bitrate_arg(option: &str, bitrate: &str) -> Option<String> {
    let bitrate = bitrate.trim();
    (!bitrate.is_empty()).then(|| format!("--{}-add=b={}", option, bitrate))
}

fn track_arg(option: &str, track: Option<i64>) -> String {
    match track {
        Some(id) => format!("--{}={}", option, id),
        None => format!("--{}=no", option),
    }
}

/// Crop before scaling so the crop rectangle stays in source pixels
fn filter_args(crop: Option<CropRect>, height: Option<u32>) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(crop) = crop {
        args.push(format!("--vf-add={}", crop.filter()));
    }
    if let Some(height) = height {
        args.push(format!("--vf-add=scale=-2:{}", height));
    }
    args
}

/// An embedded track is selected by id. An external file is loaded alone so
/// the encoder's default selection picks it; the id it had in the player
/// does not carry over to a fresh encoder instance.
fn subtitle_args(input: &EncodeInput<'_>) -> Vec<String> {
    let playback = input.playback;
    if !input.options.keep_subtitles || !playback.has_subtitles() {
        return vec![track_arg("sid", None)];
    }

    let mut args = match &playback.subtitle_file {
        Some(file) => vec![
            format!("--sub-file={}", file.display()),
            "--sid=auto".to_string(),
        ],
        None => vec![track_arg("sid", playback.subtitle_track)],
    };
    args.push(format!("--sub-delay={}", format_seconds(input.sub_delay)));
    args
}

fn volume_args(playback: &PlaybackState) -> Vec<String> {
    let mut args = Vec::new();
    if (playback.volume - 100.0).abs() > f64::EPSILON {
        args.push(format!("--volume={}", format_seconds(playback.volume)));
    }
    if playback.mute {
        args.push("--mute=yes".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn playback() -> PlaybackState {
        PlaybackState {
            subtitle_track: Some(2),
            subtitle_file: Some(PathBuf::from("/subs/en.srt")),
            ..PlaybackState::local("/videos/movie.mkv")
        }
    }

    fn input<'a>(playback: &'a PlaybackState, options: &'a ClipperOptions) -> EncodeInput<'a> {
        EncodeInput {
            source: &playback.path,
            start: 10.0,
            end: 15.0,
            sub_delay: 0.0,
            playback,
            options,
            output: Path::new("/clips/out.mp4"),
        }
    }

    #[test]
    fn test_video_args_shape() {
        let playback = playback();
        let options = ClipperOptions {
            height: Some(720),
            ..ClipperOptions::default()
        };
        let spec = video_args("mpv", &input(&playback, &options));
        let args = spec.arguments();

        assert_eq!(spec.program(), "mpv");
        assert_eq!(args[0], "/videos/movie.mkv");
        assert_eq!(spec.option_value("start"), Some("10.000"));
        assert_eq!(spec.option_value("end"), Some("15.000"));
        assert_eq!(spec.option_value("o"), Some("/clips/out.mp4"));
        assert_eq!(spec.option_value("ovc"), Some("libx264"));
        assert_eq!(spec.option_value("ovcopts-add"), Some("b=3M"));
        assert_eq!(spec.option_value("vf-add"), Some("scale=-2:720"));
        assert_eq!(spec.option_value("sid"), Some("auto"));
        assert_eq!(spec.option_value("sub-file"), Some("/subs/en.srt"));
        assert_eq!(spec.option_value("sub-delay"), Some("0.000"));
        assert!(spec.option_value("volume").is_none());
    }

    #[test]
    fn test_embedded_subtitles_selected_by_id() {
        let playback = PlaybackState {
            subtitle_track: Some(3),
            sub_delay: 0.25,
            ..PlaybackState::local("/videos/movie.mkv")
        };
        let options = ClipperOptions::default();
        let spec = video_args("mpv", &EncodeInput { sub_delay: 0.25, ..input(&playback, &options) });
        assert_eq!(spec.option_value("sid"), Some("3"));
        assert_eq!(spec.option_value("sub-delay"), Some("0.250"));
        assert!(spec.option_value("sub-file").is_none());
    }

    #[test]
    fn test_subtitle_file_without_track_id_is_loaded() {
        let playback = PlaybackState {
            subtitle_file: Some(PathBuf::from("/subs/fr.ass")),
            ..PlaybackState::local("/videos/movie.mkv")
        };
        let options = ClipperOptions::default();
        let spec = video_args("mpv", &input(&playback, &options));
        assert_eq!(spec.option_value("sub-file"), Some("/subs/fr.ass"));
        assert_eq!(spec.option_value("sid"), Some("auto"));
        assert_eq!(spec.option_value("sub-delay"), Some("0.000"));
    }

    #[test]
    fn test_crop_comes_before_scale() {
        let filters = filter_args(CropRect::new(640, 360, 10, 20).ok(), Some(480));
        assert_eq!(filters, vec!["--vf-add=crop=640:360:10:20", "--vf-add=scale=-2:480"]);
    }

    #[test]
    fn test_subtitles_dropped_when_disabled() {
        let playback = playback();
        let options = ClipperOptions {
            keep_subtitles: false,
            ..ClipperOptions::default()
        };
        let spec = video_args("mpv", &input(&playback, &options));
        assert_eq!(spec.option_value("sid"), Some("no"));
        assert!(spec.option_value("sub-file").is_none());
        assert!(spec.option_value("sub-delay").is_none());
    }

    #[test]
    fn test_audio_args_shape() {
        let mut playback = playback();
        playback.volume = 50.0;
        playback.mute = true;
        let options = ClipperOptions {
            extra_args: "--af=loudnorm".to_string(),
            ..ClipperOptions::default()
        };
        let spec = audio_args("mpv", &input(&playback, &options));

        assert_eq!(spec.option_value("vid"), Some("no"));
        assert_eq!(spec.option_value("sid"), Some("no"));
        assert_eq!(spec.option_value("aid"), Some("1"));
        assert_eq!(spec.option_value("oac"), Some("libmp3lame"));
        assert_eq!(spec.option_value("oacopts-add"), Some("b=192k"));
        assert_eq!(spec.option_value("volume"), Some("50.000"));
        assert_eq!(spec.option_value("mute"), Some("yes"));
        assert_eq!(spec.arguments().last().map(String::as_str), Some("--af=loudnorm"));
    }

    #[test]
    fn test_empty_bitrate_is_omitted() {
        assert_eq!(bitrate_arg("ovcopts", " "), None);
    }
}
