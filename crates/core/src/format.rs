use std::time::Duration;

use crate::types::Transcript;

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format transcript segments with timestamps
pub fn format_transcript_with_timestamps(transcript: &Transcript) -> String {
    transcript
        .segments
        .iter()
        .map(|seg| format!("[{}] {}", format_timestamp(seg.start), seg.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(75.9), "01:15");
        assert_eq!(format_timestamp(3600.0), "60:00");
    }

    #[test]
    fn transcript_lines_are_timestamped_and_trimmed() {
        let transcript = Transcript {
            text: "Hi there. Buy now.".to_string(),
            segments: vec![
                Segment {
                    start: 0.0,
                    end: 2.5,
                    text: " Hi there.".to_string(),
                },
                Segment {
                    start: 62.0,
                    end: 64.0,
                    text: " Buy now. ".to_string(),
                },
            ],
            language: "en".to_string(),
        };

        assert_eq!(
            format_transcript_with_timestamps(&transcript),
            "[00:00] Hi there.\n[01:02] Buy now."
        );
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(150)), "2m 30s");
    }
}
