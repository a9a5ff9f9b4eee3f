//! Conversion between ASS and SRT timestamps.

/// Converts an ASS timestamp (`H:MM:SS.cc`) into SRT form (`HH:MM:SS,mmm`).
///
/// Hours, minutes and seconds are zero-padded on the left to two digits and the
/// centiseconds are padded on the right to three, so `0:00:06.40` becomes
/// `00:00:06,400`. Components longer than their width are kept as-is.
///
/// Anything that isn't shaped like an ASS timestamp is returned unchanged.
pub fn ass_to_srt(timestamp: &str) -> String {
    try_ass_to_srt(timestamp.trim()).unwrap_or_else(|| timestamp.to_owned())
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn try_ass_to_srt(s: &str) -> Option<String> {
    let (hms, fraction) = s.split_once('.')?;
    // an empty fraction is padded like any other
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut units = hms.split(':');
    let hours = units.next()?;
    let minutes = units.next()?;
    let seconds = units.next()?;
    if units.next().is_some() || ![hours, minutes, seconds].into_iter().all(is_number) {
        return None;
    }

    Some(format!("{hours:0>2}:{minutes:0>2}:{seconds:0>2},{fraction:0<3}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ass_to_srt() {
        assert_eq!(ass_to_srt("0:00:06.40"), "00:00:06,400");
        assert_eq!(ass_to_srt("1:02:03.05"), "01:02:03,050");
        assert_eq!(ass_to_srt("10:59:59.99"), "10:59:59,990");
        assert_eq!(ass_to_srt(" 0:01:00.00 "), "00:01:00,000");
    }

    #[test]
    fn test_padding_is_textual() {
        // a single digit fraction is padded, not scaled as centiseconds
        assert_eq!(ass_to_srt("0:00:01.5"), "00:00:01,500");
        assert_eq!(ass_to_srt("0:00:01.1234"), "00:00:01,1234");
        assert_eq!(ass_to_srt("123:4:5.00"), "123:04:05,000");
        assert_eq!(ass_to_srt("0:00:06."), "00:00:06,000");
    }

    #[test]
    fn test_malformed_is_returned_unchanged() {
        for input in [
            "garbage",
            "",
            "0:00:06",
            "0:00.40",
            "0:00:06.4.0",
            "a:00:06.40",
            "0:00:06.xx",
            "0:00:00:06.40",
            "0:00:06.-1",
        ] {
            assert_eq!(ass_to_srt(input), input);
        }
    }
}
