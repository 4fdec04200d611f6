/// Normalizes a raw codec string from either backend's wire format into a
/// canonical display form (spec §4.1). Unknown codecs pass through verbatim.
pub fn normalize_codec(raw: &str) -> String {
    match raw.to_ascii_lowercase().as_str() {
        "hevc" | "h265" | "h.265" => "HEVC".to_string(),
        "h264" | "h.264" | "avc" | "avc1" => "H.264".to_string(),
        "mpeg4" => "MPEG4".to_string(),
        "vc1" | "vc-1" => "VC-1".to_string(),
        "vp9" => "VP9".to_string(),
        "av1" => "AV1".to_string(),
        _ => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_known_codecs() {
        assert_eq!(normalize_codec("hevc"), "HEVC");
        assert_eq!(normalize_codec("h264"), "H.264");
        assert_eq!(normalize_codec("mpeg4"), "MPEG4");
        assert_eq!(normalize_codec("vc1"), "VC-1");
        assert_eq!(normalize_codec("vp9"), "VP9");
        assert_eq!(normalize_codec("av1"), "AV1");
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(normalize_codec("HEVC"), "HEVC");
    }

    #[test]
    fn passes_through_unknown_codecs() {
        assert_eq!(normalize_codec("prores"), "prores");
    }
}
