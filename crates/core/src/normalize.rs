use unicode_normalization::UnicodeNormalization;

/// Canonical form shared by training and inference.
///
/// Trims, lowercases, composes to NFC and collapses every whitespace run
/// into a single ASCII space. Idempotent.
pub fn normalize_text(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let composed: String = lowered.nfc().collect();

    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "Da Dầu Mụn nên dùng gì?",
        "  serum\t\tgiá \n bao   nhiêu ",
        "MU\u{0323}N",
        "ÀÉÎ\u{00a0}ÕÜ",
        "İstanbul",
        "ﬁne  Straße",
    ];

    #[test]
    fn is_idempotent() {
        for sample in SAMPLES {
            let once = normalize_text(sample);
            assert_eq!(normalize_text(&once), once, "sample {sample:?}");
        }
    }

    #[test]
    fn collapses_whitespace_and_lowercases() {
        assert_eq!(
            normalize_text("  Serum\t\tGIÁ \n bao   nhiêu "),
            "serum giá bao nhiêu"
        );
    }

    #[test]
    fn composes_decomposed_marks() {
        let decomposed = "mu\u{0323}n";
        assert_eq!(normalize_text(decomposed), "mụn");
        assert_eq!(normalize_text(decomposed), normalize_text("Mụn"));
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \t\n"), "");
    }
}
