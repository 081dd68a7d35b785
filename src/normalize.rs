// 🧹 Name Normalization
// Collapses surface spellings of the same card name into one canonical key:
// "青眼の白竜", "青眼の 白龍", "ｂｌｕｅ－ｅｙｅｓ" and "Blue-Eyes" all compare equal
//
// Pipeline order matters, every step assumes the previous ones ran:
//   1. strip whitespace (incl. U+3000)
//   2. strip punctuation / symbols (incl. `*`)
//   3. fold kanji variants
//   4. fold full-width Latin letters and digits
//   5. lower-case
//   6. fold hiragana to katakana

/// Kanji variant → canonical form
pub const KANJI_VARIANTS: &[(char, char)] = &[('竜', '龍'), ('剣', '劍')];

/// Punctuation and symbols removed in step 2
const STRIPPED_SYMBOLS: &str = concat!(
    "・★☆※‼！？。、,.，．:：;；",
    "「」『』【】〔〕（）()［］[]｛｝{}〈〉《》",
    "〜～~-－_＿/／\\＼|｜&＆@＠#＃$＄%％^＾*＊+＋=＝<＜>＞",
    "!?'\"“”‘’`´｀",
);

const FULLWIDTH_OFFSET: u32 = 0xFEE0;
const KANA_OFFSET: u32 = 0x60;

fn is_stripped_symbol(c: char) -> bool {
    STRIPPED_SYMBOLS.contains(c)
}

fn fold_kanji(c: char) -> char {
    KANJI_VARIANTS
        .iter()
        .find(|(variant, _)| *variant == c)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(c)
}

fn fold_fullwidth(c: char) -> char {
    match c {
        'Ａ'..='Ｚ' | 'ａ'..='ｚ' | '０'..='９' => {
            char::from_u32(c as u32 - FULLWIDTH_OFFSET).unwrap_or(c)
        }
        _ => c,
    }
}

/// Hiragana (U+3041..=U+3096) → katakana
pub fn hiragana_to_katakana(c: char) -> char {
    match c {
        '\u{3041}'..='\u{3096}' => char::from_u32(c as u32 + KANA_OFFSET).unwrap_or(c),
        _ => c,
    }
}

/// Canonical comparison key for a card name. Total and idempotent.
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| !is_stripped_symbol(*c))
        .map(fold_kanji)
        .map(fold_fullwidth)
        .collect();

    folded.to_lowercase().chars().map(hiragana_to_katakana).collect()
}

/// Collation key for string sorting: kana folded so that hiragana and
/// katakana spellings sort together
pub fn collation_key(input: &str) -> String {
    input.chars().map(hiragana_to_katakana).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" 　\t"), "");
    }

    #[test]
    fn test_strips_whitespace_and_symbols() {
        assert_eq!(normalize("ブルーアイズ・ホワイト・ドラゴン"), "ブルーアイズホワイトドラゴン");
        assert_eq!(normalize("「青眼の 白龍」"), "青眼ノ白龍");
        assert_eq!(normalize("E・HERO　ネオス"), "eheroネオス");
        assert_eq!(normalize("No.39 希望皇ホープ"), "no39希望皇ホープ");
        assert_eq!(normalize("青眼*"), "青眼");
    }

    #[test]
    fn test_kanji_variants() {
        assert_eq!(normalize("青眼の白竜"), normalize("青眼の白龍"));
        assert_eq!(normalize("伝説の剣"), "伝説ノ劍");
    }

    #[test]
    fn test_fullwidth_and_case() {
        assert_eq!(normalize("ＨＥＲＯ"), "hero");
        assert_eq!(normalize("ｈｅｒｏ１２３"), "hero123");
        assert_eq!(normalize("Hero123"), "hero123");
    }

    #[test]
    fn test_hiragana_folds_to_katakana() {
        assert_eq!(normalize("ぶるーあいず"), "ブルーアイズ");
        assert_eq!(normalize("ぶるーあいず"), normalize("ブルーアイズ"));
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "青眼の白竜",
            "ＥＬＥＭＥＮＴＡＬ　ＨＥＲＯ",
            "ぶらっく・まじしゃん",
            "《No.39 希望皇ホープ》",
            "Card_With_Underscore|99",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s}");
        }
    }

    #[test]
    fn test_collation_key_folds_kana_only() {
        assert_eq!(collation_key("あア"), "アア");
        assert_eq!(collation_key("Abc 竜"), "Abc 竜");
    }
}
