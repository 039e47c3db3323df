//! Name normalization shared by cache keys, award matching and handle generation

/// Replace Turkish (and a few common Latin) diacritics with ASCII equivalents.
///
/// Capital dotted `İ` maps straight to `i` so that a later `to_lowercase`
/// never produces a combining dot.
pub fn fold_diacritics(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'ç' => 'c',
            'Ç' => 'C',
            'ğ' => 'g',
            'Ğ' => 'G',
            'ı' => 'i',
            'İ' => 'i',
            'ö' => 'o',
            'Ö' => 'O',
            'ş' => 's',
            'Ş' => 'S',
            'ü' => 'u',
            'Ü' => 'U',
            'â' | 'á' | 'à' | 'ä' => 'a',
            'Â' | 'Á' | 'À' | 'Ä' => 'A',
            'î' | 'í' | 'ì' | 'ï' => 'i',
            'Î' | 'Í' | 'Ì' | 'Ï' => 'I',
            'û' | 'ú' | 'ù' => 'u',
            'Û' | 'Ú' | 'Ù' => 'U',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'ô' | 'ó' | 'ò' => 'o',
            'Ô' | 'Ó' | 'Ò' => 'O',
            'ñ' => 'n',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Fold diacritics, lowercase, trim and collapse runs of whitespace.
pub fn normalize_name(input: &str) -> String {
    fold_diacritics(input)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a folded, lowercased string into alphanumeric words.
pub fn words(input: &str) -> Vec<String> {
    normalize_name(input)
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim and drop empty strings, so `Some("")` behaves like `None`.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_turkish() {
        assert_eq!(fold_diacritics("Çiya Sofrası"), "Ciya Sofrasi");
        assert_eq!(fold_diacritics("Beşiktaş Üsküdar"), "Besiktas Uskudar");
        assert_eq!(fold_diacritics("İstanbul"), "istanbul");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("NEOLOKAL "), "neolokal");
        assert_eq!(normalize_name("  Mikla   Restaurant "), "mikla restaurant");
        assert_eq!(normalize_name("İSTANBUL"), "istanbul");
    }

    #[test]
    fn test_words() {
        assert_eq!(words("Karaköy Lokantası & Bar"), vec!["karakoy", "lokantasi", "bar"]);
        assert!(words("  ").is_empty());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" Moda ")), Some("Moda"));
        assert_eq!(non_empty(None), None);
    }
}
