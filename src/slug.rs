//! URL-safe identifiers derived from display names.
//!
//! Slugs are lowercase ASCII, words joined by single hyphens. Cyrillic is transliterated with
//! the same table `unidecode` uses, Latin diacritics are stripped through NFKD decomposition.
//! The function is pure: the same name always gives the same slug, and slugifying a slug
//! returns it unchanged. No uniqueness suffix is ever appended.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Longest slug the store accepts
pub const SLUG_MAX_LENGTH: usize = 200;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

fn transliterate(c: char) -> Option<&'static str> {
    let s = match c {
        'А' => "A", 'а' => "a",
        'Б' => "B", 'б' => "b",
        'В' => "V", 'в' => "v",
        'Г' => "G", 'г' => "g",
        'Д' => "D", 'д' => "d",
        'Е' => "E", 'е' => "e",
        'Ё' => "Io", 'ё' => "io",
        'Ж' => "Zh", 'ж' => "zh",
        'З' => "Z", 'з' => "z",
        'И' => "I", 'и' => "i",
        'Й' => "I", 'й' => "i",
        'К' => "K", 'к' => "k",
        'Л' => "L", 'л' => "l",
        'М' => "M", 'м' => "m",
        'Н' => "N", 'н' => "n",
        'О' => "O", 'о' => "o",
        'П' => "P", 'п' => "p",
        'Р' => "R", 'р' => "r",
        'С' => "S", 'с' => "s",
        'Т' => "T", 'т' => "t",
        'У' => "U", 'у' => "u",
        'Ф' => "F", 'ф' => "f",
        'Х' => "Kh", 'х' => "kh",
        'Ц' => "Ts", 'ц' => "ts",
        'Ч' => "Ch", 'ч' => "ch",
        'Ш' => "Sh", 'ш' => "sh",
        'Щ' => "Shch", 'щ' => "shch",
        'Ъ' | 'ъ' | 'Ь' | 'ь' => "",
        'Ы' => "Y", 'ы' => "y",
        'Э' => "E", 'э' => "e",
        'Ю' => "Iu", 'ю' => "iu",
        'Я' => "Ia", 'я' => "ia",
        'Є' => "Ie", 'є' => "ie",
        'І' => "I", 'і' => "i",
        'Ї' => "Yi", 'ї' => "yi",
        'Ґ' => "G", 'ґ' => "g",
        'ß' => "ss",
        'Æ' => "AE", 'æ' => "ae",
        'Œ' => "OE", 'œ' => "oe",
        'Ø' => "O", 'ø' => "o",
        'Ł' => "L", 'ł' => "l",
        'Đ' => "D", 'đ' => "d",
        'Þ' => "Th", 'þ' => "th",
        '\'' | '’' | '`' => "",
        _ => return None,
    };
    Some(s)
}

/// Derive the slug for a display name
pub fn slugify(input: &str) -> String {
    let mut ascii = String::with_capacity(input.len());
    for c in input.chars() {
        match transliterate(c) {
            Some(s) => ascii.push_str(s),
            None => ascii.push(c),
        }
    }

    let ascii: String = ascii.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let hyphenated = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let mut slug = hyphenated.trim_matches('-').to_string();

    if slug.len() > SLUG_MAX_LENGTH {
        slug.truncate(SLUG_MAX_LENGTH);
        slug = slug.trim_end_matches('-').to_string();
    }
    slug
}

/// Slug of an author, derived from "first last"
pub fn author_slug(first_name: &str, last_name: &str) -> String {
    slugify(&format!("{} {}", first_name, last_name))
}
