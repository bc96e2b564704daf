// ABOUTME: URL slug generation for courses, recipes and programs
// ABOUTME: Folds accented letters to ASCII and collapses everything else to single hyphens

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Letters NFKD leaves alone
fn fold_letter(ch: char) -> Option<&'static str> {
    Some(match ch {
        'ß' => "ss",
        'æ' | 'Æ' => "ae",
        'œ' | 'Œ' => "oe",
        'ø' | 'Ø' => "o",
        'đ' | 'Đ' | 'ð' | 'Ð' => "d",
        'ł' | 'Ł' => "l",
        'þ' | 'Þ' => "th",
        'ı' => "i",
        _ => return None,
    })
}

/// Derive a URL slug from a title
///
/// `"Push / Pull: Week 1"` becomes `"push-pull-week-1"` and accented
/// letters fold to ASCII, so `"Šaltibarščiai"` becomes `"saltibarsciai"`.
/// Returns an empty string when nothing alphanumeric survives.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for ch in title.nfkd().filter(|c| !is_combining_mark(*c)) {
        let folded = match fold_letter(ch) {
            Some(letters) => letters,
            None if ch.is_ascii_alphanumeric() => "",
            None => {
                pending_hyphen = true;
                continue;
            }
        };
        if pending_hyphen && !slug.is_empty() {
            slug.push('-');
        }
        pending_hyphen = false;
        if folded.is_empty() {
            slug.push(ch.to_ascii_lowercase());
        } else {
            slug.push_str(folded);
        }
    }
    slug
}

/// Whether a client-supplied slug is already in canonical form
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Push / Pull: Week 1"), "push-pull-week-1");
        assert_eq!(slugify("  Overnight Oats!  "), "overnight-oats");
        assert_eq!(slugify("Café au lait"), "cafe-au-lait");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_slugify_folds_non_ascii_letters() {
        assert_eq!(slugify("Šaltibarščiai"), "saltibarsciai");
        assert_eq!(slugify("Crème Brûlée"), "creme-brulee");
        assert_eq!(slugify("Straße Smørrebrød"), "strasse-smorrebrod");
        assert_eq!(slugify("Ｆｕｌｌ Ｂｏｄｙ"), "full-body");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("overnight-oats"));
        assert!(!is_valid_slug("Overnight-Oats"));
        assert!(!is_valid_slug("-oats"));
        assert!(!is_valid_slug(""));
    }
}
