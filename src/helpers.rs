//! Small formatting and validation helpers used by controllers and views

use chrono::{Datelike, Local, NaiveDate};
use config::SiteConfig;
use regex::Regex;
use std::sync::LazyLock;

const WEEKDAYS: [&str; 7] = [
    "domingo",
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
];

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$";

/// Keep only ASCII digits
pub fn clean_number(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Check a CPF: eleven digits, not all equal, both check digits correct.
/// Punctuation is ignored.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = clean_number(cpf)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 || digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    (9..11).all(|position| {
        let sum: u32 = digits[..position]
            .iter()
            .enumerate()
            .map(|(i, &d)| d * (position as u32 + 1 - i as u32))
            .sum();
        (sum * 10) % 11 % 10 == digits[position]
    })
}

/// Format eleven digits as `000.000.000-00`; anything else is returned as is
pub fn mask_cpf(cpf: &str) -> String {
    let digits = clean_number(cpf);
    if digits.len() != 11 {
        return cpf.to_string();
    }
    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

/// URL friendly form of a title.
///
/// Accents are dropped, punctuation becomes `_`, spaces become `-`.
pub fn slug(text: &str) -> String {
    let mapped: String = text.trim().chars().map(fold_char).collect();

    let mut slug = String::with_capacity(mapped.len());
    for c in mapped.chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.to_lowercase()
}

fn fold_char(c: char) -> char {
    match c {
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ç' => 'C',
        'ç' => 'c',
        'Ñ' => 'N',
        'ñ' => 'n',
        'Ý' => 'Y',
        'ý' => 'y',
        '!' | '@' | '#' | '$' | '%' | '&' | '*' | '_' | '-' | '+' | '=' | ':' | ';' | ','
        | '.' | '?' | '/' | '|' | '\'' | '~' | '^' | '°' | '¨' | 'ª' | 'º' | '´' => '_',
        other => other,
    }
}

/// Long Portuguese date, e.g. `sexta-feira, 03 de maio de 2024`
pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{}, {:02} de {} de {}",
        WEEKDAYS[date.weekday().num_days_from_sunday() as usize],
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

pub fn current_date() -> String {
    format_date(Local::now().date_naive())
}

pub fn is_localhost(host: &str) -> bool {
    let name = host.split(':').next().unwrap_or(host);
    name.eq_ignore_ascii_case("localhost")
}

/// Absolute URL for `path`, on the development base when served from localhost
pub fn url(site: &SiteConfig, host: &str, path: &str) -> String {
    let base = if is_localhost(host) {
        &site.url_development
    } else {
        &site.url_production
    };

    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Loose check: long enough, has a dot and an http(s) scheme
pub fn validate_url(url: &str) -> bool {
    url.chars().count() >= 10
        && url.contains('.')
        && (url.contains("http://") || url.contains("https://"))
}

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_number_strips_punctuation() {
        assert_eq!(clean_number("529.982.247-25"), "52998224725");
        assert_eq!(clean_number("abc"), "");
    }

    #[test]
    fn cpf_check_digits() {
        assert!(validate_cpf("529.982.247-25"));
        assert!(validate_cpf("11144477735"));
        // first digit right, second wrong
        assert!(!validate_cpf("52998224724"));
        assert!(!validate_cpf("12345678900"));
        assert!(!validate_cpf("11111111111"));
        assert!(!validate_cpf("5299822472"));
    }

    #[test]
    fn cpf_mask() {
        assert_eq!(mask_cpf("52998224725"), "529.982.247-25");
        assert_eq!(mask_cpf("123"), "123");
    }

    #[test]
    fn slug_folds_accents_and_spaces() {
        assert_eq!(slug("Imóvel Guia"), "imovel-guia");
        assert_eq!(slug("  Casa   na Praia "), "casa-na-praia");
        assert_eq!(slug("Olá, Mundo!"), "ola_-mundo_");
    }

    #[test]
    fn portuguese_long_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(format_date(date), "sexta-feira, 03 de maio de 2024");

        let date = NaiveDate::from_ymd_opt(2023, 3, 12).unwrap();
        assert_eq!(format_date(date), "domingo, 12 de março de 2023");
    }

    #[test]
    fn url_picks_environment_by_host() {
        let site = SiteConfig::default();
        assert_eq!(
            url(&site, "localhost:3000", "404"),
            "http://localhost/imovel-guide/404"
        );
        assert_eq!(
            url(&site, "imovelguide.glaucopereira.com", "/editar/1"),
            "https://imovelguide.glaucopereira.com/editar/1"
        );
        assert!(is_localhost("LOCALHOST"));
        assert!(!is_localhost("example.com"));
    }

    #[test]
    fn url_and_email_checks() {
        assert!(validate_url("https://example.com"));
        assert!(!validate_url("example.com/path"));
        assert!(!validate_url("http://a"));

        assert!(EMAIL_RE.is_some());
        assert!(validate_email("ana@imovelguide.com.br"));
        assert!(!validate_email("ana@"));
        assert!(!validate_email("ana imovel@guide.com"));
    }
}
